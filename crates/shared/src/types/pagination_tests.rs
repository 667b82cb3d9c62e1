use super::*;

#[test]
fn test_page_request_default_is_unpaginated() {
    let request = PageRequest::default();
    assert!(!request.is_paginated());
    assert_eq!(request.window(), None);
}

#[test]
fn test_page_request_offset() {
    assert_eq!(PageRequest::new(1, 20).offset(), 0);
    assert_eq!(PageRequest::new(2, 20).offset(), 20);
    assert_eq!(PageRequest::new(3, 7).window(), Some((14, 7)));
}

#[test]
fn test_page_request_fills_missing_half() {
    let only_page = PageRequest {
        page: Some(2),
        page_size: None,
    };
    assert_eq!(only_page.window(), Some((10, 10)));

    let only_size = PageRequest {
        page: None,
        page_size: Some(5),
    };
    assert_eq!(only_size.window(), Some((0, 5)));
}

#[test]
fn test_page_request_clamps_zero() {
    let request = PageRequest::new(0, 0);
    assert_eq!(request.page(), 1);
    assert_eq!(request.page_size(), 1);
    assert_eq!(request.offset(), 0);
}

#[test]
fn test_page_request_deserializes_camel_case() {
    let request: PageRequest = serde_json::from_str(r#"{"page":2,"pageSize":25}"#).unwrap();
    assert_eq!(request, PageRequest::new(2, 25));
}

#[test]
fn test_page_total_pages_rounds_up() {
    // 25 items, 10 per page -> 3 pages
    let page: Page<i32> = Page::new(vec![], 25, &PageRequest::new(1, 10));
    assert_eq!(page.total_pages, Some(3));
    assert_eq!(page.current_page, Some(1));
    assert_eq!(page.page_size, Some(10));
}

#[test]
fn test_page_empty_has_zero_pages() {
    let page: Page<i32> = Page::new(vec![], 0, &PageRequest::new(1, 10));
    assert_eq!(page.total_pages, Some(0));
}

#[test]
fn test_unpaginated_serialization_omits_metadata() {
    let page = Page::new(vec![1, 2, 3], 3, &PageRequest::all());
    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json, serde_json::json!({ "items": [1, 2, 3], "totalCount": 3 }));
}

#[test]
fn test_paginated_serialization_shape() {
    let page = Page::new(vec!["a"], 11, &PageRequest::new(2, 10));
    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "items": ["a"],
            "totalCount": 11,
            "pageSize": 10,
            "currentPage": 2,
            "totalPages": 2
        })
    );
}

#[test]
fn test_page_map_keeps_metadata() {
    let page = Page::new(vec![1, 2], 12, &PageRequest::new(1, 2)).map(|n| n * 10);
    assert_eq!(page.items, vec![10, 20]);
    assert_eq!(page.total_pages, Some(6));
}
