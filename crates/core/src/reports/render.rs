//! Tabular report rendering.
//!
//! Reports are first laid out as a [`ReportTable`] of display strings, then
//! handed to a [`ReportRenderer`] for a concrete output format.

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tally_shared::types::Money;

use super::error::ReportError;
use super::types::{DateRange, TrialBalanceReport};

/// A titled table of display strings.
///
/// The first column is a left-aligned label; the rest are right-aligned
/// amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    /// Heading printed on the first page.
    pub title: String,
    /// Line under the heading.
    pub subtitle: String,
    /// Column headers.
    pub columns: Vec<String>,
    /// Body rows.
    pub rows: Vec<Vec<String>>,
    /// Closing row printed after the body.
    pub total: Option<Vec<String>>,
}

impl ReportTable {
    /// Lays out a trial balance.
    #[must_use]
    pub fn trial_balance(report: &TrialBalanceReport) -> Self {
        let amount = |value| Money::new(value, report.currency).format_grouped();
        let rows = report
            .accounts
            .iter()
            .map(|a| vec![a.label.clone(), amount(a.debit), amount(a.credit)])
            .collect();
        Self {
            title: "Trial Balance".to_string(),
            subtitle: describe_range(report.range),
            columns: vec![" ".to_string(), "Debit".to_string(), "Credit".to_string()],
            rows,
            total: Some(vec![
                "Total".to_string(),
                amount(report.totals.total_debit),
                amount(report.totals.total_credit),
            ]),
        }
    }
}

/// "Transactions from January 5, 2024 to March 1, 2024", or "All Dates".
#[must_use]
pub fn describe_range(range: Option<DateRange>) -> String {
    match range {
        Some(range) => format!(
            "Transactions from {} to {}",
            long_date(range.start),
            long_date(range.end)
        ),
        None => "All Dates".to_string(),
    }
}

fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Turns a [`ReportTable`] into bytes.
pub trait ReportRenderer: Send + Sync {
    /// MIME type of the output.
    fn content_type(&self) -> &'static str;

    /// Renders the table.
    fn render(&self, table: &ReportTable) -> Result<Vec<u8>, ReportError>;
}

// US Letter, in points.
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 50;
const ROW_HEIGHT: i64 = 18;
const BODY_SIZE: i64 = 10;
const TITLE_SIZE: i64 = 18;
const SUBTITLE_SIZE: i64 = 11;

/// Renders tables as a paginated PDF using the built-in Helvetica fonts.
#[derive(Debug, Clone, Copy)]
pub struct PdfRenderer {
    rows_per_page: usize,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self { rows_per_page: 30 }
    }
}

impl PdfRenderer {
    /// Creates a renderer placing at most `rows_per_page` body rows on a page.
    #[must_use]
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            rows_per_page: rows_per_page.max(1),
        }
    }

    /// Number of pages a table with `rows` body rows occupies.
    #[must_use]
    pub fn page_count(&self, rows: usize) -> usize {
        rows.div_ceil(self.rows_per_page).max(1)
    }

    fn page_operations(
        table: &ReportTable,
        rows: &[Vec<String>],
        first: bool,
        last: bool,
    ) -> Vec<Operation> {
        let mut ops = Vec::new();
        let mut y = PAGE_HEIGHT - MARGIN;

        if first {
            y -= TITLE_SIZE;
            let x = (PAGE_WIDTH - text_width(&table.title, TITLE_SIZE)) / 2;
            text(&mut ops, "F2", TITLE_SIZE, x, y, &table.title);
            y -= ROW_HEIGHT + 4;
            let x = (PAGE_WIDTH - text_width(&table.subtitle, SUBTITLE_SIZE)) / 2;
            text(&mut ops, "F1", SUBTITLE_SIZE, x, y, &table.subtitle);
            y -= ROW_HEIGHT * 2;
        } else {
            y -= ROW_HEIGHT;
        }

        row(&mut ops, "F2", y, &table.columns);
        rule(&mut ops, y - 6);
        y -= ROW_HEIGHT + 4;

        for cells in rows {
            row(&mut ops, "F1", y, cells);
            y -= ROW_HEIGHT;
        }

        if last {
            if let Some(total) = &table.total {
                rule(&mut ops, y + ROW_HEIGHT - 6);
                y -= 4;
                row(&mut ops, "F2", y, total);
            }
        }
        ops
    }
}

impl ReportRenderer for PdfRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, table: &ReportTable) -> Result<Vec<u8>, ReportError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let empty: &[Vec<String>] = &[];
        let chunks: Vec<&[Vec<String>]> = if table.rows.is_empty() {
            vec![empty]
        } else {
            table.rows.chunks(self.rows_per_page).collect()
        };
        let page_total = chunks.len();

        let mut kids: Vec<Object> = Vec::with_capacity(page_total);
        for (index, chunk) in chunks.into_iter().enumerate() {
            let content = Content {
                operations: Self::page_operations(table, chunk, index == 0, index + 1 == page_total),
            };
            let encoded = content
                .encode()
                .map_err(|e| ReportError::Render(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = i64::try_from(kids.len()).map_err(|e| ReportError::Render(e.to_string()))?;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ReportError::Render(e.to_string()))?;
        Ok(buffer)
    }
}

/// Helvetica advance width of `s` at `size`, in points.
fn text_width(s: &str, size: i64) -> i64 {
    let units: i64 = s
        .chars()
        .map(|c| match c {
            ',' | '.' | ' ' | '/' | '(' | ')' => 278,
            '-' => 333,
            'A'..='Z' => 667,
            'i' | 'j' | 'l' => 222,
            'f' | 't' | 'r' => 300,
            'm' | 'w' => 833,
            _ => 556,
        })
        .sum();
    units * size / 1000
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, s: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
    ));
    ops.push(Operation::new(
        "Td",
        vec![Object::Integer(x), Object::Integer(y)],
    ));
    ops.push(Operation::new("Tj", vec![Object::string_literal(s)]));
    ops.push(Operation::new("ET", vec![]));
}

/// Right edge of each amount column.
const AMOUNT_EDGES: [i64; 2] = [430, PAGE_WIDTH - MARGIN];

fn row(ops: &mut Vec<Operation>, font: &str, y: i64, cells: &[String]) {
    let mut cells = cells.iter();
    if let Some(label) = cells.next() {
        text(ops, font, BODY_SIZE, MARGIN, y, label);
    }
    for (cell, edge) in cells.zip(AMOUNT_EDGES) {
        text(ops, font, BODY_SIZE, edge - text_width(cell, BODY_SIZE), y, cell);
    }
}

fn rule(ops: &mut Vec<Operation>, y: i64) {
    ops.push(Operation::new("w", vec![Object::Integer(1)]));
    ops.push(Operation::new(
        "m",
        vec![Object::Integer(MARGIN), Object::Integer(y)],
    ));
    ops.push(Operation::new(
        "l",
        vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(y)],
    ));
    ops.push(Operation::new("S", vec![]));
}
