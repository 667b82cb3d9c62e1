//! Trial balance routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::LedgerStore;
use tally_core::reports::{DateRange, TrialBalanceReport};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
};

/// Creates the report routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/trial-balance", get(trial_balance::<S>))
        .route("/trial-balance/pdf", get(trial_balance_pdf::<S>))
}

/// Query parameters for the trial balance.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceQuery {
    /// First date included (YYYY-MM-DD).
    pub start_date: Option<NaiveDate>,
    /// Last date included (YYYY-MM-DD).
    pub end_date: Option<NaiveDate>,
}

impl TrialBalanceQuery {
    /// Both bounds give a range, neither gives all dates.
    ///
    /// # Errors
    ///
    /// Fails when only one bound is given or `start > end`.
    pub fn range(&self) -> ApiResult<Option<DateRange>> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Ok(Some(DateRange::new(start, end)?)),
            (None, None) => Ok(None),
            _ => Err(ApiError::bad_request(
                "INVALID_DATE_RANGE",
                "startDate and endDate must be given together",
            )),
        }
    }
}

/// GET `/trial-balance` - Per-account totals and grand totals.
async fn trial_balance<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<TrialBalanceQuery>,
) -> ApiResult<Json<TrialBalanceReport>> {
    let range = query.range()?;
    Ok(Json(state.ledger.reports.trial_balance(range).await?))
}

/// GET `/trial-balance/pdf` - The same report as a download.
async fn trial_balance_pdf<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<TrialBalanceQuery>,
) -> ApiResult<impl IntoResponse> {
    let range = query.range()?;
    let bytes = state
        .ledger
        .reports
        .render(range, state.renderer.as_ref())
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, state.renderer.content_type()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"trial-balance.pdf\"",
            ),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_range_needs_both_bounds() {
        let query = TrialBalanceQuery {
            start_date: Some(date(1)),
            end_date: None,
        };
        assert_eq!(query.range().unwrap_err().code(), "INVALID_DATE_RANGE");
        assert!(TrialBalanceQuery::default().range().unwrap().is_none());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let query = TrialBalanceQuery {
            start_date: Some(date(9)),
            end_date: Some(date(1)),
        };
        let err = query.range().unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
