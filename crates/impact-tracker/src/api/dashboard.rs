//! Aggregate dashboard queries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::stats_repo::{self, MonthFilter};
use crate::db::Database;
use crate::month;

use super::ApiError;

/// Query parameters for `GET /dashboard`.
///
/// Either `month` alone or both `from_month` and `to_month` must be given;
/// `month` wins when both forms are present. `ngo_id` filters by substring.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DashboardQuery {
    pub month: Option<String>,
    pub from_month: Option<String>,
    pub to_month: Option<String>,
    pub ngo_id: Option<String>,
}

impl DashboardQuery {
    fn month_filter(&self) -> Result<MonthFilter, ApiError> {
        if let Some(ref month) = self.month {
            check_format(month)?;
            return Ok(MonthFilter::Exact(month.clone()));
        }
        if let (Some(from), Some(to)) = (&self.from_month, &self.to_month) {
            check_format(from)?;
            check_format(to)?;
            return Ok(MonthFilter::Range {
                from: from.clone(),
                to: to.clone(),
            });
        }
        Err(ApiError::InvalidQuery(
            "Month parameter is required (format: YYYY-MM)".to_string(),
        ))
    }
}

fn check_format(value: &str) -> Result<(), ApiError> {
    if month::is_valid_format(value) {
        Ok(())
    } else {
        Err(ApiError::InvalidQuery(
            "Invalid month format. Use YYYY-MM (e.g., 2024-01)".to_string(),
        ))
    }
}

/// Aggregates for the selected months, echoing the query back.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ngo_id: Option<String>,
    pub total_ngos_reporting: i64,
    pub total_people_helped: i64,
    pub total_events_conducted: i64,
    pub total_funds_utilized: Decimal,
}

/// Runs the aggregate query. Read-only.
pub fn get_dashboard(db: &Database, query: &DashboardQuery) -> Result<DashboardView, ApiError> {
    let filter = query.month_filter()?;
    let totals = stats_repo::dashboard_totals(db, &filter, query.ngo_id.as_deref())?;

    let (month, from_month, to_month) = match filter {
        MonthFilter::Exact(m) => (Some(m), None, None),
        MonthFilter::Range { from, to } => (None, Some(from), Some(to)),
    };

    Ok(DashboardView {
        month,
        from_month,
        to_month,
        ngo_id: query.ngo_id.clone(),
        total_ngos_reporting: totals.total_ngos_reporting,
        total_people_helped: totals.total_people_helped,
        total_events_conducted: totals.total_events_conducted,
        total_funds_utilized: totals.total_funds_utilized,
    })
}
