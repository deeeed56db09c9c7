//! Single report submission and the debug listing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::report_repo::{self, ReportRecord, ReportRow, UpsertOutcome};
use crate::db::Database;
use crate::month;

use super::{ApiError, FieldError};

/// Body of `POST /report`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReportRequest {
    pub ngo_id: String,
    pub month: String,
    pub people_helped: i64,
    pub events_conducted: i64,
    pub funds_utilized: Decimal,
}

impl SubmitReportRequest {
    /// Field-level validation; collects every offending field rather than
    /// stopping at the first, so the caller can fix a form in one pass.
    /// This path is the authoritative month-format check.
    fn validate(&self) -> Result<ReportRecord, Vec<FieldError>> {
        let mut errors = Vec::new();

        let ngo_id = self.ngo_id.trim();
        if ngo_id.is_empty() {
            errors.push(FieldError::new("ngo_id", "NGO ID cannot be empty"));
        }

        let month_value = self.month.trim();
        if !month::is_valid_format(month_value) {
            errors.push(FieldError::new("month", month::MONTH_FORMAT_HINT));
        }

        if self.people_helped < 0 {
            errors.push(FieldError::new(
                "people_helped",
                "People helped must be a valid non-negative number",
            ));
        }
        if self.events_conducted < 0 {
            errors.push(FieldError::new(
                "events_conducted",
                "Events conducted must be a valid non-negative number",
            ));
        }
        if self.funds_utilized < Decimal::ZERO {
            errors.push(FieldError::new(
                "funds_utilized",
                "Funds utilized must be a valid non-negative number",
            ));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ReportRecord {
            ngo_id: ngo_id.to_string(),
            month: month_value.to_string(),
            people_helped: self.people_helped,
            events_conducted: self.events_conducted,
            funds_utilized: self.funds_utilized.round_dp(2),
        })
    }
}

/// Result of a submission: the stored record plus whether it was new.
#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub created: bool,
    pub report: ReportRow,
}

impl SubmitOutcome {
    /// 201 for a fresh report, 200 for an overwrite.
    pub fn status_code(&self) -> u16 {
        if self.created {
            201
        } else {
            200
        }
    }

    pub fn message(&self) -> &'static str {
        if self.created {
            "Report created successfully"
        } else {
            "Report updated successfully"
        }
    }
}

/// Upserts one report keyed by (ngo_id, month).
pub fn submit_report(
    db: &Database,
    request: &SubmitReportRequest,
) -> Result<SubmitOutcome, ApiError> {
    let record = request.validate().map_err(ApiError::Validation)?;
    let (outcome, report) = report_repo::upsert(db, &record)?;
    Ok(SubmitOutcome {
        created: outcome == UpsertOutcome::Created,
        report,
    })
}

/// All stored reports, newest first. Unbounded; debugging/admin use.
#[derive(Debug, Serialize)]
pub struct ReportListView {
    pub count: usize,
    pub data: Vec<ReportRow>,
}

pub fn list_reports(db: &Database) -> Result<ReportListView, ApiError> {
    let data = report_repo::list_all(db)?;
    Ok(ReportListView {
        count: data.len(),
        data,
    })
}
