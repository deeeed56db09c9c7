//! Row validation for bulk CSV ingestion.
//!
//! Maps one raw header-to-value row onto a validated `ReportRecord` or the
//! first violated rule. Pure: no side effects, no storage access.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::report_repo::ReportRecord;

/// The first rule a row violated. Messages are part of the API surface:
/// they land verbatim in a job's error details.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("NGO ID cannot be empty")]
    EmptyNgoId,

    #[error("Month cannot be empty")]
    EmptyMonth,

    #[error("Month must be in YYYY-MM format (e.g., 2024-01)")]
    MonthFormat,

    #[error("People helped must be a valid non-negative number")]
    PeopleHelped,

    #[error("Events conducted must be a valid non-negative number")]
    EventsConducted,

    #[error("Funds utilized must be a valid non-negative number")]
    FundsUtilized,
}

/// Parses an optional count column. An absent column counts as 0; a present
/// but unparseable or negative value is an error.
fn parse_count(raw: Option<&str>, err: RowError) -> Result<i64, RowError> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    let value: i64 = raw.trim().parse().map_err(|_| err.clone())?;
    if value < 0 {
        return Err(err);
    }
    Ok(value)
}

/// Parses the optional funds column as an exact decimal, quantized to
/// 2 fractional digits.
fn parse_funds(raw: Option<&str>) -> Result<Decimal, RowError> {
    let Some(raw) = raw else {
        return Ok(Decimal::ZERO);
    };
    let value = Decimal::from_str(raw.trim()).map_err(|_| RowError::FundsUtilized)?;
    if value < Decimal::ZERO {
        return Err(RowError::FundsUtilized);
    }
    Ok(value.round_dp(2))
}

/// Validates one raw CSV row. Rules apply in order; the first failure wins.
pub fn validate_row(raw: &BTreeMap<String, String>) -> Result<ReportRecord, RowError> {
    let ngo_id = raw.get("ngo_id").map(|s| s.trim()).unwrap_or_default();
    if ngo_id.is_empty() {
        return Err(RowError::EmptyNgoId);
    }

    let month = raw.get("month").map(|s| s.trim()).unwrap_or_default();
    if month.is_empty() {
        return Err(RowError::EmptyMonth);
    }
    if !crate::month::is_valid_format(month) {
        return Err(RowError::MonthFormat);
    }

    let people_helped = parse_count(
        raw.get("people_helped").map(String::as_str),
        RowError::PeopleHelped,
    )?;
    let events_conducted = parse_count(
        raw.get("events_conducted").map(String::as_str),
        RowError::EventsConducted,
    )?;
    let funds_utilized = parse_funds(raw.get("funds_utilized").map(String::as_str))?;

    Ok(ReportRecord {
        ngo_id: ngo_id.to_string(),
        month: month.to_string(),
        people_helped,
        events_conducted,
        funds_utilized,
    })
}
