//! Dashboard statistics repository — read-only aggregates over reports.

use rust_decimal::Decimal;
use serde::Serialize;

use super::report_repo::from_cents;
use super::{Database, DatabaseError};

/// Month selection for an aggregate query.
///
/// Range bounds are inclusive and compared as strings, which is
/// chronological for zero-padded `YYYY-MM` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthFilter {
    Exact(String),
    Range { from: String, to: String },
}

/// Aggregated dashboard totals over a filtered report set.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardTotals {
    pub total_ngos_reporting: i64,
    pub total_people_helped: i64,
    pub total_events_conducted: i64,
    pub total_funds_utilized: Decimal,
}

/// Escapes LIKE wildcards so an ngo_id filter matches literally.
fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Returns totals over all reports matching the month filter and the
/// optional ngo_id substring. Sums are 0 over an empty set.
///
/// The NGO count is distinct organizations with at least one matching
/// report, not the number of matching reports.
pub fn dashboard_totals(
    db: &Database,
    months: &MonthFilter,
    ngo_id_contains: Option<&str>,
) -> Result<DashboardTotals, DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        match months {
            MonthFilter::Exact(month) => {
                conditions.push(format!("month = ?{}", param_values.len() + 1));
                param_values.push(Box::new(month.clone()));
            }
            MonthFilter::Range { from, to } => {
                conditions.push(format!("month >= ?{}", param_values.len() + 1));
                param_values.push(Box::new(from.clone()));
                conditions.push(format!("month <= ?{}", param_values.len() + 1));
                param_values.push(Box::new(to.clone()));
            }
        }

        if let Some(fragment) = ngo_id_contains {
            conditions.push(format!(
                "ngo_id LIKE ?{} ESCAPE '\\'",
                param_values.len() + 1
            ));
            param_values.push(Box::new(format!("%{}%", escape_like(fragment))));
        }

        let sql = format!(
            "SELECT COUNT(DISTINCT ngo_id),
             COALESCE(SUM(people_helped), 0),
             COALESCE(SUM(events_conducted), 0),
             COALESCE(SUM(funds_utilized_cents), 0)
             FROM reports WHERE {}",
            conditions.join(" AND ")
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let (ngos, people, events, funds_cents): (i64, i64, i64, i64) =
            conn.query_row(&sql, params_ref.as_slice(), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;

        Ok(DashboardTotals {
            total_ngos_reporting: ngos,
            total_people_helped: people,
            total_events_conducted: events,
            total_funds_utilized: from_cents(funds_cents),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::report_repo::{self, ReportRecord};
    use std::str::FromStr;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn seed(db: &Database, ngo_id: &str, month: &str, people: i64, events: i64, funds: &str) {
        report_repo::upsert(
            db,
            &ReportRecord {
                ngo_id: ngo_id.to_string(),
                month: month.to_string(),
                people_helped: people,
                events_conducted: events,
                funds_utilized: Decimal::from_str(funds).unwrap(),
            },
        )
        .unwrap();
    }

    #[test]
    fn test_exact_month_totals() {
        let db = test_db();
        seed(&db, "NGO1", "2024-01", 100, 5, "15000.50");
        seed(&db, "NGO2", "2024-01", 50, 2, "4999.50");
        seed(&db, "NGO3", "2024-02", 999, 9, "1.00");

        let totals = dashboard_totals(
            &db,
            &MonthFilter::Exact("2024-01".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(totals.total_ngos_reporting, 2);
        assert_eq!(totals.total_people_helped, 150);
        assert_eq!(totals.total_events_conducted, 7);
        assert_eq!(
            totals.total_funds_utilized,
            Decimal::from_str("20000.00").unwrap()
        );
    }

    #[test]
    fn test_empty_month_is_all_zeros() {
        let db = test_db();
        seed(&db, "NGO1", "2024-01", 100, 5, "100.00");

        let totals = dashboard_totals(
            &db,
            &MonthFilter::Exact("2030-12".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(totals.total_ngos_reporting, 0);
        assert_eq!(totals.total_people_helped, 0);
        assert_eq!(totals.total_events_conducted, 0);
        assert_eq!(totals.total_funds_utilized, Decimal::new(0, 2));
    }

    #[test]
    fn test_range_is_inclusive() {
        let db = test_db();
        seed(&db, "NGO1", "2024-01", 10, 1, "1.00");
        seed(&db, "NGO1", "2024-02", 20, 1, "1.00");
        seed(&db, "NGO1", "2024-03", 30, 1, "1.00");
        seed(&db, "NGO1", "2024-04", 40, 1, "1.00");

        let totals = dashboard_totals(
            &db,
            &MonthFilter::Range {
                from: "2024-02".to_string(),
                to: "2024-03".to_string(),
            },
            None,
        )
        .unwrap();

        assert_eq!(totals.total_people_helped, 50);
        // One NGO across two months counts once.
        assert_eq!(totals.total_ngos_reporting, 1);
    }

    #[test]
    fn test_ngo_substring_filter() {
        let db = test_db();
        seed(&db, "ALPHA_NGO", "2024-01", 10, 1, "1.00");
        seed(&db, "BETA_NGO", "2024-01", 20, 1, "1.00");
        seed(&db, "GAMMA", "2024-01", 40, 1, "1.00");

        let totals = dashboard_totals(
            &db,
            &MonthFilter::Exact("2024-01".to_string()),
            Some("_NGO"),
        )
        .unwrap();

        // Underscore is escaped, so "_NGO" matches literally.
        assert_eq!(totals.total_ngos_reporting, 2);
        assert_eq!(totals.total_people_helped, 30);
    }

    #[test]
    fn test_like_wildcards_are_literal() {
        let db = test_db();
        seed(&db, "NGO1", "2024-01", 10, 1, "1.00");
        seed(&db, "N%O1", "2024-01", 20, 1, "1.00");

        let totals = dashboard_totals(
            &db,
            &MonthFilter::Exact("2024-01".to_string()),
            Some("N%O"),
        )
        .unwrap();

        assert_eq!(totals.total_ngos_reporting, 1);
        assert_eq!(totals.total_people_helped, 20);
    }

    #[test]
    fn test_funds_sum_is_exact() {
        let db = test_db();
        // Classic float-drift pair: 0.10 + 0.20 must be exactly 0.30.
        seed(&db, "NGO1", "2024-01", 0, 0, "0.10");
        seed(&db, "NGO2", "2024-01", 0, 0, "0.20");

        let totals = dashboard_totals(
            &db,
            &MonthFilter::Exact("2024-01".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(
            totals.total_funds_utilized,
            Decimal::from_str("0.30").unwrap()
        );
    }
}
