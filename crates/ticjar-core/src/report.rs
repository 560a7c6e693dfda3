//! Report aggregation, pure functions over the ledger map

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ledger::LedgerMap;
use crate::month::{MonthKey, ParseMonthError};

/// One month's line in a user's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyEntry {
    pub month: String,
    pub count: u64,
    pub amount_owed: f64,
}

/// A single user's all-time breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserHistory {
    pub user: String,
    pub total_tics: u64,
    pub total_owed: f64,
    pub monthly_breakdown: Vec<MonthlyEntry>,
    pub cost_per_tic: f64,
}

/// One user's aggregated slice of a range report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTotals {
    pub user: String,
    pub count: u64,
    pub amount_owed: f64,
}

/// Cross-user report over an inclusive month range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeReport {
    pub month: String,
    pub cost_per_tic: f64,
    pub users: Vec<UserTotals>,
    pub total_tics: u64,
    pub total_owed: f64,
}

/// All-time breakdown for `user`, months ascending. Unknown users get a
/// zeroed result with an empty breakdown.
pub fn user_history(ledger: &LedgerMap, user: &str, cost_per_tic: f64) -> UserHistory {
    let user = user.to_lowercase();
    let mut history = UserHistory {
        user: user.clone(),
        total_tics: 0,
        total_owed: 0.0,
        monthly_breakdown: Vec::new(),
        cost_per_tic,
    };

    if let Some(months) = ledger.get(&user) {
        for (month, &count) in months {
            let amount_owed = count as f64 * cost_per_tic;
            history.total_tics += count;
            history.total_owed += amount_owed;
            history.monthly_breakdown.push(MonthlyEntry {
                month: month.clone(),
                count,
                amount_owed,
            });
        }
    }

    history
}

/// Report over `[start, end]` inclusive. Both bounds must parse as
/// `YYYY-MM`; a bad bound yields the validation error, never a partial
/// report.
pub fn range_report(
    ledger: &LedgerMap,
    start: &str,
    end: &str,
    cost_per_tic: f64,
) -> Result<RangeReport, ParseMonthError> {
    let start_key: MonthKey = start.parse()?;
    let end_key: MonthKey = end.parse()?;
    let label = if start == end {
        start.to_string()
    } else {
        format!("{start} to {end}")
    };
    Ok(report_between(ledger, start_key, end_key, label, cost_per_tic))
}

/// Report covering a single month
pub fn month_report(ledger: &LedgerMap, month: MonthKey, cost_per_tic: f64) -> RangeReport {
    report_between(ledger, month, month, month.to_string(), cost_per_tic)
}

fn report_between(
    ledger: &LedgerMap,
    start: MonthKey,
    end: MonthKey,
    label: String,
    cost_per_tic: f64,
) -> RangeReport {
    let mut report = RangeReport {
        month: label,
        cost_per_tic,
        users: Vec::new(),
        total_tics: 0,
        total_owed: 0.0,
    };

    let mut per_user: BTreeMap<String, UserTotals> = BTreeMap::new();
    for (user, months) in ledger {
        for (month_key, &count) in months {
            // Tolerate corrupt month keys in stored data rather than
            // aborting the whole report.
            let parsed: MonthKey = match month_key.parse() {
                Ok(key) => key,
                Err(_) => {
                    warn!("Skipping unparsable month key {month_key:?} for user {user:?}");
                    continue;
                }
            };
            if parsed < start || parsed > end {
                continue;
            }

            let amount = count as f64 * cost_per_tic;
            let entry = per_user
                .entry(user.clone())
                .or_insert_with(|| UserTotals {
                    user: user.clone(),
                    count: 0,
                    amount_owed: 0.0,
                });
            entry.count += count;
            entry.amount_owed += amount;
            report.total_tics += count;
            report.total_owed += amount;
        }
    }

    report.users = per_user.into_values().collect();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ledger() -> LedgerMap {
        let mut ledger = LedgerMap::new();
        ledger
            .entry("alice".to_string())
            .or_default()
            .insert("2024-01".to_string(), 3);
        let bob = ledger.entry("bob".to_string()).or_default();
        bob.insert("2024-01".to_string(), 2);
        bob.insert("2024-02".to_string(), 1);
        ledger
    }

    #[test]
    fn test_range_report_aggregates_across_months() {
        let ledger = sample_ledger();
        let report = range_report(&ledger, "2024-01", "2024-02", 0.5).unwrap();

        assert_eq!(report.month, "2024-01 to 2024-02");
        assert_eq!(report.total_tics, 6);
        assert_eq!(report.total_owed, 3.0);

        let alice = report.users.iter().find(|u| u.user == "alice").unwrap();
        assert_eq!(alice.count, 3);
        assert_eq!(alice.amount_owed, 1.5);

        let bob = report.users.iter().find(|u| u.user == "bob").unwrap();
        assert_eq!(bob.count, 3);
        assert_eq!(bob.amount_owed, 1.5);
    }

    #[test]
    fn test_range_report_single_month_label() {
        let ledger = sample_ledger();
        let report = range_report(&ledger, "2024-01", "2024-01", 0.5).unwrap();
        assert_eq!(report.month, "2024-01");
        assert_eq!(report.total_tics, 5);
    }

    #[test]
    fn test_range_report_empty_range() {
        let ledger = sample_ledger();
        let report = range_report(&ledger, "2025-06", "2025-06", 0.5).unwrap();
        assert!(report.users.is_empty());
        assert_eq!(report.total_tics, 0);
        assert_eq!(report.total_owed, 0.0);
    }

    #[test]
    fn test_range_report_invalid_bound_is_an_error() {
        let ledger = sample_ledger();
        assert!(range_report(&ledger, "2024-13", "2024-01", 0.5).is_err());
        assert!(range_report(&ledger, "2024-01", "garbage", 0.5).is_err());
    }

    #[test]
    fn test_range_report_skips_corrupt_month_keys() {
        let mut ledger = sample_ledger();
        ledger
            .get_mut("alice")
            .unwrap()
            .insert("not-a-month".to_string(), 99);

        let report = range_report(&ledger, "2024-01", "2024-02", 0.5).unwrap();
        assert_eq!(report.total_tics, 6);
    }

    #[test]
    fn test_month_report() {
        let ledger = sample_ledger();
        let report = month_report(&ledger, MonthKey::new(2024, 2).unwrap(), 0.5);
        assert_eq!(report.month, "2024-02");
        assert_eq!(report.total_tics, 1);
        assert_eq!(report.users.len(), 1);
        assert_eq!(report.users[0].user, "bob");
    }

    #[test]
    fn test_user_history_totals_and_order() {
        let ledger = sample_ledger();
        let history = user_history(&ledger, "bob", 0.5);

        assert_eq!(history.user, "bob");
        assert_eq!(history.total_tics, 3);
        assert_eq!(history.total_owed, 1.5);
        assert_eq!(history.monthly_breakdown.len(), 2);
        assert_eq!(history.monthly_breakdown[0].month, "2024-01");
        assert_eq!(history.monthly_breakdown[1].month, "2024-02");
    }

    #[test]
    fn test_user_history_unknown_user_is_zeroed() {
        let ledger = sample_ledger();
        let history = user_history(&ledger, "carol", 0.5);
        assert_eq!(history.total_tics, 0);
        assert_eq!(history.total_owed, 0.0);
        assert!(history.monthly_breakdown.is_empty());
        assert_eq!(history.cost_per_tic, 0.5);
    }

    #[test]
    fn test_user_history_normalizes_case() {
        let ledger = sample_ledger();
        let history = user_history(&ledger, "Alice", 0.5);
        assert_eq!(history.user, "alice");
        assert_eq!(history.total_tics, 3);
    }
}
