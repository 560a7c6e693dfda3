//! The tic jar itself, a file-backed ledger of per-user monthly counts

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::month::{MonthKey, ParseMonthError};
use crate::report::{self, RangeReport, UserHistory};

/// user name -> month key -> tic count, exactly the shape of the
/// persisted JSON document
pub type LedgerMap = BTreeMap<String, BTreeMap<String, u64>>;

/// Confirmation returned after a tic is recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicReceipt {
    pub user: String,
    pub message: String,
}

/// Single-owner store for the ledger.
///
/// The ledger lives behind one mutex, held across the whole
/// read-modify-write-persist sequence, so concurrent increments
/// serialize instead of losing updates.
pub struct TicJar {
    path: PathBuf,
    cost_per_tic: f64,
    data: Mutex<LedgerMap>,
}

impl TicJar {
    /// Open the ledger document at `path`, creating an empty one if it
    /// does not exist. A document that cannot be parsed is tolerated:
    /// the session starts from an empty ledger and the problem is logged.
    pub async fn open(path: impl Into<PathBuf>, cost_per_tic: f64) -> Result<Self> {
        let path = path.into();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => LedgerMap::new(),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        "Ledger at {} is not valid JSON ({e}); starting from an empty ledger",
                        path.display()
                    );
                    LedgerMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await.with_context(|| {
                            format!("Failed to create ledger dir: {}", parent.display())
                        })?;
                    }
                }
                tokio::fs::write(&path, "{}")
                    .await
                    .with_context(|| format!("Failed to create ledger at {}", path.display()))?;
                info!("Created empty ledger at {}", path.display());
                LedgerMap::new()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read ledger at {}", path.display()));
            }
        };

        debug!(
            "Loaded ledger from {} ({} users)",
            path.display(),
            data.len()
        );
        Ok(Self {
            path,
            cost_per_tic,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cost_per_tic(&self) -> f64 {
        self.cost_per_tic
    }

    /// Record one tic for `user` in the current calendar month and persist
    /// the whole ledger before returning.
    pub async fn add_tic(&self, user: &str) -> Result<TicReceipt> {
        let user = user.to_lowercase();
        let month = MonthKey::current().to_string();

        let mut data = self.data.lock().await;
        let count = data
            .entry(user.clone())
            .or_default()
            .entry(month.clone())
            .or_insert(0);
        *count += 1;
        let count = *count;
        self.persist(&data).await?;
        debug!("tic recorded for {user} in {month} (now {count})");

        Ok(TicReceipt {
            message: format!("tic added for {user}."),
            user,
        })
    }

    /// All-time breakdown for one user, months ascending
    pub async fn user_history(&self, user: &str) -> UserHistory {
        let data = self.data.lock().await;
        report::user_history(&data, user, self.cost_per_tic)
    }

    /// Cross-user report over `[start, end]` inclusive, both `YYYY-MM`
    pub async fn range_report(
        &self,
        start: &str,
        end: &str,
    ) -> Result<RangeReport, ParseMonthError> {
        let data = self.data.lock().await;
        report::range_report(&data, start, end, self.cost_per_tic)
    }

    /// Report for the current calendar month
    pub async fn current_report(&self) -> RangeReport {
        let data = self.data.lock().await;
        report::month_report(&data, MonthKey::current(), self.cost_per_tic)
    }

    /// Report for the month before the current one
    pub async fn previous_report(&self) -> RangeReport {
        let data = self.data.lock().await;
        report::month_report(&data, MonthKey::current().pred(), self.cost_per_tic)
    }

    /// (user count, total tic count) across the whole ledger
    pub async fn totals(&self) -> (usize, u64) {
        let data = self.data.lock().await;
        let tics = data.values().flat_map(|months| months.values().copied()).sum();
        (data.len(), tics)
    }

    async fn persist(&self, data: &LedgerMap) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("Failed to serialize ledger")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write ledger at {}", self.path.display()))?;
        Ok(())
    }
}
