//! Progress reporting for list and copy runs.
//!
//! The copier calls a [`ProgressReporter`] once per listed table, once at the
//! start and end of every copied table, and once per copied row.

use tracing::{debug, info};

/// Start or end of one table's copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableProgress<'a> {
    /// Source table name.
    pub table: &'a str,
    /// Target table name, if the table is remapped.
    pub target_table: Option<&'a str>,
    /// Row count of the source table, taken before streaming.
    pub total_rows: u64,
}

/// One copied row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowProgress<'a> {
    /// Source table name.
    pub table: &'a str,
    /// Target table name, if the table is remapped.
    pub target_table: Option<&'a str>,
    /// 1-based number of the row just copied.
    pub current: u64,
    /// Row count of the source table, taken before streaming.
    pub total: u64,
}

impl RowProgress<'_> {
    /// Whether this is the last row of the counted total.
    pub fn is_last(&self) -> bool {
        self.current == self.total
    }
}

/// Sink for progress events.
pub trait ProgressReporter: Send + Sync {
    /// A table passed the name filter of a `list` run.
    fn table_listed(&self, name: &str);

    /// Copying of a table begins.
    fn table_started(&self, progress: &TableProgress<'_>);

    /// A row was inserted into the target.
    fn row_copied(&self, progress: &RowProgress<'_>);

    /// Copying of a table completed with `rows` rows.
    fn table_finished(&self, progress: &TableProgress<'_>, rows: u64);
}

/// Reports progress as `tracing` events.
///
/// Every row is logged at debug level; every `interval`-th row and the last
/// row are also logged at info level.
#[derive(Debug, Clone)]
pub struct LogProgress {
    interval: u64,
}

impl LogProgress {
    /// Default number of rows between info-level row events.
    pub const DEFAULT_INTERVAL: u64 = 1000;

    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    /// Whether a row event is reported at info level.
    pub fn is_milestone(&self, progress: &RowProgress<'_>) -> bool {
        progress.current % self.interval == 0 || progress.is_last()
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

fn describe(table: &str, target_table: Option<&str>) -> String {
    match target_table {
        Some(target) => format!("{} -> {}", table, target),
        None => table.to_string(),
    }
}

impl ProgressReporter for LogProgress {
    fn table_listed(&self, name: &str) {
        info!("{}", name);
    }

    fn table_started(&self, progress: &TableProgress<'_>) {
        info!(
            "Copying table {} ({} rows)",
            describe(progress.table, progress.target_table),
            progress.total_rows
        );
    }

    fn row_copied(&self, progress: &RowProgress<'_>) {
        let table = describe(progress.table, progress.target_table);
        if self.is_milestone(progress) {
            info!("{}: {}/{} rows copied", table, progress.current, progress.total);
        } else {
            debug!("{}: {}/{} rows copied", table, progress.current, progress.total);
        }
    }

    fn table_finished(&self, progress: &TableProgress<'_>, rows: u64) {
        info!(
            "Table {} finished: {} rows copied",
            describe(progress.table, progress.target_table),
            rows
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(current: u64, total: u64) -> RowProgress<'static> {
        RowProgress {
            table: "ORDERS",
            target_table: None,
            current,
            total,
        }
    }

    #[test]
    fn test_milestones() {
        let progress = LogProgress::new(10);
        assert!(!progress.is_milestone(&row(1, 25)));
        assert!(progress.is_milestone(&row(10, 25)));
        assert!(progress.is_milestone(&row(20, 25)));
        assert!(progress.is_milestone(&row(25, 25)));
        assert!(!progress.is_milestone(&row(24, 25)));
    }

    #[test]
    fn test_zero_interval_reports_every_row() {
        let progress = LogProgress::new(0);
        assert!(progress.is_milestone(&row(1, 3)));
        assert!(progress.is_milestone(&row(2, 3)));
    }

    #[test]
    fn test_describe_mentions_remapping() {
        assert_eq!(describe("A", None), "A");
        assert_eq!(describe("A", Some("B")), "A -> B");
    }
}
