use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::StoredRecord;

/// Counters shown above a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
}

/// Counts records by status, category key and priority key.
///
/// Keys are taken literally, so unknown categories get their own bucket.
pub fn get_stats<'a, R: StoredRecord + 'a>(records: impl IntoIterator<Item = &'a R>) -> Stats {
    let mut stats = Stats::default();

    for record in records {
        stats.total += 1;
        if record.is_active() {
            stats.active += 1;
        }
        *stats.by_category.entry(record.category_key().to_string()).or_insert(0) += 1;
        if let Some(priority) = record.priority_key() {
            *stats.by_priority.entry(priority.to_string()).or_insert(0) += 1;
        }
    }

    stats.inactive = stats.total - stats.active;
    stats
}
