use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{FeedbackRecord, TaskCategory};

/// How many trend points the CLI and dashboards show.
pub const RECENT_TRENDS_LIMIT: usize = 10;

/// Aggregate statistics over a feedback collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total_feedback: usize,
    pub avg_accuracy: f64,
    pub avg_satisfaction: f64,
    /// Percentage of records with the task completed, 0 to 100.
    pub completion_rate: f64,
    pub by_category: BTreeMap<TaskCategory, usize>,
    /// Newest first.
    pub recent_trends: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// UTC calendar date as `M/D/YYYY`.
    pub date: String,
    pub accuracy: u8,
    pub satisfaction: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: TaskCategory,
    pub count: usize,
}

impl FeedbackStats {
    /// Category histogram, most frequent first.
    pub fn category_entries(&self) -> Vec<CategoryCount> {
        let mut entries: Vec<CategoryCount> = self
            .by_category
            .iter()
            .map(|(&category, &count)| CategoryCount { category, count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }

    /// The newest `limit` trend points.
    pub fn recent(&self, limit: usize) -> &[TrendPoint] {
        &self.recent_trends[..self.recent_trends.len().min(limit)]
    }
}

/// Summarize a feedback collection. An empty collection yields all zeros.
pub fn compute_analytics(records: &[FeedbackRecord]) -> FeedbackStats {
    if records.is_empty() {
        return FeedbackStats::default();
    }

    let total = records.len();
    let accuracy_sum: u64 = records.iter().map(|r| u64::from(r.overall_accuracy)).sum();
    let satisfaction_sum: u64 = records
        .iter()
        .map(|r| u64::from(r.overall_satisfaction))
        .sum();
    let completed = records.iter().filter(|r| r.task_completed).count();

    let mut by_category = BTreeMap::new();
    for category in records.iter().filter_map(|r| r.task_category) {
        *by_category.entry(category).or_insert(0) += 1;
    }

    // Stable: equal timestamps keep their input order.
    let mut newest_first: Vec<&FeedbackRecord> = records.iter().collect();
    newest_first.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let recent_trends = newest_first
        .into_iter()
        .map(|r| TrendPoint {
            date: r.timestamp.format("%-m/%-d/%Y").to_string(),
            accuracy: r.overall_accuracy,
            satisfaction: r.overall_satisfaction,
        })
        .collect();

    FeedbackStats {
        total_feedback: total,
        avg_accuracy: accuracy_sum as f64 / total as f64,
        avg_satisfaction: satisfaction_sum as f64 / total as f64,
        completion_rate: completed as f64 / total as f64 * 100.0,
        by_category,
        recent_trends,
    }
}
