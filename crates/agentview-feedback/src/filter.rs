use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use agentview_sessions::parse_instant;

use crate::error::{FeedbackError, Result};
use crate::types::{empty_as_none, FeedbackRecord, TaskCategory};

/// Criteria for narrowing a feedback collection. Every field is optional and
/// all present criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackFilters {
    #[serde(
        default,
        deserialize_with = "rating_or_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_accuracy: Option<u8>,
    #[serde(
        default,
        deserialize_with = "rating_or_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_accuracy: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_completed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_category: Option<TaskCategory>,
    /// Inclusive lower bound; a bare date means the start of that UTC day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Inclusive upper bound; a bare date covers the whole UTC day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Filters with date bounds parsed, ready to test records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFilters {
    pub min_accuracy: Option<u8>,
    pub max_accuracy: Option<u8>,
    pub task_completed: Option<bool>,
    pub task_category: Option<TaskCategory>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

impl FeedbackFilters {
    pub fn has_active_filters(&self) -> bool {
        self.min_accuracy.is_some()
            || self.max_accuracy.is_some()
            || self.task_completed.is_some()
            || self.task_category.is_some()
            || self.start_date.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self.end_date.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// Parse the date bounds. An unparsable date rejects the whole filter.
    pub fn resolve(&self) -> Result<ResolvedFilters> {
        Ok(ResolvedFilters {
            min_accuracy: self.min_accuracy,
            max_accuracy: self.max_accuracy,
            task_completed: self.task_completed,
            task_category: self.task_category,
            start: parse_bound("startDate", self.start_date.as_deref(), Bound::Start)?,
            end: parse_bound("endDate", self.end_date.as_deref(), Bound::End)?,
        })
    }
}

impl ResolvedFilters {
    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        if let Some(min) = self.min_accuracy {
            if record.overall_accuracy < min {
                return false;
            }
        }
        if let Some(max) = self.max_accuracy {
            if record.overall_accuracy > max {
                return false;
            }
        }
        if let Some(completed) = self.task_completed {
            if record.task_completed != completed {
                return false;
            }
        }
        if let Some(category) = self.task_category {
            if record.task_category != Some(category) {
                return false;
            }
        }
        if let Some(start) = self.start {
            if record.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if record.timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Return the records matching every present criterion, in input order.
pub fn filter_feedback(
    records: &[FeedbackRecord],
    filters: &FeedbackFilters,
) -> Result<Vec<FeedbackRecord>> {
    let resolved = filters.resolve()?;
    Ok(records
        .iter()
        .filter(|r| resolved.matches(r))
        .cloned()
        .collect())
}

fn parse_bound(
    field: &'static str,
    value: Option<&str>,
    bound: Bound,
) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Some(instant) = parse_instant(raw) {
        return Ok(Some(instant));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = match bound {
            Bound::Start => NaiveTime::MIN,
            Bound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
                .unwrap_or(NaiveTime::MIN),
        };
        return Ok(Some(date.and_time(time).and_utc()));
    }

    Err(FeedbackError::InvalidFilterValue {
        field,
        value: raw.to_string(),
    })
}

/// Accuracy bounds come in as numbers from JSON and as strings from query
/// strings; an empty string is absent, like an unselected category.
fn rating_or_empty<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u8),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) => match text.trim() {
            "" => Ok(None),
            t => t.parse().map(Some).map_err(|_| {
                serde::de::Error::custom(format!("invalid accuracy value '{}'", t))
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_only_bounds_cover_whole_day() {
        let filters = FeedbackFilters {
            start_date: Some("2026-01-20".to_string()),
            end_date: Some("2026-01-20".to_string()),
            ..Default::default()
        };
        let resolved = filters.resolve().unwrap();
        assert_eq!(
            resolved.start.unwrap().to_rfc3339(),
            "2026-01-20T00:00:00+00:00"
        );
        assert_eq!(
            resolved.end.unwrap().to_rfc3339(),
            "2026-01-20T23:59:59.999999999+00:00"
        );
    }

    #[test]
    fn test_rfc3339_bound_is_converted_to_utc() {
        let filters = FeedbackFilters {
            start_date: Some("2026-01-20T12:00:00+02:00".to_string()),
            ..Default::default()
        };
        let resolved = filters.resolve().unwrap();
        assert_eq!(
            resolved.start.unwrap().to_rfc3339(),
            "2026-01-20T10:00:00+00:00"
        );
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let filters = FeedbackFilters {
            end_date: Some("last tuesday".to_string()),
            ..Default::default()
        };
        let err = filters.resolve().unwrap_err();
        assert!(matches!(
            err,
            FeedbackError::InvalidFilterValue { field: "endDate", ref value } if value == "last tuesday"
        ));
    }

    #[test]
    fn test_blank_dates_are_inactive() {
        let filters = FeedbackFilters {
            start_date: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!filters.has_active_filters());
        assert_eq!(filters.resolve().unwrap(), ResolvedFilters::default());
    }

    #[test]
    fn test_query_string_shape() {
        let filters: FeedbackFilters =
            serde_json::from_str(r#"{"minAccuracy":3,"taskCategory":"","taskCompleted":false}"#)
                .unwrap();
        assert_eq!(filters.min_accuracy, Some(3));
        assert_eq!(filters.task_category, None);
        assert_eq!(filters.task_completed, Some(false));
        assert!(filters.has_active_filters());
    }

    #[test]
    fn test_empty_accuracy_is_absent() {
        let filters: FeedbackFilters =
            serde_json::from_str(r#"{"minAccuracy":"","maxAccuracy":" ","taskCategory":""}"#)
                .unwrap();
        assert_eq!(filters.min_accuracy, None);
        assert_eq!(filters.max_accuracy, None);
        assert!(!filters.has_active_filters());

        let filters: FeedbackFilters =
            serde_json::from_str(r#"{"minAccuracy":"4","maxAccuracy":5}"#).unwrap();
        assert_eq!(filters.min_accuracy, Some(4));
        assert_eq!(filters.max_accuracy, Some(5));

        let bad = serde_json::from_str::<FeedbackFilters>(r#"{"minAccuracy":"high"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_naive_bound_without_seconds() {
        let filters = FeedbackFilters {
            end_date: Some("2026-01-20T18:45".to_string()),
            ..Default::default()
        };
        let resolved = filters.resolve().unwrap();
        assert_eq!(
            resolved.end.unwrap().to_rfc3339(),
            "2026-01-20T18:45:00+00:00"
        );
    }
}
