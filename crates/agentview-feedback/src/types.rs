use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FeedbackError;

/// Lowest allowed value of any 1-5 rating.
pub const MIN_RATING: u8 = 1;
/// Highest allowed value of any 1-5 rating.
pub const MAX_RATING: u8 = 5;

/// What kind of work the rated session was doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskCategory {
    BugFix,
    FeatureDevelopment,
    Documentation,
    Refactoring,
    Testing,
    Debugging,
    CodeReview,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 8] = [
        TaskCategory::BugFix,
        TaskCategory::FeatureDevelopment,
        TaskCategory::Documentation,
        TaskCategory::Refactoring,
        TaskCategory::Testing,
        TaskCategory::Debugging,
        TaskCategory::CodeReview,
        TaskCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::BugFix => "bug-fix",
            TaskCategory::FeatureDevelopment => "feature-development",
            TaskCategory::Documentation => "documentation",
            TaskCategory::Refactoring => "refactoring",
            TaskCategory::Testing => "testing",
            TaskCategory::Debugging => "debugging",
            TaskCategory::CodeReview => "code-review",
            TaskCategory::Other => "other",
        }
    }

    /// Title-cased label, e.g. "Feature Development".
    pub fn label(&self) -> String {
        title_case(self.as_str())
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown task category: {}", s))
    }
}

/// Problems a reviewer can flag on a single prompt's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Hallucination,
    Incomplete,
    Incorrect,
    OffTopic,
    Outdated,
    SecurityConcern,
}

impl IssueType {
    pub const ALL: [IssueType; 6] = [
        IssueType::Hallucination,
        IssueType::Incomplete,
        IssueType::Incorrect,
        IssueType::OffTopic,
        IssueType::Outdated,
        IssueType::SecurityConcern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Hallucination => "hallucination",
            IssueType::Incomplete => "incomplete",
            IssueType::Incorrect => "incorrect",
            IssueType::OffTopic => "off-topic",
            IssueType::Outdated => "outdated",
            IssueType::SecurityConcern => "security-concern",
        }
    }

    pub fn label(&self) -> String {
        title_case(self.as_str())
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueType::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| format!("Unknown issue type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            _ => Err(format!("Unknown complexity: {}", s)),
        }
    }
}

/// Evaluation of one prompt within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub prompt_index: usize,
    pub prompt_text: String,
    pub response_accuracy: u8,
    pub response_helpful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<IssueType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A stored, human-submitted evaluation of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,

    pub overall_accuracy: u8,
    pub overall_satisfaction: u8,

    pub task_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_completion_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_relevance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_worked_well: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_needs_improvement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_comments: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_category: Option<TaskCategory>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub complexity: Option<Complexity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<Vec<PromptFeedback>>,
}

/// Feedback as submitted by a reviewer; the store assigns `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub session_id: String,
    pub overall_accuracy: u8,
    pub overall_satisfaction: u8,
    pub task_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_completion_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_relevance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_worked_well: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_needs_improvement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_category: Option<TaskCategory>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub complexity: Option<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<Vec<PromptFeedback>>,
}

/// A partial update. Present fields overwrite; `id` and `timestamp` are not
/// part of the patch and are rejected as unknown fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FeedbackPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_accuracy: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_satisfaction: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_completion_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_relevance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_worked_well: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_needs_improvement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_category: Option<TaskCategory>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub complexity: Option<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<Vec<PromptFeedback>>,
}

impl NewFeedback {
    /// Minimal feedback with the two required ratings.
    pub fn new(
        session_id: impl Into<String>,
        overall_accuracy: u8,
        overall_satisfaction: u8,
        task_completed: bool,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            overall_accuracy,
            overall_satisfaction,
            task_completed,
            task_completion_notes: None,
            code_quality: None,
            response_relevance: None,
            efficiency: None,
            what_worked_well: None,
            what_needs_improvement: None,
            additional_comments: None,
            user_role: None,
            task_category: None,
            complexity: None,
            prompt_feedback: None,
        }
    }

    pub fn validate(&self) -> Result<(), FeedbackError> {
        check_rating("overallAccuracy", self.overall_accuracy)?;
        check_rating("overallSatisfaction", self.overall_satisfaction)?;
        check_optional_ratings(self.code_quality, self.response_relevance, self.efficiency)?;
        check_prompt_feedback(self.prompt_feedback.as_deref())
    }

    /// Stamp the submission with its identity.
    pub fn into_record(self, id: String, timestamp: DateTime<Utc>) -> FeedbackRecord {
        FeedbackRecord {
            id,
            session_id: self.session_id,
            timestamp,
            overall_accuracy: self.overall_accuracy,
            overall_satisfaction: self.overall_satisfaction,
            task_completed: self.task_completed,
            task_completion_notes: self.task_completion_notes,
            code_quality: self.code_quality,
            response_relevance: self.response_relevance,
            efficiency: self.efficiency,
            what_worked_well: self.what_worked_well,
            what_needs_improvement: self.what_needs_improvement,
            additional_comments: self.additional_comments,
            user_role: self.user_role,
            task_category: self.task_category,
            complexity: self.complexity,
            prompt_feedback: self.prompt_feedback,
        }
    }
}

impl FeedbackPatch {
    pub fn is_empty(&self) -> bool {
        self == &FeedbackPatch::default()
    }

    pub fn validate(&self) -> Result<(), FeedbackError> {
        if let Some(value) = self.overall_accuracy {
            check_rating("overallAccuracy", value)?;
        }
        if let Some(value) = self.overall_satisfaction {
            check_rating("overallSatisfaction", value)?;
        }
        check_optional_ratings(self.code_quality, self.response_relevance, self.efficiency)?;
        check_prompt_feedback(self.prompt_feedback.as_deref())
    }
}

impl FeedbackRecord {
    pub fn validate(&self) -> Result<(), FeedbackError> {
        check_rating("overallAccuracy", self.overall_accuracy)?;
        check_rating("overallSatisfaction", self.overall_satisfaction)?;
        check_optional_ratings(self.code_quality, self.response_relevance, self.efficiency)?;
        check_prompt_feedback(self.prompt_feedback.as_deref())
    }

    /// Merge a patch into this record. `id` and `timestamp` never change.
    pub fn apply(&mut self, patch: FeedbackPatch) {
        let FeedbackPatch {
            session_id,
            overall_accuracy,
            overall_satisfaction,
            task_completed,
            task_completion_notes,
            code_quality,
            response_relevance,
            efficiency,
            what_worked_well,
            what_needs_improvement,
            additional_comments,
            user_role,
            task_category,
            complexity,
            prompt_feedback,
        } = patch;

        if let Some(v) = session_id {
            self.session_id = v;
        }
        if let Some(v) = overall_accuracy {
            self.overall_accuracy = v;
        }
        if let Some(v) = overall_satisfaction {
            self.overall_satisfaction = v;
        }
        if let Some(v) = task_completed {
            self.task_completed = v;
        }
        if task_completion_notes.is_some() {
            self.task_completion_notes = task_completion_notes;
        }
        if code_quality.is_some() {
            self.code_quality = code_quality;
        }
        if response_relevance.is_some() {
            self.response_relevance = response_relevance;
        }
        if efficiency.is_some() {
            self.efficiency = efficiency;
        }
        if what_worked_well.is_some() {
            self.what_worked_well = what_worked_well;
        }
        if what_needs_improvement.is_some() {
            self.what_needs_improvement = what_needs_improvement;
        }
        if additional_comments.is_some() {
            self.additional_comments = additional_comments;
        }
        if user_role.is_some() {
            self.user_role = user_role;
        }
        if task_category.is_some() {
            self.task_category = task_category;
        }
        if complexity.is_some() {
            self.complexity = complexity;
        }
        if prompt_feedback.is_some() {
            self.prompt_feedback = prompt_feedback;
        }
    }
}

fn check_rating(field: &str, value: u8) -> Result<(), FeedbackError> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(())
    } else {
        Err(FeedbackError::InvalidRating {
            field: field.to_string(),
            value,
        })
    }
}

fn check_optional_ratings(
    code_quality: Option<u8>,
    response_relevance: Option<u8>,
    efficiency: Option<u8>,
) -> Result<(), FeedbackError> {
    let optional = [
        ("codeQuality", code_quality),
        ("responseRelevance", response_relevance),
        ("efficiency", efficiency),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            check_rating(field, value)?;
        }
    }
    Ok(())
}

fn check_prompt_feedback(prompts: Option<&[PromptFeedback]>) -> Result<(), FeedbackError> {
    for (i, prompt) in prompts.unwrap_or_default().iter().enumerate() {
        check_rating(
            &format!("promptFeedback[{}].responseAccuracy", i),
            prompt.response_accuracy,
        )?;
    }
    Ok(())
}

/// "feature-development" -> "Feature Development"
fn title_case(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Optional enum fields arrive as `""` from unselected form inputs; treat
/// that as absent.
pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = String>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
