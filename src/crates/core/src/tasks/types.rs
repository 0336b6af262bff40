use crate::util::errors::OneThingError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Priority tier a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskTier {
    /// Today's single highest-impact task. At most one is expected.
    OneThing,
    Supporting,
    IfTime,
    Backlog,
}

impl TaskTier {
    pub const ALL: [TaskTier; 4] = [
        TaskTier::OneThing,
        TaskTier::Supporting,
        TaskTier::IfTime,
        TaskTier::Backlog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskTier::OneThing => "one-thing",
            TaskTier::Supporting => "supporting",
            TaskTier::IfTime => "if-time",
            TaskTier::Backlog => "backlog",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskTier::OneThing => "ONE Thing",
            TaskTier::Supporting => "Supporting",
            TaskTier::IfTime => "If Time",
            TaskTier::Backlog => "Backlog",
        }
    }
}

impl fmt::Display for TaskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskTier {
    type Err = OneThingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TaskTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == value.trim())
            .ok_or_else(|| OneThingError::Validation(format!("Unknown task tier: {}", value)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tier: TaskTier,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
}

impl Task {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description,
            tier: TaskTier::Backlog,
            completed: false,
            created_at: now,
            updated_at: now,
            due_date: None,
            estimated_minutes: None,
        }
    }

    pub fn with_tier(mut self, tier: TaskTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn to_ref(&self) -> TaskRef {
        TaskRef {
            id: self.id.clone(),
            title: self.title.clone(),
            tier: self.tier.as_str().to_string(),
        }
    }
}

/// The slice of a task the briefing endpoint needs.
///
/// `tier` stays a plain string on the wire so unknown values from older
/// clients are tolerated instead of rejecting the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: String,
    pub title: String,
    pub tier: String,
}

impl TaskRef {
    pub fn is_one_thing(&self) -> bool {
        self.tier == TaskTier::OneThing.as_str()
    }
}

/// Per-day record written when a briefing concludes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReview {
    pub date: NaiveDate,
    pub one_thing_id: String,
    pub one_thing_goal: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
