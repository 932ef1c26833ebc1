//! Task model shared by the store, the dispatcher and the shell.
//!
//! `Task` is the validated form. `TaskDraft` is what the interpretation
//! service sends back; it only becomes a `Task` through [`TaskDraft::validate`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Med,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Med => "med",
            Priority::High => "high",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "med" => Some(Priority::Med),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Core task type.
///
/// Serializes to the same JSON shape the interpretation service is asked to
/// return, so the current list can be sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,

    /// Short advisory text; may be empty.
    pub insight: String,

    pub status: TaskStatus,
    pub priority: Priority,

    /// Reward granted on completion.
    pub credits: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            insight: String::new(),
            status: TaskStatus::Pending,
            priority: Priority::Med,
            credits: 0,
            deadline: None,
        }
    }

    pub fn with_insight(mut self, insight: impl Into<String>) -> Self {
        self.insight = insight.into();
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = credits;
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Unvalidated task as it arrives on the wire.
///
/// Required fields are typed just enough for JSON decoding to reject a reply
/// that is missing them; the enum and range checks happen in `validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub id: String,
    pub title: String,
    pub insight: String,
    pub status: String,
    pub priority: String,
    pub credits: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl TaskDraft {
    pub fn validate(&self) -> Result<Task, ValidationError> {
        let id = self.id.as_str();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyId {
                title: self.title.clone(),
            });
        }

        let status = TaskStatus::parse(&self.status).ok_or_else(|| {
            ValidationError::UnknownStatus {
                id: id.to_string(),
                value: self.status.clone(),
            }
        })?;

        let priority = Priority::parse(&self.priority).ok_or_else(|| {
            ValidationError::UnknownPriority {
                id: id.to_string(),
                value: self.priority.clone(),
            }
        })?;

        let credits = u32::try_from(self.credits).map_err(|_| ValidationError::InvalidCredits {
            id: id.to_string(),
            value: self.credits,
        })?;

        // "" is what the service tends to emit when no date was mentioned.
        let deadline = match self.deadline.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ValidationError::InvalidDeadline {
                    id: id.to_string(),
                    value: raw.to_string(),
                }
            })?),
        };

        Ok(Task {
            id: id.to_string(),
            title: self.title.clone(),
            insight: self.insight.clone(),
            status,
            priority,
            credits,
            deadline,
        })
    }
}

impl From<&Task> for TaskDraft {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id.clone(),
            title: t.title.clone(),
            insight: t.insight.clone(),
            status: t.status.as_str().to_string(),
            priority: t.priority.as_str().to_string(),
            credits: i64::from(t.credits),
            deadline: t.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Tasks every new session starts with.
pub fn seed_tasks(today: NaiveDate) -> Vec<Task> {
    vec![
        Task::new("t-101", "Rebalance Crypto Portfolio")
            .with_insight("ETH staking yield up 2.1%")
            .with_priority(Priority::High)
            .with_credits(500)
            .with_deadline(today),
        Task::new("t-102", "Audit Monthly Subscriptions")
            .with_insight("Possible 15% wastage detected")
            .with_priority(Priority::Low)
            .with_credits(150),
        Task::new("t-103", "Budget Tokyo Trip")
            .with_insight("Yen currently weak against USD")
            .with_status(TaskStatus::Completed)
            .with_priority(Priority::Med)
            .with_credits(300)
            .with_deadline(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap_or(today)),
    ]
}
