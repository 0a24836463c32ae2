use serde::{Deserialize, Serialize};

use crate::driver::traits::Locator;

/// Closed set of engagement actions the orchestrator knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Watch,
    Share,
    Quote,
    Reply,
    Like,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Watch => "watch",
            TaskType::Share => "share",
            TaskType::Quote => "quote",
            TaskType::Reply => "reply",
            TaskType::Like => "like",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable locator pair driving one task type: the button that starts the
/// task and the button that confirms it.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub action: Locator,
    pub verify: Locator,
}

/// Why a task run ended in failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailReason {
    /// Action button never became clickable; presumed unavailable.
    TriggerUnavailable,
    /// Verify button absent; no retry is possible without it.
    VerifyMissing,
    /// All verify clicks spent without the action button disappearing.
    RetryExhausted { attempts: u32 },
    /// Stop was requested while a wait was in flight.
    Cancelled,
}

/// One recorded (session, task type) attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub session_id: String,
    pub task_type: TaskType,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<FailReason>,
    pub at: chrono::DateTime<chrono::Utc>,
}

impl TaskOutcome {
    pub fn success(session_id: impl Into<String>, task_type: TaskType) -> Self {
        Self {
            session_id: session_id.into(),
            task_type,
            success: true,
            fail_reason: None,
            at: chrono::Utc::now(),
        }
    }

    pub fn failure(
        session_id: impl Into<String>,
        task_type: TaskType,
        reason: FailReason,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            task_type,
            success: false,
            fail_reason: Some(reason),
            at: chrono::Utc::now(),
        }
    }
}
