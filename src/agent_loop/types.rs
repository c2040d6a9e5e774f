//! Core turn types for the agent loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a turn is in its lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    Running,
    AwaitingResubmission,
    Completed,
    Errored,
}

/// How a turn ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnStatus {
    Completed,
    Errored { message: String },
    /// The stream drained with nothing to submit and no terminal run event.
    Incomplete,
}

impl TurnStatus {
    pub fn errored(message: impl Into<String>) -> Self {
        Self::Errored {
            message: message.into(),
        }
    }
}

/// Result of a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    #[serde(flatten)]
    pub status: TurnStatus,
    pub passes: usize,
    pub resume_calls: usize,
    pub finished_at: DateTime<Utc>,
}

impl TurnOutcome {
    pub fn new(status: TurnStatus, passes: usize, resume_calls: usize) -> Self {
        Self {
            status,
            passes,
            resume_calls,
            finished_at: Utc::now(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TurnStatus::Completed
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            TurnStatus::Errored { message } => Some(message),
            _ => None,
        }
    }
}

/// What to submit for a tool-output request whose function the provider does not list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedCallPolicy {
    /// Submit nothing for the call id.
    #[default]
    Omit,
    /// Submit an explicit error output so the run is not left waiting.
    Report,
}

/// Limits and policies for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOptions {
    pub max_passes: usize,
    pub unresolved_calls: UnresolvedCallPolicy,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            max_passes: 20,
            unresolved_calls: UnresolvedCallPolicy::Omit,
        }
    }
}
