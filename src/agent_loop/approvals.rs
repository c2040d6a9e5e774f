//! Approval policies for tool calls that need sign-off.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::tools::ToolArguments;

/// Approval decision for a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Deny,
}

impl ApprovalDecision {
    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approve)
    }
}

/// Decides whether a tool call awaiting approval may run.
#[async_trait]
pub trait ApprovalPolicy: Send + Sync {
    async fn decide(&self, tool_name: &str, arguments: &ToolArguments) -> ApprovalDecision;
}

/// Approves every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl ApprovalPolicy for AllowAll {
    async fn decide(&self, _tool_name: &str, _arguments: &ToolArguments) -> ApprovalDecision {
        ApprovalDecision::Approve
    }
}

/// Denies the listed tools and approves everything else.
#[derive(Debug, Clone, Default)]
pub struct DenyTools {
    denied: HashSet<String>,
}

impl DenyTools {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denied: names.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ApprovalPolicy for DenyTools {
    async fn decide(&self, tool_name: &str, _arguments: &ToolArguments) -> ApprovalDecision {
        if self.denied.contains(tool_name) {
            ApprovalDecision::Deny
        } else {
            ApprovalDecision::Approve
        }
    }
}
