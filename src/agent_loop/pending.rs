//! Approvals and outputs accumulated during one stream pass.

use crate::agents::{ToolApproval, ToolOutput};

/// Work to submit when the current pass drains.
///
/// Each call id appears at most once across both sets; a later record for the
/// same call id replaces the earlier one, wherever it was stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingWork {
    approvals: Vec<ToolApproval>,
    outputs: Vec<ToolOutput>,
}

impl PendingWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_approval(&mut self, approval: ToolApproval) {
        self.outputs
            .retain(|o| o.tool_call_id != approval.tool_call_id);
        match self
            .approvals
            .iter_mut()
            .find(|a| a.tool_call_id == approval.tool_call_id)
        {
            Some(existing) => *existing = approval,
            None => self.approvals.push(approval),
        }
    }

    pub fn record_output(&mut self, output: ToolOutput) {
        self.approvals
            .retain(|a| a.tool_call_id != output.tool_call_id);
        match self
            .outputs
            .iter_mut()
            .find(|o| o.tool_call_id == output.tool_call_id)
        {
            Some(existing) => *existing = output,
            None => self.outputs.push(output),
        }
    }

    /// Drop whatever is stored for `call_id` in either set.
    pub fn forget(&mut self, call_id: &str) {
        self.approvals.retain(|a| a.tool_call_id != call_id);
        self.outputs.retain(|o| o.tool_call_id != call_id);
    }

    pub fn approvals(&self) -> &[ToolApproval] {
        &self.approvals
    }

    pub fn outputs(&self) -> &[ToolOutput] {
        &self.outputs
    }

    pub fn is_empty(&self) -> bool {
        self.approvals.is_empty() && self.outputs.is_empty()
    }

    /// Move both sets out, leaving this accumulator empty for the next pass.
    pub fn take(&mut self) -> (Vec<ToolApproval>, Vec<ToolOutput>) {
        (
            std::mem::take(&mut self.approvals),
            std::mem::take(&mut self.outputs),
        )
    }
}
