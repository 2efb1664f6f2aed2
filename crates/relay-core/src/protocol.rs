use serde::Deserialize;
use serde::Serialize;

use crate::events::ActivityEvent;
use crate::events::ApprovalPlan;
use crate::events::MessageId;
use crate::events::PlanId;
use crate::events::RunId;
use crate::streaming::ChatRole;

pub const DEFAULT_EXECUTION_ERROR: &str = "execution failed";

fn default_execution_error() -> String {
    DEFAULT_EXECUTION_ERROR.to_string()
}

/// Messages the remote agent posts to the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundMessage {
    #[serde(rename_all = "camelCase")]
    Activity { run_id: RunId, event: ActivityEvent },
    #[serde(rename_all = "camelCase")]
    RunComplete { run_id: RunId },
    #[serde(rename_all = "camelCase")]
    StreamStart { message_id: MessageId },
    #[serde(rename_all = "camelCase")]
    StreamDelta {
        message_id: MessageId,
        #[serde(default)]
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    StreamEnd { message_id: MessageId },
    #[serde(rename_all = "camelCase")]
    Message {
        text: String,
        #[serde(default)]
        role: ChatRole,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<MessageId>,
    },
    #[serde(rename_all = "camelCase")]
    PlanProposed { plan: ApprovalPlan },
    #[serde(rename_all = "camelCase")]
    ExecutionComplete {
        plan_id: PlanId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        approved_action_indices: Option<Vec<usize>>,
    },
    #[serde(rename_all = "camelCase")]
    ExecutionError {
        plan_id: PlanId,
        #[serde(default = "default_execution_error")]
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    PlanRejected { plan_id: PlanId },
}

impl InboundMessage {
    /// Every wire `type` tag the panel understands.
    pub const KINDS: [&'static str; 10] = [
        "activity",
        "run-complete",
        "stream-start",
        "stream-delta",
        "stream-end",
        "message",
        "plan-proposed",
        "execution-complete",
        "execution-error",
        "plan-rejected",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Activity { .. } => "activity",
            Self::RunComplete { .. } => "run-complete",
            Self::StreamStart { .. } => "stream-start",
            Self::StreamDelta { .. } => "stream-delta",
            Self::StreamEnd { .. } => "stream-end",
            Self::Message { .. } => "message",
            Self::PlanProposed { .. } => "plan-proposed",
            Self::ExecutionComplete { .. } => "execution-complete",
            Self::ExecutionError { .. } => "execution-error",
            Self::PlanRejected { .. } => "plan-rejected",
        }
    }

    /// Wire name of the correlation field a kind cannot be applied without.
    pub fn correlation_field(kind: &str) -> Option<&'static str> {
        match kind {
            "activity" | "run-complete" => Some("runId"),
            "stream-start" | "stream-delta" | "stream-end" => Some("messageId"),
            "execution-complete" | "execution-error" | "plan-rejected" => Some("planId"),
            "plan-proposed" => Some("plan"),
            _ => None,
        }
    }
}

/// Requests the panel posts back to the agent. Fire and forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    #[serde(rename_all = "camelCase")]
    ApproveAction {
        plan_id: PlanId,
        action_indices: Vec<usize>,
    },
    #[serde(rename_all = "camelCase")]
    RejectPlan { plan_id: PlanId },
    OpenFile { path: String },
    ReviewDiff { path: String },
    SendMessage { text: String },
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApproveAction { .. } => "approve-action",
            Self::RejectPlan { .. } => "reject-plan",
            Self::OpenFile { .. } => "open-file",
            Self::ReviewDiff { .. } => "review-diff",
            Self::SendMessage { .. } => "send-message",
        }
    }
}
