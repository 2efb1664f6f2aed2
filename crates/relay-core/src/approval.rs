use std::collections::BTreeSet;

use crate::events::ApprovalPlan;
use crate::events::PlanAction;
use crate::events::PlanId;
use crate::protocol::OutboundMessage;

pub const APPROVAL_TIMEOUT_MESSAGE: &str = "approval request timed out";

/// Where a plan sits in its approval lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPhase {
    Ready(usize),
    AwaitingAck(usize),
    Done,
    Rejected,
}

impl PlanPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ready(_) => "Awaiting your approval",
            Self::AwaitingAck(_) => "Executing",
            Self::Done => "All actions applied",
            Self::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Completed,
    Requested,
    Failed,
    Pending,
}

impl ActionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "done",
            Self::Requested => "running",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Applied,
    Duplicate,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePlan {
    pub plan: ApprovalPlan,
    pub completed_action_indices: BTreeSet<usize>,
    pub in_flight: bool,
    pub last_requested_index: Option<usize>,
    pub execution_error: Option<String>,
    pub rejected: bool,
    pub requested_at_ms: Option<u64>,
}

impl ActivePlan {
    fn new(plan: ApprovalPlan) -> Self {
        Self {
            plan,
            completed_action_indices: BTreeSet::new(),
            in_flight: false,
            last_requested_index: None,
            execution_error: None,
            rejected: false,
            requested_at_ms: None,
        }
    }

    pub fn plan_id(&self) -> &PlanId {
        &self.plan.plan_id
    }

    pub fn current_action(&self) -> Option<usize> {
        (0..self.plan.actions.len()).find(|idx| !self.completed_action_indices.contains(idx))
    }

    pub fn current(&self) -> Option<(usize, &PlanAction)> {
        self.current_action()
            .and_then(|idx| self.plan.actions.get(idx).map(|action| (idx, action)))
    }

    pub fn phase(&self) -> PlanPhase {
        if self.rejected {
            return PlanPhase::Rejected;
        }
        match self.current_action() {
            None => PlanPhase::Done,
            Some(current) if self.in_flight => {
                PlanPhase::AwaitingAck(self.last_requested_index.unwrap_or(current))
            }
            Some(current) => PlanPhase::Ready(current),
        }
    }

    pub fn action_status(&self, index: usize) -> ActionStatus {
        if self.completed_action_indices.contains(&index) {
            return ActionStatus::Completed;
        }
        if self.in_flight && self.last_requested_index == Some(index) {
            return ActionStatus::Requested;
        }
        if self.execution_error.is_some() && self.current_action() == Some(index) {
            return ActionStatus::Failed;
        }
        ActionStatus::Pending
    }

    pub fn completed_count(&self) -> usize {
        self.completed_action_indices.len()
    }
}

/// Drives one plan at a time through ascending-index, one-request-at-a-time approval.
#[derive(Debug, Clone, Default)]
pub struct ApprovalSequencer {
    active: Option<ActivePlan>,
}

impl ApprovalSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActivePlan> {
        self.active.as_ref()
    }

    pub fn phase(&self) -> Option<PlanPhase> {
        self.active.as_ref().map(ActivePlan::phase)
    }

    /// Makes `plan` the active plan. Returns false when the same plan id with an
    /// identical action list is already active, in which case nothing changes.
    pub fn select_plan(&mut self, plan: ApprovalPlan) -> bool {
        if let Some(active) = self.active.as_mut() {
            if active.plan.plan_id == plan.plan_id && active.plan.actions == plan.actions {
                active.plan.message = plan.message;
                return false;
            }
        }
        self.active = Some(ActivePlan::new(plan));
        true
    }

    pub fn current_action(&self) -> Option<usize> {
        self.active
            .as_ref()
            .filter(|active| !active.rejected)
            .and_then(ActivePlan::current_action)
    }

    /// Requests execution of the current action, unless a request is already out.
    pub fn approve_current(&mut self, now_ms: u64) -> Option<OutboundMessage> {
        let active = self.active.as_mut()?;
        if active.rejected || active.in_flight {
            return None;
        }
        let current = active.current_action()?;
        active.in_flight = true;
        active.last_requested_index = Some(current);
        active.execution_error = None;
        active.requested_at_ms = Some(now_ms);
        Some(OutboundMessage::ApproveAction {
            plan_id: active.plan.plan_id.clone(),
            action_indices: vec![current],
        })
    }

    pub fn on_execution_complete(
        &mut self,
        plan_id: &PlanId,
        approved_indices: Option<&[usize]>,
    ) -> AckOutcome {
        let Some(active) = self.matching_mut(plan_id) else {
            return AckOutcome::Ignored;
        };
        let action_count = active.plan.actions.len();
        let mut added = 0;
        match approved_indices {
            Some(indices) => {
                for idx in indices.iter().copied().filter(|idx| *idx < action_count) {
                    if active.completed_action_indices.insert(idx) {
                        added += 1;
                    }
                }
            }
            None => {
                if let Some(idx) = active.last_requested_index.filter(|idx| *idx < action_count) {
                    if active.completed_action_indices.insert(idx) {
                        added += 1;
                    }
                }
            }
        }

        let had_pending_state = active.in_flight
            || active.last_requested_index.is_some()
            || active.execution_error.is_some();
        active.in_flight = false;
        active.execution_error = None;
        active.last_requested_index = None;
        active.requested_at_ms = None;

        if added == 0 && !had_pending_state {
            AckOutcome::Duplicate
        } else {
            AckOutcome::Applied
        }
    }

    pub fn on_execution_error(&mut self, plan_id: &PlanId, message: String) -> AckOutcome {
        let Some(active) = self.matching_mut(plan_id) else {
            return AckOutcome::Ignored;
        };
        let duplicate = !active.in_flight && active.execution_error.as_deref() == Some(&message);
        active.in_flight = false;
        active.requested_at_ms = None;
        active.execution_error = Some(message);
        if duplicate {
            AckOutcome::Duplicate
        } else {
            AckOutcome::Applied
        }
    }

    /// Marks the active plan rejected and returns the notice for the agent.
    pub fn reject_plan(&mut self) -> Option<OutboundMessage> {
        let active = self.active.as_mut()?;
        if active.rejected {
            return None;
        }
        active.rejected = true;
        active.in_flight = false;
        active.requested_at_ms = None;
        Some(OutboundMessage::RejectPlan {
            plan_id: active.plan.plan_id.clone(),
        })
    }

    /// Agent-side confirmation of a rejection.
    pub fn on_plan_rejected(&mut self, plan_id: &PlanId) -> AckOutcome {
        match self.active.as_mut() {
            Some(active) if active.plan.plan_id == *plan_id => {
                if active.rejected {
                    return AckOutcome::Duplicate;
                }
                active.rejected = true;
                active.in_flight = false;
                active.requested_at_ms = None;
                AckOutcome::Applied
            }
            _ => AckOutcome::Ignored,
        }
    }

    /// Reverts a request that has waited longer than `timeout_ms` to retry-eligible.
    ///
    /// `last_requested_index` survives so a late acknowledgement without indices
    /// still completes the right action.
    pub fn expire_in_flight(&mut self, now_ms: u64, timeout_ms: u64) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let Some(requested_at_ms) = active.requested_at_ms else {
            return false;
        };
        if !active.in_flight || now_ms.saturating_sub(requested_at_ms) < timeout_ms {
            return false;
        }
        active.in_flight = false;
        active.requested_at_ms = None;
        active.execution_error = Some(APPROVAL_TIMEOUT_MESSAGE.to_string());
        true
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    fn matching_mut(&mut self, plan_id: &PlanId) -> Option<&mut ActivePlan> {
        self.active
            .as_mut()
            .filter(|active| active.plan.plan_id == *plan_id && !active.rejected)
    }
}
