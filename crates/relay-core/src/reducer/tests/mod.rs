pub(super) use super::reduce;
pub(super) use super::PanelEffect;
pub(super) use crate::actions::MenuCommand;
pub(super) use crate::actions::PanelAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::approval::PlanPhase;
pub(super) use crate::approval::APPROVAL_TIMEOUT_MESSAGE;
pub(super) use crate::events::ActionKind;
pub(super) use crate::events::ActivityEvent;
pub(super) use crate::events::ApprovalPlan;
pub(super) use crate::events::MessageId;
pub(super) use crate::events::PlanAction;
pub(super) use crate::events::PlanId;
pub(super) use crate::events::RiskLevel;
pub(super) use crate::events::RunId;
pub(super) use crate::events::RunStatus;
pub(super) use crate::phases::derive_groups;
pub(super) use crate::protocol::InboundMessage;
pub(super) use crate::protocol::OutboundMessage;
pub(super) use crate::state::LogBuffer;
pub(super) use crate::state::LogEntry;
pub(super) use crate::state::LogLevel;
pub(super) use crate::state::LogSource;
pub(super) use crate::state::PanelFocus;
pub(super) use crate::state::PanelSettings;
pub(super) use crate::state::PanelState;
pub(super) use crate::streaming::ChatRole;

mod invariants;
mod streaming_chat;

fn state() -> PanelState {
    PanelState::default()
}

fn agent(state: &mut PanelState, message: InboundMessage) -> Vec<PanelEffect> {
    reduce(state, PanelAction::Agent(message))
}

fn user(state: &mut PanelState, action: UserAction) -> Vec<PanelEffect> {
    reduce(state, PanelAction::User(action))
}

fn activity(run_id: &str, event: ActivityEvent) -> InboundMessage {
    InboundMessage::Activity {
        run_id: RunId::from(run_id),
        event,
    }
}

fn phase_start(id: &str, title: &str) -> ActivityEvent {
    ActivityEvent::PhaseStart {
        id: id.to_string(),
        title: title.to_string(),
    }
}

fn phase_end(id: &str) -> ActivityEvent {
    ActivityEvent::PhaseEnd {
        phase_id: id.to_string(),
    }
}

fn analysis(text: &str) -> ActivityEvent {
    ActivityEvent::Analysis {
        text: text.to_string(),
    }
}

fn plan_action(kind: ActionKind, target: &str, risk: RiskLevel) -> PlanAction {
    let (path, command) = match kind {
        ActionKind::RunCommand => (None, Some(target.to_string())),
        ActionKind::CreateFile | ActionKind::EditFile => (Some(target.to_string()), None),
    };
    PlanAction {
        kind,
        path,
        command,
        risk,
        warnings: Vec::new(),
        preview: None,
    }
}

fn three_step_plan(plan_id: &str) -> ApprovalPlan {
    ApprovalPlan {
        plan_id: PlanId::from(plan_id),
        message: "Fix the failing test".to_string(),
        actions: vec![
            plan_action(ActionKind::EditFile, "src/lib.rs", RiskLevel::Low),
            plan_action(ActionKind::CreateFile, "tests/fix.rs", RiskLevel::Medium),
            plan_action(ActionKind::RunCommand, "cargo test", RiskLevel::High),
        ],
    }
}

fn posted(effects: &[PanelEffect]) -> Vec<OutboundMessage> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            PanelEffect::Post(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

fn log_messages(state: &PanelState) -> Vec<String> {
    state.logs.iter().map(|entry| entry.message.clone()).collect()
}
