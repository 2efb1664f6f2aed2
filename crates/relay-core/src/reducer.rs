use tracing::debug;

use crate::actions::MenuCommand;
use crate::actions::PanelAction;
use crate::actions::UserAction;
use crate::approval::AckOutcome;
use crate::approval::PlanPhase;
use crate::events::ActivityEvent;
use crate::events::RunId;
use crate::events::RunStatus;
use crate::phases::derive_groups;
use crate::protocol::InboundMessage;
use crate::protocol::OutboundMessage;
use crate::state::LogEntry;
use crate::state::LogLevel;
use crate::state::LogSource;
use crate::state::PanelFocus;
use crate::state::PanelState;
use crate::streaming::StreamOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEffect {
    Post(OutboundMessage),
    RequestFrame,
    CopyToClipboard(String),
    Quit,
}

pub fn reduce(state: &mut PanelState, action: PanelAction) -> Vec<PanelEffect> {
    match action {
        PanelAction::Agent(message) => reduce_inbound(state, message),
        PanelAction::User(user) => reduce_user(state, user),
        PanelAction::Tick { now_ms } => reduce_tick(state, now_ms),
    }
}

fn reduce_inbound(state: &mut PanelState, message: InboundMessage) -> Vec<PanelEffect> {
    match message {
        InboundMessage::Activity { run_id, event } => {
            append_activity(state, run_id, event);
            vec![PanelEffect::RequestFrame]
        }
        InboundMessage::RunComplete { run_id } => {
            let (run, created) = state.activity.run_entry(&run_id);
            if run.status == RunStatus::Done {
                debug!(run_id = %run_id, "duplicate run-complete ignored");
                return Vec::new();
            }
            run.status = RunStatus::Done;
            let event_count = run.events.len();
            if created {
                state.activity.active_run_id = Some(run_id.clone());
            }
            state.log(
                LogEntry::new(
                    LogLevel::Info,
                    LogSource::Activity,
                    format!("run finished after {event_count} events"),
                )
                .with_run(run_id),
            );
            vec![PanelEffect::RequestFrame]
        }
        InboundMessage::StreamStart { message_id } => {
            state.chat.stream_start(message_id);
            vec![PanelEffect::RequestFrame]
        }
        InboundMessage::StreamDelta { message_id, text } => {
            let outcome = state.chat.stream_delta(&message_id, &text);
            note_stream_outcome(state, outcome, "stream-delta", message_id.as_str());
            frame_if(outcome.changed())
        }
        InboundMessage::StreamEnd { message_id } => {
            let outcome = state.chat.stream_end(&message_id);
            note_stream_outcome(state, outcome, "stream-end", message_id.as_str());
            frame_if(outcome.changed())
        }
        InboundMessage::Message {
            text,
            role,
            message_id,
        } => {
            state.chat.final_message(role, message_id, text);
            vec![PanelEffect::RequestFrame]
        }
        InboundMessage::PlanProposed { plan } => {
            let plan_id = plan.plan_id.clone();
            let action_count = plan.actions.len();
            if !state.approval.select_plan(plan) {
                debug!(plan_id = %plan_id, "plan re-proposed unchanged");
                return vec![PanelEffect::RequestFrame];
            }
            state.focus = PanelFocus::Plan;
            state.log(
                LogEntry::new(
                    LogLevel::Info,
                    LogSource::Approval,
                    format!("plan proposed with {action_count} actions"),
                )
                .with_context(plan_id.to_string()),
            );
            vec![PanelEffect::RequestFrame]
        }
        InboundMessage::ExecutionComplete {
            plan_id,
            approved_action_indices,
        } => {
            let outcome = state
                .approval
                .on_execution_complete(&plan_id, approved_action_indices.as_deref());
            if !note_ack_outcome(state, outcome, "execution-complete", plan_id.as_str()) {
                return Vec::new();
            }
            if state.approval.phase() == Some(PlanPhase::Done) {
                state.log(
                    LogEntry::new(LogLevel::Info, LogSource::Approval, "all actions applied")
                        .with_context(plan_id.to_string()),
                );
            }
            vec![PanelEffect::RequestFrame]
        }
        InboundMessage::ExecutionError { plan_id, error } => {
            let outcome = state.approval.on_execution_error(&plan_id, error.clone());
            if !note_ack_outcome(state, outcome, "execution-error", plan_id.as_str()) {
                return Vec::new();
            }
            state.log(
                LogEntry::new(LogLevel::Warn, LogSource::Approval, error)
                    .with_context(plan_id.to_string()),
            );
            vec![PanelEffect::RequestFrame]
        }
        InboundMessage::PlanRejected { plan_id } => {
            let outcome = state.approval.on_plan_rejected(&plan_id);
            frame_if(note_ack_outcome(
                state,
                outcome,
                "plan-rejected",
                plan_id.as_str(),
            ))
        }
    }
}

fn reduce_user(state: &mut PanelState, action: UserAction) -> Vec<PanelEffect> {
    match action {
        UserAction::ApproveCurrent => match state.approval.approve_current(state.clock_ms) {
            Some(request) => vec![PanelEffect::Post(request), PanelEffect::RequestFrame],
            None => {
                debug!(phase = ?state.approval.phase(), "approve ignored");
                Vec::new()
            }
        },
        UserAction::RejectPlan => match state.approval.reject_plan() {
            Some(notice) => {
                state.log(LogEntry::new(
                    LogLevel::Info,
                    LogSource::Approval,
                    "plan rejected",
                ));
                vec![PanelEffect::Post(notice), PanelEffect::RequestFrame]
            }
            None => Vec::new(),
        },
        UserAction::SendPrompt(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Vec::new();
            }
            state.chat.push_user_message(text.to_string());
            vec![
                PanelEffect::Post(OutboundMessage::SendMessage {
                    text: text.to_string(),
                }),
                PanelEffect::RequestFrame,
            ]
        }
        UserAction::TogglePhaseCollapsed { run_id, phase_id } => {
            match state.activity.run_mut(&run_id) {
                Some(run) => {
                    run.toggle_collapsed(&phase_id);
                    vec![PanelEffect::RequestFrame]
                }
                None => Vec::new(),
            }
        }
        UserAction::CollapseAllPhases { run_id } => set_all_collapsed(state, &run_id, true),
        UserAction::ExpandAllPhases { run_id } => set_all_collapsed(state, &run_id, false),
        UserAction::SelectRun(run_id) => {
            if state.activity.run(&run_id).is_none() {
                return Vec::new();
            }
            state.activity.active_run_id = Some(run_id);
            vec![PanelEffect::RequestFrame]
        }
        UserAction::OpenFile { path } => {
            vec![PanelEffect::Post(OutboundMessage::OpenFile { path })]
        }
        UserAction::ReviewDiff { path } => {
            vec![PanelEffect::Post(OutboundMessage::ReviewDiff { path })]
        }
        UserAction::CopyLastMessage => {
            let text = state
                .chat
                .last_assistant_text()
                .filter(|text| !text.is_empty())
                .map(str::to_string);
            if let Some(text) = text {
                return vec![PanelEffect::CopyToClipboard(text)];
            }
            state.log(LogEntry::new(
                LogLevel::Info,
                LogSource::Chat,
                "no assistant message to copy",
            ));
            vec![PanelEffect::RequestFrame]
        }
        UserAction::ClearChat => {
            state.chat.clear();
            vec![PanelEffect::RequestFrame]
        }
        UserAction::ClearLogs => {
            state.logs.clear();
            vec![PanelEffect::RequestFrame]
        }
        UserAction::NextFocus => {
            state.focus = state.focus.next();
            vec![PanelEffect::RequestFrame]
        }
        UserAction::PrevFocus => {
            state.focus = state.focus.prev();
            vec![PanelEffect::RequestFrame]
        }
        UserAction::SetFocus(focus) => {
            state.focus = focus;
            vec![PanelEffect::RequestFrame]
        }
        UserAction::SetTheme(theme) => {
            state.settings.theme = theme;
            vec![PanelEffect::RequestFrame]
        }
        UserAction::CycleTheme => {
            state.settings.theme = state.settings.theme.next();
            vec![PanelEffect::RequestFrame]
        }
        UserAction::RunMenuCommand(command) => command_to_effects(state, command),
        UserAction::Quit => vec![PanelEffect::Quit],
    }
}

fn command_to_effects(state: &mut PanelState, command: MenuCommand) -> Vec<PanelEffect> {
    let active_run_id = state.activity.active_run().map(|run| run.id.clone());
    let action = match command {
        MenuCommand::ApproveCurrent => UserAction::ApproveCurrent,
        MenuCommand::RejectPlan => UserAction::RejectPlan,
        MenuCommand::CollapseAllPhases => match active_run_id {
            Some(run_id) => UserAction::CollapseAllPhases { run_id },
            None => return Vec::new(),
        },
        MenuCommand::ExpandAllPhases => match active_run_id {
            Some(run_id) => UserAction::ExpandAllPhases { run_id },
            None => return Vec::new(),
        },
        MenuCommand::CopyLastMessage => UserAction::CopyLastMessage,
        MenuCommand::ClearChat => UserAction::ClearChat,
        MenuCommand::ClearLogs => UserAction::ClearLogs,
        MenuCommand::Focus(focus) => UserAction::SetFocus(focus),
        MenuCommand::SetTheme(theme) => UserAction::SetTheme(theme),
        MenuCommand::Quit => UserAction::Quit,
    };
    reduce_user(state, action)
}

fn reduce_tick(state: &mut PanelState, now_ms: u64) -> Vec<PanelEffect> {
    state.clock_ms = state.clock_ms.max(now_ms);
    let Some(timeout_ms) = state.settings.approval_timeout_ms else {
        return Vec::new();
    };
    if !state.approval.expire_in_flight(state.clock_ms, timeout_ms) {
        return Vec::new();
    }
    let plan_id = state
        .approval
        .active()
        .map(|active| active.plan_id().to_string())
        .unwrap_or_default();
    state.log(
        LogEntry::new(
            LogLevel::Warn,
            LogSource::Approval,
            format!("no acknowledgement after {timeout_ms}ms, action can be retried"),
        )
        .with_context(plan_id),
    );
    vec![PanelEffect::RequestFrame]
}

fn append_activity(state: &mut PanelState, run_id: RunId, event: ActivityEvent) {
    let collapse_finished = state.settings.collapse_finished_phases;
    let (run, created) = state.activity.run_entry(&run_id);
    let late = run.status == RunStatus::Done;
    if collapse_finished {
        if let ActivityEvent::PhaseEnd { phase_id } = &event {
            run.collapsed_phase_ids.insert(phase_id.clone());
        }
    }
    run.events.push(event);

    if late {
        debug!(run_id = %run_id, "activity after run-complete");
    }
    if created {
        state.log(
            LogEntry::new(LogLevel::Info, LogSource::Activity, "run started")
                .with_run(run_id.clone()),
        );
    }
    state.activity.active_run_id = Some(run_id);
}

fn set_all_collapsed(
    state: &mut PanelState,
    run_id: &RunId,
    collapsed: bool,
) -> Vec<PanelEffect> {
    let Some(run) = state.activity.run_mut(run_id) else {
        return Vec::new();
    };
    if collapsed {
        let ids: Vec<String> = derive_groups(&run.events)
            .into_iter()
            .map(|group| group.id)
            .collect();
        run.collapsed_phase_ids.extend(ids);
    } else {
        run.collapsed_phase_ids.clear();
    }
    vec![PanelEffect::RequestFrame]
}

fn note_stream_outcome(state: &mut PanelState, outcome: StreamOutcome, kind: &str, id: &str) {
    match outcome {
        StreamOutcome::Applied => {}
        StreamOutcome::Healed => {
            debug!(message_id = id, kind, "stream self-healed");
            state.log(
                LogEntry::new(
                    LogLevel::Debug,
                    LogSource::Chat,
                    format!("{kind} recovered a missing bubble"),
                )
                .with_context(id.to_string()),
            );
        }
        StreamOutcome::Ignored => {
            debug!(message_id = id, kind, "stream message did not match active stream");
            state.log(
                LogEntry::new(LogLevel::Debug, LogSource::Chat, format!("{kind} ignored"))
                    .with_context(id.to_string()),
            );
        }
    }
}

/// Returns whether the acknowledgement changed anything worth redrawing.
fn note_ack_outcome(
    state: &mut PanelState,
    outcome: AckOutcome,
    kind: &str,
    plan_id: &str,
) -> bool {
    match outcome {
        AckOutcome::Applied => true,
        AckOutcome::Duplicate => {
            debug!(plan_id, kind, "duplicate acknowledgement");
            false
        }
        AckOutcome::Ignored => {
            debug!(plan_id, kind, "acknowledgement for inactive plan");
            state.log(
                LogEntry::new(LogLevel::Debug, LogSource::Approval, format!("{kind} ignored"))
                    .with_context(plan_id.to_string()),
            );
            false
        }
    }
}

fn frame_if(changed: bool) -> Vec<PanelEffect> {
    if changed {
        vec![PanelEffect::RequestFrame]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests;
