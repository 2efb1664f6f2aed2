use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use tracing::info;
use tracing::warn;

use relay_channel::Inbox;
use relay_channel::JsonLinesInbox;
use relay_channel::Outbox;
use relay_core::actions::PanelAction;
use relay_core::actions::UserAction;
use relay_core::approval::PlanPhase;
use relay_core::protocol::OutboundMessage;
use relay_core::reducer::reduce;
use relay_core::reducer::PanelEffect;
use relay_core::state::PanelState;
use relay_core::view::render_text;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub records: usize,
    pub posted: Vec<OutboundMessage>,
    /// Phase of a plan that was still waiting on the user or the agent when the inbox ran out.
    pub open_plan: Option<PlanPhase>,
}

/// Feeds every inbox record through the reducer and forwards posts to `outbox`.
/// A trailing record without its newline is flushed and handled like the rest.
///
/// With `auto_approve`, the current action is approved whenever the plan is ready
/// and has no recorded failure, standing in for a user who accepts everything.
pub fn drive<I, O>(
    state: &mut PanelState,
    inbox: &mut I,
    outbox: &mut O,
    auto_approve: bool,
    now_ms: impl Fn() -> u64,
) -> anyhow::Result<ReplaySummary>
where
    I: Inbox,
    O: Outbox,
{
    let mut summary = ReplaySummary::default();
    loop {
        let message = match inbox.recv()? {
            Some(message) => message,
            None => match inbox.flush_pending() {
                Some(message) => message,
                None => break,
            },
        };
        summary.records += 1;
        reduce(state, PanelAction::Tick { now_ms: now_ms() });
        let mut effects = reduce(state, PanelAction::Agent(message));
        if auto_approve && ready_without_error(state) {
            effects.extend(reduce(state, PanelAction::User(UserAction::ApproveCurrent)));
        }
        for effect in effects {
            if let PanelEffect::Post(message) = effect {
                outbox.post(&message)?;
                summary.posted.push(message);
            }
        }
    }
    summary.open_plan = state.approval.phase().filter(|phase| !phase.is_terminal());
    Ok(summary)
}

fn ready_without_error(state: &PanelState) -> bool {
    let Some(active) = state.approval.active() else {
        return false;
    };
    matches!(active.phase(), PlanPhase::Ready(_)) && active.execution_error.is_none()
}

pub fn run_replay(
    inbox_path: &Path,
    mut state: PanelState,
    auto_approve: bool,
) -> anyhow::Result<()> {
    let file = File::open(inbox_path)
        .with_context(|| format!("cannot open inbox {}", inbox_path.display()))?;
    let mut inbox = JsonLinesInbox::new(BufReader::new(file));
    let mut posted: Vec<OutboundMessage> = Vec::new();

    let summary = drive(&mut state, &mut inbox, &mut posted, auto_approve, || {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    })?;
    if inbox.skipped() > 0 {
        warn!(skipped = inbox.skipped(), "some inbox records could not be decoded");
    }
    if let Some(phase) = summary.open_plan {
        info!(phase = phase.label(), "plan still open at end of inbox");
    }
    info!(records = summary.records, posted = posted.len(), "replay finished");

    print!("{}", render_text(&state));
    if !posted.is_empty() {
        println!("== outbound");
        for message in &posted {
            println!("  {}", relay_channel::encode_outbound(message)?);
        }
    }
    if let Some(phase) = summary.open_plan {
        println!("(plan still open: {})", phase.label());
    }
    if inbox.skipped() > 0 {
        println!("({} undecodable records skipped)", inbox.skipped());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use std::io::Cursor;

    use super::*;
    use relay_channel::Loopback;
    use relay_core::events::ActionKind;
    use relay_core::events::ApprovalPlan;
    use relay_core::events::PlanAction;
    use relay_core::events::PlanId;
    use relay_core::events::RiskLevel;
    use relay_core::protocol::InboundMessage;

    fn plan() -> ApprovalPlan {
        ApprovalPlan {
            plan_id: PlanId::from("p1"),
            message: String::new(),
            actions: [RiskLevel::Low, RiskLevel::High]
                .into_iter()
                .map(|risk| PlanAction {
                    kind: ActionKind::RunCommand,
                    path: None,
                    command: Some("cargo fmt".to_string()),
                    risk,
                    warnings: Vec::new(),
                    preview: None,
                })
                .collect(),
        }
    }

    fn complete(index: usize) -> InboundMessage {
        InboundMessage::ExecutionComplete {
            plan_id: PlanId::from("p1"),
            approved_action_indices: Some(vec![index]),
        }
    }

    #[test]
    fn auto_approve_walks_the_plan_in_order() {
        let mut channel = Loopback::new();
        channel.push(InboundMessage::PlanProposed { plan: plan() });
        channel.push(complete(0));
        channel.push(complete(1));
        let mut posted = Vec::new();
        let mut state = PanelState::default();

        let summary = drive(&mut state, &mut channel, &mut posted, true, || 1).expect("drive");

        assert_eq!(summary.records, 3);
        assert_eq!(
            posted,
            vec![
                OutboundMessage::ApproveAction {
                    plan_id: PlanId::from("p1"),
                    action_indices: vec![0],
                },
                OutboundMessage::ApproveAction {
                    plan_id: PlanId::from("p1"),
                    action_indices: vec![1],
                },
            ]
        );
        assert_eq!(state.approval.phase(), Some(PlanPhase::Done));
        assert_eq!(summary.open_plan, None);
    }

    #[test]
    fn failed_action_is_not_auto_retried() {
        let mut channel = Loopback::new();
        channel.push(InboundMessage::PlanProposed { plan: plan() });
        channel.push(InboundMessage::ExecutionError {
            plan_id: PlanId::from("p1"),
            error: "denied".to_string(),
        });
        let mut state = PanelState::default();

        let mut posted: Vec<OutboundMessage> = Vec::new();

        let summary = drive(&mut state, &mut channel, &mut posted, true, || 1).expect("drive");

        assert_eq!(summary.posted.len(), 1);
        assert_eq!(state.approval.phase(), Some(PlanPhase::Ready(0)));
    }

    #[test]
    fn without_auto_approve_nothing_is_posted() {
        let mut channel = Loopback::new();
        channel.push(InboundMessage::PlanProposed { plan: plan() });
        let mut state = PanelState::default();

        let mut posted: Vec<OutboundMessage> = Vec::new();

        let summary = drive(&mut state, &mut channel, &mut posted, false, || 1).expect("drive");

        assert!(summary.posted.is_empty());
        assert_eq!(state.approval.phase(), Some(PlanPhase::Ready(0)));
        assert_eq!(summary.open_plan, Some(PlanPhase::Ready(0)));
    }

    #[test]
    fn last_record_without_newline_is_still_approved() {
        let records = concat!(
            r#"{"type":"activity","runId":"r1","event":{"type":"analysis","text":"looking"}}"#,
            "\n",
            r#"{"type":"plan-proposed","plan":{"planId":"p1","actions":[{"kind":"runCommand","command":"cargo fmt","risk":"low"}]}}"#,
        );
        let mut inbox = JsonLinesInbox::new(Cursor::new(records));
        let mut state = PanelState::default();
        let mut posted: Vec<OutboundMessage> = Vec::new();

        let summary = drive(&mut state, &mut inbox, &mut posted, true, || 1).expect("drive");

        assert_eq!(summary.records, 2);
        assert_eq!(
            posted,
            vec![OutboundMessage::ApproveAction {
                plan_id: PlanId::from("p1"),
                action_indices: vec![0],
            }]
        );
        assert_eq!(summary.posted, posted);
        assert_eq!(summary.open_plan, Some(PlanPhase::AwaitingAck(0)));
    }
}
