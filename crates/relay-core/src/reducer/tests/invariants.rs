use super::*;
use pretty_assertions::assert_eq;

fn assert_plan_invariants(state: &PanelState) {
    let Some(active) = state.approval.active() else {
        return;
    };
    let action_count = active.plan.actions.len();
    assert!(active
        .completed_action_indices
        .iter()
        .all(|idx| *idx < action_count));
    if active.in_flight {
        assert!(active.last_requested_index.is_some());
        assert!(!active.rejected);
    }
}

#[test]
fn noisy_acknowledgements_keep_plan_consistent() {
    let mut state = state();
    agent(
        &mut state,
        InboundMessage::PlanProposed {
            plan: three_step_plan("p1"),
        },
    );

    let script: Vec<PanelAction> = vec![
        PanelAction::User(UserAction::ApproveCurrent),
        PanelAction::User(UserAction::ApproveCurrent),
        PanelAction::Agent(InboundMessage::ExecutionComplete {
            plan_id: PlanId::from("p1"),
            approved_action_indices: Some(vec![0, 42]),
        }),
        PanelAction::Agent(InboundMessage::ExecutionComplete {
            plan_id: PlanId::from("p1"),
            approved_action_indices: Some(vec![0]),
        }),
        PanelAction::Agent(InboundMessage::ExecutionError {
            plan_id: PlanId::from("old"),
            error: "stale".to_string(),
        }),
        PanelAction::User(UserAction::ApproveCurrent),
        PanelAction::Agent(InboundMessage::ExecutionError {
            plan_id: PlanId::from("p1"),
            error: "flaky".to_string(),
        }),
        PanelAction::Agent(InboundMessage::ExecutionError {
            plan_id: PlanId::from("p1"),
            error: "flaky".to_string(),
        }),
        PanelAction::User(UserAction::ApproveCurrent),
        PanelAction::Agent(InboundMessage::ExecutionComplete {
            plan_id: PlanId::from("p1"),
            approved_action_indices: None,
        }),
    ];

    let mut requests = Vec::new();
    for action in script {
        let effects = reduce(&mut state, action);
        requests.extend(posted(&effects));
        assert_plan_invariants(&state);
    }

    let indices: Vec<Vec<usize>> = requests
        .into_iter()
        .filter_map(|message| match message {
            OutboundMessage::ApproveAction { action_indices, .. } => Some(action_indices),
            _ => None,
        })
        .collect();
    assert_eq!(indices, vec![vec![0], vec![1], vec![1]]);
    assert_eq!(state.approval.current_action(), Some(2));
}

#[test]
fn at_most_one_request_outstanding() {
    let mut state = state();
    agent(
        &mut state,
        InboundMessage::PlanProposed {
            plan: three_step_plan("p1"),
        },
    );

    let mut outstanding = 0usize;
    for round in 0..6 {
        let sent = posted(&user(&mut state, UserAction::ApproveCurrent)).len();
        outstanding += sent;
        assert!(outstanding <= 1, "round {round}: {outstanding} outstanding");
        if round % 2 == 1 && outstanding == 1 {
            agent(
                &mut state,
                InboundMessage::ExecutionComplete {
                    plan_id: PlanId::from("p1"),
                    approved_action_indices: None,
                },
            );
            outstanding = 0;
        }
    }
    assert_eq!(state.approval.current_action(), None);
}

#[test]
fn phase_groups_rederive_identically_from_run_history() {
    let mut state = state();
    for event in [
        analysis("warmup"),
        phase_start("p1", "Explore"),
        analysis("read"),
        phase_end("nope"),
        analysis("after"),
    ] {
        agent(&mut state, activity("r1", event));
    }

    let run = state.activity.active_run().expect("run");
    let first = derive_groups(&run.events);
    let second = derive_groups(&run.events);
    assert_eq!(first, second);
    assert_eq!(first.iter().filter(|group| group.is_implicit).count(), 1);
}

#[test]
fn focus_cycles_through_every_pane() {
    let mut state = state();
    let mut seen = vec![state.focus];
    for _ in 0..4 {
        user(&mut state, UserAction::NextFocus);
        seen.push(state.focus);
    }
    assert_eq!(
        seen,
        vec![
            PanelFocus::Activity,
            PanelFocus::Chat,
            PanelFocus::Plan,
            PanelFocus::Logs,
            PanelFocus::Activity
        ]
    );
    user(&mut state, UserAction::PrevFocus);
    assert_eq!(state.focus, PanelFocus::Logs);
}

#[test]
fn quit_is_only_an_effect() {
    let mut state = state();
    let effects = user(&mut state, UserAction::RunMenuCommand(MenuCommand::Quit));
    assert_eq!(effects, vec![PanelEffect::Quit]);
}
