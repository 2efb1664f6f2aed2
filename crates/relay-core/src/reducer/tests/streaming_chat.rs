use super::*;
use pretty_assertions::assert_eq;

fn start(id: &str) -> InboundMessage {
    InboundMessage::StreamStart {
        message_id: MessageId::from(id),
    }
}

fn delta(id: &str, text: &str) -> InboundMessage {
    InboundMessage::StreamDelta {
        message_id: MessageId::from(id),
        text: text.to_string(),
    }
}

fn end(id: &str) -> InboundMessage {
    InboundMessage::StreamEnd {
        message_id: MessageId::from(id),
    }
}

fn texts(state: &PanelState) -> Vec<String> {
    state
        .chat
        .transcript()
        .iter()
        .map(|message| message.text.clone())
        .collect()
}

#[test]
fn deltas_accumulate_into_one_bubble() {
    let mut state = state();
    agent(&mut state, start("m1"));
    for chunk in ["Hel", "lo, ", "world"] {
        agent(&mut state, delta("m1", chunk));
    }
    agent(&mut state, end("m1"));

    assert_eq!(texts(&state), vec!["Hello, world".to_string()]);
    assert!(!state.chat.transcript()[0].streaming);
    assert_eq!(state.chat.streaming_id(), None);
}

#[test]
fn stray_delta_after_end_is_ignored_and_logged_at_debug() {
    let mut state = state();
    agent(&mut state, start("m1"));
    agent(&mut state, delta("m1", "done"));
    agent(&mut state, end("m1"));

    let effects = agent(&mut state, delta("m1", " again"));

    assert!(effects.is_empty());
    assert_eq!(texts(&state), vec!["done".to_string()]);
    let last = state.logs.iter().last().expect("log entry");
    assert_eq!(last.level, LogLevel::Debug);
    assert_eq!(last.source, LogSource::Chat);
    assert_eq!(last.context.as_deref(), Some("m1"));
}

#[test]
fn delta_without_start_still_renders() {
    let mut state = state();
    let effects = agent(&mut state, delta("m9", "partial"));

    assert!(matches!(effects.as_slice(), [PanelEffect::RequestFrame]));
    assert_eq!(texts(&state), vec!["partial".to_string()]);
    assert_eq!(state.chat.streaming_id(), Some(&MessageId::from("m9")));
}

#[test]
fn final_message_replaces_partial_stream() {
    let mut state = state();
    user(&mut state, UserAction::SendPrompt("hi".to_string()));
    agent(&mut state, start("m1"));
    agent(&mut state, delta("m1", "Hel"));

    agent(
        &mut state,
        InboundMessage::Message {
            text: "Hello there".to_string(),
            role: ChatRole::Assistant,
            message_id: Some(MessageId::from("m1")),
        },
    );

    assert_eq!(texts(&state), vec!["hi".to_string(), "Hello there".to_string()]);
    assert_eq!(state.chat.streaming_id(), None);
    assert!(!state.chat.is_thinking());

    let effects = agent(&mut state, delta("m1", "lo"));
    assert!(effects.is_empty());
}

#[test]
fn send_prompt_posts_and_raises_thinking() {
    let mut state = state();
    let effects = user(&mut state, UserAction::SendPrompt("  explain this  ".to_string()));

    assert_eq!(
        posted(&effects),
        vec![OutboundMessage::SendMessage {
            text: "explain this".to_string()
        }]
    );
    assert!(state.chat.is_thinking());
    assert_eq!(state.chat.transcript()[0].role, ChatRole::User);

    agent(&mut state, start("m1"));
    assert!(!state.chat.is_thinking());
}

#[test]
fn blank_prompt_is_dropped() {
    let mut state = state();
    assert!(user(&mut state, UserAction::SendPrompt("   ".to_string())).is_empty());
    assert!(state.chat.transcript().is_empty());
}

#[test]
fn copy_last_message_uses_latest_assistant_text() {
    let mut state = state();
    agent(&mut state, start("m1"));
    agent(&mut state, delta("m1", "first"));
    agent(&mut state, end("m1"));
    user(&mut state, UserAction::SendPrompt("next".to_string()));

    let effects = user(&mut state, UserAction::CopyLastMessage);
    assert_eq!(effects, vec![PanelEffect::CopyToClipboard("first".to_string())]);
}

#[test]
fn copy_with_empty_transcript_only_logs() {
    let mut state = state();
    let effects = user(&mut state, UserAction::CopyLastMessage);
    assert!(matches!(effects.as_slice(), [PanelEffect::RequestFrame]));
    assert_eq!(
        log_messages(&state),
        vec!["no assistant message to copy".to_string()]
    );
}

#[test]
fn clear_chat_mid_stream_recreates_bubble_on_next_delta() {
    let mut state = state();
    agent(&mut state, start("m1"));
    agent(&mut state, delta("m1", "Hel"));
    user(&mut state, UserAction::ClearChat);
    assert!(state.chat.transcript().is_empty());

    agent(&mut state, delta("m1", "lo"));
    assert_eq!(texts(&state), vec!["Hello".to_string()]);
}

#[test]
fn delta_for_unknown_id_after_end_appends_nowhere() {
    let mut state = state();
    agent(&mut state, start("m1"));
    agent(&mut state, delta("m1", "done"));
    agent(&mut state, end("m1"));

    let effects = agent(&mut state, delta("m2", "stray"));

    assert!(effects.is_empty());
    assert_eq!(texts(&state), vec!["done".to_string()]);
    assert_eq!(state.chat.streaming_id(), None);
    let last = state.logs.iter().last().expect("log entry");
    assert_eq!(last.level, LogLevel::Debug);
    assert_eq!(last.context.as_deref(), Some("m2"));
}

#[test]
fn late_delta_for_replaced_stream_is_ignored() {
    let mut state = state();
    agent(&mut state, start("m1"));
    agent(&mut state, delta("m1", "old"));
    agent(&mut state, start("m2"));
    agent(&mut state, delta("m2", "new"));
    agent(&mut state, end("m2"));

    let effects = agent(&mut state, delta("m1", " late"));

    assert!(effects.is_empty());
    assert_eq!(texts(&state), vec!["old".to_string(), "new".to_string()]);
}
