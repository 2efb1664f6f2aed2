use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;

use crate::events::MessageId;

/// Number of finished message ids a surface remembers for stray-delta suppression.
pub const ENDED_STREAM_WINDOW: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    #[default]
    Assistant,
    System,
}

impl ChatRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "you",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub message_id: Option<MessageId>,
    pub text: String,
    pub streaming: bool,
}

/// Position of a bubble in the surface transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleRef(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingMessage {
    pub message_id: MessageId,
    pub accumulated_text: String,
    pub bubble: Option<BubbleRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Applied,
    /// Applied after synthesizing a bubble the stream did not announce.
    Healed,
    Ignored,
}

impl StreamOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// One chat surface: transcript plus the single in-progress stream.
#[derive(Debug, Clone, Default)]
pub struct ChatSurface {
    transcript: Vec<ChatMessage>,
    streaming: Option<StreamingMessage>,
    ended: VecDeque<MessageId>,
    /// Set once any stream has ended or been superseded; unannounced deltas are ignored after that.
    stream_closed: bool,
    thinking: bool,
}

impl ChatSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn streaming(&self) -> Option<&StreamingMessage> {
        self.streaming.as_ref()
    }

    pub fn streaming_id(&self) -> Option<&MessageId> {
        self.streaming.as_ref().map(|stream| &stream.message_id)
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    pub fn bubble(&self, bubble: BubbleRef) -> Option<&ChatMessage> {
        self.transcript.get(bubble.0)
    }

    pub fn last_assistant_text(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::Assistant && !message.text.is_empty())
            .map(|message| message.text.as_str())
    }

    /// Records a prompt the user sent and raises the thinking indicator.
    pub fn push_user_message(&mut self, text: String) {
        self.transcript.push(ChatMessage {
            role: ChatRole::User,
            message_id: None,
            text,
            streaming: false,
        });
        self.thinking = true;
    }

    pub fn stream_start(&mut self, message_id: MessageId) -> StreamOutcome {
        self.release_bubble();
        if let Some(previous) = self.streaming.take() {
            if previous.message_id != message_id {
                self.close_stream(previous.message_id);
            }
        }
        self.ended.retain(|id| *id != message_id);
        let bubble = self.push_bubble(message_id.clone());
        self.streaming = Some(StreamingMessage {
            message_id,
            accumulated_text: String::new(),
            bubble: Some(bubble),
        });
        self.thinking = false;
        StreamOutcome::Applied
    }

    pub fn stream_delta(&mut self, message_id: &MessageId, chunk: &str) -> StreamOutcome {
        let mut outcome = StreamOutcome::Applied;
        let active_matches = self
            .streaming
            .as_ref()
            .map(|stream| stream.message_id == *message_id);
        match active_matches {
            Some(true) => {}
            Some(false) => return StreamOutcome::Ignored,
            None => {
                if self.stream_closed || self.ended.contains(message_id) {
                    return StreamOutcome::Ignored;
                }
                self.streaming = Some(StreamingMessage {
                    message_id: message_id.clone(),
                    accumulated_text: String::new(),
                    bubble: None,
                });
                self.thinking = false;
            }
        }

        let needs_bubble = self
            .streaming
            .as_ref()
            .is_some_and(|stream| stream.bubble.is_none());
        if needs_bubble {
            let bubble = self.push_bubble(message_id.clone());
            if let Some(stream) = self.streaming.as_mut() {
                stream.bubble = Some(bubble);
            }
            outcome = StreamOutcome::Healed;
        }

        let Some(stream) = self.streaming.as_mut() else {
            return StreamOutcome::Ignored;
        };
        stream.accumulated_text.push_str(chunk);
        if let Some(bubble) = stream.bubble {
            if let Some(message) = self.transcript.get_mut(bubble.0) {
                message.text = stream.accumulated_text.clone();
            }
        }
        outcome
    }

    pub fn stream_end(&mut self, message_id: &MessageId) -> StreamOutcome {
        let matches = self
            .streaming
            .as_ref()
            .is_some_and(|stream| stream.message_id == *message_id);
        if !matches {
            return StreamOutcome::Ignored;
        }
        self.release_bubble();
        self.streaming = None;
        self.close_stream(message_id.clone());
        StreamOutcome::Applied
    }

    /// Renders a complete message, superseding whatever stream is in progress.
    ///
    /// A partial bubble left by the stream, or an earlier bubble with the same
    /// message id, is overwritten in place instead of leaving a duplicate. The
    /// partial bubble wins, and it takes the final message's id (or none).
    pub fn final_message(
        &mut self,
        role: ChatRole,
        message_id: Option<MessageId>,
        text: String,
    ) -> BubbleRef {
        let partial = self.streaming.take().and_then(|stream| {
            self.close_stream(stream.message_id);
            stream.bubble
        });
        self.thinking = false;

        let existing = message_id.as_ref().and_then(|id| {
            self.transcript
                .iter()
                .rposition(|message| message.message_id.as_ref() == Some(id))
                .map(BubbleRef)
        });
        if let Some(id) = message_id.as_ref() {
            self.remember_ended(id.clone());
        }

        let message = ChatMessage {
            role,
            message_id,
            text,
            streaming: false,
        };
        match partial.or(existing) {
            Some(bubble) if bubble.0 < self.transcript.len() => {
                self.transcript[bubble.0] = message;
                bubble
            }
            _ => {
                self.transcript.push(message);
                BubbleRef(self.transcript.len() - 1)
            }
        }
    }

    /// Empties the transcript. An in-progress stream keeps its id and text and
    /// gets a fresh bubble on its next delta.
    pub fn clear(&mut self) {
        self.transcript.clear();
        if let Some(stream) = self.streaming.as_mut() {
            stream.bubble = None;
        }
    }

    fn push_bubble(&mut self, message_id: MessageId) -> BubbleRef {
        self.transcript.push(ChatMessage {
            role: ChatRole::Assistant,
            message_id: Some(message_id),
            text: String::new(),
            streaming: true,
        });
        BubbleRef(self.transcript.len() - 1)
    }

    fn release_bubble(&mut self) {
        let bubble = self.streaming.as_ref().and_then(|stream| stream.bubble);
        if let Some(bubble) = bubble {
            if let Some(message) = self.transcript.get_mut(bubble.0) {
                message.streaming = false;
            }
        }
    }

    fn close_stream(&mut self, message_id: MessageId) {
        self.stream_closed = true;
        self.remember_ended(message_id);
    }

    fn remember_ended(&mut self, message_id: MessageId) {
        if self.ended.contains(&message_id) {
            return;
        }
        if self.ended.len() == ENDED_STREAM_WINDOW {
            self.ended.pop_front();
        }
        self.ended.push_back(message_id);
    }
}
