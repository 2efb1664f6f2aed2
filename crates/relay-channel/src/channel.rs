use std::collections::VecDeque;
use std::io::BufRead;
use std::io::Write;

use tracing::warn;

use relay_core::protocol::InboundMessage;
use relay_core::protocol::OutboundMessage;

use crate::codec::decode_inbound;
use crate::codec::encode_outbound;
use crate::error::ChannelError;

/// Source of agent records.
pub trait Inbox {
    /// Next decoded record, or `None` when nothing more is available right now.
    fn recv(&mut self) -> Result<Option<InboundMessage>, ChannelError>;

    /// Decodes a record held back because its writer has not finished it yet.
    /// Call once the writer is known to be done.
    fn flush_pending(&mut self) -> Option<InboundMessage> {
        None
    }
}

/// Sink for panel requests.
pub trait Outbox {
    fn post(&mut self, message: &OutboundMessage) -> Result<(), ChannelError>;
}

/// Reads newline-delimited JSON records. Undecodable lines are logged and skipped.
///
/// A trailing line without its newline is held back until the rest arrives, so a
/// file that is still being appended to can be tailed by calling `recv` again.
pub struct JsonLinesInbox<R> {
    reader: R,
    pending: String,
    line_no: usize,
    skipped: usize,
}

impl<R: BufRead> JsonLinesInbox<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: String::new(),
            line_no: 0,
            skipped: 0,
        }
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, line: &str) -> Option<InboundMessage> {
        match decode_inbound(line) {
            Ok(message) => message,
            Err(err) => {
                self.skipped += 1;
                warn!(line = self.line_no, error = %err, "skipping inbound record");
                None
            }
        }
    }
}

impl<R: BufRead> Inbox for JsonLinesInbox<R> {
    fn recv(&mut self) -> Result<Option<InboundMessage>, ChannelError> {
        loop {
            let read = self.reader.read_line(&mut self.pending)?;
            if read == 0 {
                return Ok(None);
            }
            if !self.pending.ends_with('\n') {
                continue;
            }
            let line = std::mem::take(&mut self.pending);
            self.line_no += 1;
            if let Some(message) = self.decode_line(&line) {
                return Ok(Some(message));
            }
        }
    }

    fn flush_pending(&mut self) -> Option<InboundMessage> {
        if self.pending.trim().is_empty() {
            self.pending.clear();
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        self.line_no += 1;
        self.decode_line(&line)
    }
}

/// Writes each request as one JSON line and flushes immediately.
pub struct JsonLinesOutbox<W> {
    writer: W,
}

impl<W: Write> JsonLinesOutbox<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Outbox for JsonLinesOutbox<W> {
    fn post(&mut self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let line = encode_outbound(message)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory channel: records queued by the test play the agent, posts are kept for inspection.
#[derive(Debug, Default)]
pub struct Loopback {
    inbound: VecDeque<InboundMessage>,
    posted: Vec<OutboundMessage>,
}

impl Loopback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: InboundMessage) {
        self.inbound.push_back(message);
    }

    pub fn posted(&self) -> &[OutboundMessage] {
        &self.posted
    }

    pub fn take_posted(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.posted)
    }
}

impl Inbox for Loopback {
    fn recv(&mut self) -> Result<Option<InboundMessage>, ChannelError> {
        Ok(self.inbound.pop_front())
    }
}

impl Outbox for Loopback {
    fn post(&mut self, message: &OutboundMessage) -> Result<(), ChannelError> {
        self.posted.push(message.clone());
        Ok(())
    }
}

impl Outbox for Vec<OutboundMessage> {
    fn post(&mut self, message: &OutboundMessage) -> Result<(), ChannelError> {
        self.push(message.clone());
        Ok(())
    }
}
