//! Wire plumbing between the panel and the agent: record validation and JSON-lines transport.

pub mod channel;
pub mod codec;
pub mod error;

pub use channel::Inbox;
pub use channel::JsonLinesInbox;
pub use channel::JsonLinesOutbox;
pub use channel::Loopback;
pub use channel::Outbox;
pub use codec::decode_inbound;
pub use codec::encode_outbound;
pub use codec::encode_record;
pub use error::ChannelError;
