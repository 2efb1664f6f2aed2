use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record has no string `type` tag")]
    MissingType,
    #[error("`{kind}` record is missing `{field}`")]
    MissingField { kind: String, field: &'static str },
    #[error("malformed `{kind}` record: {reason}")]
    Malformed { kind: String, reason: String },
}

impl ChannelError {
    /// Decode failures affect a single record; io failures end the stream.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
