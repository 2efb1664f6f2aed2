use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use relay_core::protocol::InboundMessage;
use relay_core::protocol::OutboundMessage;

use crate::error::ChannelError;

/// Decodes one JSON record sent by the agent.
///
/// Blank lines and records with an unrecognized `type` yield `Ok(None)`. A known
/// record without its correlation id is an error rather than a guess.
pub fn decode_inbound(line: &str) -> Result<Option<InboundMessage>, ChannelError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(line)?;
    let Some(record) = value.as_object() else {
        return Err(ChannelError::Malformed {
            kind: "record".to_string(),
            reason: "expected a JSON object".to_string(),
        });
    };
    let kind = record
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ChannelError::MissingType)?
        .to_string();

    if !InboundMessage::KINDS.contains(&kind.as_str()) {
        debug!(kind = %kind, "ignoring unknown inbound record");
        return Ok(None);
    }

    if let Some(field) = InboundMessage::correlation_field(&kind) {
        let present = match record.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(id)) => !id.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(ChannelError::MissingField { kind, field });
        }
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|err| ChannelError::Malformed {
            kind,
            reason: err.to_string(),
        })
}

pub fn encode_outbound(message: &OutboundMessage) -> Result<String, ChannelError> {
    encode_record(message)
}

/// Single-line JSON for any wire record.
pub fn encode_record<T: Serialize>(record: &T) -> Result<String, ChannelError> {
    Ok(serde_json::to_string(record)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use relay_core::events::MessageId;
    use relay_core::events::PlanId;

    #[test]
    fn decodes_stream_delta() {
        let message = decode_inbound(r#"{"type":"stream-delta","messageId":"m1","text":"Hel"}"#)
            .expect("decode");
        assert_eq!(
            message,
            Some(InboundMessage::StreamDelta {
                message_id: MessageId::from("m1"),
                text: "Hel".to_string(),
            })
        );
    }

    #[test]
    fn unknown_type_is_ignored() {
        let message = decode_inbound(r#"{"type":"telemetry","cpu":0.4}"#).expect("decode");
        assert_eq!(message, None);
    }

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(decode_inbound("   ").expect("decode"), None);
    }

    #[test]
    fn missing_type_is_an_error() {
        let err = decode_inbound(r#"{"planId":"p1"}"#).expect_err("missing type");
        assert!(matches!(err, ChannelError::MissingType));
    }

    #[test]
    fn missing_correlation_id_is_an_error() {
        let err = decode_inbound(r#"{"type":"execution-complete","approvedActionIndices":[0]}"#)
            .expect_err("missing plan id");
        match err {
            ChannelError::MissingField { kind, field } => {
                assert_eq!(kind, "execution-complete");
                assert_eq!(field, "planId");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_correlation_id_counts_as_missing() {
        let err = decode_inbound(r#"{"type":"stream-start","messageId":""}"#)
            .expect_err("empty id");
        assert!(matches!(err, ChannelError::MissingField { field: "messageId", .. }));
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let line = r#"{"type":"execution-complete","planId":"p1","approvedActionIndices":"all"}"#;
        let err = decode_inbound(line).expect_err("bad indices");
        assert!(matches!(err, ChannelError::Malformed { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn non_object_is_malformed() {
        let err = decode_inbound("[1,2,3]").expect_err("array");
        assert!(matches!(err, ChannelError::Malformed { .. }));
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = decode_inbound("{not json").expect_err("invalid");
        assert!(matches!(err, ChannelError::Json(_)));
    }

    #[test]
    fn outbound_encodes_on_one_line() {
        let line = encode_outbound(&OutboundMessage::RejectPlan {
            plan_id: PlanId::from("p1"),
        })
        .expect("encode");
        assert_eq!(line, r#"{"type":"reject-plan","planId":"p1"}"#);
    }
}
