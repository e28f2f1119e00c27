use serde_json::{json, Value};

use crate::socket::WireFrame;
use crate::types::{
    ClientMessage, ClientMessageType, MailboxError, Result, ServerMessage, ServerMessageType,
    ServerPayload,
};

/// Builds a subscribe request for `channel`.
pub fn subscribe(channel: &str, data: Value) -> ClientMessage {
    ClientMessage::new(ClientMessageType::Subscribe, channel, data)
}

/// Builds an unsubscribe request for `channel`. Parameters are optional and
/// default to an empty object.
pub fn unsubscribe(channel: &str, data: Option<Value>) -> ClientMessage {
    ClientMessage::new(
        ClientMessageType::Unsubscribe,
        channel,
        data.unwrap_or_else(|| json!({})),
    )
}

/// Builds a paginated fetch request for `channel`.
pub fn fetch(channel: &str, data: Value) -> ClientMessage {
    ClientMessage::new(ClientMessageType::Fetch, channel, data)
}

/// Renders an outbound message to its wire text form.
pub fn serialize(message: &ClientMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Renders a validated inbound message back to wire text.
pub fn serialize_server(message: &ServerMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Parses and validates one inbound frame.
///
/// Text frames and binary frames carrying UTF-8 text are accepted; any other
/// representation is rejected with [`MailboxError::UnsupportedFrame`].
/// Malformed JSON fails with [`MailboxError::Decode`]; well-formed JSON with
/// missing or mistyped required fields fails with
/// [`MailboxError::Validation`].
pub fn parse(frame: &WireFrame) -> Result<ServerMessage> {
    let text: &str = match frame {
        WireFrame::Text(text) => text,
        WireFrame::Binary(bytes) => std::str::from_utf8(bytes)
            .map_err(|e| MailboxError::Decode(format!("binary frame is not UTF-8 text: {}", e)))?,
        WireFrame::Other(kind) => return Err(MailboxError::UnsupportedFrame(kind)),
    };

    let value: Value =
        serde_json::from_str(text).map_err(|e| MailboxError::Decode(e.to_string()))?;
    validate(value)
}

fn validate(value: Value) -> Result<ServerMessage> {
    let obj = value
        .as_object()
        .ok_or_else(|| MailboxError::Validation("frame must be a JSON object".to_string()))?;

    let r#type = match obj.get("type").and_then(Value::as_str) {
        Some("data") => ServerMessageType::Data,
        Some("update") => ServerMessageType::Update,
        Some("disconnect") => ServerMessageType::Disconnect,
        Some(other) => {
            return Err(MailboxError::Validation(format!(
                "unknown message type '{}'",
                other
            )))
        }
        None => {
            return Err(MailboxError::Validation(
                "missing or non-string field 'type'".to_string(),
            ))
        }
    };

    let channel = obj
        .get("channel")
        .and_then(Value::as_str)
        .ok_or_else(|| MailboxError::Validation("missing or non-string field 'channel'".to_string()))?
        .to_string();

    let data = obj
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| MailboxError::Validation("missing or non-object field 'data'".to_string()))?;

    let code = data
        .get("code")
        .and_then(Value::as_i64)
        .ok_or_else(|| MailboxError::Validation("field 'data.code' must be numeric".to_string()))?;

    let response = data
        .get("response")
        .filter(|v| v.is_object())
        .ok_or_else(|| {
            MailboxError::Validation("missing or non-object field 'data.response'".to_string())
        })?;

    if !response
        .get("success")
        .map(Value::is_boolean)
        .unwrap_or(false)
    {
        return Err(MailboxError::Validation(
            "field 'data.response.success' must be a boolean".to_string(),
        ));
    }

    Ok(ServerMessage {
        r#type,
        channel,
        data: ServerPayload {
            code,
            response: response.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(value: Value) -> WireFrame {
        WireFrame::Text(value.to_string())
    }

    #[test]
    fn test_subscribe_builder() {
        let msg = subscribe("mailboxes", json!({"userId": "u1", "token": "t1"}));
        assert_eq!(msg.r#type, ClientMessageType::Subscribe);
        assert_eq!(msg.channel, "mailboxes");
        assert_eq!(msg.data["userId"], "u1");
    }

    #[test]
    fn test_unsubscribe_builder_defaults_to_empty_object() {
        let msg = unsubscribe("filters", None);
        assert_eq!(msg.r#type, ClientMessageType::Unsubscribe);
        assert_eq!(msg.data, json!({}));
    }

    #[test]
    fn test_fetch_builder() {
        let msg = fetch("messages", json!({"mailboxId": "inbox123", "cursor": "p2"}));
        assert_eq!(msg.r#type, ClientMessageType::Fetch);
        assert_eq!(msg.data["cursor"], "p2");
    }

    #[test]
    fn test_parse_valid_data_frame() {
        let msg = parse(&wire(json!({
            "type": "data",
            "channel": "messages",
            "data": {"code": 200, "response": {"success": true, "items": []}}
        })))
        .unwrap();
        assert_eq!(msg.r#type, ServerMessageType::Data);
        assert_eq!(msg.channel, "messages");
        assert_eq!(msg.data.code, 200);
        assert!(msg.success());
    }

    #[test]
    fn test_parse_binary_utf8_frame() {
        let text = json!({
            "type": "update",
            "channel": "mailboxes",
            "data": {"code": 200, "response": {"success": true}}
        })
        .to_string();
        let msg = parse(&WireFrame::Binary(text.into_bytes())).unwrap();
        assert_eq!(msg.r#type, ServerMessageType::Update);
    }

    #[test]
    fn test_parse_rejects_unsupported_representation() {
        let err = parse(&WireFrame::Other("raw frame")).unwrap_err();
        assert!(matches!(err, MailboxError::UnsupportedFrame(_)));
    }

    #[test]
    fn test_parse_non_json_is_decode_error() {
        let err = parse(&WireFrame::Text("not json at all".to_string())).unwrap_err();
        assert!(matches!(err, MailboxError::Decode(_)));
    }

    #[test]
    fn test_parse_invalid_utf8_binary_is_decode_error() {
        let err = parse(&WireFrame::Binary(vec![0xff, 0xfe, 0xfd])).unwrap_err();
        assert!(matches!(err, MailboxError::Decode(_)));
    }

    #[test]
    fn test_missing_success_is_validation_not_decode() {
        let err = parse(&wire(json!({
            "type": "data",
            "channel": "settings",
            "data": {"code": 200, "response": {}}
        })))
        .unwrap_err();
        assert!(matches!(err, MailboxError::Validation(_)));
    }

    #[test]
    fn test_unknown_type_is_validation_error() {
        let err = parse(&wire(json!({
            "type": "subscribe",
            "channel": "settings",
            "data": {"code": 200, "response": {"success": true}}
        })))
        .unwrap_err();
        assert!(matches!(err, MailboxError::Validation(_)));
    }

    #[test]
    fn test_missing_channel_is_validation_error() {
        let err = parse(&wire(json!({
            "type": "data",
            "data": {"code": 200, "response": {"success": true}}
        })))
        .unwrap_err();
        assert!(matches!(err, MailboxError::Validation(_)));
    }

    #[test]
    fn test_non_numeric_code_is_validation_error() {
        let err = parse(&wire(json!({
            "type": "data",
            "channel": "settings",
            "data": {"code": "200", "response": {"success": true}}
        })))
        .unwrap_err();
        assert!(matches!(err, MailboxError::Validation(_)));
    }

    #[test]
    fn test_non_boolean_success_is_validation_error() {
        let err = parse(&wire(json!({
            "type": "data",
            "channel": "settings",
            "data": {"code": 200, "response": {"success": "yes"}}
        })))
        .unwrap_err();
        assert!(matches!(err, MailboxError::Validation(_)));
    }

    #[test]
    fn test_round_trip_stability() {
        let original = ServerMessage {
            r#type: ServerMessageType::Data,
            channel: "mailboxes".to_string(),
            data: ServerPayload {
                code: 200,
                response: json!({"success": true, "mailboxes": ["inbox", "sent"]}),
            },
        };
        let first = serialize_server(&original).unwrap();
        let reparsed = parse(&WireFrame::Text(first.clone())).unwrap();
        let second = serialize_server(&reparsed).unwrap();
        assert_eq!(first, second);
    }
}
