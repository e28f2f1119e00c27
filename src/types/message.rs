use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound frame kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMessageType {
    Subscribe,
    Unsubscribe,
    Fetch,
}

/// Inbound frame kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerMessageType {
    Data,
    Update,
    Disconnect,
}

/// Outbound frame: a subscribe, unsubscribe or fetch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub r#type: ClientMessageType,
    pub channel: String,
    #[serde(default)]
    pub data: Value,
}

impl ClientMessage {
    pub fn new(r#type: ClientMessageType, channel: impl Into<String>, data: Value) -> Self {
        Self {
            r#type,
            channel: channel.into(),
            data,
        }
    }
}

/// Inbound frame payload. `response` is a validated JSON object carrying a
/// boolean `success` plus arbitrary server-supplied fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerPayload {
    pub code: i64,
    pub response: Value,
}

/// Inbound frame: a data reply, an update push, or a disconnect notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub r#type: ServerMessageType,
    pub channel: String,
    pub data: ServerPayload,
}

impl ServerMessage {
    pub fn success(&self) -> bool {
        self.data
            .response
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Server-supplied error name, when the response carries one.
    pub fn error_name(&self) -> Option<&str> {
        self.data.response.get("error").and_then(Value::as_str)
    }

    /// Orthogonal error classification over any message type.
    pub fn is_error(&self) -> bool {
        !self.success() || self.data.code >= 400
    }

    pub fn is_disconnect(&self) -> bool {
        self.r#type == ServerMessageType::Disconnect
    }

    pub fn is_data(&self) -> bool {
        self.r#type == ServerMessageType::Data
    }

    pub fn is_update(&self) -> bool {
        self.r#type == ServerMessageType::Update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(code: i64, response: Value) -> ServerMessage {
        ServerMessage {
            r#type: ServerMessageType::Data,
            channel: "messages".to_string(),
            data: ServerPayload { code, response },
        }
    }

    #[test]
    fn test_client_message_wire_shape() {
        let msg = ClientMessage::new(
            ClientMessageType::Fetch,
            "messages",
            json!({"mailboxId": "inbox123"}),
        );
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["type"], "fetch");
        assert_eq!(wire["channel"], "messages");
        assert_eq!(wire["data"]["mailboxId"], "inbox123");
    }

    #[test]
    fn test_server_message_round_trip() {
        let msg = message(200, json!({"success": true, "items": [1, 2, 3]}));
        let serialized = serde_json::to_string(&msg).unwrap();
        let deserialized: ServerMessage = serde_json::from_str(&serialized).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_success_accessor() {
        assert!(message(200, json!({"success": true})).success());
        assert!(!message(200, json!({"success": false})).success());
    }

    #[test]
    fn test_error_classification() {
        assert!(!message(200, json!({"success": true})).is_error());
        assert!(message(200, json!({"success": false})).is_error());
        assert!(message(404, json!({"success": true})).is_error());
        assert!(message(500, json!({"success": false, "error": "internal"})).is_error());
    }

    #[test]
    fn test_error_name() {
        let msg = message(403, json!({"success": false, "error": "forbidden"}));
        assert_eq!(msg.error_name(), Some("forbidden"));
        assert_eq!(message(200, json!({"success": true})).error_name(), None);
    }

    #[test]
    fn test_type_predicates() {
        let mut msg = message(200, json!({"success": true}));
        assert!(msg.is_data());
        msg.r#type = ServerMessageType::Update;
        assert!(msg.is_update());
        msg.r#type = ServerMessageType::Disconnect;
        assert!(msg.is_disconnect());
    }
}
