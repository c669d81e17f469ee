use serde::{Deserialize, Serialize};

/// Role values accepted by the chat-completions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instruction/system role.
    System,
    /// Human/user role.
    User,
    /// Assistant role.
    Assistant,
    /// Tool result role.
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// One function call requested by the model.
///
/// Serializes to the provider's `tool_calls` entry shape; `arguments`
/// stays a raw JSON string exactly as the provider sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-generated call id.
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    /// Name and argument payload of the requested function.
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

impl ToolCallRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// One transcript entry.
///
/// The same serde model is sent over the wire and written to disk, so a
/// saved transcript round-trips byte-for-byte through load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

impl Message {
    /// Builds a plain text message for any role.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// Builds the assistant record of a requested tool call (no content).
    pub fn tool_request(call: ToolCallRequest) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_call_id: None,
            tool_calls: Some(vec![call]),
        }
    }

    /// Builds a tool-role result message answering `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_message_serializes_without_optional_fields() {
        let value = serde_json::to_value(Message::text(Role::User, "hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn tool_request_matches_provider_shape() {
        let call = ToolCallRequest::new("call_1", "think", r#"{"thought":"x"}"#);
        let value = serde_json::to_value(Message::tool_request(call)).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "assistant",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "think", "arguments": "{\"thought\":\"x\"}"}
                }]
            })
        );
    }

    #[test]
    fn tool_result_carries_call_id() {
        let value = serde_json::to_value(Message::tool_result("call_1", "4")).unwrap();
        assert_eq!(
            value,
            json!({"role": "tool", "content": "4", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn messages_round_trip_through_json() {
        let messages = vec![
            Message::text(Role::System, "be brief"),
            Message::text(Role::User, "2+2?"),
            Message::tool_request(ToolCallRequest::new("c1", "think", "{}")),
            Message::tool_result("c1", "thinking"),
            Message::text(Role::Assistant, "4"),
        ];
        let encoded = serde_json::to_string(&messages).unwrap();
        let decoded: Vec<Message> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, messages);
    }
}
