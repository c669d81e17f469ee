use std::error::Error;
use std::fmt;

use crate::chat::client::{ClientError, Completion, CompletionOutcome};
use crate::chat::message::{Message, Role};
use crate::chat::tools::{ToolError, ToolRegistry};
use crate::chat::transcript::Transcript;

/// Failure during one conversation turn.
#[derive(Debug)]
pub enum TurnError {
    Client(ClientError),
    Tool(ToolError),
    /// The follow-up completion asked for a tool even though none were
    /// offered.
    UnexpectedToolCall { name: String },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(source) => source.fmt(f),
            Self::Tool(source) => source.fmt(f),
            Self::UnexpectedToolCall { name } => {
                write!(f, "model requested tool '{name}' when tools were disabled")
            }
        }
    }
}

impl Error for TurnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Client(source) => Some(source),
            Self::Tool(source) => Some(source),
            Self::UnexpectedToolCall { .. } => None,
        }
    }
}

impl From<ClientError> for TurnError {
    fn from(source: ClientError) -> Self {
        Self::Client(source)
    }
}

impl From<ToolError> for TurnError {
    fn from(source: ToolError) -> Self {
        Self::Tool(source)
    }
}

/// Orchestrates one turn at a time over a transcript, a tool registry,
/// and a completion client.
///
/// A turn is at most two service round trips: the first request may
/// offer tool schemas; if the model requests a call, exactly one tool
/// runs and the follow-up request is issued without schemas, so a turn
/// can never recurse into further tool use.
pub struct Engine<C> {
    transcript: Transcript,
    registry: ToolRegistry,
    client: C,
}

impl<C: Completion> Engine<C> {
    pub fn new(client: C, registry: ToolRegistry) -> Self {
        Self {
            transcript: Transcript::new(),
            registry,
            client,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    /// Runs one turn: appends the caller's message, requests a
    /// completion, dispatches at most one tool call, and returns the
    /// final assistant text (also appended).
    ///
    /// When a tool invocation fails, a tool-role message describing the
    /// failure is appended under the originating call id before the
    /// error is returned, so the transcript never holds an unanswered
    /// tool-call request.
    pub fn send(
        &mut self,
        text: impl Into<String>,
        role: Role,
        model: &str,
        tools_enabled: bool,
    ) -> Result<String, TurnError> {
        self.transcript.push(Message::text(role, text));

        let schemas = if tools_enabled && !self.registry.is_empty() {
            Some(self.registry.schemas())
        } else {
            None
        };

        let outcome =
            self.client
                .complete(self.transcript.messages(), model, schemas.as_deref())?;

        let call = match outcome {
            CompletionOutcome::Final(content) => {
                self.transcript
                    .push(Message::text(Role::Assistant, content.clone()));
                return Ok(content);
            }
            CompletionOutcome::ToolCall(call) => call,
        };

        self.transcript.push(Message::tool_request(call.clone()));
        match self
            .registry
            .invoke(&call.function.name, &call.function.arguments)
        {
            Ok(result) => self
                .transcript
                .push(Message::tool_result(call.id.clone(), result)),
            Err(err) => {
                self.transcript
                    .push(Message::tool_result(call.id.clone(), err.to_string()));
                return Err(err.into());
            }
        }

        match self
            .client
            .complete(self.transcript.messages(), model, None)?
        {
            CompletionOutcome::Final(content) => {
                self.transcript
                    .push(Message::text(Role::Assistant, content.clone()));
                Ok(content)
            }
            CompletionOutcome::ToolCall(call) => Err(TurnError::UnexpectedToolCall {
                name: call.function.name,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::ToolCallRequest;
    use crate::chat::tools::{ToolFn, ToolFunction, ToolParam, ToolParamType};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct ScriptedClient {
        outcomes: RefCell<VecDeque<CompletionOutcome>>,
        /// Whether each observed request carried tool schemas.
        offered_tools: RefCell<Vec<bool>>,
    }

    impl ScriptedClient {
        fn new(outcomes: Vec<CompletionOutcome>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                offered_tools: RefCell::new(Vec::new()),
            }
        }
    }

    impl Completion for ScriptedClient {
        fn complete(
            &self,
            _messages: &[Message],
            _model: &str,
            tools: Option<&[serde_json::Value]>,
        ) -> Result<CompletionOutcome, ClientError> {
            self.offered_tools.borrow_mut().push(tools.is_some());
            Ok(self
                .outcomes
                .borrow_mut()
                .pop_front()
                .expect("script exhausted"))
        }
    }

    fn echo_tool() -> (ToolFunction, ToolFn) {
        (
            ToolFunction::new("echo", "Returns its input").with_param(ToolParam::new(
                "text",
                ToolParamType::String,
                true,
                None,
            )),
            Box::new(|args| {
                Ok(args
                    .get("text")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string())
            }),
        )
    }

    fn engine_with_echo(
        outcomes: Vec<CompletionOutcome>,
    ) -> Engine<ScriptedClient> {
        let mut registry = ToolRegistry::new();
        let (function, run) = echo_tool();
        registry.register(function, run);
        Engine::new(ScriptedClient::new(outcomes), registry)
    }

    #[test]
    fn plain_turn_appends_user_and_assistant() {
        let mut engine =
            engine_with_echo(vec![CompletionOutcome::Final("hello".to_string())]);

        let reply = engine.send("hi", Role::User, "gpt-4o-mini", true).unwrap();

        assert_eq!(reply, "hello");
        let messages = engine.transcript().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::text(Role::User, "hi"));
        assert_eq!(messages[1], Message::text(Role::Assistant, "hello"));
    }

    #[test]
    fn tools_are_not_offered_when_disabled() {
        let mut engine =
            engine_with_echo(vec![CompletionOutcome::Final("ok".to_string())]);

        engine.send("hi", Role::User, "o1-mini", false).unwrap();

        assert_eq!(*engine.client.offered_tools.borrow(), vec![false]);
    }

    #[test]
    fn tool_turn_runs_two_requests_and_appends_four_messages() {
        let call = ToolCallRequest::new("c1", "echo", r#"{"text":"pong"}"#);
        let mut engine = engine_with_echo(vec![
            CompletionOutcome::ToolCall(call.clone()),
            CompletionOutcome::Final("the tool said pong".to_string()),
        ]);

        let reply = engine.send("ping?", Role::User, "gpt-4o-mini", true).unwrap();

        assert_eq!(reply, "the tool said pong");
        // first request offers schemas, the follow-up never does
        assert_eq!(*engine.client.offered_tools.borrow(), vec![true, false]);

        let messages = engine.transcript().messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::text(Role::User, "ping?"));
        assert_eq!(messages[1], Message::tool_request(call));
        assert_eq!(messages[2], Message::tool_result("c1", "pong"));
        assert_eq!(
            messages[3],
            Message::text(Role::Assistant, "the tool said pong")
        );
    }

    #[test]
    fn failed_tool_call_still_gets_a_result_message() {
        let call = ToolCallRequest::new("c9", "missing", "{}");
        let mut engine = engine_with_echo(vec![CompletionOutcome::ToolCall(call.clone())]);

        let err = engine
            .send("go", Role::User, "gpt-4o-mini", true)
            .unwrap_err();
        assert!(matches!(err, TurnError::Tool(ToolError::UnknownTool { .. })));

        // transcript stays valid: the request is answered by an error result
        let messages = engine.transcript().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::tool_request(call));
        assert_eq!(messages[2].role, Role::Tool);
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("c9"));
        assert!(
            messages[2]
                .content
                .as_deref()
                .unwrap()
                .contains("no tool named 'missing'")
        );
        // only the first request went out
        assert_eq!(*engine.client.offered_tools.borrow(), vec![true]);
    }

    #[test]
    fn tool_call_on_followup_is_rejected() {
        let mut engine = engine_with_echo(vec![
            CompletionOutcome::ToolCall(ToolCallRequest::new("c1", "echo", r#"{"text":"a"}"#)),
            CompletionOutcome::ToolCall(ToolCallRequest::new("c2", "echo", r#"{"text":"b"}"#)),
        ]);

        let err = engine
            .send("hi", Role::User, "gpt-4o-mini", true)
            .unwrap_err();
        assert!(matches!(err, TurnError::UnexpectedToolCall { ref name } if name == "echo"));
    }

    #[test]
    fn system_messages_go_through_the_transcript_directly() {
        let mut engine = engine_with_echo(vec![]);
        engine
            .transcript_mut()
            .push(Message::text(Role::System, "be terse"));
        assert_eq!(engine.transcript().len(), 1);
    }
}
