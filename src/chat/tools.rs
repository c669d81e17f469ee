use std::error::Error;
use std::fmt;

use serde_json::{Map, Value, json};

/// JSON schema primitive types supported for tool parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolParamType {
    Integer,
    Number,
    String,
    Boolean,
    Object,
    Array,
}

impl ToolParamType {
    fn as_str(self) -> &'static str {
        match self {
            ToolParamType::Integer => "integer",
            ToolParamType::Number => "number",
            ToolParamType::String => "string",
            ToolParamType::Boolean => "boolean",
            ToolParamType::Object => "object",
            ToolParamType::Array => "array",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ToolParamType::Integer => value.is_i64() || value.is_u64(),
            ToolParamType::Number => value.is_number(),
            ToolParamType::String => value.is_string(),
            ToolParamType::Boolean => value.is_boolean(),
            ToolParamType::Object => value.is_object(),
            ToolParamType::Array => value.is_array(),
        }
    }
}

/// One function parameter definition.
#[derive(Debug, Clone)]
pub struct ToolParam {
    /// Parameter name.
    pub name: String,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// JSON schema type.
    pub kind: ToolParamType,
    /// Whether the parameter is required.
    pub required: bool,
}

impl ToolParam {
    /// Builds a parameter definition.
    pub fn new(
        name: impl Into<String>,
        kind: ToolParamType,
        required: bool,
        description: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            kind,
            required,
        }
    }
}

/// Callable tool function declaration.
#[derive(Debug, Clone)]
pub struct ToolFunction {
    /// Function name.
    pub name: String,
    /// Function description.
    pub description: String,
    /// Parameter definitions.
    pub params: Vec<ToolParam>,
}

impl ToolFunction {
    /// Creates a function declaration.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Appends one parameter definition.
    pub fn with_param(mut self, param: ToolParam) -> Self {
        self.params.push(param);
        self
    }

    fn to_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut param_def = Map::new();
            param_def.insert(
                "type".to_string(),
                Value::String(param.kind.as_str().to_string()),
            );
            if let Some(description) = &param.description {
                param_def.insert(
                    "description".to_string(),
                    Value::String(description.clone()),
                );
            }
            properties.insert(param.name.clone(), Value::Object(param_def));
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        Value::Object(schema)
    }

    /// Serializes the declaration to the chat-completions tool schema.
    pub fn to_json(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.to_schema(),
            }
        })
    }
}

/// Failure modes of tool lookup, argument validation, and execution.
#[derive(Debug)]
pub enum ToolError {
    UnknownTool {
        name: String,
    },
    InvalidArguments {
        name: String,
        reason: String,
    },
    MissingParameter {
        name: String,
        param: String,
    },
    ParameterType {
        name: String,
        param: String,
        expected: &'static str,
    },
    Failed {
        name: String,
        message: String,
    },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool { name } => write!(f, "no tool named '{name}' is registered"),
            Self::InvalidArguments { name, reason } => {
                write!(f, "arguments for tool '{name}' are invalid: {reason}")
            }
            Self::MissingParameter { name, param } => {
                write!(f, "tool '{name}' requires parameter '{param}'")
            }
            Self::ParameterType {
                name,
                param,
                expected,
            } => write!(
                f,
                "parameter '{param}' of tool '{name}' must be of type {expected}"
            ),
            Self::Failed { name, message } => write!(f, "tool '{name}' failed: {message}"),
        }
    }
}

impl Error for ToolError {}

/// A tool implementation: a pure function over its validated arguments.
pub type ToolFn = Box<dyn Fn(&Map<String, Value>) -> Result<String, String>>;

struct RegisteredTool {
    function: ToolFunction,
    run: ToolFn,
}

/// Name-addressed collection of locally executable tools.
///
/// Registration happens once at startup; re-registering a name replaces
/// the earlier entry. Declaration order is preserved so the schema list
/// sent to the model is stable.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `run` under the declaration's name; last registration wins.
    pub fn register(&mut self, function: ToolFunction, run: ToolFn) {
        let entry = RegisteredTool { function, run };
        match self
            .tools
            .iter()
            .position(|tool| tool.function.name == entry.function.name)
        {
            Some(index) => self.tools[index] = entry,
            None => self.tools.push(entry),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool schemas in registration order, ready to send with a request.
    pub fn schemas(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| tool.function.to_json())
            .collect()
    }

    /// Parses and validates `arguments` against the declared parameters,
    /// then runs the named tool.
    pub fn invoke(&self, name: &str, arguments: &str) -> Result<String, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.function.name == name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
            })?;

        let payload: Value =
            serde_json::from_str(arguments).map_err(|err| ToolError::InvalidArguments {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        let args = payload
            .as_object()
            .ok_or_else(|| ToolError::InvalidArguments {
                name: name.to_string(),
                reason: "payload is not a JSON object".to_string(),
            })?;

        for param in &tool.function.params {
            match args.get(&param.name) {
                Some(value) => {
                    if !param.kind.accepts(value) {
                        return Err(ToolError::ParameterType {
                            name: name.to_string(),
                            param: param.name.clone(),
                            expected: param.kind.as_str(),
                        });
                    }
                }
                None if param.required => {
                    return Err(ToolError::MissingParameter {
                        name: name.to_string(),
                        param: param.name.clone(),
                    });
                }
                None => {}
            }
        }

        (tool.run)(args).map_err(|message| ToolError::Failed {
            name: name.to_string(),
            message,
        })
    }
}
