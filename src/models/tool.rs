use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool that can be offered to a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema for the parameters the tool accepts
    pub parameters: Value,
}

impl Tool {
    /// Create a new tool with the given name and description
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool invocation requested by the model.
///
/// The arguments payload is opaque here; it is passed through to the gateway
/// verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Identifier unique within one turn, echoed back on the tool message
    pub id: String,
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution
    pub arguments: Value,
}

impl ToolCall {
    pub fn new<I, N>(id: I, name: N, arguments: Value) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Id assigned when the model did not provide one, deterministic by
    /// position in the tool-call list.
    pub fn synthetic_id(index: usize) -> String {
        format!("call_{}", index)
    }
}

/// One tool invocation's outcome, position-aligned with the request list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    /// The provider-specific payload, untouched
    pub raw: Value,
    /// Voice-friendly rendering, set by a formatter that recognized the shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_summary: Option<String>,
}

impl ToolResult {
    pub fn new(raw: Value) -> Self {
        Self {
            raw,
            voice_summary: None,
        }
    }
}
