//! These models represent the objects passed around by the orchestrator
//!
//! The transcript format follows the openai-compatible chat schema that both
//! the LLM endpoint and the tool gateway speak: messages carry a role, text
//! content, and optionally a set of tool calls (assistant) or the id of the
//! tool call they answer (tool). We convert to and from the wire format at
//! the provider boundary and keep these internal structs everywhere else.
pub mod message;
pub mod tool;

pub use message::{Message, Role};
pub use tool::{Tool, ToolCall, ToolResult};
