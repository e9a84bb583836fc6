use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Message, Tool};

/// Base trait for LLM chat backends.
///
/// Implementations must echo tool names verbatim in any tool calls they
/// return; the orchestrator pairs results back to requests by those names
/// and ids.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next assistant message for the given transcript,
    /// offering `tools` to the model when non-empty.
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Message>;
}
