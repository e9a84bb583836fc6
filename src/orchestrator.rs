//! The turn state machine.
//!
//! One spoken utterance becomes at most two completions: an initial call
//! that may request tools, an optional single tool round through the
//! gateway, and a final call that turns the tool output into the spoken
//! answer. Every failure path degrades to something speakable; nothing in
//! here propagates an error to the audio stage.

use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::format::FormatterRegistry;
use crate::gateway::{align_results, ToolGateway};
use crate::models::{Message, Tool, ToolResult};
use crate::providers::base::Provider;

/// Spoken when a completion fails outright and there is nothing to fall
/// back on.
pub const GENERIC_APOLOGY: &str = "Sorry, I had trouble processing that request.";

const TOOL_FAILURE_PREFIX: &str = "I had trouble accessing the tools, but I can tell you: ";

pub const SYSTEM_PROMPT: &str = "\
You are a helpful voice assistant with access to time and Airbnb tools.
Keep responses conversational, brief, and natural for voice conversations.

For Airbnb searches:
- Mention only the top 2-3 best options with key details (name, price, rating)
- Don't mention URLs, listing IDs, or coordinates
- Focus on practical info like price per night and guest ratings
- Avoid repetitive information

For time queries:
- Give simple, clear time information
- Mention timezone and whether it's daylight saving time if relevant

Never use asterisks, bullet points, markdown, or any formatting in responses.
Keep everything conversational and easy to understand when spoken aloud.";

/// Drives one conversational turn: transcript ownership, the two LLM calls,
/// and the tool round between them.
pub struct Orchestrator {
    provider: Box<dyn Provider>,
    gateway: Option<Box<dyn ToolGateway>>,
    tools: Vec<Tool>,
    formatters: FormatterRegistry,
    system_prompt: String,
}

impl Orchestrator {
    /// Create a tool-less orchestrator around a provider
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            provider,
            gateway: None,
            tools: Vec::new(),
            formatters: FormatterRegistry::default(),
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Attach a gateway and the tools it exposed at startup
    pub fn with_gateway(mut self, gateway: Box<dyn ToolGateway>, tools: Vec<Tool>) -> Self {
        self.gateway = Some(gateway);
        self.tools = tools;
        self
    }

    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Run one turn over the transcribed utterance, returning the reply
    /// text. Always returns something speakable; failures are folded into
    /// apology text rather than surfaced.
    pub async fn run_turn(&self, transcript: &str) -> String {
        if transcript.trim().is_empty() {
            return String::new();
        }

        let mut messages = vec![Message::user(transcript)];

        let response = match self
            .provider
            .complete(&self.system_prompt, &messages, &self.tools)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "initial completion failed");
                return GENERIC_APOLOGY.to_string();
            }
        };

        if self.tools.is_empty() || !response.has_tool_calls() {
            return response.content;
        }

        let initial_answer = response.content.clone();
        info!(calls = response.tool_calls.len(), "executing tool calls");

        if let Err(e) = self.tool_round(&mut messages, response).await {
            warn!(error = %e, "tool round failed, answering without tools");
            return format!("{}{}", TOOL_FAILURE_PREFIX, initial_answer);
        }

        // At most one tool round per turn: any tool calls in this response
        // are dropped to keep voice latency bounded.
        match self
            .provider
            .complete(&self.system_prompt, &messages, &self.tools)
            .await
        {
            Ok(final_response) => final_response.content,
            Err(e) => {
                warn!(error = %e, "final completion failed");
                GENERIC_APOLOGY.to_string()
            }
        }
    }

    /// Invoke the requested tools and append the paired assistant and tool
    /// messages to the transcript. On error the transcript may hold the
    /// assistant message already; callers discard it along with the turn.
    async fn tool_round(&self, messages: &mut Vec<Message>, response: Message) -> Result<()> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| anyhow!("no tool gateway configured"))?;

        let calls = response.tool_calls.clone();
        messages.push(response);

        let results = gateway.invoke(&calls).await?;
        let mut results = align_results(&calls, results);
        self.formatters.apply(&mut results);

        for (index, call) in calls.iter().enumerate() {
            let content = match results.get(index) {
                Some(result) => tool_message_content(result),
                None => "No result".to_string(),
            };
            messages.push(Message::tool(call.id.clone(), content));
        }

        Ok(())
    }
}

/// Pick the transcript text for one tool result: the voice summary when a
/// formatter claimed it, a count-only sentence for unformatted listing
/// payloads, the raw JSON otherwise.
fn tool_message_content(result: &ToolResult) -> String {
    if let Some(summary) = &result.voice_summary {
        return summary.clone();
    }
    if result.raw.get("datetime").is_some() {
        return result.raw.to_string();
    }
    if let Some(listings) = result.raw.get("searchResults").and_then(Value::as_array) {
        return format!("Found {} listings.", listings.len());
    }
    result.raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use crate::models::{Role, ToolCall};
    use crate::providers::mock::MockProvider;
    use serde_json::json;

    fn time_tool() -> Tool {
        Tool::new(
            "time_get_current_time",
            "Get current time",
            json!({"type": "object", "properties": {"timezone": {"type": "string"}}}),
        )
    }

    fn time_call(id: &str) -> ToolCall {
        ToolCall::new(id, "time_get_current_time", json!({"timezone": "Europe/London"}))
    }

    #[tokio::test]
    async fn test_simple_response_without_tools() {
        let provider = MockProvider::new(vec![Message::assistant("Hello!")]);
        let log = provider.request_log();
        let orchestrator = Orchestrator::new(Box::new(provider));

        assert_eq!(orchestrator.run_turn("Hi").await, "Hello!");
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_utterance_makes_no_completion() {
        let provider = MockProvider::new(vec![Message::assistant("unreachable")]);
        let log = provider.request_log();
        let orchestrator = Orchestrator::new(Box::new(provider));

        assert_eq!(orchestrator.run_turn("   \n ").await, "");
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tool_round_pairs_results_by_id() {
        let provider = MockProvider::new(vec![
            Message::assistant("Let me check.").with_tool_calls(vec![
                time_call("call_a"),
                time_call("call_b"),
            ]),
            Message::assistant("It is noon in both."),
        ]);
        let log = provider.request_log();
        let gateway = MockGateway::new(
            vec![time_tool()],
            vec![vec![
                ToolResult::new(json!({"datetime": "2025-07-27T12:00:00+01:00", "timezone": "Europe/London"})),
                ToolResult::new(json!({"datetime": "2025-07-27T12:00:00+01:00", "timezone": "Europe/Dublin"})),
            ]],
        );
        let orchestrator =
            Orchestrator::new(Box::new(provider)).with_gateway(Box::new(gateway), vec![time_tool()]);

        let reply = orchestrator.run_turn("What time is it?").await;
        assert_eq!(reply, "It is noon in both.");

        // The final completion sees user, assistant with tool calls, then
        // one tool message per call in request order with matching ids.
        let requests = log.lock().unwrap();
        let final_transcript = &requests[1];
        assert_eq!(final_transcript.len(), 4);
        assert_eq!(final_transcript[1].role, Role::Assistant);
        let call_ids: Vec<_> = final_transcript[1]
            .tool_calls
            .iter()
            .map(|call| call.id.clone())
            .collect();
        assert_eq!(call_ids, vec!["call_a", "call_b"]);
        assert_eq!(final_transcript[2].role, Role::Tool);
        assert_eq!(final_transcript[2].tool_call_id.as_deref(), Some("call_a"));
        assert_eq!(final_transcript[3].tool_call_id.as_deref(), Some("call_b"));
    }

    #[tokio::test]
    async fn test_tool_messages_use_voice_summaries() {
        let provider = MockProvider::new(vec![
            Message::assistant("").with_tool_calls(vec![time_call("call_0")]),
            Message::assistant("done"),
        ]);
        let log = provider.request_log();
        let gateway = MockGateway::new(
            vec![time_tool()],
            vec![vec![ToolResult::new(json!({
                "datetime": "2025-07-27T15:30:00+01:00",
                "timezone": "Europe/London"
            }))]],
        );
        let orchestrator =
            Orchestrator::new(Box::new(provider)).with_gateway(Box::new(gateway), vec![time_tool()]);

        orchestrator.run_turn("time?").await;
        let requests = log.lock().unwrap();
        let tool_message = &requests[1][2];
        assert_eq!(
            tool_message.content,
            "The current time in Europe, London is 3:30 PM."
        );
    }

    #[tokio::test]
    async fn test_unformatted_listing_payload_becomes_count_sentence() {
        let provider = MockProvider::new(vec![
            Message::assistant("").with_tool_calls(vec![ToolCall::new(
                "call_0",
                "airbnb_search",
                json!({"location": "Paris"}),
            )]),
            Message::assistant("done"),
        ]);
        let log = provider.request_log();
        // Listings without ids defeat the formatter, leaving the raw shape.
        let gateway = MockGateway::new(
            vec![time_tool()],
            vec![vec![ToolResult::new(
                json!({"searchResults": [{"name": "x"}, {"name": "y"}]}),
            )]],
        );
        let orchestrator =
            Orchestrator::new(Box::new(provider)).with_gateway(Box::new(gateway), vec![time_tool()]);

        orchestrator.run_turn("find a place").await;
        let requests = log.lock().unwrap();
        assert_eq!(requests[1][2].content, "Found 2 listings.");
    }

    #[tokio::test]
    async fn test_at_most_one_tool_round() {
        // Both completions request tools; the gateway must run only once.
        let provider = MockProvider::new(vec![
            Message::assistant("").with_tool_calls(vec![time_call("call_0")]),
            Message::assistant("Checking again.").with_tool_calls(vec![time_call("call_1")]),
        ]);
        let gateway = MockGateway::new(vec![time_tool()], vec![]);
        let invocations = gateway.invocation_log();
        let orchestrator =
            Orchestrator::new(Box::new(provider)).with_gateway(Box::new(gateway), vec![time_tool()]);

        let reply = orchestrator.run_turn("what time is it?").await;
        assert_eq!(reply, "Checking again.");
        assert_eq!(invocations.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_falls_back_to_initial_answer() {
        let provider = MockProvider::new(vec![Message::assistant("It is around noon.")
            .with_tool_calls(vec![time_call("call_0")])]);
        let log = provider.request_log();
        let gateway = MockGateway::failing(vec![time_tool()]);
        let orchestrator =
            Orchestrator::new(Box::new(provider)).with_gateway(Box::new(gateway), vec![time_tool()]);

        let reply = orchestrator.run_turn("what time is it?").await;
        assert_eq!(
            reply,
            "I had trouble accessing the tools, but I can tell you: It is around noon."
        );
        // No second completion after a failed tool round.
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_generic_apology() {
        let orchestrator = Orchestrator::new(Box::new(MockProvider::failing()));
        assert_eq!(orchestrator.run_turn("hello").await, GENERIC_APOLOGY);
    }

    #[tokio::test]
    async fn test_tool_calls_ignored_when_no_tools_registered() {
        let provider = MockProvider::new(vec![
            Message::assistant("I would need tools for that.")
                .with_tool_calls(vec![time_call("call_0")]),
        ]);
        let log = provider.request_log();
        let orchestrator = Orchestrator::new(Box::new(provider));

        let reply = orchestrator.run_turn("what time is it?").await;
        assert_eq!(reply, "I would need tools for that.");
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
