//! Client for the external tool gateway.
//!
//! The gateway is an mcpo-style process: it publishes its callable tools
//! through `GET /openapi.json` and executes each one through a dedicated
//! `POST` route. We introspect once at startup and keep the tool list
//! read-only afterwards; if the gateway is down at launch the assistant
//! simply runs without tools.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::AgentError;
use crate::models::{Tool, ToolCall, ToolResult};

pub const MCPO_HOST: &str = "http://127.0.0.1:8000";

/// Narrow contract the orchestrator needs from the gateway: the tool
/// specifications, and batched invocation returning one result per call,
/// position-aligned.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<Tool>>;

    async fn invoke(&self, calls: &[ToolCall]) -> Result<Vec<ToolResult>>;
}

/// HTTP client for an mcpo gateway.
pub struct McpoGateway {
    client: Client,
    host: String,
    tools: Vec<Tool>,
    // tool name -> POST route, fixed at introspection time
    routes: HashMap<String, String>,
}

impl McpoGateway {
    /// Connect to the gateway and introspect its tool list. Fails if the
    /// gateway is unreachable; callers treat that as "run without tools".
    pub async fn connect(host: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        let host = host.trim_end_matches('/').to_string();

        let spec: Value = client
            .get(format!("{}/openapi.json", host))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut tools = Vec::new();
        let mut routes = HashMap::new();
        let paths = spec
            .get("paths")
            .and_then(Value::as_object)
            .ok_or_else(|| anyhow!("gateway openapi spec has no paths"))?;

        for (path, item) in paths {
            let Some(post) = item.get("post") else {
                continue;
            };
            let name = path.trim_matches('/').replace('/', "_");
            let description = post
                .get("summary")
                .or_else(|| post.get("description"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let parameters = post
                .pointer("/requestBody/content/application~1json/schema")
                .cloned()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}}));

            debug!(tool = %name, %path, "discovered gateway tool");
            routes.insert(name.clone(), path.clone());
            tools.push(Tool::new(name, description, parameters));
        }

        Ok(Self {
            client,
            host,
            tools,
            routes,
        })
    }
}

#[async_trait]
impl ToolGateway for McpoGateway {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        Ok(self.tools.clone())
    }

    async fn invoke(&self, calls: &[ToolCall]) -> Result<Vec<ToolResult>> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let route = self
                .routes
                .get(&call.name)
                .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

            let response = self
                .client
                .post(format!("{}{}", self.host, route))
                .json(&call.arguments)
                .send()
                .await
                .map_err(|e| AgentError::Gateway(e.to_string()))?;

            if !response.status().is_success() {
                return Err(AgentError::Gateway(format!(
                    "{} returned {}",
                    call.name,
                    response.status()
                ))
                .into());
            }

            let raw = response
                .json()
                .await
                .map_err(|e| AgentError::Gateway(e.to_string()))?;
            results.push(ToolResult::new(raw));
        }
        Ok(results)
    }
}

/// Re-pair results with their requests by id where the gateway included
/// one, falling back to positional pairing otherwise. Gateways are expected
/// to return results position-aligned, so this is usually the identity.
pub fn align_results(calls: &[ToolCall], mut results: Vec<ToolResult>) -> Vec<ToolResult> {
    let has_ids = results
        .iter()
        .any(|result| result.raw.get("tool_call_id").and_then(Value::as_str).is_some());
    if !has_ids {
        return results;
    }

    let mut aligned: Vec<Option<ToolResult>> = vec![None; calls.len()];
    let mut unmatched = Vec::new();
    for result in results.drain(..) {
        let slot = result
            .raw
            .get("tool_call_id")
            .and_then(Value::as_str)
            .and_then(|id| calls.iter().position(|call| call.id == id));
        match slot {
            Some(index) if aligned[index].is_none() => aligned[index] = Some(result),
            _ => unmatched.push(result),
        }
    }

    // Unmatched results fill the remaining slots in their original order.
    let mut unmatched = unmatched.into_iter();
    aligned
        .into_iter()
        .filter_map(|slot| slot.or_else(|| unmatched.next()))
        .collect()
}

/// A scripted gateway for testing the orchestrator.
pub struct MockGateway {
    tools: Vec<Tool>,
    results: std::sync::Mutex<Vec<Vec<ToolResult>>>,
    invocations: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    fail: bool,
}

impl MockGateway {
    pub fn new(tools: Vec<Tool>, results: Vec<Vec<ToolResult>>) -> Self {
        Self {
            tools,
            results: std::sync::Mutex::new(results),
            invocations: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            fail: false,
        }
    }

    /// A gateway whose every invocation fails
    pub fn failing(tools: Vec<Tool>) -> Self {
        Self {
            tools,
            results: std::sync::Mutex::new(Vec::new()),
            invocations: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            fail: true,
        }
    }

    /// Handle to the invocation counter that survives moving the gateway
    /// into an orchestrator.
    pub fn invocation_log(&self) -> std::sync::Arc<std::sync::atomic::AtomicUsize> {
        self.invocations.clone()
    }
}

#[async_trait]
impl ToolGateway for MockGateway {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        Ok(self.tools.clone())
    }

    async fn invoke(&self, calls: &[ToolCall]) -> Result<Vec<ToolResult>> {
        self.invocations
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail {
            return Err(AgentError::Gateway("mock gateway failure".to_string()).into());
        }
        let mut scripted = self.results.lock().unwrap();
        if scripted.is_empty() {
            Ok(calls.iter().map(|_| ToolResult::new(Value::Null)).collect())
        } else {
            Ok(scripted.remove(0))
        }
    }
}
