//! Voice-friendly rendering of raw tool results.
//!
//! Gateway payloads are verbose JSON meant for screens. Before they go back
//! into the transcript we try each registered formatter against the payload;
//! the first one whose shape detector matches writes a spoken-style summary
//! onto the result. Unrecognized payloads pass through untouched, and a
//! formatter that trips over malformed data leaves the result unformatted
//! rather than failing the turn.
pub mod listings;
pub mod time;

use serde_json::Value;
use tracing::debug;

use crate::models::ToolResult;

/// A shape detector paired with a transform to a spoken summary.
pub trait ResultFormatter: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Whether this formatter recognizes the payload shape
    fn matches(&self, raw: &Value) -> bool;

    /// Render the payload for speech; `None` means the payload did not
    /// parse and the result should stay unformatted.
    fn format(&self, raw: &Value) -> Option<String>;
}

/// Formatters tried in registration order; the first match claims the result.
pub struct FormatterRegistry {
    formatters: Vec<Box<dyn ResultFormatter>>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self {
            formatters: Vec::new(),
        }
    }

    pub fn register(mut self, formatter: Box<dyn ResultFormatter>) -> Self {
        self.formatters.push(formatter);
        self
    }

    /// Apply the registry to each result, setting `voice_summary` where a
    /// formatter recognized the shape.
    pub fn apply(&self, results: &mut [ToolResult]) {
        for result in results.iter_mut() {
            for formatter in &self.formatters {
                if !formatter.matches(&result.raw) {
                    continue;
                }
                match formatter.format(&result.raw) {
                    Some(summary) => result.voice_summary = Some(summary),
                    None => debug!(
                        formatter = formatter.name(),
                        "matched shape but could not parse payload"
                    ),
                }
                break;
            }
        }
    }
}

impl Default for FormatterRegistry {
    /// The standard set, in the order results are checked: point-in-time
    /// payloads first, then search listings.
    fn default() -> Self {
        Self::new()
            .register(Box::new(time::TimeFormatter))
            .register(Box::new(listings::ListingFormatter))
    }
}
