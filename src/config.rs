use std::env;

use crate::gateway::MCPO_HOST;
use crate::providers::ollama::{OLLAMA_HOST, OLLAMA_MODEL};

/// Process configuration, resolved once at startup and read-only after.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ollama_host: String,
    pub ollama_model: String,
    pub mcpo_host: String,
}

impl Settings {
    /// Read settings from the environment, falling back to the local
    /// defaults the stack ships with.
    pub fn from_env() -> Self {
        Self {
            ollama_host: env::var("OLLAMA_HOST").unwrap_or_else(|_| OLLAMA_HOST.to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| OLLAMA_MODEL.to_string()),
            mcpo_host: env::var("MCPO_HOST").unwrap_or_else(|_| MCPO_HOST.to_string()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_host: OLLAMA_HOST.to_string(),
            ollama_model: OLLAMA_MODEL.to_string(),
            mcpo_host: MCPO_HOST.to_string(),
        }
    }
}
