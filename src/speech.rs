//! Boundary contracts for the external speech engines.
//!
//! Transcription and synthesis are black boxes to this crate: audio in,
//! text out, and text in, a finite stream of audio chunks out. Real
//! inference lives in whatever engine the binary is wired to; the traits
//! here are the whole contract.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// One block of synthesized audio, ready for the output transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub data: Vec<u8>,
}

impl AudioChunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Speech-to-text: may legitimately return empty text for silence.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Text-to-speech: a finite, lazily produced chunk sequence, consumed
/// exactly once per call.
pub trait TextToSpeech: Send + Sync {
    fn stream(&self, text: &str) -> BoxStream<'static, AudioChunk>;
}
