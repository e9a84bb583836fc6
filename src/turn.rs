//! Entry point for one turn: utterance audio in, reply audio out.

use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{error, info};

use crate::orchestrator::{Orchestrator, GENERIC_APOLOGY};
use crate::sanitize::sanitize;
use crate::speech::{AudioChunk, SpeechToText, TextToSpeech};

/// Runs one utterance through transcription, the orchestrator, the
/// sanitizer, and synthesis. Restartable per call; no state crosses turns.
pub struct TurnRunner {
    stt: Box<dyn SpeechToText>,
    tts: Box<dyn TextToSpeech>,
    orchestrator: Orchestrator,
}

impl TurnRunner {
    pub fn new(
        stt: Box<dyn SpeechToText>,
        tts: Box<dyn TextToSpeech>,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            stt,
            tts,
            orchestrator,
        }
    }

    /// Produce the reply audio for one utterance as a lazy, finite chunk
    /// sequence. An empty or silent utterance produces no chunks; every
    /// failure past that point is spoken as an apology rather than raised.
    pub fn run(&self, audio: Vec<u8>) -> BoxStream<'_, AudioChunk> {
        Box::pin(async_stream::stream! {
            match self.stt.transcribe(&audio).await {
                Err(e) => {
                    error!(error = %e, "transcription failed");
                    let mut chunks = self.tts.stream(GENERIC_APOLOGY);
                    while let Some(chunk) = chunks.next().await {
                        yield chunk;
                    }
                }
                Ok(transcript) if transcript.trim().is_empty() => {}
                Ok(transcript) => {
                    info!(user = %transcript, "transcribed utterance");

                    let reply = self.orchestrator.run_turn(&transcript).await;
                    let reply = if reply.trim().is_empty() {
                        GENERIC_APOLOGY.to_string()
                    } else {
                        reply
                    };

                    let spoken = sanitize(&reply);
                    info!(assistant = %spoken, "speaking reply");

                    let mut chunks = self.tts.stream(&spoken);
                    while let Some(chunk) = chunks.next().await {
                        yield chunk;
                    }
                }
            }
        })
    }
}
