use std::io::{self, BufRead, Write};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use parlance::config::Settings;
use parlance::gateway::{McpoGateway, ToolGateway};
use parlance::orchestrator::Orchestrator;
use parlance::providers::ollama::{OllamaConfig, OllamaProvider};
use parlance::speech::{AudioChunk, SpeechToText, TextToSpeech};
use parlance::turn::TurnRunner;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ollama host (can also be set via OLLAMA_HOST)
    #[arg(long)]
    ollama_host: Option<String>,

    /// Model to use (can also be set via OLLAMA_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Tool gateway host (can also be set via MCPO_HOST)
    #[arg(long)]
    mcpo_host: Option<String>,
}

/// Console stand-in for the speech engines: utterance bytes are UTF-8 text
/// and the reply is synthesized as a single text chunk.
struct ConsoleStt;

#[async_trait]
impl SpeechToText for ConsoleStt {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(audio).into_owned())
    }
}

struct ConsoleTts;

impl TextToSpeech for ConsoleTts {
    fn stream(&self, text: &str) -> BoxStream<'static, AudioChunk> {
        let chunk = AudioChunk::new(text.as_bytes().to_vec());
        Box::pin(futures::stream::iter(vec![chunk]))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    if let Some(host) = cli.ollama_host {
        settings.ollama_host = host;
    }
    if let Some(model) = cli.model {
        settings.ollama_model = model;
    }
    if let Some(host) = cli.mcpo_host {
        settings.mcpo_host = host;
    }

    let provider = OllamaProvider::new(OllamaConfig {
        host: settings.ollama_host.clone(),
        model: settings.ollama_model.clone(),
        temperature: None,
    })?;

    let mut orchestrator = Orchestrator::new(Box::new(provider));
    match McpoGateway::connect(&settings.mcpo_host).await {
        Ok(gateway) => {
            let tools = gateway.list_tools().await?;
            println!("Voice assistant initialized with {} tools:", tools.len());
            for tool in &tools {
                println!("  - {}", tool.name);
            }
            orchestrator = orchestrator.with_gateway(Box::new(gateway), tools);
        }
        Err(e) => {
            warn!(error = %e, "could not connect to tool gateway");
            println!("Voice assistant ready (without tools)");
        }
    }

    let runner = TurnRunner::new(Box::new(ConsoleStt), Box::new(ConsoleTts), orchestrator);

    println!("Type an utterance and press enter; empty line to exit.\n");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }

        let mut chunks = runner.run(line.trim().as_bytes().to_vec());
        while let Some(chunk) = chunks.next().await {
            println!("{}", String::from_utf8_lossy(&chunk.data));
        }
    }

    Ok(())
}
