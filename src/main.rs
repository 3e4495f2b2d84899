//! Parley - turn-taking conversation agent
//!
//! Runs the assistant against the terminal: typed lines stand in for
//! transcribed speech and replies are printed at speaking pace.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parley::{
    config::ParleyConfig,
    llm::OllamaClient,
    memory::{InMemoryIndex, MaintenanceWorker, MemoryStore, SimilarityIndex},
    orchestrator::Orchestrator,
    state::SharedState,
    voice::{speech::DEFAULT_QUEUE_CAPACITY, CaptureWorker, ConsoleSynthesizer, SpeechQueue, SpeechWorker, StdinTranscriber},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "Turn-taking conversation agent with scored long-term memory")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a conversation on the terminal
    Run {
        /// Keep memories in memory only (no snapshot file)
        #[arg(long)]
        ephemeral: bool,

        /// Override the memory snapshot file
        #[arg(long)]
        memory_file: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they do not interleave with the conversation
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("parley={}", log_level).into());
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Run {
            ephemeral,
            memory_file,
        } => {
            run_conversation(config, ephemeral, memory_file).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

/// Explicit path, else `<config dir>/parley/config.toml` if present, else defaults.
fn load_config(path: Option<PathBuf>) -> Result<ParleyConfig> {
    let path = path.or_else(|| {
        dirs_next::config_dir()
            .map(|dir| dir.join("parley").join("config.toml"))
            .filter(|p| p.exists())
    });

    match path {
        Some(path) => {
            let config = ParleyConfig::from_file(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Configuration loaded");
            Ok(config)
        }
        None => Ok(ParleyConfig::default()),
    }
}

async fn run_conversation(
    mut config: ParleyConfig,
    ephemeral: bool,
    memory_file: Option<PathBuf>,
) -> Result<()> {
    if memory_file.is_some() {
        config.memory.persist_path = memory_file;
    }
    config.validate()?;

    tracing::info!(
        assistant = %config.assistant.name,
        mode = config.assistant.mode.as_str(),
        model = %config.generator.model,
        "Starting Parley"
    );

    let state = Arc::new(SharedState::new(
        config.turn_taking.short_term_capacity,
        config.memory.summarization_interval,
    ));

    let index: Arc<dyn SimilarityIndex> = match config.memory.resolved_persist_path() {
        Some(path) if !ephemeral => Arc::new(InMemoryIndex::open(&path).await?),
        _ => Arc::new(InMemoryIndex::new()),
    };
    let store = Arc::new(MemoryStore::new(index, &config.memory));
    store.load().await?;

    let ollama = Arc::new(OllamaClient::new(&config.generator)?);

    let (speech, speech_rx) = SpeechQueue::channel(DEFAULT_QUEUE_CAPACITY);
    let synthesizer = Arc::new(ConsoleSynthesizer::new(
        config.assistant.name.clone(),
        config.speech.words_per_minute,
    ));
    let speech_worker =
        SpeechWorker::new(speech_rx, synthesizer, state.clone(), config.speech.timeout()).spawn();

    let capture_worker = CaptureWorker::new(Box::new(StdinTranscriber::new()), state.clone()).spawn();

    let maintenance = Arc::new(MaintenanceWorker::new(
        store.clone(),
        state.clone(),
        ollama.clone(),
        &config.memory,
    ))
    .spawn();

    state.start_session(Uuid::new_v4().to_string()).await;

    let orchestrator =
        Arc::new(Orchestrator::new(&config, state.clone(), store.clone(), ollama, speech)).spawn();

    tokio::select! {
        _ = tokio::time::sleep(config.turn_taking.startup_delay()) => {
            state.set_ready(true).await;
            tracing::info!("Ready. Type to talk, Ctrl+C to stop.");
            tokio::signal::ctrl_c().await?;
        }
        result = tokio::signal::ctrl_c() => result?,
    }

    tracing::info!("Shutting down...");
    state.request_shutdown().await;

    let (orchestrator, speech, capture, maintenance) =
        tokio::join!(orchestrator, speech_worker, capture_worker, maintenance);
    for (name, result) in [
        ("orchestrator", orchestrator),
        ("speech", speech),
        ("capture", capture),
        ("maintenance", maintenance),
    ] {
        if let Err(e) = result {
            tracing::error!(worker = name, error = %e, "Worker panicked");
        }
    }

    tracing::info!(memories = store.len().await, "Parley stopped");
    // A pending terminal read keeps the runtime alive until the next line
    eprintln!("Press Enter to exit.");
    Ok(())
}

fn show_config(config: Option<&ParleyConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    println!("{}", config.to_toml()?);
    Ok(())
}
