use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::GenesisConfig;
use genesis_core::audio::wav_from_base64;
use genesis_core::{
    AgentResult, BigQueryClient, Dispatcher, GeminiTts, GoogleProvider, LlmProvider, UserProfile,
};
use genesis_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "genesis")]
#[command(version)]
#[command(about = "GENESIS: banking assistant agents over Gemini")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat gateway
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one chat message through an agent and print the JSON reply
    Ask {
        /// Agent type: GENERAL, SUPPORT, NEWS or ANALYST
        #[arg(short, long, default_value = "GENERAL")]
        agent: String,

        /// JSON file with the user profile
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Write the news narration to this WAV file
        #[arg(long)]
        audio_out: Option<PathBuf>,

        /// The message to send
        message: String,
    },

    /// Initialize config directory and default config
    Init,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config).await,
        Commands::Serve { port } => cmd_serve(&cli.config, port).await,
        Commands::Ask {
            agent,
            profile,
            audio_out,
            message,
        } => cmd_ask(&cli.config, &agent, profile.as_deref(), audio_out.as_deref(), &message).await,
    }
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        info!("Created default config at {}", config_path.display());
    }

    println!("GENESIS initialized at {}", config_dir.display());
    println!("Edit {} to configure your Google credentials.", config_path.display());
    Ok(())
}

async fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = GenesisConfig::load(config_path)?;
    println!("{}", toml::to_string_pretty(&cfg.redacted())?);
    Ok(())
}

fn build_dispatcher(cfg: &GenesisConfig) -> Result<Dispatcher> {
    let endpoint = cfg.gemini_endpoint()?;
    info!("Using {} via {}", cfg.model.name, endpoint.label());

    let provider: Arc<dyn LlmProvider> =
        Arc::new(GoogleProvider::new(endpoint, cfg.model.name.clone()));

    if cfg.google.access_token.is_empty() {
        warn!("No access token configured; the analyst agent will use mock transactions");
    }
    let warehouse = Arc::new(BigQueryClient::new(
        cfg.google.project.clone(),
        cfg.analyst.location.clone(),
        cfg.google.access_token.clone(),
        cfg.analyst.table.clone(),
    ));

    let tts = Arc::new(GeminiTts::new(provider.clone(), cfg.speech_config().voice));

    Ok(Dispatcher::new(provider, warehouse, tts, cfg.dispatcher_config()))
}

async fn cmd_serve(config_path: &Option<PathBuf>, port: Option<u16>) -> Result<()> {
    let cfg = GenesisConfig::load(config_path)?;
    let bind = cfg.bind_addr(port)?;
    let dispatcher = Arc::new(build_dispatcher(&cfg)?);

    info!("Starting GENESIS gateway...");
    GatewayServer::new(bind, dispatcher)
        .run_until(async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down...");
        })
        .await
}

async fn cmd_ask(
    config_path: &Option<PathBuf>,
    agent: &str,
    profile_path: Option<&Path>,
    audio_out: Option<&Path>,
    message: &str,
) -> Result<()> {
    let cfg = GenesisConfig::load(config_path)?;
    let dispatcher = build_dispatcher(&cfg)?;

    let profile = match profile_path {
        Some(path) => Some(load_profile(path).await?),
        None => None,
    };

    let result = dispatcher
        .generate_response(agent, message, profile.as_ref())
        .await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(out) = audio_out {
        write_audio(&result, out, cfg.speech_config().sample_rate).await?;
    }
    Ok(())
}

async fn load_profile(path: &Path) -> Result<UserProfile> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read profile at {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse profile at {}", path.display()))
}

/// Save the news narration as WAV. Returns whether a file was written.
async fn write_audio(result: &AgentResult, out: &Path, sample_rate: u32) -> Result<bool> {
    let audio = match result {
        AgentResult::News(reply) => reply.audio_base64.as_deref(),
        _ => None,
    };
    let Some(audio) = audio else {
        warn!("Reply carries no audio; nothing written to {}", out.display());
        return Ok(false);
    };

    let wav = wav_from_base64(audio, sample_rate)?;
    tokio::fs::write(out, &wav)
        .await
        .with_context(|| format!("Failed to write audio to {}", out.display()))?;
    info!("Wrote {} bytes of audio to {}", wav.len(), out.display());
    Ok(true)
}
