use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gembot_core::GeminiClient;
use gembot_line::LineClient;
use gembot_relay::config::AppConfig;
use gembot_relay::context::{
    ContextBackendRef, ContextStore, InMemoryContextBackend, RedisContextBackend,
};
use gembot_relay::dispatcher::EventDispatcher;
use gembot_relay::gateway::AiGateway;
use gembot_relay::http_server::{self, AppState};
use gembot_relay::profile::ProfileResolver;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gembot-daemon", about = "LINE webhook relay for Gemini")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gemini API key
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Gemini model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Cache service URL for conversation contexts
    #[arg(long)]
    cache_url: Option<String>,

    /// Address to bind the webhook server to (overrides the configured port)
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Starting gembot daemon");

    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config from file or use defaults
    let config_path = args
        .config
        .clone()
        .or_else(AppConfig::default_config_file);
    let mut config = match &config_path {
        Some(path) => match AppConfig::load_from_file(path) {
            Ok(cfg) => {
                info!("Loaded configuration from {}", path.display());
                cfg
            }
            Err(e) => {
                error!("Failed to load configuration from {}: {}", path.display(), e);
                return Err(anyhow::anyhow!("Configuration error: {}", e));
            }
        },
        None => AppConfig::default(),
    };

    config.apply_env_overrides();

    // CLI args win over file and environment
    if let Some(api_key) = args.api_key {
        config.gemini.api_key = Some(api_key);
    }
    if let Some(model) = args.model {
        config.gemini.model_name = Some(model);
    }
    if let Some(cache_url) = args.cache_url {
        config.cache_url = Some(cache_url);
    }

    if config.line.channel_access_token.is_empty() || config.line.channel_secret.is_empty() {
        anyhow::bail!("LINE channel access token and secret must be configured");
    }

    // Initialize the Gemini client
    let gemini_client = match GeminiClient::new(config.gemini.clone()) {
        Ok(client) => {
            info!("Initialized Gemini client");
            Arc::new(client)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize Gemini client");
            return Err(anyhow::anyhow!("Failed to initialize Gemini client: {}", e));
        }
    };

    let line_client = Arc::new(LineClient::new(config.line.channel_access_token.clone()));

    // Prefer the external cache; fall back to process-local memory when it
    // is not configured or unreachable.
    let backend: ContextBackendRef = match &config.cache_url {
        Some(url) => match RedisContextBackend::connect(url).await {
            Ok(backend) => Arc::new(backend),
            Err(e) => {
                warn!(error = %e, "Context cache unavailable, falling back to in-memory store");
                Arc::new(InMemoryContextBackend::new())
            }
        },
        None => {
            info!("No cache URL configured, using in-memory context store");
            Arc::new(InMemoryContextBackend::new())
        }
    };
    let store = ContextStore::new(backend);

    let profiles = ProfileResolver::new(Arc::clone(&line_client));
    let gateway = AiGateway::new(Arc::clone(&gemini_client), store, profiles.clone());

    let channel_secret = config.line.channel_secret.clone();
    let port = config.port;
    let dispatcher = EventDispatcher::new(Arc::new(config), line_client, gateway, profiles);

    let addr = args
        .listen
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], port)));

    http_server::run_server(AppState::new(channel_secret, dispatcher), addr).await
}
