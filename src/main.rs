use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use chattyio::connector::tui;
use chattyio::{
    ApiKey, ApiKeyHandle, AppConfig, CompletionClient, JsonSettingsStore, MockCompletionClient,
    OpenAiCompletionClient, TurnOrchestrator, UpdateApiKeyUseCase,
};

const LOG_FILE_NAME: &str = "chattyio.log";

#[derive(Parser)]
#[command(name = "chattyio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, default_value = "~/.chattyio")]
    data_dir: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat screen (default)
    Chat {
        /// Answer with an offline echo client instead of the remote API
        #[arg(long)]
        mock: bool,
    },

    /// Store the API key used for completions
    SetKey { key: String },

    /// Send a single prompt and print the reply
    Ask { prompt: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let data_dir = PathBuf::from(expand_tilde(&cli.data_dir));
    std::fs::create_dir_all(&data_dir)?;
    let config_path = AppConfig::path_in(&data_dir);

    match cli.command.unwrap_or(Commands::Chat { mock: false }) {
        Commands::Chat { mock } => {
            // The terminal UI owns the screen, so logs go to a file.
            init_file_logging(level, &data_dir)?;

            let (client, handle) = if mock {
                info!("Using mock completion client");
                let client: Arc<dyn CompletionClient> = Arc::new(MockCompletionClient::echo());
                (client, ApiKeyHandle::new(ApiKey::new("offline")?))
            } else {
                build_remote(&config_path)?
            };

            let orchestrator = TurnOrchestrator::new(client, handle.clone());
            let store = Arc::new(JsonSettingsStore::new(&config_path));
            let settings = UpdateApiKeyUseCase::new(store, handle);

            tui::run(orchestrator, settings).await?;
        }

        Commands::SetKey { key } => {
            init_stderr_logging(level)?;

            let store = Arc::new(JsonSettingsStore::new(&config_path));
            let handle = ApiKeyHandle::new(ApiKey::new(key.as_str())?);
            UpdateApiKeyUseCase::new(store, handle)
                .execute(&key)
                .await?;
            println!("API key saved to {}", config_path.display());
        }

        Commands::Ask { prompt } => {
            init_stderr_logging(level)?;

            let (client, handle) = build_remote(&config_path)?;
            let mut orchestrator = TurnOrchestrator::new(client, handle);

            if !orchestrator.submit(&prompt).await? {
                println!("Nothing to send.");
                return Ok(());
            }
            if let Some(reply) = orchestrator.conversation().last() {
                println!("{}", reply.content());
            }
        }
    }

    Ok(())
}

/// Load the config file and build the HTTP client. Any configuration problem
/// is fatal.
fn build_remote(config_path: &Path) -> Result<(Arc<dyn CompletionClient>, ApiKeyHandle)> {
    let config = AppConfig::load(config_path)?;
    let api_key = config.api_key()?;

    info!(
        "Using completion endpoint {} with model {}",
        config.base_url(),
        config.model()
    );

    let client = OpenAiCompletionClient::new(config.model(), config.base_url())
        .with_max_tokens(config.max_tokens());
    Ok((Arc::new(client), ApiKeyHandle::new(api_key)))
}

fn init_stderr_logging(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn init_file_logging(level: Level, data_dir: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE_NAME))?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
