mod api;
mod config;
mod feedback;
mod serve;
mod sessions;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use agentview_logging::{init_tracing, LogFormat};

use crate::config::{FileConfig, Overrides, Settings};
use crate::feedback::FeedbackAction;
use crate::sessions::SessionsAction;

#[derive(Parser, Debug)]
#[command(
    name = "agentview",
    about = "Browse coding agent sessions and collect feedback on them",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: ./agentview.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding hook event logs
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log server to read events from instead of a directory
    #[arg(long, global = true, conflicts_with = "log_dir")]
    source_url: Option<String>,

    /// Feedback database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Tracing level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value = "pretty")]
    log_format: LogFormatChoice,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse agent sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },

    /// Record and analyze session feedback
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,
    },

    /// Run the HTTP API
    Serve {
        /// Port to listen on (default: 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open the sessions endpoint in a browser
        #[arg(long)]
        open: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match cli.config {
        Some(ref path) => FileConfig::load_from(path)?,
        None => {
            let working_dir =
                std::env::current_dir().context("Failed to get current directory")?;
            FileConfig::load(&working_dir)?.unwrap_or_default()
        }
    };

    let settings = Settings::resolve(
        file_config,
        Overrides {
            log_dir: cli.log_dir,
            source_url: cli.source_url,
            db_path: cli.db,
            log_level: cli.log_level,
        },
    );

    init_tracing(&settings.log_level, cli.log_format.into());

    match cli.command {
        Commands::Sessions { action } => sessions::handle_sessions_command(action, &settings).await,
        Commands::Feedback { action } => feedback::handle_feedback_command(action, &settings).await,
        Commands::Serve { port, open } => {
            let port = port.unwrap_or(settings.port);
            serve::handle_serve_command(&settings, port, open).await
        }
    }
}
