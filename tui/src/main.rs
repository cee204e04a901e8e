//! Delphi TUI Entry Point
//!
//! Launches the terminal chat client for a hosted Delphi clone.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (hosted backend, demo roster)
//! delphi-tui
//!
//! # Start with a user already selected
//! delphi-tui --user avtar
//!
//! # Another backend, conversations kept in memory only
//! delphi-tui --base-url http://localhost:3000 --no-persist
//!
//! # Print the roster and exit
//! delphi-tui --list-users
//!
//! # Verbose logging (written to the log file, not the terminal)
//! RUST_LOG=debug delphi-tui
//! ```

use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delphi_core::config::{load_config_from_path, ConfigOverrides};
use delphi_core::users::find_by_name;
use delphi_core::{
    ChatConfig, ChatController, ConversationCache, DelphiClient, FileStore, MemoryStore,
};
use delphi_tui::{App, SessionClient};

/// Delphi TUI - Chat with a hosted Delphi clone from the terminal
#[derive(Parser, Debug)]
#[command(name = "delphi-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "DELPHI_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Application slug
    #[arg(long)]
    slug: Option<String>,

    /// Conversation store file
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Keep conversation ids in memory only
    #[arg(long, conflicts_with = "store")]
    no_persist: bool,

    /// Pre-select a user by name (case-insensitive)
    #[arg(short = 'u', long, value_name = "NAME")]
    user: Option<String>,

    /// Log file path
    #[arg(long, env = "DELPHI_LOG_FILE", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the user roster and exit
    #[arg(long)]
    list_users: bool,
}

/// Default log location: `$XDG_CACHE_HOME/delphi-chat/tui.log`
fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("delphi-chat").join("tui.log"))
}

/// Send logs to a file; the terminal is in raw mode
fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {parent:?}"))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {path:?}"))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("delphi_tui=info,delphi_core=info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter)
        .init();

    Ok(())
}

/// Load and validate configuration, then apply CLI overrides
fn build_config(args: &Args) -> Result<ChatConfig> {
    let path = args
        .config
        .clone()
        .or_else(delphi_core::config::default_config_path);
    let mut config = load_config_from_path(path)?;

    let mut overrides = ConfigOverrides::new();
    if let Some(ref url) = args.base_url {
        overrides = overrides.with_base_url(url);
    }
    if let Some(ref slug) = args.slug {
        overrides = overrides.with_slug(slug);
    }
    if let Some(ref store) = args.store {
        overrides = overrides.with_store_path(store.clone());
    }
    if args.no_persist {
        overrides = overrides.with_no_persist();
    }
    overrides.apply(&mut config);

    config.validate()?;
    Ok(config)
}

fn build_cache(config: &ChatConfig) -> ConversationCache {
    match config.store_path {
        Some(ref path) => {
            tracing::info!(path = %path.display(), "using conversation file");
            ConversationCache::new(FileStore::new(path))
        }
        None => {
            tracing::info!("conversation ids kept in memory only");
            ConversationCache::new(MemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_file.clone().or_else(default_log_path))?;

    let config = build_config(&args)?;
    tracing::info!(
        source = %config.source(),
        base_url = %config.base_url,
        slug = %config.slug,
        "configuration loaded"
    );

    if args.list_users {
        for user in &config.users {
            println!("{:<12} {:<28} {}", user.name, user.email, user.program_type);
        }
        return Ok(());
    }

    let initial_user = match args.user {
        Some(ref name) => match find_by_name(&config.users, name) {
            Some(index) => Some(index),
            None => bail!("No user named {name:?}; see --list-users"),
        },
        None => None,
    };

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: delphi-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  - Running in a non-interactive environment (CI, container)");
        eprintln!("  - SSH without -t flag");
        eprintln!("  - Piped stdin/stdout");
        eprintln!();
        eprintln!("Use --list-users to inspect the configuration without a terminal.");
        std::process::exit(1);
    }

    let backend = Arc::new(DelphiClient::new(&config.client_config())?);
    let controller = ChatController::new(backend, build_cache(&config), &config);
    let mut app = App::new(SessionClient::new(controller), &config);
    if initial_user.is_some() {
        app.session_mut().select_user(initial_user);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Propagate any errors
    result
}
