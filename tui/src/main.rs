//! Ollama Chat Entry Point
//!
//! Launches the terminal chat UI against a local Ollama server.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (~/.config/ollama-chat/config.toml if present)
//! ollama-chat
//!
//! # Pick the startup model
//! ollama-chat --model mistral:latest
//!
//! # Remote server, don't try to launch one locally
//! ollama-chat --host gpu-box --port 11434 --no-manage-backend
//!
//! # Verbose logging to the log file
//! RUST_LOG=debug ollama-chat
//! ```

use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use chat_conductor::{default_config_path, load_config_from_path, ConfigOverrides, PromptMode};
use ollama_chat::{logging, App, ConductorClient};

/// Terminal chat interface for a local Ollama server
#[derive(Parser, Debug)]
#[command(name = "ollama-chat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, env = "OLLAMA_CHAT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ollama host, or a URL such as https://gpu-box:443
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Ollama port
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Model selected at startup
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Never check for or launch a local server process
    #[arg(long)]
    no_manage_backend: bool,

    /// How history is sent: flat or structured
    #[arg(long, value_name = "MODE")]
    prompt_mode: Option<PromptMode>,

    /// Log file path
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref host) = self.host {
            overrides = overrides.with_host(host.clone());
        }
        if let Some(port) = self.port {
            overrides = overrides.with_port(port);
        }
        if let Some(ref model) = self.model {
            overrides = overrides.with_default_model(model.clone());
        }
        if self.no_manage_backend {
            overrides = overrides.with_manage_backend(false);
        }
        if let Some(mode) = self.prompt_mode {
            overrides = overrides.with_prompt_mode(mode);
        }
        if let Some(ref path) = self.log_file {
            overrides = overrides.with_log_file(path.clone());
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(config_path.as_deref())
        .context("Failed to load configuration")?;
    cli.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;

    logging::init(&config.log_filter, config.log_file.as_deref())?;
    tracing::info!(source = %config.source(), url = %config.backend.base_url(), "Configuration loaded");

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: ollama-chat requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means stdin or stdout is piped, or the session");
        eprintln!("is non-interactive (CI, container, ssh without -t).");
        std::process::exit(1);
    }

    let client = ConductorClient::from_config(&config)?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
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

    let mut app = App::new(client);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if result.is_ok() {
        println!("{}", app.goodbye());
    }
    result
}
