//! steam-status: headless host for the Steam status indicator.
//!
//! Renders the indicator as text and drives the engine from the terminal.
//!
//! ## Subcommands
//!
//! - `run`: Start the engine and accept status commands on stdin
//! - `poll`: Fetch presence once and print the resolved status
//! - `set`: Change status through the OS `steam://` handler
//! - `validate`: Check the saved settings
//! - `config`: Print effective settings as JSON

mod launcher;
mod logging;
mod surface;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use steam_status_core::{
    extract_persona_state, resolve_persona, ui_channel, HostServices, JsonSettingsFile, NoTheme,
    PresenceClient, Settings, SettingsStore, Status, StatusEngine, StatusError, SteamWebClient,
    StorageConfig, UiPump,
};

use crate::launcher::SystemLauncher;
use crate::surface::TerminalSurface;

const PUMP_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "steam-status")]
#[command(about = "Steam presence indicator")]
#[command(version)]
struct Cli {
    /// Settings file (default: ~/.steam-status/settings.json)
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Presence endpoint base URL
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the engine; reads online|away|busy|invisible|offline|menu|poll|quit from stdin
    Run,

    /// Fetch presence once and print the persona code and resolved status
    Poll,

    /// Set status through the OS steam:// handler
    Set {
        #[arg(value_name = "STATUS")]
        status: Status,
    },

    /// Print validation errors for the saved settings (exit code 1 if any)
    Validate,

    /// Print effective settings as JSON with the API key masked
    Config,
}

fn main() -> ExitCode {
    let storage = StorageConfig::default();
    let _logging_guard = logging::init(&storage.logs_dir());
    let cli = Cli::parse();

    let settings_file = match &cli.settings {
        Some(path) => JsonSettingsFile::new(path.clone()),
        None => JsonSettingsFile::from_storage(&storage),
    };

    let result = match cli.command {
        Commands::Run => run(settings_file, cli.base_url.as_deref()),
        Commands::Poll => poll(settings_file, cli.base_url.as_deref()),
        Commands::Set { status } => set(settings_file, status),
        Commands::Validate => return validate(settings_file),
        Commands::Config => config(settings_file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "steam-status failed");
            eprintln!("steam-status: {err}");
            ExitCode::FAILURE
        }
    }
}

fn presence_client(base_url: Option<&str>) -> steam_status_core::Result<SteamWebClient> {
    match base_url {
        Some(url) => SteamWebClient::with_base_url(url),
        None => SteamWebClient::new(),
    }
}

fn load_settings(settings_file: JsonSettingsFile) -> Settings {
    SettingsStore::load(Arc::new(settings_file), Arc::new(NoTheme))
        .values()
        .clone()
}

fn start_engine(
    settings_file: JsonSettingsFile,
    presence: Arc<dyn PresenceClient>,
) -> (StatusEngine, UiPump) {
    let (executor, pump) = ui_channel();
    let engine = StatusEngine::start(HostServices {
        persistence: Arc::new(settings_file),
        theme: Arc::new(NoTheme),
        launcher: Arc::new(SystemLauncher),
        presence,
        executor: Arc::new(executor),
    });
    (engine, pump)
}

fn run(settings_file: JsonSettingsFile, base_url: Option<&str>) -> steam_status_core::Result<()> {
    let (engine, pump) = start_engine(settings_file, Arc::new(presence_client(base_url)?));
    let engine = Arc::new(engine);
    let done = Arc::new(AtomicBool::new(false));

    let report = engine.validate();
    for error in &report.errors {
        eprintln!("settings: {error}");
    }
    engine.refresh_icon();

    let input = {
        let engine = engine.clone();
        let done = done.clone();
        thread::Builder::new()
            .name("stdin-commands".into())
            .spawn(move || {
                read_commands(&engine);
                done.store(true, Ordering::SeqCst);
            })
            .map_err(|source| StatusError::Io {
                path: PathBuf::from("<stdin>"),
                source,
            })?
    };

    // This thread owns the surface; everything else only queues updates.
    let mut surface = TerminalSurface::new(io::stdout());
    while !done.load(Ordering::SeqCst) {
        pump.pump_one(&mut surface, PUMP_INTERVAL);
    }
    pump.drain(&mut surface);

    if input.join().is_err() {
        tracing::error!("Command reader panicked");
    }
    engine.shutdown();
    Ok(())
}

fn read_commands(engine: &StatusEngine) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let command = line.trim().to_ascii_lowercase();
        match command.as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "menu" => engine.open_menu(),
            "poll" => match engine.poll_now() {
                Ok(outcome) => eprintln!("poll: {outcome:?}"),
                Err(err) => eprintln!("poll: {err}"),
            },
            other => match other.parse::<Status>() {
                // Failures are already shown as a notice on the surface.
                Ok(status) => {
                    let _ = engine.set_manual(status);
                }
                Err(err) => eprintln!("{err}"),
            },
        }
    }
}

fn poll(settings_file: JsonSettingsFile, base_url: Option<&str>) -> steam_status_core::Result<()> {
    let settings = load_settings(settings_file);
    if !settings.has_credentials() {
        return Err(StatusError::MissingCredentials);
    }

    let client = presence_client(base_url)?;
    let payload = client.fetch(settings.api_key.trim(), settings.steam_id.trim())?;
    match extract_persona_state(&payload) {
        Some(code) => println!("personastate={code} status={}", resolve_persona(code)),
        None => println!("personastate not found"),
    }
    Ok(())
}

fn set(settings_file: JsonSettingsFile, status: Status) -> steam_status_core::Result<()> {
    let (engine, pump) = start_engine(settings_file, Arc::new(NoPresence));
    let result = engine.set_manual(status);
    engine.shutdown();

    let mut surface = TerminalSurface::new(io::stdout());
    pump.drain(&mut surface);
    result
}

fn validate(settings_file: JsonSettingsFile) -> ExitCode {
    let path = settings_file.path().display().to_string();
    let report = load_settings(settings_file).validate();
    if report.is_ok() {
        println!("{path}: OK");
        return ExitCode::SUCCESS;
    }
    for error in &report.errors {
        println!("{path}: {error}");
    }
    ExitCode::FAILURE
}

fn config(settings_file: JsonSettingsFile) -> steam_status_core::Result<()> {
    let mut settings = load_settings(settings_file);
    settings.api_key = mask_secret(&settings.api_key);
    let json = serde_json::to_string_pretty(&settings).map_err(|source| StatusError::Json {
        context: "serializing settings".to_string(),
        source,
    })?;
    println!("{json}");
    Ok(())
}

/// Keeps the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}

/// Presence client for one-shot commands that never poll.
struct NoPresence;

impl PresenceClient for NoPresence {
    fn fetch(&self, _api_key: &str, _steam_id: &str) -> steam_status_core::Result<String> {
        Err(StatusError::WorkerStopped("presence disabled"))
    }
}
