//! NeuroCrypt CLI - run behavioral capture sessions from a terminal
//!
//! Commands:
//! - enroll: capture a session and register it as the user's baseline
//! - verify: capture a session and verify it against the stored baseline
//! - status: print the stored profile for a user
//! - logout: remove a user's session on the scoring service
//!
//! During capture, input events are read from stdin as NDJSON
//! (`{"kind":"key"}` or `{"kind":"pointer","x":10,"y":20}`); a blank line
//! counts as a keystroke. Events are timestamped on arrival.

use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use neurocrypt_session::dashboard::Dashboard;
use neurocrypt_session::navigation::Navigator;
use neurocrypt_session::{
    HttpScoringClient, InjectMode, InputEvent, Mode, SessionConfig, SessionController,
    SessionError, SessionReport, SessionState, VERSION,
};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// NeuroCrypt - cognitive-behavioral authentication sessions
#[derive(Parser)]
#[command(name = "neurocrypt")]
#[command(version = VERSION)]
#[command(about = "Capture behavioral sessions and enroll or verify identities", long_about = None)]
struct Cli {
    /// Scoring service base URL (defaults to NEUROCRYPT_API_URL or http://127.0.0.1:5000)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a session and register it as a new baseline
    Enroll {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Capture a session and verify it against an existing baseline
    Verify {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Show the stored profile for a user
    Status {
        #[arg(short, long)]
        user: String,
    },

    /// Log a user out
    Logout {
        #[arg(short, long)]
        user: String,
    },
}

#[derive(clap::Args)]
struct SessionArgs {
    /// User identifier
    #[arg(short, long)]
    user: String,

    /// Capture window in milliseconds
    #[arg(long)]
    window_ms: Option<u64>,

    /// Synthetic feature profile requested from the scorer
    #[arg(long, default_value = "normal")]
    inject_mode: InjectModeArg,
}

#[derive(Clone, ValueEnum)]
enum InjectModeArg {
    Normal,
    Anomalous,
}

impl From<InjectModeArg> for InjectMode {
    fn from(arg: InjectModeArg) -> Self {
        match arg {
            InjectModeArg::Normal => InjectMode::Normal,
            InjectModeArg::Anomalous => InjectMode::Anomalous,
        }
    }
}

/// One line of stdin input
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawInput {
    Key,
    Pointer { x: f64, y: f64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NEUROCRYPT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pretty = cli.pretty;

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            let error = CliError::from(e);
            let rendered = if pretty {
                serde_json::to_string_pretty(&error)
            } else {
                serde_json::to_string(&error)
            };
            eprintln!("{}", rendered.unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, SessionError> {
    let mut config = SessionConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_request_timeout_ms(timeout_ms);
    }

    match cli.command {
        Commands::Enroll { session } => cmd_session(Mode::Enroll, session, config, cli.pretty).await,
        Commands::Verify { session } => cmd_session(Mode::Verify, session, config, cli.pretty).await,
        Commands::Status { user } => {
            config.validate()?;
            let dashboard = Dashboard::new(Arc::new(HttpScoringClient::from_config(&config)));
            let profile = dashboard.load(&user).await?;
            print_json(&profile, cli.pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Logout { user } => {
            config.validate()?;
            let dashboard = Dashboard::new(Arc::new(HttpScoringClient::from_config(&config)));
            dashboard.logout(&user).await?;
            print_json(&serde_json::json!({ "uid": user, "logged_out": true }), cli.pretty)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_session(
    mode: Mode,
    args: SessionArgs,
    mut config: SessionConfig,
    pretty: bool,
) -> Result<ExitCode, SessionError> {
    if let Some(window_ms) = args.window_ms {
        config = config.with_capture_window_ms(window_ms);
    }
    config = config.with_inject_mode(args.inject_mode.into());
    config.validate()?;

    let service = Arc::new(HttpScoringClient::from_config(&config));
    let mut controller = SessionController::new(mode, service, config);

    let mut nav = Navigator::new();
    match mode {
        Mode::Enroll => nav.go_enroll(),
        Mode::Verify => nav.go_verify(),
    }

    if atty::is(atty::Stream::Stdin) {
        eprintln!("Type and press Enter to record keystrokes; capture ends automatically.");
    }

    let (input_tx, input_rx) = mpsc::channel(256);
    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let reader = tokio::spawn(read_inputs(input_tx));
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let result = controller
        .run(&args.user, input_rx, signal_tx, cancel)
        .await;
    reader.abort();
    interrupt.abort();
    let state = result?;

    while let Ok(signal) = signal_rx.try_recv() {
        nav.apply(&signal);
    }
    tracing::debug!(screen = ?nav.screen(), "navigation after session");

    let report: SessionReport = controller.report();
    print_json(&report, pretty)?;

    Ok(match state {
        SessionState::Succeeded => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn read_inputs(tx: mpsc::Sender<InputEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        };
        let at = Utc::now();
        let trimmed = line.trim();

        let event = if trimmed.is_empty() || !trimmed.starts_with('{') {
            InputEvent::Key { at }
        } else {
            match serde_json::from_str::<RawInput>(trimmed) {
                Ok(RawInput::Key) => InputEvent::Key { at },
                Ok(RawInput::Pointer { x, y }) => InputEvent::Pointer { x, y, at },
                Err(e) => {
                    tracing::warn!(error = %e, line = trimmed, "skipping malformed input");
                    continue;
                }
            }
        };

        if tx.send(event).await.is_err() {
            break;
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<(), SessionError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

// Error types

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        let message = e.to_string();
        match e {
            SessionError::Validation(_) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message,
                hint: Some("Pass a non-empty --user".to_string()),
            },
            SessionError::Timeout { .. }
            | SessionError::Transport(_)
            | SessionError::Status { .. }
            | SessionError::Decode(_) => CliError {
                code: "NETWORK_ERROR".to_string(),
                message,
                hint: Some(
                    "Check your connection and that the scoring service is running (--base-url)"
                        .to_string(),
                ),
            },
            SessionError::Load(_) => CliError {
                code: "LOAD_ERROR".to_string(),
                message,
                hint: Some("Check that the user is enrolled".to_string()),
            },
            SessionError::Json(_) => CliError {
                code: "JSON_ERROR".to_string(),
                message,
                hint: Some("Check JSON syntax".to_string()),
            },
            SessionError::InvalidTransition { .. } => CliError {
                code: "INVALID_STATE".to_string(),
                message,
                hint: None,
            },
        }
    }
}
