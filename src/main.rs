//! Tabata Timer CLI - interval workouts in the terminal
//!
//! Runs Tabata-style sessions in the foreground:
//! - An optional prepare phase
//! - Rounds of work and rest
//! - Audio cues on every phase change and for the last three seconds

use std::future::Future;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;

use tabata::cli::{Cli, Commands, ConfigArgs, Display, PresetAction, SessionDisplay, StartArgs};
use tabata::presets::{Preset, PresetStore};
use tabata::session::{Control, SessionRunner};
use tabata::sound::{rodio_engine_factory, CuePlayer};
use tabata::timer::{MonotonicTimeSource, PhaseClock, TimeSource};
use tabata::types::SessionConfig;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so they never interleave with the session view.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Start(args)) => run_session(args).await?,
        Some(Commands::Total(args)) => {
            let store = preset_store(args.presets_file.as_deref());
            let config = build_session_config(&args.config, &store)?;
            Display::show_total(&config);
        }
        Some(Commands::Presets(args)) => {
            let store = preset_store(args.presets_file.as_deref());
            match args.action {
                PresetAction::List => {
                    let presets = store.load_all().context("Failed to load presets")?;
                    Display::show_presets(&presets);
                }
                PresetAction::Save { name, config } => {
                    let config = build_session_config(&config, &store)?;
                    let preset = Preset::new(name, config);
                    store.save(preset.clone()).context("Failed to save preset")?;
                    Display::show_preset_saved(&preset);
                }
                PresetAction::Remove { name } => {
                    let removed = store.remove(&name).context("Failed to remove preset")?;
                    Display::show_preset_removed(&name, removed);
                }
            }
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn preset_store(path: Option<&Path>) -> PresetStore {
    path.map_or_else(PresetStore::new, PresetStore::with_path)
}

/// Builds the session config from an optional preset plus explicit flags.
fn build_session_config(args: &ConfigArgs, store: &PresetStore) -> Result<SessionConfig> {
    let base = match &args.preset {
        Some(name) => store
            .find(name)
            .context("Failed to load presets")?
            .with_context(|| format!("No preset named '{}'", name))?
            .config(),
        None => SessionConfig::default(),
    };

    let config = args.apply(base);
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

/// Runs one session in the foreground until it completes or is stopped.
async fn run_session(args: StartArgs) -> Result<()> {
    let store = preset_store(args.presets_file.as_deref());
    let config = build_session_config(&args.config, &store)?;

    let time: Arc<dyn TimeSource> = Arc::new(MonotonicTimeSource);
    let cues = if args.no_sound {
        CuePlayer::disabled(time.clone())
    } else {
        CuePlayer::new(rodio_engine_factory(args.sounds_dir), time.clone())
    };
    let display = SessionDisplay::new(std::io::stdout());
    let mut runner = SessionRunner::new(PhaseClock::new(time), cues, Box::new(display));

    let (control_tx, control_rx) = mpsc::unbounded_channel();
    spawn_keyboard_controls(control_tx.clone());
    spawn_ctrl_c(control_tx);

    Display::show_session_start(&config);
    let outcome = runner.run(config, control_rx).await?;
    Display::show_outcome(outcome);
    Ok(())
}

/// Feeds stdin lines into the control channel.
///
/// Runs on a plain thread: a blocking stdin read must not hold up runtime
/// shutdown once the session is over.
fn spawn_keyboard_controls(tx: mpsc::UnboundedSender<Control>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if let Some(control) = Control::parse(&line) {
                if tx.send(control).is_err() {
                    break;
                }
            }
        }
    });
}

fn spawn_ctrl_c(tx: mpsc::UnboundedSender<Control>) {
    tokio::spawn(forward_interrupts(tokio::signal::ctrl_c, tx));
}

/// Sends a stop for every interrupt until the signal source fails or the
/// session has gone away.
async fn forward_interrupts<F, Fut>(mut next: F, tx: mpsc::UnboundedSender<Control>)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    while next().await.is_ok() {
        tracing::debug!("interrupt received");
        if tx.send(Control::Stop).is_err() {
            break;
        }
    }
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
