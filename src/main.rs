use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use live_minutes::{
    BackendEvent, Command, Config, FileStore, HistoryLog, ManualClock, Script, SessionController,
};

/// Streaming meeting minutes: segments live recognition results into a
/// durable, time-stamped transcript log.
#[derive(Debug, Parser)]
#[command(name = "live-minutes", version)]
struct Args {
    /// Config file (without extension)
    #[arg(long, default_value = "config/live-minutes")]
    config: String,

    /// Replay a scripted backend event file (JSON) through the core
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Write the history log as plain text to this file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Clear the persisted history log first
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Split interval: {}s, restart delay: {}ms",
        cfg.transcript.split_interval_secs, cfg.transcript.restart_delay_ms
    );

    let store = FileStore::open(&cfg.storage.data_dir)?;
    let mut history = HistoryLog::load_or_default(Box::new(store), cfg.storage.history_key.clone())?;

    if args.clear {
        history.clear()?;
        info!("History cleared");
    }

    if let Some(script_path) = &args.replay {
        history = replay_script(script_path, &cfg, history)?;
    }

    info!("History contains {} entries", history.len());

    if let Some(export_path) = &args.export {
        let mut text = history.render_plain();
        text.push('\n');
        std::fs::write(export_path, text)
            .with_context(|| format!("Failed to write {}", export_path.display()))?;
        info!(
            "Exported {} entries to {}",
            history.len(),
            export_path.display()
        );
    }

    Ok(())
}

/// Replay a script synchronously against a manual clock: each scripted delay
/// advances the clock, and backend cycling (stop, scheduled restart, next
/// session) is simulated in place.
fn replay_script(path: &PathBuf, cfg: &Config, history: HistoryLog) -> Result<HistoryLog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let script: Script = serde_json::from_str(&json).context("Failed to parse script")?;

    info!("Replaying {} scripted sessions", script.sessions.len());

    let clock = Arc::new(ManualClock::new());
    let mut controller = SessionController::new(cfg.session_config(), clock.clone(), history);

    // start_recording issues StartBackend; each loop iteration is one
    // backend session.
    let _ = controller.start_recording();

    'sessions: for events in script.sessions {
        let _ = controller.handle_event(BackendEvent::SessionStarted);

        for scripted in events {
            clock.advance(scripted.delay_ms);
            match controller.handle_event(scripted.event) {
                Some(Command::StopBackend) => {
                    // Policy cut (or hard stop): the engine ends, then the
                    // scheduled restart brings up the next session.
                    if !simulate_cycle(&mut controller, &clock) {
                        break 'sessions;
                    }
                    continue 'sessions;
                }
                Some(Command::RestartBackendAfter { delay, generation }) => {
                    // Engine ended on its own mid-script.
                    clock.advance(delay.as_millis() as u64);
                    if controller.confirm_restart(generation).is_none() {
                        break 'sessions;
                    }
                    continue 'sessions;
                }
                _ => {}
            }
            if !controller.is_recording() {
                break 'sessions;
            }
        }
    }

    let _ = controller.stop_recording();
    Ok(controller.into_history())
}

/// Feed the engine's end-of-session signal and honor the scheduled restart.
/// Returns false when the controller has given up on the recording.
fn simulate_cycle(controller: &mut SessionController, clock: &ManualClock) -> bool {
    match controller.handle_event(BackendEvent::SessionEnded) {
        Some(Command::RestartBackendAfter { delay, generation }) => {
            clock.advance(delay.as_millis() as u64);
            controller.confirm_restart(generation).is_some()
        }
        _ => false,
    }
}
