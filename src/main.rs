/// Entry point and frame loop.
///
/// Each frame: drain keyboard and gamepad commands, feed them to the
/// session one at a time, turn the recorded outcomes into sounds and a
/// status line, redraw.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use shapeshift::config::{GameConfig, LogConfig};
use shapeshift::sim::sequencer::Sequencer;
use shapeshift::sim::session::{RecordingSink, Session};
use shapeshift::sim::sources;
use shapeshift::ui::gamepad::GamepadState;
use shapeshift::ui::input::{Command, InputState};
use shapeshift::ui::renderer::{status_for, Hud, Renderer};
use shapeshift::ui::sound::{cues_for, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(16);
const MESSAGE_TTL: Duration = Duration::from_secs(3);

fn main() -> ExitCode {
    let config = GameConfig::load();

    // Dropped at the end of main, which flushes the log file.
    let _log_guard = match setup_logging(&config.log) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };
    for problem in &config.problems {
        warn!("config: {problem}");
    }

    match run(&config) {
        Ok(()) => {
            println!("Thanks for playing Shapeshift!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            eprintln!("shapeshift: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// File-only logging: the terminal belongs to the renderer.
/// Log lines are written until the returned guard is dropped.
fn setup_logging(cfg: &LogConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&cfg.dir)
        .with_context(|| format!("creating log dir {}", cfg.dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&cfg.dir, "shapeshift.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins over the configured default.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&cfg.filter))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    info!(log = %cfg.dir.join("shapeshift.log").display(), "logging initialized");
    Ok(guard)
}

fn run(config: &GameConfig) -> Result<()> {
    let sources = sources::discover(&config.levels);
    let sequencer = Sequencer::new(sources, config.parse_options())
        .context("no playable level")?;
    let mut session = Session::new(sequencer, RecordingSink::default());

    let mut renderer = Renderer::new(&config.display);
    renderer.init().context("terminal init failed")?;

    let sound = SoundEngine::new();
    if sound.is_none() {
        info!("no audio output, playing silently");
    }

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), config);

    // Restore the terminal before any error reaches the user.
    let cleanup = renderer.cleanup().context("terminal cleanup failed");
    result.and(cleanup)
}

/// Transient status line with an expiry.
struct StatusLine {
    text: String,
    since: Instant,
}

impl StatusLine {
    fn set(&mut self, text: String) {
        self.text = text;
        self.since = Instant::now();
    }

    fn tick(&mut self) {
        if !self.text.is_empty() && self.since.elapsed() >= MESSAGE_TTL {
            self.text.clear();
        }
    }
}

fn game_loop(
    session: &mut Session<RecordingSink>,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut status = StatusLine { text: String::new(), since: Instant::now() };
    let seq = session.sequencer();
    status.set(format!("Level {}: {}", seq.current_index() + 1, seq.current_name()));

    loop {
        let mut commands = kb.drain_commands();
        commands.extend(gp.drain_commands());

        for cmd in commands {
            match cmd {
                Command::Quit => return Ok(()),
                Command::Move(dir) => {
                    session.request_move(dir)?;
                }
                Command::CycleForm => {
                    session.request_cycle_form();
                }
                Command::Reload => {
                    session.request_reload()?;
                }
            }
        }

        let (outcomes, loaded) = session.sink_mut().drain();
        for outcome in &outcomes {
            if let Some(sfx) = sound {
                for cue in cues_for(outcome) {
                    sfx.play(cue);
                }
            }
            if let Some(text) = status_for(outcome) {
                status.set(text);
            }
        }
        for (index, name) in loaded {
            status.set(format!("Level {}: {name}", index + 1));
        }
        status.tick();

        let hud = Hud {
            level_index: session.sequencer().current_index(),
            level_count: session.sequencer().len(),
            level_name: session.sequencer().current_name(),
            message: &status.text,
            pad_connected: gp.connected,
        };
        renderer.render(session.world(), &hud)?;
        std::thread::sleep(FRAME_SLEEP);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_lines_reach_the_file_when_the_guard_drops() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = LogConfig { dir: tmp.path().join("logs"), filter: "info".into() };

        let guard = setup_logging(&cfg).unwrap();
        tracing::error!("fatal: last words");
        drop(guard);

        let text = std::fs::read_to_string(cfg.dir.join("shapeshift.log")).unwrap();
        assert!(text.contains("logging initialized"));
        assert!(text.contains("fatal: last words"));
    }
}
