use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::Context;
use engine_logging::engine_info;
use linkharvest_core::{update, AppState, Msg, Notice, SessionState};

use super::config::RunSettings;
use super::console::ConsoleRenderer;
use super::effects::EffectRunner;

const TICK_INTERVAL: Duration = Duration::from_millis(75);
const EXIT_TASK_FAILURES: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

pub fn run(settings: RunSettings) -> anyhow::Result<ExitCode> {
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(settings.engine.clone(), msg_tx.clone())
        .context("failed to start the download engine")?;

    let cancel_tx = msg_tx.clone();
    ctrlc::set_handler(move || {
        let _ = cancel_tx.send(Msg::CancelRequested);
    })
    .context("failed to install the Ctrl+C handler")?;

    let mut driver = Driver::new(settings, runner);
    driver.dispatch(Msg::HarvestRequested {
        source: driver.settings.source.clone(),
        manifest_path: Some(driver.settings.manifest_path.clone()),
    });

    loop {
        let msg = match msg_rx.recv_timeout(TICK_INTERVAL) {
            Ok(msg) => msg,
            Err(RecvTimeoutError::Timeout) => Msg::Tick,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        driver.dispatch(msg);
        if let Some(code) = driver.next_step() {
            return Ok(code);
        }
    }
    Ok(ExitCode::FAILURE)
}

/// Owns the controller state and feeds effects to the engine.
struct Driver {
    settings: RunSettings,
    state: AppState,
    runner: EffectRunner,
    console: ConsoleRenderer,
    download_sent: bool,
    interrupted: bool,
}

impl Driver {
    fn new(settings: RunSettings, runner: EffectRunner) -> Self {
        Self {
            settings,
            state: AppState::new(),
            runner,
            console: ConsoleRenderer::default(),
            download_sent: false,
            interrupted: false,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        // Outside a batch there is nothing to cancel, so Ctrl+C just quits.
        if msg == Msg::CancelRequested && self.state.session() != SessionState::Running {
            self.interrupted = true;
        }
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.console.render(&state.view());
        }
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Advances the scripted flow; returns the exit code once the run is over.
    fn next_step(&mut self) -> Option<ExitCode> {
        if self.interrupted {
            return Some(ExitCode::from(EXIT_INTERRUPTED));
        }
        match self.state.session() {
            SessionState::Idle => {
                let failed = matches!(self.state.view().notice, Some(Notice::HarvestFailed(_)));
                Some(if failed {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                })
            }
            SessionState::Ready if self.settings.list_only => Some(ExitCode::SUCCESS),
            SessionState::Ready if !self.download_sent => {
                self.download_sent = true;
                self.dispatch(Msg::DownloadRequested {
                    output_dir: self.settings.output_dir.clone(),
                    naming: self.settings.naming,
                });
                None
            }
            SessionState::Completed | SessionState::Cancelled => {
                if self.settings.open_folder {
                    self.dispatch(Msg::OpenFolderRequested);
                }
                Some(self.exit_code())
            }
            _ => None,
        }
    }

    fn exit_code(&self) -> ExitCode {
        let view = self.state.view();
        let counts = view.counts.unwrap_or_default();
        engine_info!(
            "Run ended {}: {} completed, {} failed, {} cancelled",
            view.session,
            counts.completed,
            counts.failed,
            counts.cancelled
        );
        if view.session == SessionState::Cancelled {
            ExitCode::from(EXIT_INTERRUPTED)
        } else if counts.failed > 0 {
            ExitCode::from(EXIT_TASK_FAILURES)
        } else {
            ExitCode::SUCCESS
        }
    }
}
