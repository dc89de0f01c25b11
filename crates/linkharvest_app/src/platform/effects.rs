use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use linkharvest_core::{BatchCounts, Effect, LinkRow, Msg, NamingMode, TaskResultKind};
use linkharvest_engine::{
    BatchOutcome, BatchSummary, EngineConfig, EngineError, EngineEvent, EngineHandle, LinkRecord,
    TaskOutcome,
};

use super::opener;

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, msg_tx: mpsc::Sender<Msg>) -> Result<Self, EngineError> {
        let engine = EngineHandle::new(config)?;
        let runner = Self { engine };
        runner.spawn_event_loop(msg_tx);
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartHarvest {
                    source,
                    manifest_path,
                } => {
                    engine_info!("StartHarvest source={:?}", source);
                    self.engine.harvest(source, manifest_path);
                }
                Effect::StartDownloads {
                    links,
                    output_dir,
                    naming,
                } => {
                    let records = links.into_iter().enumerate().map(to_record).collect();
                    self.engine
                        .start_downloads(records, output_dir, map_naming(naming));
                }
                Effect::Cancel => {
                    engine_info!("Cancellation requested by user");
                    self.engine.cancel();
                }
                Effect::OpenFolder { path } => {
                    if let Err(err) = opener::open_folder(&path) {
                        engine_warn!("Could not open {:?}: {}", path, err);
                    }
                }
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
                if msg_tx.send(map_event(event)).is_err() {
                    break;
                }
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::HarvestCompleted(result) => match result {
            Ok(report) => Msg::HarvestCompleted {
                result: Ok(report.links.into_iter().map(to_row).collect()),
                manifest: report.manifest,
            },
            Err(message) => Msg::HarvestCompleted {
                result: Err(message),
                manifest: None,
            },
        },
        EngineEvent::TaskStarted { index, .. } => Msg::TaskStarted { index },
        EngineEvent::TaskProgress { index, percent } => Msg::TaskProgress { index, percent },
        EngineEvent::TaskFinished { index, outcome } => Msg::TaskFinished {
            index,
            result: map_outcome(outcome),
        },
        EngineEvent::BatchFinished(summary) => map_summary(summary),
    }
}

fn map_outcome(outcome: TaskOutcome) -> TaskResultKind {
    match outcome {
        TaskOutcome::Completed { .. } => TaskResultKind::Completed,
        TaskOutcome::Failed { message } => TaskResultKind::Failed(message),
        TaskOutcome::Cancelled => TaskResultKind::Cancelled,
    }
}

fn map_summary(summary: BatchSummary) -> Msg {
    Msg::BatchFinished {
        counts: BatchCounts {
            completed: summary.completed,
            failed: summary.failed,
            cancelled: summary.cancelled,
        },
        cancelled: summary.outcome == BatchOutcome::Cancelled,
    }
}

fn map_naming(naming: NamingMode) -> linkharvest_engine::NamingMode {
    match naming {
        NamingMode::ByTitle => linkharvest_engine::NamingMode::ByTitle,
        NamingMode::ByUrl => linkharvest_engine::NamingMode::ByUrl,
    }
}

fn to_row(record: LinkRecord) -> LinkRow {
    LinkRow {
        url: record.url,
        title: record.title,
    }
}

fn to_record((order, row): (usize, LinkRow)) -> LinkRecord {
    LinkRecord {
        url: row.url,
        title: row.title,
        order,
    }
}
