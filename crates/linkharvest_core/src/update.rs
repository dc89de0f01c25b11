use crate::{AppState, Effect, Msg, Notice, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::HarvestRequested {
            source,
            manifest_path,
        } => match state.session() {
            SessionState::Harvesting | SessionState::Running => {
                state.set_notice(Notice::HarvestRejected);
                Vec::new()
            }
            SessionState::Idle
            | SessionState::Ready
            | SessionState::Completed
            | SessionState::Cancelled => {
                state.begin_harvest(source.clone());
                vec![Effect::StartHarvest {
                    source,
                    manifest_path,
                }]
            }
        },
        Msg::HarvestCompleted { result, manifest } => {
            // A late result after the user moved on is dropped.
            if state.session() == SessionState::Harvesting {
                state.finish_harvest(result, manifest);
            }
            Vec::new()
        }
        Msg::DownloadRequested { output_dir, naming } => match state.session() {
            SessionState::Ready | SessionState::Completed | SessionState::Cancelled
                if !state.links().is_empty() =>
            {
                state.begin_batch(output_dir.clone());
                vec![Effect::StartDownloads {
                    links: state.links().to_vec(),
                    output_dir,
                    naming,
                }]
            }
            _ => {
                state.set_notice(Notice::DownloadRejected);
                Vec::new()
            }
        },
        Msg::CancelRequested => {
            if state.session() == SessionState::Running && state.request_cancel() {
                vec![Effect::Cancel]
            } else {
                Vec::new()
            }
        }
        Msg::TaskStarted { index } => {
            if state.session() == SessionState::Running {
                state.apply_started(index);
            }
            Vec::new()
        }
        Msg::TaskProgress { index, percent } => {
            if state.session() == SessionState::Running {
                state.apply_progress(index, percent);
            }
            Vec::new()
        }
        Msg::TaskFinished { index, result } => {
            if state.session() == SessionState::Running {
                state.apply_finished(index, result);
            }
            Vec::new()
        }
        Msg::BatchFinished { counts, cancelled } => {
            if state.session() == SessionState::Running {
                state.finish_batch(counts, cancelled);
            }
            Vec::new()
        }
        Msg::OpenFolderRequested => match state.output_dir() {
            Some(path) => vec![Effect::OpenFolder {
                path: path.to_path_buf(),
            }],
            None => Vec::new(),
        },
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
