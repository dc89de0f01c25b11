use std::path::PathBuf;
use std::sync::Once;

use linkharvest_core::{
    update, AppState, BatchCounts, Effect, LinkRow, Msg, NamingMode, Notice, RowStatus,
    SessionState, TaskResultKind,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn links() -> Vec<LinkRow> {
    ["a", "b", "c"]
        .iter()
        .map(|name| LinkRow {
            url: format!("https://{name}.example/{name}.pdf"),
            title: name.to_string(),
        })
        .collect()
}

fn ready_state() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::HarvestRequested {
            source: PathBuf::from("doc.pdf"),
            manifest_path: None,
        },
    );
    let (mut state, _) = update(
        state,
        Msg::HarvestCompleted {
            result: Ok(links()),
            manifest: None,
        },
    );
    state.consume_dirty();
    state
}

fn start(state: AppState) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::DownloadRequested {
            output_dir: PathBuf::from("out"),
            naming: NamingMode::ByTitle,
        },
    )
}

#[test]
fn download_request_starts_batch_with_all_links() {
    init_logging();
    let (state, effects) = start(ready_state());

    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(
        effects,
        vec![Effect::StartDownloads {
            links: links(),
            output_dir: PathBuf::from("out"),
            naming: NamingMode::ByTitle,
        }]
    );
}

#[test]
fn download_without_links_is_rejected() {
    init_logging();
    let (state, effects) = start(AppState::new());

    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(state.view().notice, Some(Notice::DownloadRejected));
}

#[test]
fn row_statuses_follow_task_events() {
    init_logging();
    let (state, _) = start(ready_state());
    let (state, _) = update(state, Msg::TaskStarted { index: 0 });
    assert_eq!(state.view().rows[0].status, RowStatus::Started);

    let (state, _) = update(state, Msg::TaskProgress { index: 0, percent: 40 });
    let (state, _) = update(
        state,
        Msg::TaskFinished {
            index: 0,
            result: TaskResultKind::Completed,
        },
    );
    let (state, _) = update(state, Msg::TaskStarted { index: 1 });
    let (state, _) = update(
        state,
        Msg::TaskFinished {
            index: 1,
            result: TaskResultKind::Failed("http status 404".to_string()),
        },
    );
    let (state, _) = update(state, Msg::TaskStarted { index: 2 });
    let (state, _) = update(
        state,
        Msg::TaskFinished {
            index: 2,
            result: TaskResultKind::Completed,
        },
    );
    let counts = BatchCounts {
        completed: 2,
        failed: 1,
        cancelled: 0,
    };
    let (state, _) = update(
        state,
        Msg::BatchFinished {
            counts,
            cancelled: false,
        },
    );
    let view = state.view();

    let labels: Vec<String> = view.rows.iter().map(|r| r.status.to_string()).collect();
    assert_eq!(labels, vec!["done", "error: http status 404", "done"]);
    assert_eq!(view.session, SessionState::Completed);
    assert_eq!(view.counts, Some(counts));
    assert_eq!(view.notice, Some(Notice::BatchCompleted(counts)));
}

#[test]
fn progress_never_moves_backwards() {
    init_logging();
    let (state, _) = start(ready_state());
    let (state, _) = update(state, Msg::TaskStarted { index: 0 });
    let (state, _) = update(state, Msg::TaskProgress { index: 0, percent: 60 });
    let (mut state, _) = update(state, Msg::TaskProgress { index: 0, percent: 30 });
    assert_eq!(state.view().rows[0].status, RowStatus::Percent(60));

    state.consume_dirty();
    let (mut state, _) = update(state, Msg::TaskProgress { index: 0, percent: 60 });
    assert!(!state.consume_dirty());

    let (state, _) = update(
        state,
        Msg::TaskFinished {
            index: 0,
            result: TaskResultKind::Completed,
        },
    );
    let (state, _) = update(state, Msg::TaskProgress { index: 0, percent: 99 });
    assert_eq!(state.view().rows[0].status, RowStatus::Done);
    assert_eq!(state.view().rows[0].status.to_string(), "done");
}

#[test]
fn cancel_is_sent_once_and_batch_ends_cancelled() {
    init_logging();
    let (state, _) = start(ready_state());
    let (state, first) = update(state, Msg::CancelRequested);
    let (state, second) = update(state, Msg::CancelRequested);
    assert_eq!(first, vec![Effect::Cancel]);
    assert!(second.is_empty());

    let (state, _) = update(
        state,
        Msg::TaskFinished {
            index: 0,
            result: TaskResultKind::Completed,
        },
    );
    let mut state = state;
    for index in 1..3 {
        let (next, _) = update(
            state,
            Msg::TaskFinished {
                index,
                result: TaskResultKind::Cancelled,
            },
        );
        state = next;
    }
    let counts = BatchCounts {
        completed: 1,
        failed: 0,
        cancelled: 2,
    };
    let (state, _) = update(
        state,
        Msg::BatchFinished {
            counts,
            cancelled: true,
        },
    );
    let view = state.view();

    assert_eq!(view.session, SessionState::Cancelled);
    assert_eq!(view.rows[2].status.to_string(), "cancelled");
    assert_eq!(view.notice, Some(Notice::BatchCancelled(counts)));
}

#[test]
fn cancel_outside_running_does_nothing() {
    init_logging();
    let state = ready_state();
    let (next, effects) = update(state.clone(), Msg::CancelRequested);

    assert!(effects.is_empty());
    assert_eq!(next, state);
}

#[test]
fn harvest_is_rejected_while_running() {
    init_logging();
    let (state, _) = start(ready_state());
    let (state, effects) = update(
        state,
        Msg::HarvestRequested {
            source: PathBuf::from("other.pdf"),
            manifest_path: None,
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Running);
    assert_eq!(state.view().notice, Some(Notice::HarvestRejected));
}

#[test]
fn completed_batch_can_be_rerun_and_folder_opened() {
    init_logging();
    let (state, _) = start(ready_state());
    let (state, _) = update(
        state,
        Msg::BatchFinished {
            counts: BatchCounts::default(),
            cancelled: false,
        },
    );
    let (state, effects) = update(state, Msg::OpenFolderRequested);
    assert_eq!(
        effects,
        vec![Effect::OpenFolder {
            path: PathBuf::from("out")
        }]
    );

    let (state, effects) = start(state);
    assert_eq!(effects.len(), 1);
    assert!(state
        .view()
        .rows
        .iter()
        .all(|r| r.status == RowStatus::Pending));
}

#[test]
fn open_folder_without_output_dir_is_ignored() {
    init_logging();
    let (_, effects) = update(ready_state(), Msg::OpenFolderRequested);
    assert!(effects.is_empty());
}
