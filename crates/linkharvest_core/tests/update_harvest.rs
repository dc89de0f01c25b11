use std::path::PathBuf;
use std::sync::Once;

use linkharvest_core::{update, AppState, Effect, LinkRow, Msg, Notice, RowStatus, SessionState};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn row(title: &str, url: &str) -> LinkRow {
    LinkRow {
        url: url.to_string(),
        title: title.to_string(),
    }
}

fn request(state: AppState) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::HarvestRequested {
            source: PathBuf::from("doc.pdf"),
            manifest_path: Some(PathBuf::from("out/extracted_urls.csv")),
        },
    )
}

#[test]
fn harvest_request_enters_harvesting_and_emits_effect() {
    init_logging();
    let (mut state, effects) = request(AppState::new());

    assert_eq!(state.session(), SessionState::Harvesting);
    assert_eq!(
        effects,
        vec![Effect::StartHarvest {
            source: PathBuf::from("doc.pdf"),
            manifest_path: Some(PathBuf::from("out/extracted_urls.csv")),
        }]
    );
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn harvest_result_populates_pending_rows() {
    init_logging();
    let (state, _) = request(AppState::new());
    let (state, effects) = update(
        state,
        Msg::HarvestCompleted {
            result: Ok(vec![
                row("Report", "https://a.example/report.pdf"),
                row("https://b.example/data", "https://b.example/data"),
            ]),
            manifest: Some(PathBuf::from("out/extracted_urls.csv")),
        },
    );
    let view = state.view();

    assert!(effects.is_empty());
    assert_eq!(view.session, SessionState::Ready);
    assert_eq!(view.link_count, 2);
    assert_eq!(view.manifest, Some(PathBuf::from("out/extracted_urls.csv")));
    assert!(view.rows.iter().all(|r| r.status == RowStatus::Pending));
    assert_eq!(view.rows[0].title, "Report");
    assert_eq!(view.rows[1].index, 1);
}

#[test]
fn empty_harvest_returns_to_idle_with_notice() {
    init_logging();
    let (state, _) = request(AppState::new());
    let (state, _) = update(
        state,
        Msg::HarvestCompleted {
            result: Ok(Vec::new()),
            manifest: None,
        },
    );
    let view = state.view();

    assert_eq!(view.session, SessionState::Idle);
    assert_eq!(view.notice, Some(Notice::NoLinksFound));
    assert!(view.rows.is_empty());
}

#[test]
fn failed_harvest_reports_message() {
    init_logging();
    let (state, _) = request(AppState::new());
    let (state, _) = update(
        state,
        Msg::HarvestCompleted {
            result: Err("not a PDF".to_string()),
            manifest: None,
        },
    );

    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(
        state.view().notice,
        Some(Notice::HarvestFailed("not a PDF".to_string()))
    );
}

#[test]
fn second_harvest_while_harvesting_is_rejected() {
    init_logging();
    let (state, _) = request(AppState::new());
    let (state, effects) = request(state);

    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Harvesting);
    assert_eq!(state.view().notice, Some(Notice::HarvestRejected));
}

#[test]
fn harvest_result_outside_harvesting_is_ignored() {
    init_logging();
    let state = AppState::new();
    let (next, _) = update(
        state.clone(),
        Msg::HarvestCompleted {
            result: Ok(vec![row("x", "https://x.example/")]),
            manifest: None,
        },
    );

    assert_eq!(next, state);
}

#[test]
fn reharvest_from_ready_replaces_rows() {
    init_logging();
    let (state, _) = request(AppState::new());
    let (state, _) = update(
        state,
        Msg::HarvestCompleted {
            result: Ok(vec![row("old", "https://old.example/")]),
            manifest: None,
        },
    );
    let (state, effects) = request(state);
    assert_eq!(effects.len(), 1);
    assert!(state.links().is_empty());

    let (state, _) = update(
        state,
        Msg::HarvestCompleted {
            result: Ok(vec![row("new", "https://new.example/")]),
            manifest: None,
        },
    );
    assert_eq!(state.links(), &[row("new", "https://new.example/")]);
}
