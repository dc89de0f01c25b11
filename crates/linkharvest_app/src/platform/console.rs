//! Terminal rendering of the view model.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use linkharvest_core::{AppViewModel, BatchCounts, Notice, RowIndex, RowStatus, SessionState};

#[derive(Default)]
pub struct ConsoleRenderer {
    listed: bool,
    reported: Vec<bool>,
    active: Option<(RowIndex, ProgressBar)>,
    last_notice: Option<Notice>,
}

impl ConsoleRenderer {
    pub fn render(&mut self, view: &AppViewModel) {
        match view.session {
            SessionState::Harvesting => {
                self.listed = false;
            }
            SessionState::Running if self.reported.len() != view.rows.len() => {
                self.reported = vec![false; view.rows.len()];
            }
            _ => {}
        }

        if !self.listed && !view.rows.is_empty() {
            self.print_listing(view);
            self.listed = true;
        }
        if view.session == SessionState::Running {
            self.render_rows(view);
        }
        if view.notice != self.last_notice {
            if let Some(notice) = &view.notice {
                self.print_notice(notice);
            }
            self.last_notice = view.notice.clone();
        }
    }

    fn print_listing(&self, view: &AppViewModel) {
        println!("Found {} link(s):", view.link_count);
        for row in &view.rows {
            println!("{:>4}  {}  <{}>", row.index + 1, row.title, row.url);
        }
        if let Some(manifest) = &view.manifest {
            println!("Manifest written to {}", manifest.display());
        }
    }

    fn render_rows(&mut self, view: &AppViewModel) {
        let total = view.rows.len();
        for row in &view.rows {
            if self.reported.get(row.index).copied().unwrap_or(true) {
                continue;
            }
            match &row.status {
                RowStatus::Pending => {}
                RowStatus::Started => {
                    self.ensure_bar(row.index, &row.title);
                }
                RowStatus::Percent(percent) => {
                    let bar = self.ensure_bar(row.index, &row.title);
                    if bar.length() != Some(100) {
                        bar.set_style(bar_style());
                        bar.set_length(100);
                    }
                    bar.set_position(u64::from(*percent));
                }
                status => {
                    let line = format!("[{}/{}] {}: {}", row.index + 1, total, row.title, status);
                    match self.active.take() {
                        Some((index, bar)) if index == row.index => {
                            bar.finish_and_clear();
                        }
                        Some(other) => self.active = Some(other),
                        None => {}
                    }
                    println!("{line}");
                    self.reported[row.index] = true;
                }
            }
        }
    }

    fn ensure_bar(&mut self, index: RowIndex, title: &str) -> &ProgressBar {
        let stale = matches!(&self.active, Some((current, _)) if *current != index);
        if stale {
            if let Some((_, bar)) = self.active.take() {
                bar.finish_and_clear();
            }
        }
        let (_, bar) = self.active.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(spinner_style());
            bar.set_message(title.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            (index, bar)
        });
        bar
    }

    fn print_notice(&self, notice: &Notice) {
        match notice {
            Notice::HarvestRejected => println!("A harvest or download is already running."),
            Notice::HarvestFailed(message) => println!("Could not read the document: {message}"),
            Notice::NoLinksFound => println!("No http(s) links found in the document."),
            Notice::DownloadRejected => println!("Nothing to download."),
            Notice::BatchCompleted(counts) => print_summary("Finished", counts),
            Notice::BatchCancelled(counts) => print_summary("Cancelled", counts),
        }
    }
}

fn print_summary(label: &str, counts: &BatchCounts) {
    println!(
        "{label}: {} completed, {} failed, {} cancelled",
        counts.completed, counts.failed, counts.cancelled
    );
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} [{bar:30}] {pos:>3}% {msg}")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
