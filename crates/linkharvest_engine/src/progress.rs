use std::sync::mpsc;

use crate::EngineEvent;

/// Consumer of engine events, typically the presentation layer.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Turns byte counts into whole percentages, reporting each value once.
#[derive(Debug, Clone)]
pub(crate) struct PercentTracker {
    total: Option<u64>,
    last: Option<u8>,
}

impl PercentTracker {
    pub(crate) fn new(total: Option<u64>) -> Self {
        Self { total, last: None }
    }

    /// `floor(written * 100 / total)` if it differs from the last reported
    /// value; always `None` when the total is unknown.
    pub(crate) fn update(&mut self, written: u64) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        let percent = (u128::from(written) * 100 / u128::from(total)).min(100) as u8;
        if self.last == Some(percent) {
            return None;
        }
        self.last = Some(percent);
        Some(percent)
    }
}
