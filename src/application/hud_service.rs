// HUD Service - rotating text feed fed from the response slot
use crate::common::{Cadence, Tickable};
use crate::domains::logger::DynLogger;
use crate::domains::narration::{clean_response, ResponseSlot};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_HUD_POLL_INTERVAL: Duration = Duration::from_secs(4);
pub const DEFAULT_HUD_LINES: usize = 3;

/// Single-text pane showing the world summary.
struct SummaryPane {
    slot: Arc<dyn ResponseSlot>,
    text: String,
}

pub struct HudFeed {
    slot: Arc<dyn ResponseSlot>,
    cadence: Cadence,
    lines: VecDeque<String>,
    last_seen: String,
    summary: Option<SummaryPane>,
    logger: DynLogger,
}

impl HudFeed {
    pub fn new(slot: Arc<dyn ResponseSlot>, poll_interval: Duration, line_count: usize, logger: DynLogger) -> Self {
        let line_count = line_count.max(1);
        Self {
            slot,
            cadence: Cadence::new(poll_interval),
            lines: std::iter::repeat(String::new()).take(line_count).collect(),
            last_seen: String::new(),
            summary: None,
            logger,
        }
    }

    /// Adds the world summary pane, read from its own slot on the same cadence.
    pub fn with_summary(mut self, slot: Arc<dyn ResponseSlot>) -> Self {
        self.summary = Some(SummaryPane {
            slot,
            text: String::new(),
        });
        self
    }

    /// Reads the slot once. Returns true when a new line was pushed.
    pub fn poll(&mut self) -> bool {
        let raw = match self.slot.read() {
            Ok(raw) => raw,
            Err(e) => {
                self.logger.warn(&format!("HUD could not read response slot: {}", e));
                return false;
            }
        };

        let cleaned = clean_response(&raw);
        if cleaned == self.last_seen {
            return false;
        }
        self.last_seen = cleaned.clone();
        self.lines.pop_back();
        self.lines.push_front(cleaned);
        true
    }

    /// Re-reads the summary slot. Returns true when the pane text changed.
    pub fn poll_summary(&mut self) -> bool {
        let Some(pane) = self.summary.as_mut() else {
            return false;
        };
        let raw = match pane.slot.read() {
            Ok(raw) => raw,
            Err(e) => {
                self.logger.warn(&format!("HUD could not read summary slot: {}", e));
                return false;
            }
        };
        let cleaned = clean_response(&raw);
        if cleaned == pane.text {
            return false;
        }
        pane.text = cleaned;
        true
    }

    /// Newest line first.
    pub fn lines(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }

    pub fn visibility(&self) -> Vec<bool> {
        self.lines.iter().map(|line| !line.is_empty()).collect()
    }

    /// `None` when the feed has no summary pane.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_ref().map(|pane| pane.text.as_str())
    }

    pub fn summary_visible(&self) -> bool {
        self.summary().is_some_and(|text| !text.is_empty())
    }
}

impl Tickable for HudFeed {
    fn on_tick(&mut self, delta: Duration) {
        if self.cadence.advance(delta) {
            self.poll();
            self.poll_summary();
        }
    }
}
