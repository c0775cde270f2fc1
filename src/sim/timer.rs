//! Phase countdown
//!
//! Remaining time is recomputed from the absolute start time on every poll,
//! so a suspended tab or a late interval never makes the clock drift.

use serde::{Deserialize, Serialize};

use crate::Millis;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimer {
    duration_secs: u32,
    started_at: Option<Millis>,
    /// Set once the expiry has been reported
    expired_reported: bool,
}

impl PhaseTimer {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            started_at: None,
            expired_reported: false,
        }
    }

    /// Start counting; a second call keeps the original start time
    pub fn start(&mut self, now: Millis) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Milliseconds since start (0 before start)
    pub fn elapsed_ms(&self, now: Millis) -> Millis {
        self.started_at.map_or(0, |start| now.saturating_sub(start))
    }

    /// Whole seconds left: `duration - floor(elapsed / 1000)`, never below 0
    pub fn remaining_secs(&self, now: Millis) -> u32 {
        let elapsed_secs = self.elapsed_ms(now) / 1000;
        (self.duration_secs as u64).saturating_sub(elapsed_secs) as u32
    }

    /// Fraction of the phase still to play, for the progress bar
    pub fn progress(&self, now: Millis) -> f32 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.remaining_secs(now) as f32 / self.duration_secs as f32
    }

    pub fn is_expired(&self, now: Millis) -> bool {
        self.is_started() && self.remaining_secs(now) == 0
    }

    /// True exactly once: on the first poll at or after expiry
    pub fn poll_expired(&mut self, now: Millis) -> bool {
        if self.expired_reported || !self.is_expired(now) {
            return false;
        }
        self.expired_reported = true;
        true
    }
}
