//! AR coin hunt
//!
//! A fixed set of coins is anchored around the player once a surface is
//! placed. The clock starts at placement; the hunt ends when every coin is
//! taken or time runs out. Devices without AR, or sessions that fail to
//! start, resolve straight to a fixed award.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::hunt::HuntOutcome;
use super::timer::PhaseTimer;
use crate::Millis;
use crate::session::CoinSource;
use crate::tuning::ArHuntTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArHuntState {
    /// Scanning for a surface
    Scanning,
    Running,
    Finished,
}

/// Why the hunt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArHuntEnd {
    AllCollected,
    TimeUp,
    /// No AR on this device
    Skipped,
    /// AR session could not start
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArCoinHunt {
    state: ArHuntState,
    timer: PhaseTimer,
    coin_count: u32,
    collected: BTreeSet<u32>,
    fallback_award: u32,
    failure_award: u32,
    end: Option<ArHuntEnd>,
}

impl ArCoinHunt {
    pub fn new(tuning: &ArHuntTuning) -> Self {
        Self {
            state: ArHuntState::Scanning,
            timer: PhaseTimer::new(tuning.duration_secs),
            coin_count: tuning.coin_count,
            collected: BTreeSet::new(),
            fallback_award: tuning.fallback_award,
            failure_award: tuning.failure_award,
            end: None,
        }
    }

    pub fn state(&self) -> ArHuntState {
        self.state
    }

    pub fn end(&self) -> Option<ArHuntEnd> {
        self.end
    }

    pub fn coin_count(&self) -> u32 {
        self.coin_count
    }

    pub fn collected(&self) -> u32 {
        self.collected.len() as u32
    }

    pub fn remaining_coins(&self) -> u32 {
        self.coin_count - self.collected()
    }

    pub fn time_remaining_secs(&self, now: Millis) -> u32 {
        self.timer.remaining_secs(now)
    }

    /// Surface placed: coins appear and the clock starts
    pub fn place(&mut self, now: Millis) {
        if self.state != ArHuntState::Scanning {
            return;
        }
        log::info!(
            "AR hunt placed: {} coins, {}s",
            self.coin_count,
            self.timer.duration_secs()
        );
        self.state = ArHuntState::Running;
        self.timer.start(now);
    }

    /// Coin `id` was tapped or walked into; false for repeats and unknown ids
    pub fn collect(&mut self, id: u32) -> bool {
        if self.state != ArHuntState::Running || id >= self.coin_count {
            return false;
        }
        self.collected.insert(id)
    }

    /// Per-frame check; returns the outcome once, when the hunt ends
    pub fn tick(&mut self, now: Millis) -> Option<HuntOutcome> {
        if self.state != ArHuntState::Running {
            return None;
        }
        if self.collected() >= self.coin_count {
            return Some(self.finish(ArHuntEnd::AllCollected, self.collected()));
        }
        if self.timer.poll_expired(now) {
            return Some(self.finish(ArHuntEnd::TimeUp, self.collected()));
        }
        None
    }

    /// No AR support: award the fallback amount
    pub fn skip(&mut self) -> Option<HuntOutcome> {
        if self.state == ArHuntState::Finished {
            return None;
        }
        Some(self.finish(ArHuntEnd::Skipped, self.fallback_award))
    }

    /// AR session failed to start: award the failure amount
    pub fn fail(&mut self) -> Option<HuntOutcome> {
        if self.state == ArHuntState::Finished {
            return None;
        }
        log::warn!("AR hunt could not start, resolving with failure award");
        Some(self.finish(ArHuntEnd::Failed, self.failure_award))
    }

    fn finish(&mut self, end: ArHuntEnd, award: u32) -> HuntOutcome {
        log::info!("AR hunt over ({:?}): {} coins", end, award);
        self.state = ArHuntState::Finished;
        self.end = Some(end);
        HuntOutcome {
            source: CoinSource::ArHunt,
            collected: award,
        }
    }
}
