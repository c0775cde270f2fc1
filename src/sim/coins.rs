//! Coin lifecycle
//!
//! One shared clock drives every coin: no coin owns a timer. A coin's state is
//! derived from `now - spawned_at` (or `now - fade_started_at`) each tick.
//!
//! ```text
//! Active ──match held──▶ Collected ──▶ Fading ──fade done──▶ Removed
//!    └────lifetime over─────────────────▲
//! ```

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::Stage;
use super::matcher::{DetectorSignal, Dwell, Expression, MatchDetector, MatchTarget};
use crate::{Millis, ceil_secs};

/// Lifecycle state of a coin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinState {
    Active,
    Collected,
    Fading,
    /// Dropped from the field; only ever seen on coins handed back by `remove_expired`
    Removed,
}

/// Normalized rectangle coins may spawn in (keeps them clear of the HUD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnArea {
    pub x: (f32, f32),
    pub y: (f32, f32),
}

impl Default for SpawnArea {
    fn default() -> Self {
        Self {
            x: (0.1, 0.9),
            y: (0.15, 0.85),
        }
    }
}

impl SpawnArea {
    fn roll<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let axis = |rng: &mut R, (lo, hi): (f32, f32)| {
            if lo >= hi { lo } else { rng.random_range(lo..hi) }
        };
        let x = axis(rng, self.x);
        let y = axis(rng, self.y);
        Vec2::new(x, y)
    }
}

/// A collectible coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: u32,
    /// Normalized screen position
    pub pos: Vec2,
    /// Diameter in pixels
    pub size: f32,
    pub spawned_at: Millis,
    /// Expression this coin asks for (expression hunts only)
    pub target: Option<Expression>,
    pub state: CoinState,
    pub collected_at: Option<Millis>,
    pub fade_started_at: Option<Millis>,
    #[serde(skip)]
    dwell: Dwell,
}

impl Coin {
    /// Countdown badge value: `max(0, ceil(lifetime - elapsed))` in seconds
    pub fn countdown_secs(&self, now: Millis, lifetime_ms: Millis) -> u32 {
        let elapsed = now.saturating_sub(self.spawned_at);
        ceil_secs(lifetime_ms.saturating_sub(elapsed))
    }

    pub fn was_collected(&self) -> bool {
        self.collected_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.state == CoinState::Active
    }

    pub fn match_target(&self) -> MatchTarget {
        MatchTarget {
            pos: self.pos,
            size: self.size,
            expression: self.target,
        }
    }
}

/// What changed during one `CoinField::tick`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTick {
    pub collected: Vec<u32>,
    /// Timed out without being collected (now fading)
    pub expired: Vec<u32>,
    pub removed: Vec<u32>,
}

/// Live set of coins for one hunt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinField {
    coins: Vec<Coin>,
    lifetime_ms: Millis,
    fade_ms: Millis,
    dwell_ms: Millis,
    area: SpawnArea,
    next_id: u32,
    collected: u32,
}

impl CoinField {
    pub fn new(lifetime_ms: Millis, fade_ms: Millis, dwell_ms: Millis, area: SpawnArea) -> Self {
        Self {
            coins: Vec::new(),
            lifetime_ms,
            fade_ms,
            dwell_ms,
            area,
            next_id: 0,
            collected: 0,
        }
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn get(&self, id: u32) -> Option<&Coin> {
        self.coins.iter().find(|c| c.id == id)
    }

    pub fn lifetime_ms(&self) -> Millis {
        self.lifetime_ms
    }

    pub fn active_count(&self) -> usize {
        self.coins.iter().filter(|c| c.is_active()).count()
    }

    /// Coins that reached `Collected` since the field was created
    pub fn collected_count(&self) -> u32 {
        self.collected
    }

    /// Spawn a coin if fewer than `stage.max_concurrent` are active
    pub fn spawn<R: Rng>(&mut self, stage: &Stage, now: Millis, rng: &mut R) -> Option<u32> {
        if self.active_count() >= stage.max_concurrent {
            log::debug!(
                "Spawn skipped: {} active, cap {}",
                self.active_count(),
                stage.max_concurrent
            );
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        let pos = self.area.roll(rng);
        let size = stage.roll_size(rng);
        let target = stage.roll_expression(rng);
        self.coins.push(Coin {
            id,
            pos,
            size,
            spawned_at: now,
            target,
            state: CoinState::Active,
            collected_at: None,
            fade_started_at: None,
            dwell: Dwell::default(),
        });
        Some(id)
    }

    /// Collect an active coin; false (and no count) for any other state
    pub fn attempt_collect(&mut self, id: u32, now: Millis) -> bool {
        let Some(coin) = self.coins.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        if coin.state != CoinState::Active {
            log::debug!("Coin {} already {:?}, ignoring collect", id, coin.state);
            return false;
        }
        coin.state = CoinState::Collected;
        coin.collected_at = Some(now);
        coin.fade_started_at = Some(now);
        self.collected += 1;
        true
    }

    /// Advance timeouts and fades; returns the coins dropped from the field
    ///
    /// Active coins past their lifetime start fading at the instant they
    /// expired, collected coins at the instant they were collected. Coins whose
    /// fade has run its course are removed.
    pub fn remove_expired(&mut self, now: Millis) -> Vec<Coin> {
        let lifetime = self.lifetime_ms;
        let fade = self.fade_ms;

        for coin in &mut self.coins {
            match coin.state {
                CoinState::Active if now.saturating_sub(coin.spawned_at) >= lifetime => {
                    coin.state = CoinState::Fading;
                    coin.fade_started_at = Some(coin.spawned_at + lifetime);
                    coin.dwell.reset();
                }
                CoinState::Collected => {
                    coin.state = CoinState::Fading;
                }
                _ => {}
            }
        }

        let mut removed = Vec::new();
        self.coins.retain(|coin| {
            let done = coin.state == CoinState::Fading
                && coin
                    .fade_started_at
                    .is_some_and(|start| now.saturating_sub(start) >= fade);
            if done {
                let mut gone = coin.clone();
                gone.state = CoinState::Removed;
                removed.push(gone);
            }
            !done
        });
        removed
    }

    /// One frame: collection first, then expiry
    ///
    /// Running collection first means a coin matched on the same tick it
    /// would have timed out counts as collected.
    pub fn tick(&mut self, now: Millis, detector: &MatchDetector, signal: &DetectorSignal) -> FieldTick {
        let mut report = FieldTick::default();
        let dwell_ms = self.dwell_ms;

        let mut ready = Vec::new();
        for coin in self.coins.iter_mut().filter(|c| c.is_active()) {
            let matching = detector.is_matching(&coin.match_target(), signal);
            if coin.dwell.update(matching, now, dwell_ms) {
                ready.push(coin.id);
            }
        }
        for id in ready {
            if self.attempt_collect(id, now) {
                report.collected.push(id);
            }
        }

        let was_active: Vec<u32> = self
            .coins
            .iter()
            .filter(|c| c.is_active())
            .map(|c| c.id)
            .collect();
        let removed = self.remove_expired(now);
        for id in was_active {
            let still_active = self.get(id).is_some_and(|c| c.is_active());
            if !still_active {
                report.expired.push(id);
            }
        }
        report.removed = removed.into_iter().map(|c| c.id).collect();
        report
    }

    /// Countdown badge for a live coin
    pub fn countdown_secs(&self, id: u32, now: Millis) -> Option<u32> {
        self.get(id).map(|c| c.countdown_secs(now, self.lifetime_ms))
    }

    /// Drop every coin (end of hunt); the collected tally is kept
    pub fn clear(&mut self) {
        self.coins.clear();
    }
}
