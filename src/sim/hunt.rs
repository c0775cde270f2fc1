//! Timed coin hunt
//!
//! Runs one mini-game session: the phase timer, stage-driven spawning, the
//! coin field and the match detector, all advanced from a single `tick`.
//! The hunt never touches the session; it only hands back a `HuntOutcome`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::coins::{CoinField, CoinState, SpawnArea};
use super::difficulty::{StageTable, stage_for};
use super::matcher::{DetectorSignal, Expression, MatchDetector};
use super::timer::PhaseTimer;
use crate::Millis;
use crate::session::CoinSource;
use crate::tuning::{CoinTiming, Tuning};

/// Screen flow inside a hunt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HuntStage {
    /// Instructions shown, clock not running
    Instructions,
    Playing,
    /// Time is up; the final count is on screen until the player continues
    Results,
    /// Player left early; nothing runs any more
    Cancelled,
}

/// Notifications for the host (animations, coin sound)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HuntEvent {
    CoinSpawned { id: u32 },
    CoinCollected { id: u32 },
    CoinExpired { id: u32 },
    CoinRemoved { id: u32 },
    Finished { collected: u32 },
}

/// Final result reported to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntOutcome {
    pub source: CoinSource,
    pub collected: u32,
}

/// Render data for one coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinView {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub countdown_secs: u32,
    pub target: Option<Expression>,
    pub collected: bool,
    pub fading: bool,
}

/// Render data for the whole hunt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntSnapshot {
    pub stage: HuntStage,
    pub time_remaining_secs: u32,
    /// 1.0 at start, 0.0 when time is up
    pub progress: f32,
    pub collected: u32,
    /// Detector still loading: host shows an overlay, no coins spawn
    pub loading: bool,
    pub coins: Vec<CoinView>,
}

/// One timed coin-collection mini-game
#[derive(Debug, Clone)]
pub struct CoinHunt {
    source: CoinSource,
    stage: HuntStage,
    timer: PhaseTimer,
    stages: StageTable,
    field: CoinField,
    detector: MatchDetector,
    rng: Pcg32,
    detector_ready: bool,
    next_spawn_at: Option<Millis>,
    outcome: Option<HuntOutcome>,
    events: Vec<HuntEvent>,
}

impl CoinHunt {
    pub fn new(
        source: CoinSource,
        timing: &CoinTiming,
        stages: StageTable,
        detector: MatchDetector,
        area: SpawnArea,
        seed: u64,
    ) -> Self {
        Self {
            source,
            stage: HuntStage::Instructions,
            timer: PhaseTimer::new(timing.duration_secs),
            stages,
            field: CoinField::new(timing.lifetime_ms, timing.fade_ms, timing.dwell_ms, area),
            detector,
            rng: Pcg32::seed_from_u64(seed),
            detector_ready: false,
            next_spawn_at: None,
            outcome: None,
            events: Vec::new(),
        }
    }

    /// Pinch hunt on a `viewport`-sized screen (pixels)
    pub fn gesture(tuning: &Tuning, viewport: Vec2, seed: u64) -> Self {
        let g = &tuning.gesture;
        Self::new(
            CoinSource::Gesture,
            &g.timing,
            g.stages.clone(),
            MatchDetector::proximity(viewport, g.hit_radius_scale),
            tuning.spawn_area,
            seed,
        )
    }

    /// Facial expression hunt
    pub fn expression(tuning: &Tuning, seed: u64) -> Self {
        let e = &tuning.expression;
        Self::new(
            CoinSource::Expression,
            &e.timing,
            e.stages.clone(),
            MatchDetector::expression(e.threshold),
            tuning.spawn_area,
            seed,
        )
    }

    pub fn source(&self) -> CoinSource {
        self.source
    }

    pub fn stage(&self) -> HuntStage {
        self.stage
    }

    pub fn field(&self) -> &CoinField {
        &self.field
    }

    pub fn collected(&self) -> u32 {
        self.field.collected_count()
    }

    pub fn outcome(&self) -> Option<HuntOutcome> {
        self.outcome
    }

    pub fn time_remaining_secs(&self, now: Millis) -> u32 {
        self.timer.remaining_secs(now)
    }

    /// Leave the instructions screen and start the clock
    pub fn start(&mut self, now: Millis) {
        if self.stage != HuntStage::Instructions {
            return;
        }
        log::info!(
            "{:?} hunt started ({}s)",
            self.source,
            self.timer.duration_secs()
        );
        self.stage = HuntStage::Playing;
        self.timer.start(now);
    }

    /// Detector (hand landmarker / face model) finished loading or dropped out
    pub fn set_detector_ready(&mut self, ready: bool) {
        if self.detector_ready != ready {
            log::debug!("{:?} detector ready: {}", self.source, ready);
        }
        self.detector_ready = ready;
    }

    pub fn is_detector_ready(&self) -> bool {
        self.detector_ready
    }

    /// Advance one frame; returns the outcome on the tick the clock runs out
    pub fn tick(&mut self, now: Millis, signal: &DetectorSignal) -> Option<HuntOutcome> {
        if self.stage != HuntStage::Playing {
            return None;
        }

        let report = self.field.tick(now, &self.detector, signal);
        for id in report.collected {
            log::debug!("Coin {} collected", id);
            self.events.push(HuntEvent::CoinCollected { id });
        }
        for id in report.expired {
            self.events.push(HuntEvent::CoinExpired { id });
        }
        for id in report.removed {
            self.events.push(HuntEvent::CoinRemoved { id });
        }

        if self.detector_ready && !self.timer.is_expired(now) {
            self.spawn_if_due(now);
        }

        if self.timer.poll_expired(now) {
            return Some(self.finish());
        }
        None
    }

    /// Spawn on schedule; the next delay comes from the stage in force now
    fn spawn_if_due(&mut self, now: Millis) {
        if self.next_spawn_at.is_some_and(|at| now < at) {
            return;
        }
        let elapsed_secs = self.timer.elapsed_ms(now) as f32 / 1000.0;
        let Some(stage) = stage_for(elapsed_secs, &self.stages) else {
            log::debug!("{:?} hunt has no difficulty stages, nothing spawns", self.source);
            return;
        };
        if let Some(id) = self.field.spawn(stage, now, &mut self.rng) {
            self.events.push(HuntEvent::CoinSpawned { id });
        }
        self.next_spawn_at = Some(now + stage.roll_spawn_interval(&mut self.rng));
    }

    fn finish(&mut self) -> HuntOutcome {
        let outcome = HuntOutcome {
            source: self.source,
            collected: self.field.collected_count(),
        };
        log::info!(
            "{:?} hunt finished: {} coins collected",
            self.source,
            outcome.collected
        );
        self.stage = HuntStage::Results;
        self.next_spawn_at = None;
        self.field.clear();
        self.outcome = Some(outcome);
        self.events.push(HuntEvent::Finished {
            collected: outcome.collected,
        });
        outcome
    }

    /// Abandon the hunt; pending spawns and ticks stop for good
    pub fn cancel(&mut self) {
        if matches!(self.stage, HuntStage::Results | HuntStage::Cancelled) {
            return;
        }
        log::info!("{:?} hunt cancelled", self.source);
        self.stage = HuntStage::Cancelled;
        self.next_spawn_at = None;
        self.field.clear();
    }

    pub fn drain_events(&mut self) -> Vec<HuntEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self, now: Millis) -> HuntSnapshot {
        let lifetime = self.field.lifetime_ms();
        HuntSnapshot {
            stage: self.stage,
            time_remaining_secs: self.timer.remaining_secs(now),
            progress: self.timer.progress(now),
            collected: self.field.collected_count(),
            loading: self.stage == HuntStage::Playing && !self.detector_ready,
            coins: self
                .field
                .coins()
                .iter()
                .map(|c| CoinView {
                    id: c.id,
                    pos: c.pos,
                    size: c.size,
                    countdown_secs: c.countdown_secs(now, lifetime),
                    target: c.target,
                    collected: c.was_collected(),
                    fading: matches!(c.state, CoinState::Collected | CoinState::Fading),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::matcher::ExpressionScores;

    const FRAME: Millis = 50;
    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    fn started_gesture(seed: u64) -> CoinHunt {
        let mut hunt = CoinHunt::gesture(&Tuning::default(), VIEWPORT, seed);
        hunt.start(0);
        hunt.set_detector_ready(true);
        hunt
    }

    /// Pinch on the oldest active coin, like a player chasing coins
    fn bot_pinch(hunt: &CoinHunt) -> DetectorSignal {
        hunt.field()
            .coins()
            .iter()
            .find(|c| c.is_active())
            .map(|c| DetectorSignal::Pinch(c.pos))
            .unwrap_or_default()
    }

    #[test]
    fn test_empty_stage_table_still_finishes() {
        let mut tuning = Tuning::default();
        tuning.gesture.stages = StageTable::new(Vec::new());
        let mut hunt = CoinHunt::gesture(&tuning, VIEWPORT, 9);
        hunt.start(0);
        hunt.set_detector_ready(true);

        let mut outcome = None;
        for t in (0..=30_000).step_by(FRAME as usize) {
            if let Some(o) = hunt.tick(t, &DetectorSignal::Lost) {
                outcome = Some(o);
            }
        }
        assert!(hunt.field().coins().is_empty());
        assert_eq!(
            outcome,
            Some(HuntOutcome {
                source: CoinSource::Gesture,
                collected: 0
            })
        );
    }

    #[test]
    fn test_instructions_do_not_tick() {
        let mut hunt = CoinHunt::gesture(&Tuning::default(), VIEWPORT, 1);
        hunt.set_detector_ready(true);
        assert_eq!(hunt.tick(100, &DetectorSignal::Lost), None);
        assert!(hunt.field().coins().is_empty());
        assert_eq!(hunt.stage(), HuntStage::Instructions);
    }

    #[test]
    fn test_no_spawn_until_detector_ready() {
        let mut hunt = CoinHunt::gesture(&Tuning::default(), VIEWPORT, 1);
        hunt.start(0);
        for t in (0..5_000).step_by(FRAME as usize) {
            hunt.tick(t, &DetectorSignal::Lost);
        }
        assert!(hunt.field().coins().is_empty());
        assert!(hunt.snapshot(5_000).loading);
        // Timer kept running while loading
        assert_eq!(hunt.time_remaining_secs(5_000), 25);

        hunt.set_detector_ready(true);
        hunt.tick(5_000, &DetectorSignal::Lost);
        assert_eq!(hunt.field().coins().len(), 1);
    }

    #[test]
    fn test_first_stage_caps_one_coin() {
        let mut hunt = started_gesture(2);
        for t in (0..9_000).step_by(FRAME as usize) {
            hunt.tick(t, &DetectorSignal::Lost);
            assert!(hunt.field().active_count() <= 1);
        }
    }

    #[test]
    fn test_difficulty_ramps() {
        let mut hunt = started_gesture(3);
        let mut peak_late = 0;
        for t in (0..30_000).step_by(FRAME as usize) {
            hunt.tick(t, &DetectorSignal::Lost);
            if t >= 20_000 {
                peak_late = peak_late.max(hunt.field().active_count());
            }
        }
        assert!(peak_late > 1, "late stage should allow several coins");
        assert!(peak_late <= 4);
    }

    #[test]
    fn test_unmatched_coin_expires_and_never_counts() {
        let mut hunt = started_gesture(4);
        hunt.tick(0, &DetectorSignal::Lost);
        let events = hunt.drain_events();
        assert_eq!(events, vec![HuntEvent::CoinSpawned { id: 0 }]);

        let mut expired_at = None;
        let mut removed_at = None;
        for t in (FRAME..4_000).step_by(FRAME as usize) {
            hunt.tick(t, &DetectorSignal::Lost);
            for e in hunt.drain_events() {
                match e {
                    HuntEvent::CoinExpired { id: 0 } => expired_at = Some(t),
                    HuntEvent::CoinRemoved { id: 0 } => removed_at = Some(t),
                    _ => {}
                }
            }
        }
        assert_eq!(expired_at, Some(3_000));
        assert_eq!(removed_at, Some(3_500));
        assert_eq!(hunt.collected(), 0);
    }

    #[test]
    fn test_full_gesture_run_reports_once() {
        let mut hunt = started_gesture(5);
        let mut outcomes = Vec::new();
        let mut collected_events = 0;
        let mut t = 0;
        while t <= 31_000 {
            let signal = bot_pinch(&hunt);
            if let Some(outcome) = hunt.tick(t, &signal) {
                outcomes.push(outcome);
            }
            collected_events += hunt
                .drain_events()
                .iter()
                .filter(|e| matches!(e, HuntEvent::CoinCollected { .. }))
                .count() as u32;
            t += FRAME;
        }
        assert_eq!(outcomes.len(), 1);
        let outcome = outcomes[0];
        assert_eq!(outcome.source, CoinSource::Gesture);
        assert!(outcome.collected > 10);
        assert_eq!(outcome.collected, collected_events);
        assert_eq!(hunt.stage(), HuntStage::Results);
        assert_eq!(hunt.outcome(), Some(outcome));
        assert!(hunt.field().coins().is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut hunt = started_gesture(seed);
            let mut positions = Vec::new();
            for t in (0..30_000).step_by(FRAME as usize) {
                hunt.tick(t, &DetectorSignal::Lost);
                for e in hunt.drain_events() {
                    if let HuntEvent::CoinSpawned { id } = e {
                        positions.push((t, hunt.field().get(id).map(|c| c.pos)));
                    }
                }
            }
            positions
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn test_cancel_stops_everything() {
        let mut hunt = started_gesture(6);
        hunt.tick(0, &DetectorSignal::Lost);
        assert!(!hunt.field().coins().is_empty());
        hunt.cancel();
        assert_eq!(hunt.stage(), HuntStage::Cancelled);
        assert!(hunt.field().coins().is_empty());
        for t in (0..40_000).step_by(FRAME as usize) {
            assert_eq!(hunt.tick(t, &DetectorSignal::Lost), None);
        }
        assert!(hunt.field().coins().is_empty());
        assert_eq!(hunt.outcome(), None);
    }

    #[test]
    fn test_suspended_tab_finishes_on_next_tick() {
        let mut hunt = started_gesture(7);
        hunt.tick(0, &DetectorSignal::Lost);
        let outcome = hunt.tick(90_000, &DetectorSignal::Lost);
        assert_eq!(
            outcome,
            Some(HuntOutcome {
                source: CoinSource::Gesture,
                collected: 0
            })
        );
    }

    #[test]
    fn test_expression_hunt_collects_matching_faces() {
        let mut hunt = CoinHunt::expression(&Tuning::default(), 8);
        hunt.start(0);
        hunt.set_detector_ready(true);
        let mut t = 0;
        let mut result = None;
        while result.is_none() {
            // Make whatever face the oldest coin asks for
            let signal = hunt
                .field()
                .coins()
                .iter()
                .find(|c| c.is_active())
                .and_then(|c| c.target)
                .map(|e| DetectorSignal::Expressions(ExpressionScores::new().with(e, 0.9)))
                .unwrap_or_default();
            result = hunt.tick(t, &signal);
            t += FRAME;
        }
        let outcome = result.unwrap();
        assert_eq!(outcome.source, CoinSource::Expression);
        assert!(outcome.collected > 5);
    }

    #[test]
    fn test_snapshot_views() {
        let mut hunt = started_gesture(9);
        hunt.tick(0, &DetectorSignal::Lost);
        let snap = hunt.snapshot(1_200);
        assert_eq!(snap.stage, HuntStage::Playing);
        assert_eq!(snap.time_remaining_secs, 29);
        assert_eq!(snap.coins.len(), 1);
        assert_eq!(snap.coins[0].countdown_secs, 2);
        assert!(!snap.coins[0].fading);
        assert!(!snap.loading);
    }
}
