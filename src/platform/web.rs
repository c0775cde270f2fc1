//! JS bindings for the browser host
//!
//! The React host owns the camera, AR and rendering. It drives the active
//! mini-game through these calls, reads JSON snapshots back, and tells the
//! session when a phase is done.

use glam::{Vec2, Vec3};
use wasm_bindgen::prelude::*;

use super::{init_logging, now_ms};
use crate::error::GameError;
use crate::session::{GamePhase, GameSession, PhaseCompletion};
use crate::shop::{WeaponCatalog, WeaponCategory};
use crate::sim::{ArCoinHunt, BossBattle, CoinHunt, DetectorSignal, ExpressionScores, Hit, ShakeDetector};
use crate::tuning::Tuning;

fn js_err(e: GameError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_err(e.into()))
}

#[wasm_bindgen]
pub struct WebSession {
    session: GameSession,
    seed: u64,
    hunt: Option<CoinHunt>,
    ar_hunt: Option<ArCoinHunt>,
    battle: Option<BossBattle>,
    shake: Option<ShakeDetector>,
}

#[wasm_bindgen]
impl WebSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebSession {
        init_logging();
        let seed = now_ms();
        log::info!("Coin Quest session starting, seed {}", seed);
        WebSession {
            session: GameSession::new(Tuning::load(), WeaponCatalog::default()).unwrap_or_else(|e| {
                log::warn!("Falling back to default tuning: {}", e);
                GameSession::default()
            }),
            seed,
            hunt: None,
            ar_hunt: None,
            battle: None,
            shake: None,
        }
    }

    pub fn set_capabilities(&mut self, camera: bool, ar: bool, motion: bool) -> bool {
        self.session.set_capabilities(crate::session::Capabilities {
            camera_available: camera,
            ar_available: ar,
            motion_available: motion,
        })
    }

    pub fn phase(&self) -> String {
        self.session.phase().as_str().to_string()
    }

    pub fn total_coins(&self) -> u32 {
        self.session.total_coins()
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        self.session.state_json().map_err(js_err)
    }

    pub fn catalog_json(&self) -> Result<String, JsValue> {
        to_json(self.session.catalog())
    }

    /// Splash screen "start" button
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.session
            .complete_phase(PhaseCompletion::advance(GamePhase::GestureHunt))
            .map_err(js_err)
    }

    // ---- Camera hunts ----

    /// Instructions screen for the current hunt phase
    pub fn open_hunt(&mut self, width: f32, height: f32) -> Result<(), JsValue> {
        self.seed = self.seed.wrapping_add(1);
        let hunt = match self.session.phase() {
            GamePhase::GestureHunt => self
                .session
                .gesture_hunt(Vec2::new(width, height), self.seed),
            GamePhase::ExpressionHunt => self.session.expression_hunt(self.seed),
            other => {
                return Err(JsValue::from_str(&format!(
                    "no camera hunt in phase {}",
                    other.as_str()
                )));
            }
        };
        self.hunt = Some(hunt);
        Ok(())
    }

    /// Player dismissed the instructions
    pub fn begin_hunt(&mut self) {
        if let Some(hunt) = self.hunt.as_mut() {
            hunt.start(now_ms());
        }
    }

    pub fn set_detector_ready(&mut self, ready: bool) {
        if let Some(hunt) = self.hunt.as_mut() {
            hunt.set_detector_ready(ready);
        }
    }

    /// Frame with a pinch at normalized (x, y)
    pub fn tick_pinch(&mut self, x: f32, y: f32) {
        self.tick_hunt(&DetectorSignal::Pinch(Vec2::new(x, y)));
    }

    /// Frame with expression scores as a JSON object, e.g. `{"happy":0.9}`
    ///
    /// A frame that doesn't parse still ticks the hunt, as a lost face.
    pub fn tick_expressions(&mut self, scores_json: &str) {
        let signal = match serde_json::from_str::<ExpressionScores>(scores_json) {
            Ok(scores) => DetectorSignal::Expressions(scores),
            Err(e) => {
                log::debug!("Unreadable expression frame: {}", e);
                DetectorSignal::Lost
            }
        };
        self.tick_hunt(&signal);
    }

    /// Frame with no hand or face found
    pub fn tick_lost(&mut self) {
        self.tick_hunt(&DetectorSignal::Lost);
    }

    pub fn hunt_snapshot_json(&self) -> Result<String, JsValue> {
        match &self.hunt {
            Some(hunt) => to_json(&hunt.snapshot(now_ms())),
            None => Ok("null".into()),
        }
    }

    pub fn hunt_events_json(&mut self) -> Result<String, JsValue> {
        match self.hunt.as_mut() {
            Some(hunt) => to_json(&hunt.drain_events()),
            None => Ok("[]".into()),
        }
    }

    /// Results screen "continue": credit the count and move on
    pub fn finish_hunt(&mut self) -> Result<(), JsValue> {
        let outcome = self
            .hunt
            .as_ref()
            .and_then(|h| h.outcome())
            .ok_or_else(|| JsValue::from_str("hunt still running"))?;
        let next = self
            .session
            .phase()
            .next()
            .ok_or_else(|| JsValue::from_str("no next phase"))?;
        self.session
            .complete_phase(PhaseCompletion::from_outcome(next, outcome))
            .map_err(js_err)?;
        self.hunt = None;
        Ok(())
    }

    fn tick_hunt(&mut self, signal: &DetectorSignal) {
        if let Some(hunt) = self.hunt.as_mut() {
            hunt.tick(now_ms(), signal);
        }
    }

    // ---- AR hunt ----

    pub fn ar_place(&mut self) {
        let now = now_ms();
        self.ar_hunt
            .get_or_insert_with(|| self.session.ar_hunt())
            .place(now);
    }

    pub fn ar_collect(&mut self, id: u32) -> bool {
        self.ar_hunt.as_mut().is_some_and(|h| h.collect(id))
    }

    /// Returns true once the hunt is over
    pub fn ar_tick(&mut self) -> Result<bool, JsValue> {
        let outcome = self.ar_hunt.as_mut().and_then(|h| h.tick(now_ms()));
        match outcome {
            Some(outcome) => {
                self.session
                    .complete_phase(PhaseCompletion::from_outcome(GamePhase::WeaponShop, outcome))
                    .map_err(js_err)?;
                self.ar_hunt = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn ar_time_remaining(&self) -> u32 {
        self.ar_hunt
            .as_ref()
            .map_or(0, |h| h.time_remaining_secs(now_ms()))
    }

    /// No AR on this device: take the fixed award
    pub fn ar_skip(&mut self) -> Result<(), JsValue> {
        let mut hunt = self.ar_hunt.take().unwrap_or_else(|| self.session.ar_hunt());
        let outcome = hunt
            .skip()
            .ok_or_else(|| JsValue::from_str("AR hunt already over"))?;
        self.session
            .complete_phase(PhaseCompletion::from_outcome(GamePhase::WeaponShop, outcome))
            .map_err(js_err)
    }

    /// AR session failed to start
    pub fn ar_fail(&mut self) -> Result<(), JsValue> {
        let mut hunt = self.ar_hunt.take().unwrap_or_else(|| self.session.ar_hunt());
        let outcome = hunt
            .fail()
            .ok_or_else(|| JsValue::from_str("AR hunt already over"))?;
        self.session
            .complete_phase(PhaseCompletion::from_outcome(GamePhase::WeaponShop, outcome))
            .map_err(js_err)
    }

    // ---- Shop ----

    pub fn select_weapon(&mut self, category: &str, weapon_id: &str) -> Result<(), JsValue> {
        let category = WeaponCategory::from_str(category)
            .ok_or_else(|| JsValue::from_str(&format!("unknown category {category}")))?;
        self.session
            .select_weapon(category, weapon_id)
            .map_err(js_err)
    }

    pub fn can_afford(&self, weapon_id: &str) -> bool {
        self.session.can_afford(weapon_id)
    }

    pub fn total_cost(&self) -> u32 {
        self.session.total_cost()
    }

    pub fn can_proceed(&self) -> bool {
        self.session.can_proceed()
    }

    pub fn confirm_purchase(&mut self) -> Result<(), JsValue> {
        self.session.confirm_purchase().map_err(js_err)?;
        self.battle = Some(self.session.battle());
        self.shake = Some(self.session.shake_detector());
        Ok(())
    }

    // ---- Battle ----

    pub fn battle_place(&mut self) {
        if let Some(battle) = self.battle.as_mut() {
            battle.place();
            battle.engage();
        }
    }

    /// Tap on the boss; returns true on the defeating hit
    pub fn battle_tap(&mut self) -> Result<bool, JsValue> {
        let hit = self.battle.as_mut().map_or(Hit::Ignored, |b| b.strike());
        self.on_hit(hit)
    }

    /// Accelerometer sample (m/s², gravity included)
    pub fn battle_motion(&mut self, x: f32, y: f32, z: f32) -> Result<bool, JsValue> {
        let shaken = self
            .shake
            .as_mut()
            .is_some_and(|s| s.sample(Vec3::new(x, y, z), now_ms()));
        if !shaken {
            return Ok(false);
        }
        let hit = self.battle.as_mut().map_or(Hit::Ignored, |b| b.strike());
        self.on_hit(hit)
    }

    /// Devices without AR win without fighting
    pub fn battle_skip(&mut self) -> Result<(), JsValue> {
        let hit = match self.battle.as_mut() {
            Some(battle) => battle.auto_victory(),
            None => Hit::Ignored,
        };
        self.on_hit(hit).map(|_| ())
    }

    pub fn boss_json(&self) -> Result<String, JsValue> {
        match &self.battle {
            Some(battle) => to_json(battle.boss()),
            None => Ok("null".into()),
        }
    }

    fn on_hit(&mut self, hit: Hit) -> Result<bool, JsValue> {
        if let Hit::Defeated { .. } = hit {
            self.session
                .complete_phase(PhaseCompletion::advance(GamePhase::Victory))
                .map_err(js_err)?;
            return Ok(true);
        }
        Ok(false)
    }

    // ---- Session ----

    pub fn events_json(&mut self) -> Result<String, JsValue> {
        to_json(&self.session.drain_events())
    }

    /// Victory screen "play again"
    pub fn reset(&mut self) {
        if let Some(hunt) = self.hunt.as_mut() {
            hunt.cancel();
        }
        self.hunt = None;
        self.ar_hunt = None;
        self.battle = None;
        self.shake = None;
        self.session.reset();
    }
}

impl Default for WebSession {
    fn default() -> Self {
        Self::new()
    }
}
