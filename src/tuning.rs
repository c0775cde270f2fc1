//! Data-driven game balance
//!
//! Every timing and economy constant in one serde struct. Missing fields fall
//! back to the canonical values, so a tuning file only needs the overrides.

use serde::{Deserialize, Serialize};

use crate::Millis;
use crate::consts::*;
use crate::error::{GameError, Result};
use crate::sim::{SpawnArea, StageTable};

/// Timing shared by the camera hunts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinTiming {
    pub duration_secs: u32,
    pub lifetime_ms: Millis,
    pub fade_ms: Millis,
    pub dwell_ms: Millis,
}

impl Default for CoinTiming {
    fn default() -> Self {
        Self {
            duration_secs: HUNT_DURATION_SECS,
            lifetime_ms: COIN_LIFETIME_MS,
            fade_ms: COIN_FADE_MS,
            dwell_ms: MATCH_DWELL_MS,
        }
    }
}

/// Pinch hunt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    pub timing: CoinTiming,
    /// Hit radius as a multiple of the coin radius
    pub hit_radius_scale: f32,
    pub stages: StageTable,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            timing: CoinTiming::default(),
            hit_radius_scale: HIT_RADIUS_SCALE,
            stages: StageTable::gesture(),
        }
    }
}

/// Facial expression hunt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionTuning {
    pub timing: CoinTiming,
    /// Minimum classifier confidence, in (0, 1]
    pub threshold: f32,
    pub stages: StageTable,
}

impl Default for ExpressionTuning {
    fn default() -> Self {
        Self {
            timing: CoinTiming::default(),
            threshold: EXPRESSION_THRESHOLD,
            stages: StageTable::expression(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArHuntTuning {
    pub duration_secs: u32,
    pub coin_count: u32,
    /// Coins granted when the device has no AR
    pub fallback_award: u32,
    /// Coins granted when the AR session fails to start
    pub failure_award: u32,
}

impl Default for ArHuntTuning {
    fn default() -> Self {
        Self {
            duration_secs: AR_HUNT_DURATION_SECS,
            coin_count: AR_COIN_COUNT,
            fallback_award: AR_FALLBACK_AWARD,
            failure_award: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleTuning {
    pub boss_health: u32,
    pub base_damage: u32,
}

impl Default for BattleTuning {
    fn default() -> Self {
        Self {
            boss_health: BOSS_HEALTH,
            base_damage: BASE_DAMAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeTuning {
    pub threshold: f32,
    pub cooldown_ms: Millis,
}

impl Default for ShakeTuning {
    fn default() -> Self {
        Self {
            threshold: SHAKE_THRESHOLD,
            cooldown_ms: SHAKE_COOLDOWN_MS,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub gesture: GestureTuning,
    pub expression: ExpressionTuning,
    pub spawn_area: SpawnArea,
    pub ar_hunt: ArHuntTuning,
    pub battle: BattleTuning,
    pub shake: ShakeTuning,
}

impl Tuning {
    /// Parse and validate a (possibly partial) JSON tuning document
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.gesture.stages.validate(false)?;
        self.expression.stages.validate(true)?;

        for (name, timing) in [
            ("gesture", &self.gesture.timing),
            ("expression", &self.expression.timing),
        ] {
            if timing.duration_secs == 0 {
                return Err(GameError::InvalidTuning(format!("{name} hunt has no duration")));
            }
            if timing.lifetime_ms == 0 {
                return Err(GameError::InvalidTuning(format!(
                    "{name} coins have no lifetime"
                )));
            }
        }

        if !(self.expression.threshold > 0.0 && self.expression.threshold <= 1.0) {
            return Err(GameError::InvalidTuning(format!(
                "expression threshold {} outside (0, 1]",
                self.expression.threshold
            )));
        }
        if self.gesture.hit_radius_scale <= 0.0 {
            return Err(GameError::InvalidTuning("hit radius scale must be positive".into()));
        }

        let area = &self.spawn_area;
        let in_unit = |(lo, hi): (f32, f32)| (0.0..=1.0).contains(&lo) && (0.0..=1.0).contains(&hi) && lo <= hi;
        if !in_unit(area.x) || !in_unit(area.y) {
            return Err(GameError::InvalidTuning("spawn area must lie inside the unit square".into()));
        }

        if self.ar_hunt.duration_secs == 0 {
            return Err(GameError::InvalidTuning("AR hunt has no duration".into()));
        }
        if self.battle.boss_health == 0 {
            return Err(GameError::InvalidTuning("boss starts dead".into()));
        }
        // The free loadout adds no bonus, so base damage alone must hurt
        if self.battle.base_damage == 0 {
            return Err(GameError::InvalidTuning("base damage must be positive".into()));
        }
        Ok(())
    }

    /// LocalStorage key for a developer tuning override
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "coin_quest_tuning";

    /// Load the tuning override from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning override from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring tuning override: {}", e),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Load the tuning file named by `COIN_QUEST_TUNING`, if any
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var("COIN_QUEST_TUNING") else {
            return Self::default();
        };
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| GameError::InvalidTuning(format!("{path}: {e}")))
            .and_then(|json| Self::from_json(&json));
        match parsed {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning file: {}", e);
                Self::default()
            }
        }
    }
}
