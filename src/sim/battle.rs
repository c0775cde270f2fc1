//! Boss battle damage accumulator
//!
//! The host's tap or shake detector feeds discrete damage events. Health only
//! goes down, never below zero, and the defeat fires exactly once.

use serde::{Deserialize, Serialize};

use crate::tuning::BattleTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Waiting for the player to place the boss on a surface
    Idle,
    /// Boss placed, fight not started
    Placed,
    InBattle,
    Defeated,
}

/// Health bar colour band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthTier {
    /// Above 60%
    High,
    /// Above 30%
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossState {
    pub health: u32,
    pub max_health: u32,
    pub is_defeated: bool,
}

/// Result of one damage event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hit {
    /// Not in battle (not started yet, or already won)
    Ignored,
    Damaged { dealt: u32, health: u32 },
    /// This hit finished the boss
    Defeated { dealt: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossBattle {
    phase: BattlePhase,
    boss: BossState,
    /// Damage per tap/shake: base + weapon bonus, fixed at battle start
    damage_per_hit: u32,
}

impl BossBattle {
    pub fn new(tuning: &BattleTuning, damage_bonus: u32) -> Self {
        let damage_per_hit = tuning.base_damage.saturating_add(damage_bonus);
        log::info!(
            "Battle set up: boss {} HP, {} damage per hit",
            tuning.boss_health,
            damage_per_hit
        );
        Self {
            phase: BattlePhase::Idle,
            boss: BossState {
                health: tuning.boss_health,
                max_health: tuning.boss_health,
                is_defeated: false,
            },
            damage_per_hit,
        }
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn boss(&self) -> &BossState {
        &self.boss
    }

    pub fn damage_per_hit(&self) -> u32 {
        self.damage_per_hit
    }

    pub fn is_defeated(&self) -> bool {
        self.boss.is_defeated
    }

    /// Surface placement event; the coordinates don't matter here
    pub fn place(&mut self) {
        if self.phase == BattlePhase::Idle {
            log::info!("Boss placed");
            self.phase = BattlePhase::Placed;
        }
    }

    /// Start the fight after placement
    pub fn engage(&mut self) {
        if self.phase == BattlePhase::Placed {
            log::info!("Battle started");
            self.phase = BattlePhase::InBattle;
        }
    }

    /// One tap on the boss
    pub fn strike(&mut self) -> Hit {
        self.apply_damage(self.damage_per_hit)
    }

    /// Apply a damage event of `amount`
    pub fn apply_damage(&mut self, amount: u32) -> Hit {
        if self.phase != BattlePhase::InBattle {
            log::debug!("Damage ignored in {:?}", self.phase);
            return Hit::Ignored;
        }
        let before = self.boss.health;
        self.boss.health = before.saturating_sub(amount);
        let dealt = before - self.boss.health;

        if self.boss.health == 0 {
            self.boss.is_defeated = true;
            self.phase = BattlePhase::Defeated;
            log::info!("Boss defeated");
            return Hit::Defeated { dealt };
        }
        Hit::Damaged {
            dealt,
            health: self.boss.health,
        }
    }

    /// Devices without AR skip straight to the win
    pub fn auto_victory(&mut self) -> Hit {
        if self.boss.is_defeated {
            return Hit::Ignored;
        }
        log::info!("Battle skipped: automatic victory");
        let dealt = self.boss.health;
        self.boss.health = 0;
        self.boss.is_defeated = true;
        self.phase = BattlePhase::Defeated;
        Hit::Defeated { dealt }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.boss.max_health == 0 {
            return 0.0;
        }
        self.boss.health as f32 / self.boss.max_health as f32
    }

    pub fn health_tier(&self) -> HealthTier {
        let health = self.boss.health as u64 * 100;
        let max = self.boss.max_health as u64;
        if health > max * 60 {
            HealthTier::High
        } else if health > max * 30 {
            HealthTier::Medium
        } else {
            HealthTier::Low
        }
    }
}
