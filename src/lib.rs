//! Coin Quest - phase orchestration and mini-game timing engine
//!
//! Core modules:
//! - `sim`: Deterministic mini-game simulation (coins, timers, matching, battle)
//! - `session`: Top-level phase state machine and coin ledger
//! - `shop`: Weapon catalog and purchase economy
//! - `tuning`: Data-driven game balance
//! - `platform`: Browser/native platform abstraction

pub mod error;
pub mod platform;
pub mod session;
pub mod shop;
pub mod sim;
pub mod tuning;

pub use error::{GameError, Result};
pub use session::{
    ArHuntMode, BattleMode, Capabilities, CoinLedger, CoinSource, GamePhase, GameSession,
    PhaseCompletion, SessionEvent, SessionState,
};
pub use shop::{Loadout, Weapon, WeaponCatalog, WeaponCategory};
pub use tuning::Tuning;

/// Milliseconds from an arbitrary monotonic origin, supplied by the host's tick source
pub type Millis = u64;

/// Game configuration constants
pub mod consts {
    use crate::Millis;

    /// Gesture and expression hunts last 30 seconds
    pub const HUNT_DURATION_SECS: u32 = 30;
    /// AR hunt lasts 60 seconds from placement
    pub const AR_HUNT_DURATION_SECS: u32 = 60;

    /// How long a coin stays collectible
    pub const COIN_LIFETIME_MS: Millis = 3_000;
    /// Fade-out animation length before a coin is dropped
    pub const COIN_FADE_MS: Millis = 500;
    /// Minimum continuous match before a coin is collected
    pub const MATCH_DWELL_MS: Millis = 300;

    /// Pinch point must land inside `radius * HIT_RADIUS_SCALE`
    pub const HIT_RADIUS_SCALE: f32 = 1.5;
    /// Expression classifier confidence needed for a match
    pub const EXPRESSION_THRESHOLD: f32 = 0.65;

    /// Coins placed around the player in the AR hunt
    pub const AR_COIN_COUNT: u32 = 18;
    /// Award for devices that cannot run the AR hunt
    pub const AR_FALLBACK_AWARD: u32 = 10;

    /// Boss starting health
    pub const BOSS_HEALTH: u32 = 500;
    /// Damage per hit before weapon bonuses
    pub const BASE_DAMAGE: u32 = 10;

    /// Acceleration magnitude (m/s², gravity included) that counts as a shake
    pub const SHAKE_THRESHOLD: f32 = 25.0;
    /// Minimum gap between two accepted shakes
    pub const SHAKE_COOLDOWN_MS: Millis = 500;
}

/// Whole seconds shown for a countdown with `remaining_ms` left (rounded up)
#[inline]
pub fn ceil_secs(remaining_ms: Millis) -> u32 {
    remaining_ms.div_ceil(1000) as u32
}
