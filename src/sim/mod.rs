//! Deterministic mini-game simulation
//!
//! All timing and matching logic lives here. This module must stay pure:
//! - Time only comes in as `now` from the host's tick source
//! - Seeded RNG only
//! - No rendering, camera or platform dependencies

pub mod ar_hunt;
pub mod battle;
pub mod coins;
pub mod difficulty;
pub mod hunt;
pub mod matcher;
pub mod shake;
pub mod timer;

pub use ar_hunt::{ArCoinHunt, ArHuntEnd, ArHuntState};
pub use battle::{BattlePhase, BossBattle, BossState, HealthTier, Hit};
pub use coins::{Coin, CoinField, CoinState, FieldTick, SpawnArea};
pub use difficulty::{Stage, StageTable, stage_for};
pub use hunt::{CoinHunt, CoinView, HuntEvent, HuntOutcome, HuntSnapshot, HuntStage};
pub use matcher::{DetectorSignal, Dwell, Expression, ExpressionScores, MatchDetector, MatchTarget};
pub use shake::ShakeDetector;
pub use timer::PhaseTimer;
