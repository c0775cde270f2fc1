//! Crate error type
//!
//! Only host-side mistakes are errors. Lost detector signals, missing device
//! capabilities, repeated collection and damage after defeat are silent no-ops.

use thiserror::Error;

use crate::session::{CoinSource, GamePhase};
use crate::shop::WeaponCategory;

#[derive(Error, Debug)]
pub enum GameError {
    /// Requested phase is not the direct successor of the current one
    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition { from: GamePhase, to: GamePhase },

    /// Coins reported by a phase that doesn't earn them, or for another game
    #[error("Phase {phase:?} cannot credit coins from {source:?}")]
    UnexpectedCredit {
        phase: GamePhase,
        source: Option<CoinSource>,
    },

    #[error("Unknown weapon '{0}'")]
    UnknownWeapon(String),

    #[error("Weapon '{weapon}' is not a {expected:?}")]
    CategoryMismatch {
        weapon: String,
        expected: WeaponCategory,
    },

    #[error("Cannot afford '{weapon}': loadout would cost {cost}, have {available}")]
    CannotAfford {
        weapon: String,
        cost: u32,
        available: u32,
    },

    /// Every weapon slot must be filled before leaving the shop
    #[error("Loadout incomplete: pick a shield, a sword and a helmet")]
    IncompleteLoadout,

    #[error("Invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
