//! Session state machine
//!
//! `GameSession` is the single writer of `SessionState`. Mini-games get a
//! read-only view (tuning, capabilities, loadout) when they are created and
//! report back only a final count or a victory; the session applies it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::shop::{Loadout, WeaponCatalog, WeaponCategory};
use crate::sim::{ArCoinHunt, BossBattle, CoinHunt, HuntOutcome, ShakeDetector};
use crate::tuning::Tuning;

/// Top-level stage of a game session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Splash,
    GestureHunt,
    ExpressionHunt,
    ArHunt,
    WeaponShop,
    MonsterBattle,
    Victory,
}

impl GamePhase {
    /// The only phase this one may advance to
    pub fn next(&self) -> Option<GamePhase> {
        match self {
            GamePhase::Splash => Some(GamePhase::GestureHunt),
            GamePhase::GestureHunt => Some(GamePhase::ExpressionHunt),
            GamePhase::ExpressionHunt => Some(GamePhase::ArHunt),
            GamePhase::ArHunt => Some(GamePhase::WeaponShop),
            GamePhase::WeaponShop => Some(GamePhase::MonsterBattle),
            GamePhase::MonsterBattle => Some(GamePhase::Victory),
            GamePhase::Victory => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Splash => "splash",
            GamePhase::GestureHunt => "hand-tracking",
            GamePhase::ExpressionHunt => "facial-expression",
            GamePhase::ArHunt => "ar-hunt",
            GamePhase::WeaponShop => "weapon-shop",
            GamePhase::MonsterBattle => "monster-battle",
            GamePhase::Victory => "victory",
        }
    }

    /// Mini-game whose coins are credited when this phase completes
    pub fn coin_source(&self) -> Option<CoinSource> {
        match self {
            GamePhase::GestureHunt => Some(CoinSource::Gesture),
            GamePhase::ExpressionHunt => Some(CoinSource::Expression),
            GamePhase::ArHunt => Some(CoinSource::ArHunt),
            _ => None,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        [
            GamePhase::Splash,
            GamePhase::GestureHunt,
            GamePhase::ExpressionHunt,
            GamePhase::ArHunt,
            GamePhase::WeaponShop,
            GamePhase::MonsterBattle,
            GamePhase::Victory,
        ]
        .into_iter()
        .find(|p| p.as_str() == s)
    }
}

/// Which mini-game earned a credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinSource {
    Gesture,
    Expression,
    ArHunt,
}

/// Device capability probe result, fixed for the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub camera_available: bool,
    pub ar_available: bool,
    pub motion_available: bool,
}

/// Coins earned per mini-game (informational; spending isn't tracked here)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinLedger {
    pub gesture: u32,
    pub expression: u32,
    pub ar_hunt: u32,
}

impl CoinLedger {
    fn entry(&mut self, source: CoinSource) -> &mut u32 {
        match source {
            CoinSource::Gesture => &mut self.gesture,
            CoinSource::Expression => &mut self.expression,
            CoinSource::ArHunt => &mut self.ar_hunt,
        }
    }

    pub fn get(&self, source: CoinSource) -> u32 {
        match source {
            CoinSource::Gesture => self.gesture,
            CoinSource::Expression => self.expression,
            CoinSource::ArHunt => self.ar_hunt,
        }
    }
}

/// Everything the host UI renders from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: GamePhase,
    pub total_coins: u32,
    pub coins_per_source: CoinLedger,
    pub capabilities: Capabilities,
    pub weapons: Loadout,
}

/// Phase-completion callback payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCompletion {
    pub next: GamePhase,
    pub coins: Option<u32>,
    pub source: Option<CoinSource>,
}

impl PhaseCompletion {
    /// Plain advance, no coins
    pub fn advance(next: GamePhase) -> Self {
        Self {
            next,
            coins: None,
            source: None,
        }
    }

    pub fn with_coins(next: GamePhase, coins: u32, source: CoinSource) -> Self {
        Self {
            next,
            coins: Some(coins),
            source: Some(source),
        }
    }

    /// Hand a finished hunt's count to the next phase
    pub fn from_outcome(next: GamePhase, outcome: HuntOutcome) -> Self {
        Self::with_coins(next, outcome.collected, outcome.source)
    }
}

/// How the AR hunt will run on this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArHuntMode {
    Interactive,
    /// No AR: skip with a fixed award
    Fallback { award: u32 },
}

/// How the boss battle will run on this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleMode {
    /// Damage by tapping the placed boss
    Tap,
    /// Tapping plus phone shakes
    TapAndShake,
    /// No AR: the fight is skipped and won
    AutoVictory,
}

/// Notifications for the host UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    CoinsCredited { amount: u32, source: Option<CoinSource>, total: u32 },
    CoinsDebited { amount: u32, total: u32 },
    WeaponSelected { category: WeaponCategory, weapon: String },
    Reset,
}

/// Phase/session controller
#[derive(Debug, Clone)]
pub struct GameSession {
    state: SessionState,
    tuning: Tuning,
    catalog: WeaponCatalog,
    capabilities_probed: bool,
    events: Vec<SessionEvent>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::from_parts(Tuning::default(), WeaponCatalog::default())
    }
}

impl GameSession {
    /// New session at the splash screen; the tuning is validated first
    pub fn new(tuning: Tuning, catalog: WeaponCatalog) -> Result<Self> {
        tuning.validate()?;
        Ok(Self::from_parts(tuning, catalog))
    }

    fn from_parts(tuning: Tuning, catalog: WeaponCatalog) -> Self {
        Self {
            state: SessionState::default(),
            tuning,
            catalog,
            capabilities_probed: false,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn total_coins(&self) -> u32 {
        self.state.total_coins
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn catalog(&self) -> &WeaponCatalog {
        &self.catalog
    }

    /// Record the capability probe; only the first call per session counts
    pub fn set_capabilities(&mut self, capabilities: Capabilities) -> bool {
        if self.capabilities_probed {
            log::warn!("Capabilities already probed this session, ignoring {:?}", capabilities);
            return false;
        }
        log::info!("Device capabilities: {:?}", capabilities);
        self.state.capabilities = capabilities;
        self.capabilities_probed = true;
        true
    }

    /// Add coins; `source` also books them in the per-game ledger
    pub fn credit_coins(&mut self, amount: u32, source: Option<CoinSource>) {
        self.state.total_coins = self.state.total_coins.saturating_add(amount);
        if let Some(source) = source {
            let entry = self.state.coins_per_source.entry(source);
            *entry = entry.saturating_add(amount);
        }
        log::info!(
            "Credited {} coins ({:?}), total {}",
            amount,
            source,
            self.state.total_coins
        );
        self.events.push(SessionEvent::CoinsCredited {
            amount,
            source,
            total: self.state.total_coins,
        });
    }

    /// Remove coins, stopping at zero
    pub fn debit_coins(&mut self, amount: u32) {
        self.state.total_coins = self.state.total_coins.saturating_sub(amount);
        log::info!("Debited {} coins, total {}", amount, self.state.total_coins);
        self.events.push(SessionEvent::CoinsDebited {
            amount,
            total: self.state.total_coins,
        });
    }

    /// Host callback alias for `debit_coins`
    pub fn spend_coins(&mut self, amount: u32) {
        self.debit_coins(amount);
    }

    /// Put `weapon_id` in the `category` slot if the loadout stays affordable
    pub fn select_weapon(&mut self, category: WeaponCategory, weapon_id: &str) -> Result<()> {
        let weapon = self
            .catalog
            .find(weapon_id)
            .ok_or_else(|| GameError::UnknownWeapon(weapon_id.to_string()))?;
        if weapon.category != category {
            return Err(GameError::CategoryMismatch {
                weapon: weapon_id.to_string(),
                expected: category,
            });
        }
        if !self
            .catalog
            .can_afford(weapon, &self.state.weapons, self.state.total_coins)
        {
            return Err(GameError::CannotAfford {
                weapon: weapon_id.to_string(),
                cost: self.catalog.cost_with(weapon, &self.state.weapons),
                available: self.state.total_coins,
            });
        }

        log::debug!("Selected {} for {:?}", weapon_id, category);
        self.state.weapons.set(category, weapon_id);
        self.events.push(SessionEvent::WeaponSelected {
            category,
            weapon: weapon_id.to_string(),
        });
        Ok(())
    }

    pub fn total_cost(&self) -> u32 {
        self.catalog.total_cost(&self.state.weapons)
    }

    /// Shop card state for `weapon_id` (false for unknown ids)
    pub fn can_afford(&self, weapon_id: &str) -> bool {
        self.catalog.find(weapon_id).is_some_and(|w| {
            self.catalog
                .can_afford(w, &self.state.weapons, self.state.total_coins)
        })
    }

    /// The shop's proceed button: every slot filled
    pub fn can_proceed(&self) -> bool {
        self.state.weapons.is_complete()
    }

    /// Apply a phase-completion callback
    ///
    /// Only the direct successor phase is accepted. Coins are credited with
    /// the exact count reported, and only by the hunt phase that earned
    /// them. Leaving the shop pays for the loadout.
    pub fn complete_phase(&mut self, completion: PhaseCompletion) -> Result<()> {
        let from = self.state.phase;
        if from.next() != Some(completion.next) {
            return Err(GameError::InvalidTransition {
                from,
                to: completion.next,
            });
        }

        let credit_source = match (completion.coins, completion.source) {
            (None, None) => None,
            (_, source) => match from.coin_source() {
                Some(expected) if source.is_none_or(|s| s == expected) => Some(expected),
                _ => {
                    return Err(GameError::UnexpectedCredit {
                        phase: from,
                        source,
                    });
                }
            },
        };

        if from == GamePhase::WeaponShop {
            if !self.can_proceed() {
                return Err(GameError::IncompleteLoadout);
            }
            let cost = self.total_cost();
            log::info!("Purchasing loadout for {} coins", cost);
            self.debit_coins(cost);
        }

        if let Some(coins) = completion.coins {
            self.credit_coins(coins, credit_source);
        }

        log::info!("Phase {:?} -> {:?}", from, completion.next);
        self.state.phase = completion.next;
        self.events.push(SessionEvent::PhaseChanged {
            from,
            to: completion.next,
        });
        Ok(())
    }

    /// Pay for the loadout and go to the battle
    pub fn confirm_purchase(&mut self) -> Result<()> {
        self.complete_phase(PhaseCompletion::advance(GamePhase::MonsterBattle))
    }

    /// Back to the splash screen with a fresh session
    pub fn reset(&mut self) {
        log::info!("Session reset");
        self.state = SessionState::default();
        self.capabilities_probed = false;
        self.events.push(SessionEvent::Reset);
    }

    pub fn ar_hunt_mode(&self) -> ArHuntMode {
        if self.state.capabilities.ar_available {
            ArHuntMode::Interactive
        } else {
            ArHuntMode::Fallback {
                award: self.tuning.ar_hunt.fallback_award,
            }
        }
    }

    pub fn battle_mode(&self) -> BattleMode {
        let caps = &self.state.capabilities;
        match (caps.ar_available, caps.motion_available) {
            (false, _) => BattleMode::AutoVictory,
            (true, false) => BattleMode::Tap,
            (true, true) => BattleMode::TapAndShake,
        }
    }

    pub fn gesture_hunt(&self, viewport: Vec2, seed: u64) -> CoinHunt {
        CoinHunt::gesture(&self.tuning, viewport, seed)
    }

    pub fn expression_hunt(&self, seed: u64) -> CoinHunt {
        CoinHunt::expression(&self.tuning, seed)
    }

    pub fn ar_hunt(&self) -> ArCoinHunt {
        ArCoinHunt::new(&self.tuning.ar_hunt)
    }

    /// Battle with damage fixed from the current loadout
    pub fn battle(&self) -> BossBattle {
        let bonus = self.catalog.damage_bonus(&self.state.weapons);
        BossBattle::new(&self.tuning.battle, bonus)
    }

    pub fn shake_detector(&self) -> ShakeDetector {
        ShakeDetector::new(&self.tuning.shake)
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.state)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn session_at(phase: GamePhase) -> GameSession {
        let mut session = GameSession::default();
        while session.phase() != phase {
            let next = session.phase().next().unwrap();
            if session.phase() == GamePhase::WeaponShop {
                session.select_weapon(WeaponCategory::Shield, "wooden-shield").unwrap();
                session.select_weapon(WeaponCategory::Sword, "rusty-sword").unwrap();
                session.select_weapon(WeaponCategory::Helmet, "cloth-cap").unwrap();
            }
            session.complete_phase(PhaseCompletion::advance(next)).unwrap();
        }
        session
    }

    #[test]
    fn test_forward_only_transitions() {
        let mut session = GameSession::default();
        assert_eq!(session.phase(), GamePhase::Splash);

        let skip = session.complete_phase(PhaseCompletion::advance(GamePhase::ArHunt));
        assert!(matches!(skip, Err(GameError::InvalidTransition { .. })));
        let stay = session.complete_phase(PhaseCompletion::advance(GamePhase::Splash));
        assert!(stay.is_err());

        session
            .complete_phase(PhaseCompletion::advance(GamePhase::GestureHunt))
            .unwrap();
        let back = session.complete_phase(PhaseCompletion::advance(GamePhase::Splash));
        assert!(back.is_err());
        assert_eq!(session.phase(), GamePhase::GestureHunt);
    }

    #[test]
    fn test_victory_is_terminal() {
        let mut session = session_at(GamePhase::Victory);
        for phase in [GamePhase::Splash, GamePhase::Victory, GamePhase::MonsterBattle] {
            assert!(session.complete_phase(PhaseCompletion::advance(phase)).is_err());
        }
    }

    #[test]
    fn test_completion_credits_exact_count() {
        let mut session = session_at(GamePhase::GestureHunt);
        session
            .complete_phase(PhaseCompletion::with_coins(
                GamePhase::ExpressionHunt,
                12,
                CoinSource::Gesture,
            ))
            .unwrap();
        session
            .complete_phase(PhaseCompletion::with_coins(
                GamePhase::ArHunt,
                7,
                CoinSource::Expression,
            ))
            .unwrap();
        assert_eq!(session.total_coins(), 19);
        assert_eq!(session.state().coins_per_source.gesture, 12);
        assert_eq!(session.state().coins_per_source.get(CoinSource::Expression), 7);
        assert_eq!(session.state().coins_per_source.ar_hunt, 0);
    }

    #[test]
    fn test_rejected_transition_credits_nothing() {
        let mut session = session_at(GamePhase::GestureHunt);
        let bad = PhaseCompletion::with_coins(GamePhase::WeaponShop, 50, CoinSource::Gesture);
        assert!(session.complete_phase(bad).is_err());
        assert_eq!(session.total_coins(), 0);
    }

    #[test]
    fn test_credit_must_come_from_the_finishing_hunt() {
        let mut session = GameSession::default();
        let early = PhaseCompletion::with_coins(GamePhase::GestureHunt, 5, CoinSource::Gesture);
        assert!(matches!(
            session.complete_phase(early),
            Err(GameError::UnexpectedCredit {
                phase: GamePhase::Splash,
                ..
            })
        ));
        assert_eq!(session.phase(), GamePhase::Splash);
        session
            .complete_phase(PhaseCompletion::advance(GamePhase::GestureHunt))
            .unwrap();

        let wrong = PhaseCompletion::with_coins(GamePhase::ExpressionHunt, 9, CoinSource::ArHunt);
        assert!(matches!(
            session.complete_phase(wrong),
            Err(GameError::UnexpectedCredit {
                source: Some(CoinSource::ArHunt),
                ..
            })
        ));
        assert_eq!(session.total_coins(), 0);
        assert_eq!(session.phase(), GamePhase::GestureHunt);

        // Coins without a source are booked to the hunt that finished
        let unlabeled = PhaseCompletion {
            next: GamePhase::ExpressionHunt,
            coins: Some(4),
            source: None,
        };
        session.complete_phase(unlabeled).unwrap();
        assert_eq!(session.state().coins_per_source.gesture, 4);
    }

    #[test]
    fn test_new_rejects_unusable_tuning() {
        let mut tuning = Tuning::default();
        tuning.gesture.stages = crate::sim::StageTable::new(Vec::new());
        assert!(matches!(
            GameSession::new(tuning, WeaponCatalog::default()),
            Err(GameError::InvalidTuning(_))
        ));
        assert!(GameSession::new(Tuning::default(), WeaponCatalog::default()).is_ok());
    }

    #[test]
    fn test_debit_clamps_at_zero() {
        let mut session = GameSession::default();
        session.credit_coins(5, None);
        session.debit_coins(8);
        assert_eq!(session.total_coins(), 0);
    }

    #[test]
    fn test_capabilities_first_probe_wins() {
        let mut session = GameSession::default();
        let full = Capabilities {
            camera_available: true,
            ar_available: true,
            motion_available: true,
        };
        assert!(session.set_capabilities(full));
        assert!(!session.set_capabilities(Capabilities::default()));
        assert_eq!(session.state().capabilities, full);
        assert_eq!(session.ar_hunt_mode(), ArHuntMode::Interactive);
        assert_eq!(session.battle_mode(), BattleMode::TapAndShake);
    }

    #[test]
    fn test_no_ar_policy() {
        let mut session = GameSession::default();
        session.set_capabilities(Capabilities {
            camera_available: true,
            ar_available: false,
            motion_available: true,
        });
        assert_eq!(session.ar_hunt_mode(), ArHuntMode::Fallback { award: 10 });
        assert_eq!(session.battle_mode(), BattleMode::AutoVictory);
    }

    #[test]
    fn test_select_weapon_checks() {
        let mut session = session_at(GamePhase::WeaponShop);
        session.credit_coins(20, None);

        assert!(matches!(
            session.select_weapon(WeaponCategory::Sword, "excalibur"),
            Err(GameError::UnknownWeapon(_))
        ));
        assert!(matches!(
            session.select_weapon(WeaponCategory::Shield, "iron-sword"),
            Err(GameError::CategoryMismatch { .. })
        ));

        session.select_weapon(WeaponCategory::Sword, "iron-sword").unwrap();
        assert!(!session.can_afford("diamond-sword"));
        assert!(session.can_afford("iron-sword"));
        assert!(matches!(
            session.select_weapon(WeaponCategory::Sword, "diamond-sword"),
            Err(GameError::CannotAfford { cost: 35, available: 20, .. })
        ));
        assert_eq!(session.state().weapons.sword.as_deref(), Some("iron-sword"));
        // Selecting doesn't spend anything yet
        assert_eq!(session.total_coins(), 20);
    }

    #[test]
    fn test_shop_requires_full_loadout_and_pays_once() {
        let mut session = session_at(GamePhase::WeaponShop);
        session.credit_coins(60, None);
        session.select_weapon(WeaponCategory::Sword, "diamond-sword").unwrap();
        session.select_weapon(WeaponCategory::Shield, "iron-shield").unwrap();
        assert!(!session.can_proceed());
        assert!(matches!(
            session.confirm_purchase(),
            Err(GameError::IncompleteLoadout)
        ));
        assert_eq!(session.total_coins(), 60);

        session.select_weapon(WeaponCategory::Helmet, "cloth-cap").unwrap();
        assert_eq!(session.total_cost(), 50);
        session.confirm_purchase().unwrap();
        assert_eq!(session.total_coins(), 10);
        assert_eq!(session.phase(), GamePhase::MonsterBattle);
        // A second confirm is an invalid transition, not a second charge
        assert!(session.confirm_purchase().is_err());
        assert_eq!(session.total_coins(), 10);
    }

    #[test]
    fn test_battle_uses_loadout_bonus() {
        let mut session = session_at(GamePhase::WeaponShop);
        session.credit_coins(100, None);
        session.select_weapon(WeaponCategory::Shield, "gold-shield").unwrap();
        session.select_weapon(WeaponCategory::Sword, "diamond-sword").unwrap();
        session.select_weapon(WeaponCategory::Helmet, "steel-helmet").unwrap();
        session.confirm_purchase().unwrap();
        assert_eq!(session.battle().damage_per_hit(), 10 + 25);
    }

    #[test]
    fn test_events_and_reset() {
        let mut session = GameSession::default();
        session.set_capabilities(Capabilities::default());
        session
            .complete_phase(PhaseCompletion::advance(GamePhase::GestureHunt))
            .unwrap();
        let events = session.drain_events();
        assert_eq!(
            events,
            vec![SessionEvent::PhaseChanged {
                from: GamePhase::Splash,
                to: GamePhase::GestureHunt
            }]
        );
        assert!(session.drain_events().is_empty());

        session.credit_coins(3, Some(CoinSource::Gesture));
        session.reset();
        assert_eq!(session.state(), &SessionState::default());
        // A fresh session may probe again
        assert!(session.set_capabilities(Capabilities::default()));
    }

    #[test]
    fn test_state_json() {
        let session = session_at(GamePhase::ArHunt);
        let json = session.state_json().unwrap();
        let state: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(state.phase, GamePhase::ArHunt);
    }

    #[test]
    fn test_phase_names() {
        let mut phase = GamePhase::Splash;
        loop {
            assert_eq!(GamePhase::from_str(phase.as_str()), Some(phase));
            match phase.next() {
                Some(next) => phase = next,
                None => break,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_coins_never_negative(ops in proptest::collection::vec((any::<bool>(), 0u32..100), 0..60)) {
            let mut session = GameSession::default();
            let mut expected: i64 = 0;
            for (credit, amount) in ops {
                if credit {
                    session.credit_coins(amount, Some(CoinSource::Gesture));
                    expected += amount as i64;
                } else {
                    session.debit_coins(amount);
                    expected = (expected - amount as i64).max(0);
                }
                prop_assert_eq!(session.total_coins() as i64, expected);
            }
        }
    }
}
