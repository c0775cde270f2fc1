//! Coin Quest entry point
//!
//! The browser build is driven from JS through `platform::web::WebSession`.
//! Natively this runs a headless scripted playthrough with a bot player.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use coin_quest::Millis;
    use coin_quest::platform::{init_logging, now_ms};
    use coin_quest::session::{
        ArHuntMode, BattleMode, Capabilities, GamePhase, GameSession, PhaseCompletion,
    };
    use coin_quest::shop::{WeaponCatalog, WeaponCategory};
    use coin_quest::sim::{CoinHunt, DetectorSignal, ExpressionScores, Hit};
    use coin_quest::tuning::Tuning;
    use glam::Vec2;

    /// 20 fps simulated frame clock
    const FRAME_MS: Millis = 50;
    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    /// Chase the oldest active coin
    fn pinch_bot(hunt: &CoinHunt) -> DetectorSignal {
        hunt.field()
            .coins()
            .iter()
            .find(|c| c.is_active())
            .map(|c| DetectorSignal::Pinch(c.pos))
            .unwrap_or_default()
    }

    /// Pull the face the oldest active coin asks for
    fn face_bot(hunt: &CoinHunt) -> DetectorSignal {
        hunt.field()
            .coins()
            .iter()
            .find(|c| c.is_active())
            .and_then(|c| c.target)
            .map(|e| DetectorSignal::Expressions(ExpressionScores::new().with(e, 0.9)))
            .unwrap_or_default()
    }

    fn play_hunt(
        mut hunt: CoinHunt,
        bot: fn(&CoinHunt) -> DetectorSignal,
        clock: &mut Millis,
    ) -> Option<coin_quest::sim::HuntOutcome> {
        hunt.start(*clock);
        // Model loading takes a moment
        *clock += 800;
        hunt.set_detector_ready(true);
        loop {
            let signal = bot(&hunt);
            if let Some(outcome) = hunt.tick(*clock, &signal) {
                return Some(outcome);
            }
            *clock += FRAME_MS;
            if *clock > 600_000 {
                log::error!("Hunt never finished");
                return None;
            }
        }
    }

    /// Best weapon per slot that the remaining coins allow, cheapest slot first
    fn shop_bot(session: &mut GameSession) -> coin_quest::Result<()> {
        let catalog = session.catalog().clone();
        for category in WeaponCategory::ALL {
            let free = catalog
                .in_category(category)
                .min_by_key(|w| w.cost)
                .map(|w| w.id.clone());
            if let Some(id) = free {
                session.select_weapon(category, &id)?;
            }
        }
        for category in [WeaponCategory::Sword, WeaponCategory::Shield, WeaponCategory::Helmet] {
            let mut options: Vec<_> = catalog.in_category(category).collect();
            options.sort_by_key(|w| std::cmp::Reverse(w.cost));
            if let Some(best) = options.into_iter().find(|w| session.can_afford(&w.id)) {
                session.select_weapon(category, &best.id)?;
            }
        }
        log::info!(
            "Loadout {:?} costs {} of {} coins",
            session.state().weapons,
            session.total_cost(),
            session.total_coins()
        );
        session.confirm_purchase()
    }

    pub fn run() -> coin_quest::Result<()> {
        init_logging();
        let seed = std::env::args()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(now_ms);
        log::info!("Coin Quest (native) headless playthrough, seed {}", seed);

        let mut session = GameSession::new(Tuning::load(), WeaponCatalog::default())?;
        session.set_capabilities(Capabilities {
            camera_available: true,
            ar_available: false,
            motion_available: false,
        });
        session.complete_phase(PhaseCompletion::advance(GamePhase::GestureHunt))?;

        let mut clock: Millis = 0;
        let hunt = session.gesture_hunt(VIEWPORT, seed);
        if let Some(outcome) = play_hunt(hunt, pinch_bot, &mut clock) {
            session.complete_phase(PhaseCompletion::from_outcome(
                GamePhase::ExpressionHunt,
                outcome,
            ))?;
        }

        let hunt = session.expression_hunt(seed.wrapping_add(1));
        if let Some(outcome) = play_hunt(hunt, face_bot, &mut clock) {
            session.complete_phase(PhaseCompletion::from_outcome(GamePhase::ArHunt, outcome))?;
        }

        let mut ar = session.ar_hunt();
        let outcome = match session.ar_hunt_mode() {
            ArHuntMode::Fallback { .. } => ar.skip(),
            ArHuntMode::Interactive => {
                ar.place(clock);
                (0..ar.coin_count()).for_each(|id| {
                    ar.collect(id);
                });
                ar.tick(clock)
            }
        };
        if let Some(outcome) = outcome {
            session.complete_phase(PhaseCompletion::from_outcome(GamePhase::WeaponShop, outcome))?;
        }

        shop_bot(&mut session)?;

        let mut battle = session.battle();
        let mut hits = 0;
        let defeated = match session.battle_mode() {
            BattleMode::AutoVictory => matches!(battle.auto_victory(), Hit::Defeated { .. }),
            BattleMode::Tap | BattleMode::TapAndShake => {
                battle.place();
                battle.engage();
                loop {
                    hits += 1;
                    match battle.strike() {
                        Hit::Defeated { .. } => break true,
                        Hit::Ignored => break false,
                        Hit::Damaged { .. } => {}
                    }
                }
            }
        };
        if defeated {
            session.complete_phase(PhaseCompletion::advance(GamePhase::Victory))?;
        }

        let state = session.state();
        log::info!(
            "Finished in {:?} after {} hits: {} coins left, earned {:?}",
            state.phase,
            hits,
            state.total_coins,
            state.coins_per_source
        );
        println!("{}", session.state_json()?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = demo::run() {
        log::error!("Playthrough failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is WebSession, this is just to satisfy the compiler
}
