//! Difficulty stages
//!
//! A hunt ramps up in time-windowed stages. Each stage fixes how many coins
//! may be live at once, how quickly the next one is scheduled, how big coins
//! are and (for expression hunts) which expressions may be asked for.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::matcher::Expression;
use crate::Millis;
use crate::error::{GameError, Result};

/// One time window of a hunt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Elapsed hunt time (seconds) at which this stage takes over
    pub starts_at_secs: f32,
    /// Cap on simultaneously active coins
    pub max_concurrent: usize,
    /// Inclusive range the next spawn delay is drawn from
    pub spawn_interval_ms: (Millis, Millis),
    /// Coin diameter range in pixels
    pub size: (f32, f32),
    /// Expressions a coin may ask for (empty for gesture hunts)
    #[serde(default)]
    pub expressions: Vec<Expression>,
}

impl Stage {
    /// Draw the delay until the next spawn attempt
    pub fn roll_spawn_interval<R: Rng>(&self, rng: &mut R) -> Millis {
        let (lo, hi) = self.spawn_interval_ms;
        if lo >= hi {
            return lo;
        }
        rng.random_range(lo..=hi)
    }

    /// Draw a coin diameter; whole pixels like the coin sprites use
    pub fn roll_size<R: Rng>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = self.size;
        if lo >= hi {
            return lo;
        }
        rng.random_range(lo..hi).floor()
    }

    /// Draw the expression a new coin will ask for
    pub fn roll_expression<R: Rng>(&self, rng: &mut R) -> Option<Expression> {
        if self.expressions.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.expressions.len());
        Some(self.expressions[idx])
    }
}

/// Ordered list of stages (by `starts_at_secs`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageTable {
    pub stages: Vec<Stage>,
}

impl StageTable {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Pinch hunt ramp: 1 → 3 → 4 coins, shrinking from 80-100px to 40-60px
    pub fn gesture() -> Self {
        Self::new(vec![
            Stage {
                starts_at_secs: 0.0,
                max_concurrent: 1,
                spawn_interval_ms: (1000, 1500),
                size: (80.0, 100.0),
                expressions: Vec::new(),
            },
            Stage {
                starts_at_secs: 10.0,
                max_concurrent: 3,
                spawn_interval_ms: (800, 1200),
                size: (60.0, 80.0),
                expressions: Vec::new(),
            },
            Stage {
                starts_at_secs: 20.0,
                max_concurrent: 4,
                spawn_interval_ms: (500, 1000),
                size: (40.0, 60.0),
                expressions: Vec::new(),
            },
        ])
    }

    /// Expression hunt ramp: more coins and a wider expression vocabulary
    pub fn expression() -> Self {
        use Expression::*;
        Self::new(vec![
            Stage {
                starts_at_secs: 0.0,
                max_concurrent: 1,
                spawn_interval_ms: (1500, 2000),
                size: (80.0, 100.0),
                expressions: vec![Happy, Sad, Neutral],
            },
            Stage {
                starts_at_secs: 10.0,
                max_concurrent: 2,
                spawn_interval_ms: (1000, 1500),
                size: (60.0, 80.0),
                expressions: vec![Happy, Sad, Neutral, Angry],
            },
            Stage {
                starts_at_secs: 20.0,
                max_concurrent: 3,
                spawn_interval_ms: (500, 1000),
                size: (40.0, 60.0),
                expressions: Expression::ALL.to_vec(),
            },
        ])
    }

    /// Check the table is usable; `needs_expressions` for expression hunts
    pub fn validate(&self, needs_expressions: bool) -> Result<()> {
        let first = self
            .stages
            .first()
            .ok_or_else(|| GameError::InvalidTuning("stage table is empty".into()))?;
        if first.starts_at_secs != 0.0 {
            return Err(GameError::InvalidTuning(format!(
                "first stage starts at {}s, expected 0",
                first.starts_at_secs
            )));
        }
        for pair in self.stages.windows(2) {
            if pair[1].starts_at_secs <= pair[0].starts_at_secs {
                return Err(GameError::InvalidTuning(
                    "stage thresholds must be strictly increasing".into(),
                ));
            }
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.max_concurrent == 0 {
                return Err(GameError::InvalidTuning(format!(
                    "stage {i} allows no coins"
                )));
            }
            if stage.spawn_interval_ms.0 > stage.spawn_interval_ms.1 {
                return Err(GameError::InvalidTuning(format!(
                    "stage {i} spawn interval is inverted"
                )));
            }
            if stage.size.0 > stage.size.1 || stage.size.0 <= 0.0 {
                return Err(GameError::InvalidTuning(format!(
                    "stage {i} size range is invalid"
                )));
            }
            if needs_expressions && stage.expressions.is_empty() {
                return Err(GameError::InvalidTuning(format!(
                    "stage {i} has no expressions to ask for"
                )));
            }
        }
        Ok(())
    }
}

/// Stage in force after `elapsed_secs` of hunt time
///
/// Picks the last stage whose threshold has been reached; the first stage
/// covers any earlier time. `None` only for an empty table.
pub fn stage_for(elapsed_secs: f32, table: &StageTable) -> Option<&Stage> {
    table
        .stages
        .iter()
        .rev()
        .find(|s| elapsed_secs >= s.starts_at_secs)
        .or_else(|| table.stages.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_stage_for_thresholds() {
        let table = StageTable::gesture();
        assert_eq!(stage_for(5.0, &table).unwrap().max_concurrent, 1);
        assert_eq!(stage_for(15.0, &table).unwrap().max_concurrent, 3);
        assert_eq!(stage_for(25.0, &table).unwrap().max_concurrent, 4);
    }

    #[test]
    fn test_stage_boundaries_are_half_open() {
        let table = StageTable::gesture();
        assert_eq!(stage_for(0.0, &table).unwrap(), &table.stages[0]);
        assert_eq!(stage_for(9.99, &table).unwrap(), &table.stages[0]);
        assert_eq!(stage_for(10.0, &table).unwrap(), &table.stages[1]);
        assert_eq!(stage_for(20.0, &table).unwrap(), &table.stages[2]);
        assert_eq!(stage_for(1000.0, &table).unwrap(), &table.stages[2]);
    }

    #[test]
    fn test_expression_vocabulary_grows() {
        let table = StageTable::expression();
        assert_eq!(stage_for(0.0, &table).unwrap().expressions.len(), 3);
        assert!(stage_for(12.0, &table).unwrap().expressions.contains(&Expression::Angry));
        assert_eq!(stage_for(21.0, &table).unwrap().expressions.len(), 6);
    }

    #[test]
    fn test_rolls_stay_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        let stage = &StageTable::expression().stages[1];
        for _ in 0..200 {
            let interval = stage.roll_spawn_interval(&mut rng);
            assert!((1000..=1500).contains(&interval));
            let size = stage.roll_size(&mut rng);
            assert!((60.0..80.0).contains(&size));
            let expr = stage.roll_expression(&mut rng).unwrap();
            assert!(stage.expressions.contains(&expr));
        }
    }

    #[test]
    fn test_gesture_stage_has_no_expression() {
        let mut rng = Pcg32::seed_from_u64(1);
        let stage = &StageTable::gesture().stages[0];
        assert_eq!(stage.roll_expression(&mut rng), None);
    }

    #[test]
    fn test_empty_table_has_no_stage() {
        let table = StageTable::new(Vec::new());
        assert_eq!(stage_for(0.0, &table), None);
        assert_eq!(stage_for(25.0, &table), None);
    }

    #[test]
    fn test_stage_before_first_threshold() {
        let mut table = StageTable::gesture();
        table.stages[0].starts_at_secs = 2.0;
        assert_eq!(stage_for(1.0, &table), Some(&table.stages[0]));
    }

    #[test]
    fn test_validate_defaults() {
        assert!(StageTable::gesture().validate(false).is_ok());
        assert!(StageTable::expression().validate(true).is_ok());
        // Gesture stages carry no expressions
        assert!(StageTable::gesture().validate(true).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        assert!(StageTable::new(Vec::new()).validate(false).is_err());

        let mut unsorted = StageTable::gesture();
        unsorted.stages.swap(1, 2);
        assert!(unsorted.validate(false).is_err());

        let mut late_start = StageTable::gesture();
        late_start.stages[0].starts_at_secs = 1.0;
        assert!(late_start.validate(false).is_err());

        let mut inverted = StageTable::gesture();
        inverted.stages[2].spawn_interval_ms = (900, 100);
        assert!(inverted.validate(false).is_err());
    }

    proptest! {
        #[test]
        fn prop_stage_never_regresses(a in 0.0f32..60.0, b in 0.0f32..60.0) {
            let table = StageTable::gesture();
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                stage_for(early, &table).unwrap().starts_at_secs <= stage_for(late, &table).unwrap().starts_at_secs
            );
        }
    }
}
