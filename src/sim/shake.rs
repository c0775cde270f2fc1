//! Shake gesture detection from accelerometer samples

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::Millis;
use crate::tuning::ShakeTuning;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShakeDetector {
    threshold: f32,
    cooldown_ms: Millis,
    last_shake: Option<Millis>,
}

impl ShakeDetector {
    pub fn new(tuning: &ShakeTuning) -> Self {
        Self {
            threshold: tuning.threshold,
            cooldown_ms: tuning.cooldown_ms,
            last_shake: None,
        }
    }

    /// Feed one accelerometer sample (gravity included); true if it is a new shake
    ///
    /// Samples with missing axes should be dropped by the caller.
    pub fn sample(&mut self, accel: Vec3, now: Millis) -> bool {
        if accel.length() <= self.threshold {
            return false;
        }
        if self
            .last_shake
            .is_some_and(|last| now.saturating_sub(last) <= self.cooldown_ms)
        {
            return false;
        }
        self.last_shake = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_shake = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ShakeDetector {
        ShakeDetector::new(&ShakeTuning::default())
    }

    #[test]
    fn test_resting_phone_is_not_a_shake() {
        let mut shake = detector();
        // Gravity alone
        assert!(!shake.sample(Vec3::new(0.0, 9.81, 0.0), 1_000));
        assert!(!shake.sample(Vec3::new(14.0, 14.0, 0.0), 1_100));
    }

    #[test]
    fn test_cooldown_between_shakes() {
        let mut shake = detector();
        let hard = Vec3::new(20.0, 20.0, 5.0);
        assert!(shake.sample(hard, 1_000));
        assert!(!shake.sample(hard, 1_300));
        assert!(!shake.sample(hard, 1_500));
        assert!(shake.sample(hard, 1_501));
    }

    #[test]
    fn test_reset_allows_immediate_shake() {
        let mut shake = detector();
        let hard = Vec3::new(30.0, 0.0, 0.0);
        assert!(shake.sample(hard, 0));
        shake.reset();
        assert!(shake.sample(hard, 10));
    }
}
