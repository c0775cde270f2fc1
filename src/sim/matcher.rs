//! Match detection
//!
//! Decides whether the live detector signal matches a coin. Pinch hunts match
//! on proximity, expression hunts on classifier confidence. Both variants share
//! the dwell rule: the match must hold continuously before the coin is taken.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Millis;

/// Facial expressions the classifier scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Happy,
    Sad,
    Angry,
    Surprised,
    Disgusted,
    Neutral,
}

impl Expression {
    pub const ALL: [Expression; 6] = [
        Expression::Happy,
        Expression::Sad,
        Expression::Angry,
        Expression::Surprised,
        Expression::Disgusted,
        Expression::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Angry => "angry",
            Expression::Surprised => "surprised",
            Expression::Disgusted => "disgusted",
            Expression::Neutral => "neutral",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == s.to_lowercase())
    }

    /// Coin badge shown to the player
    pub fn emoji(&self) -> &'static str {
        match self {
            Expression::Happy => "😊",
            Expression::Sad => "😢",
            Expression::Angry => "😠",
            Expression::Surprised => "😮",
            Expression::Disgusted => "🤢",
            Expression::Neutral => "😐",
        }
    }
}

/// Per-expression confidence from the face classifier (missing = 0)
///
/// Parses the classifier's raw label map; labels the game doesn't use (such
/// as `fearful`) are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f32>")]
pub struct ExpressionScores(pub BTreeMap<Expression, f32>);

impl From<BTreeMap<String, f32>> for ExpressionScores {
    fn from(raw: BTreeMap<String, f32>) -> Self {
        Self(
            raw.into_iter()
                .filter_map(|(label, score)| Expression::from_str(&label).map(|e| (e, score)))
                .collect(),
        )
    }
}

impl ExpressionScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, expression: Expression, score: f32) -> Self {
        self.0.insert(expression, score);
        self
    }

    pub fn score(&self, expression: Expression) -> f32 {
        self.0.get(&expression).copied().unwrap_or(0.0)
    }

    /// Highest scoring expression, if any score is present
    pub fn top(&self) -> Option<Expression> {
        self.0
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(e, _)| *e)
    }
}

/// What the external detector reported this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DetectorSignal {
    /// No hand or face in frame; never an error, just "not matching"
    #[default]
    Lost,
    /// Pinch point in normalized screen coordinates (already mirrored)
    Pinch(Vec2),
    /// Expression confidences
    Expressions(ExpressionScores),
}

/// The part of a coin a matcher looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchTarget {
    /// Normalized screen position
    pub pos: Vec2,
    /// Diameter in pixels
    pub size: f32,
    /// Expression the coin asks for (expression hunts only)
    pub expression: Option<Expression>,
}

/// Match strategy for a hunt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchDetector {
    /// Pinch point within `radius * radius_scale` of the coin center
    Proximity {
        /// Screen size in pixels, for converting normalized positions
        viewport: Vec2,
        radius_scale: f32,
    },
    /// Confidence for the coin's expression at or above `threshold`
    Expression { threshold: f32 },
}

impl MatchDetector {
    pub fn proximity(viewport: Vec2, radius_scale: f32) -> Self {
        MatchDetector::Proximity {
            viewport,
            radius_scale,
        }
    }

    pub fn expression(threshold: f32) -> Self {
        MatchDetector::Expression { threshold }
    }

    /// Instantaneous match test (no dwell)
    ///
    /// A signal of the wrong kind for this detector, or a lost signal, is a
    /// non-match.
    pub fn is_matching(&self, target: &MatchTarget, signal: &DetectorSignal) -> bool {
        match (self, signal) {
            (
                MatchDetector::Proximity {
                    viewport,
                    radius_scale,
                },
                DetectorSignal::Pinch(point),
            ) => {
                let radius = target.size / 2.0;
                let pinch_px = *point * *viewport;
                let coin_px = target.pos * *viewport;
                pinch_px.distance(coin_px) < radius * radius_scale
            }
            (MatchDetector::Expression { threshold }, DetectorSignal::Expressions(scores)) => {
                target
                    .expression
                    .is_some_and(|e| scores.score(e) >= *threshold)
            }
            _ => false,
        }
    }
}

/// Tracks how long a match condition has held without a lapse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dwell {
    since: Option<Millis>,
}

impl Dwell {
    /// Feed this tick's match result; true once the match has held for `dwell_ms`
    pub fn update(&mut self, matching: bool, now: Millis, dwell_ms: Millis) -> bool {
        if !matching {
            self.since = None;
            return false;
        }
        let since = *self.since.get_or_insert(now);
        now.saturating_sub(since) >= dwell_ms
    }

    /// When the current unbroken match began
    pub fn since(&self) -> Option<Millis> {
        self.since
    }

    pub fn reset(&mut self) {
        self.since = None;
    }
}
