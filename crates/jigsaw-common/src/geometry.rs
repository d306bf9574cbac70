//! Rectangle matching rules.
//!
//! Both rules are pure functions of the two rectangles (plus the rule's
//! threshold) and are symmetric in their arguments.

use serde::{Deserialize, Serialize};

use crate::ChallengeError;
use crate::constants::{DEFAULT_AREA_THRESHOLD, DEFAULT_CENTER_THRESHOLD};

/// Axis-aligned rectangle in canvas pixel units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Half the length of the diagonal
    pub fn half_diagonal(&self) -> f64 {
        self.w.hypot(self.h) / 2.0
    }

    /// Area shared with `other` (0 when they do not overlap)
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let iw = ((self.x + self.w).min(other.x + other.w) - self.x.max(other.x)).max(0.0);
        let ih = ((self.y + self.h).min(other.y + other.h) - self.y.max(other.y)).max(0.0);
        iw * ih
    }

    /// Intersection over union, in [0, 1]
    pub fn iou(&self, other: &Rect) -> f64 {
        let si = self.intersection_area(other);
        let su = self.area() + other.area() - si;
        if su > 0.0 { si / su } else { 0.0 }
    }

    /// Euclidean distance between the two centers
    pub fn center_distance(&self, other: &Rect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }
}

/// Rule deciding whether a guessed rectangle matches the true placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchRule {
    /// Matches when IoU is strictly greater than `threshold`
    AreaOverlap {
        #[serde(default = "default_area_threshold")]
        threshold: f64,
    },
    /// Matches when the centers are closer than
    /// `(half_diagonal(truth) + half_diagonal(guess)) * threshold`
    CenterDistance {
        #[serde(default = "default_center_threshold")]
        threshold: f64,
    },
}

fn default_area_threshold() -> f64 {
    DEFAULT_AREA_THRESHOLD
}

fn default_center_threshold() -> f64 {
    DEFAULT_CENTER_THRESHOLD
}

impl MatchRule {
    pub fn area_overlap() -> Self {
        Self::AreaOverlap { threshold: DEFAULT_AREA_THRESHOLD }
    }

    pub fn center_distance() -> Self {
        Self::CenterDistance { threshold: DEFAULT_CENTER_THRESHOLD }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AreaOverlap { .. } => "area_overlap",
            Self::CenterDistance { .. } => "center_distance",
        }
    }

    /// Reject thresholds that would make the rule meaningless
    pub fn validate(&self) -> Result<(), ChallengeError> {
        match *self {
            Self::AreaOverlap { threshold } if !(0.0..1.0).contains(&threshold) => Err(
                ChallengeError::Config(format!("area_overlap threshold {threshold} not in [0, 1)")),
            ),
            Self::CenterDistance { threshold } if !(threshold.is_finite() && threshold > 0.0) => {
                Err(ChallengeError::Config(format!(
                    "center_distance threshold {threshold} must be positive"
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for MatchRule {
    fn default() -> Self {
        Self::center_distance()
    }
}

/// Result of evaluating a rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub success: bool,
    /// IoU for the area rule; the center rule has no score
    pub score: Option<f64>,
}

/// Evaluate `rule` for a guessed rectangle against the truth
pub fn matches(truth: &Rect, guess: &Rect, rule: MatchRule) -> MatchOutcome {
    match rule {
        MatchRule::AreaOverlap { threshold } => {
            let score = truth.iou(guess);
            MatchOutcome {
                success: score > threshold,
                score: Some(score),
            }
        }
        MatchRule::CenterDistance { threshold } => {
            let tolerance = (truth.half_diagonal() + guess.half_diagonal()) * threshold;
            MatchOutcome {
                success: truth.center_distance(guess) < tolerance,
                score: None,
            }
        }
    }
}
