//! Core types shared across Jigsaw components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::routes::{PIECE_FILE, PUZZLE_FILE};
use crate::geometry::Rect;

/// Where the piece was cut from the canvas, in whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Placement {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// True when the placement lies fully inside a `width` x `height` canvas
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.w > 0
            && self.h > 0
            && self.x.checked_add(self.w).is_some_and(|right| right <= width)
            && self.y.checked_add(self.h).is_some_and(|bottom| bottom <= height)
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x as f64, self.y as f64, self.w as f64, self.h as f64)
    }

    /// Rectangle of the same size as this placement at a submitted position
    pub fn guess_at(&self, x: f64, y: f64) -> Rect {
        Rect::new(x, y, self.w as f64, self.h as f64)
    }
}

/// Which encoded image of a challenge to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// The cropped region the user drags
    Piece,
    /// The full canvas with the region masked
    Puzzle,
}

impl ImageKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Piece => PIECE_FILE,
            Self::Puzzle => PUZZLE_FILE,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Piece => f.write_str("piece"),
            Self::Puzzle => f.write_str("puzzle"),
        }
    }
}

impl FromStr for ImageKind {
    type Err = String;

    /// Accepts both the bare selector and the served file name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "piece" | PIECE_FILE => Ok(Self::Piece),
            "puzzle" | PUZZLE_FILE => Ok(Self::Puzzle),
            other => Err(format!("unknown image selector: {other}")),
        }
    }
}

/// Challenge handle returned to the client on creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedChallenge {
    /// Opaque challenge token
    pub token: String,
    /// Locator of the piece image
    pub piece: String,
    /// Locator of the puzzle image
    pub puzzle: String,
}

/// Verification result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Counters for monitoring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Challenges currently held in the registry
    pub active_challenges: usize,

    /// Challenges created since start
    pub issued: u64,

    /// Verifications that matched
    pub passed: u64,

    /// Verifications that did not match
    pub failed: u64,

    /// Challenges removed by the expiry sweeper
    pub expired: u64,

    /// Active matching rule
    pub match_rule: String,
}
