//! # Jigsaw Common
//!
//! Shared types, geometry, and utilities used across Jigsaw components.
//!
//! ## Modules
//! - `geometry` - Rectangles and the matching rules (IoU, center distance)
//! - `types` - Core data structures (Placement, ImageKind, Verdict, etc.)
//! - `error` - Common error types
//! - `constants` - Shared configuration constants

pub mod constants;
pub mod error;
pub mod geometry;
pub mod types;

pub use error::ChallengeError;
pub use geometry::{MatchOutcome, MatchRule, Rect, matches};
pub use types::*;
