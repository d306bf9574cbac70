//! Jigsaw challenge engine.
//!
//! Generation: `placement` picks where the piece is cut, `compositor` builds
//! the puzzle/piece PNGs from a `background`, and `registry` stores the
//! result under a fresh token. Verification: `verifier` looks the token up and
//! scores the submitted position with the configured `MatchRule`.

mod background;
mod compositor;
mod generator;
mod pattern;
mod placement;
mod registry;
mod verifier;

pub use background::Background;
pub use compositor::{Compositor, OverlayStyle};
pub use generator::ChallengeGenerator;
pub use pattern::MAX_PATTERN_SIDE;
pub use registry::{ChallengeRegistry, sweeper_worker};
pub use verifier::ChallengeVerifier;
