//! Shared constants for Jigsaw components.

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";

/// Default puzzle canvas size in pixels (square)
pub const DEFAULT_CANVAS_SIZE: u32 = 300;

/// Default piece size in pixels (square)
pub const DEFAULT_PIECE_SIZE: u32 = 50;

/// IoU a guess must exceed under the area-overlap rule
pub const DEFAULT_AREA_THRESHOLD: f64 = 0.8;

/// Fraction of the summed half-diagonals allowed between centers
pub const DEFAULT_CENTER_THRESHOLD: f64 = 0.5;

/// Opacity of the default fill overlay
pub const DEFAULT_OVERLAY_ALPHA: f32 = 0.35;

/// Random bytes in a challenge token (128 bits)
pub const TOKEN_BYTES: usize = 16;

/// Upper bound on pattern re-renders before giving up on a background
pub const MAX_PATTERN_ATTEMPTS: usize = 64;

/// Default interval between expiry sweeps (seconds)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Default request timeout applied by the HTTP layer (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Route layout shared by the server and its clients
pub mod routes {
    /// Challenge creation, and prefix for per-challenge routes: /captcha/{token}/...
    pub const CAPTCHA_PREFIX: &str = "/captcha";

    /// File name of the piece image under a challenge
    pub const PIECE_FILE: &str = "piece.png";

    /// File name of the puzzle image under a challenge
    pub const PUZZLE_FILE: &str = "puzzle.png";

    /// Verification suffix: /captcha/{token}/check
    pub const CHECK_SUFFIX: &str = "check";
}
