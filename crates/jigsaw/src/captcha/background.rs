//! Source pixels for new challenges.

use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbaImage};
use jigsaw_common::ChallengeError;
use jigsaw_common::constants::MAX_PATTERN_ATTEMPTS;
use rand::Rng;

use super::compositor::decode_source;
use super::pattern::{PatternRenderer, TilePattern};

/// Where challenge pixels come from, fixed at startup
#[derive(Clone)]
pub enum Background {
    /// A decoded image reused for every challenge
    Image(Arc<RgbaImage>),
    /// A fresh pattern per challenge
    Pattern {
        renderer: Arc<dyn PatternRenderer>,
        color: Rgb<u8>,
    },
}

impl Background {
    /// Read and decode an image file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ChallengeError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ChallengeError::InvalidSourceImage(format!("{}: {e}", path.display()))
        })?;
        Ok(Self::Image(Arc::new(decode_source(&bytes)?)))
    }

    /// Built-in tiled pattern around `color`
    pub fn pattern(color: [u8; 3]) -> Self {
        Self::Pattern {
            renderer: Arc::new(TilePattern),
            color: Rgb(color),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Image(img) => format!("image {}x{}", img.width(), img.height()),
            Self::Pattern { color, .. } => {
                format!("pattern #{:02x}{:02x}{:02x}", color[0], color[1], color[2])
            }
        }
    }

    /// Pixels for one challenge.
    ///
    /// The renderer is asked for the larger of `min_width` and `min_height`;
    /// anything smaller is re-rendered with a new seed.
    pub fn acquire<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        min_width: u32,
        min_height: u32,
    ) -> Result<Arc<RgbaImage>, ChallengeError> {
        let (renderer, color) = match self {
            Self::Image(img) => return Ok(img.clone()),
            Self::Pattern { renderer, color } => (renderer, *color),
        };

        let min_side = min_width.max(min_height);
        for attempt in 1..=MAX_PATTERN_ATTEMPTS {
            let seed: u64 = rng.random();
            let img = renderer.render(seed, color, min_side);
            if img.width() >= min_width && img.height() >= min_height {
                return Ok(Arc::new(img));
            }
            tracing::trace!(
                seed,
                attempt,
                width = img.width(),
                height = img.height(),
                "Pattern too small, re-rendering"
            );
        }

        Err(ChallengeError::InvalidSourceImage(format!(
            "no pattern of at least {min_width}x{min_height} after {MAX_PATTERN_ATTEMPTS} renders"
        )))
    }
}
