//! Challenge generation.
//!
//! One call picks a placement, composites the puzzle and piece, and stores
//! the result in the registry.

use std::sync::Arc;

use jigsaw_common::ChallengeError;

use super::background::Background;
use super::compositor::{Composite, Compositor};
use super::placement;
use super::registry::ChallengeRegistry;

/// Challenge generator service
pub struct ChallengeGenerator {
    compositor: Arc<Compositor>,
    background: Background,
    piece_width: u32,
    piece_height: u32,
}

impl ChallengeGenerator {
    pub fn new(compositor: Compositor, background: Background, piece_width: u32, piece_height: u32) -> Self {
        Self {
            compositor: Arc::new(compositor),
            background,
            piece_width,
            piece_height,
        }
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Generate a new challenge and register it, returning its token
    pub async fn generate(&self, registry: &ChallengeRegistry) -> Result<String, ChallengeError> {
        let composite = self.composite().await?;
        let solution = composite.solution;
        let token = registry
            .create(composite.puzzle_png, composite.piece_png, solution)
            .await;

        tracing::debug!(
            token = %token,
            x = solution.x,
            y = solution.y,
            "Generated jigsaw challenge"
        );

        Ok(token)
    }

    /// Build one puzzle / piece pair on the blocking pool
    async fn composite(&self) -> Result<Composite, ChallengeError> {
        let compositor = self.compositor.clone();
        let background = self.background.clone();
        let (piece_width, piece_height) = (self.piece_width, self.piece_height);

        tokio::task::spawn_blocking(move || {
            let mut rng = rand::rng();
            let source = background.acquire(&mut rng, piece_width, piece_height)?;
            let (canvas_width, canvas_height) = compositor.canvas_size();
            let placement = placement::pick(&mut rng, canvas_width, canvas_height, piece_width, piece_height);
            compositor.compose(&source, placement)
        })
        .await
        .map_err(|e| ChallengeError::Internal(format!("compositing task failed: {e}")))?
    }
}
