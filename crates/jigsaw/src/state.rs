//! Application state and shared resources.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

use crate::captcha::{Background, ChallengeGenerator, ChallengeRegistry, ChallengeVerifier, Compositor};
use crate::config::AppConfig;
use jigsaw_common::MetricsSnapshot;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Challenge store shared by generation and verification
    pub registry: Arc<ChallengeRegistry>,

    /// Challenge generator
    pub generator: Arc<ChallengeGenerator>,

    /// Challenge verifier
    pub verifier: Arc<ChallengeVerifier>,

    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create new application state, loading the background source
    pub async fn new(config: AppConfig) -> Result<Self> {
        let c = &config.captcha;

        let compositor = Compositor::new(
            c.canvas_width,
            c.canvas_height,
            c.require_square_source,
            c.overlay,
        );

        let background = match c.source_image {
            Some(ref path) => {
                let background = Background::from_file(path)
                    .await
                    .with_context(|| format!("Failed to load source image {path}"))?;
                if let Background::Image(ref img) = background {
                    compositor
                        .check_source(img)
                        .with_context(|| format!("Unusable source image {path}"))?;
                }
                background
            }
            None => Background::pattern(c.pattern_color),
        };

        let generator = Arc::new(ChallengeGenerator::new(
            compositor,
            background,
            c.piece_width,
            c.piece_height,
        ));
        let verifier = Arc::new(ChallengeVerifier::new(c.match_rule));
        let registry = Arc::new(ChallengeRegistry::new(c.challenge_ttl_secs));

        Ok(Self {
            config,
            registry,
            generator,
            verifier,
            started_at: Instant::now(),
        })
    }

    /// Current counters
    pub async fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_challenges: self.registry.len().await,
            issued: self.registry.issued(),
            passed: self.verifier.passed(),
            failed: self.verifier.failed(),
            expired: self.registry.expired(),
            match_rule: self.verifier.rule().name().to_string(),
        }
    }
}
