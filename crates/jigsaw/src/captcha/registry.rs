//! In-memory challenge registry.
//!
//! Challenges are written once and read many times. Without a TTL nothing is
//! ever removed; with one, lookups hide expired entries and the sweeper
//! drops them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jigsaw_common::constants::TOKEN_BYTES;
use jigsaw_common::{ChallengeError, ImageKind, Placement};
use rand::Rng;
use tokio::sync::RwLock;

/// A stored challenge
#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    /// Opaque lookup key
    pub token: String,
    /// PNG of the masked canvas
    pub puzzle_png: Vec<u8>,
    /// PNG of the cut-out region
    pub piece_png: Vec<u8>,
    /// Where the piece was cut
    pub solution: Placement,
    /// Creation timestamp (unix seconds)
    pub created_at: i64,
}

impl Challenge {
    pub fn image(&self, kind: ImageKind) -> &[u8] {
        match kind {
            ImageKind::Piece => &self.piece_png,
            ImageKind::Puzzle => &self.puzzle_png,
        }
    }
}

/// Token-keyed challenge store shared by generation and verification
pub struct ChallengeRegistry {
    entries: RwLock<HashMap<String, Arc<Challenge>>>,
    /// Challenge lifetime in seconds (None = never expire)
    ttl_secs: Option<u64>,
    issued: AtomicU64,
    expired: AtomicU64,
}

impl ChallengeRegistry {
    pub fn new(ttl_secs: Option<u64>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_secs,
            issued: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    pub fn ttl_secs(&self) -> Option<u64> {
        self.ttl_secs
    }

    /// Store a new challenge and return its token
    pub async fn create(&self, puzzle_png: Vec<u8>, piece_png: Vec<u8>, solution: Placement) -> String {
        self.create_at(puzzle_png, piece_png, solution, chrono::Utc::now().timestamp())
            .await
    }

    pub(crate) async fn create_at(
        &self,
        puzzle_png: Vec<u8>,
        piece_png: Vec<u8>,
        solution: Placement,
        created_at: i64,
    ) -> String {
        let mut entries = self.entries.write().await;

        let token = loop {
            let candidate = generate_token();
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };

        entries.insert(
            token.clone(),
            Arc::new(Challenge {
                token: token.clone(),
                puzzle_png,
                piece_png,
                solution,
                created_at,
            }),
        );
        self.issued.fetch_add(1, Ordering::Relaxed);

        token
    }

    /// Look up a challenge; `None` for unknown or expired tokens
    pub async fn get(&self, token: &str) -> Option<Arc<Challenge>> {
        self.get_at(token, chrono::Utc::now().timestamp()).await
    }

    pub(crate) async fn get_at(&self, token: &str, now: i64) -> Option<Arc<Challenge>> {
        let entries = self.entries.read().await;
        entries
            .get(token)
            .filter(|challenge| !self.is_expired(challenge, now))
            .cloned()
    }

    /// Encoded bytes of one image of a challenge
    pub async fn image(&self, token: &str, kind: ImageKind) -> Result<Vec<u8>, ChallengeError> {
        self.get(token)
            .await
            .map(|challenge| challenge.image(kind).to_vec())
            .ok_or_else(|| ChallengeError::NotFound(token.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    pub fn expired(&self) -> u64 {
        self.expired.load(Ordering::Relaxed)
    }

    /// Drop every challenge that has outlived the TTL, returning how many
    pub async fn sweep_expired(&self, now: i64) -> usize {
        if self.ttl_secs.is_none() {
            return 0;
        }

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, challenge| !self.is_expired(challenge, now));
        let removed = before - entries.len();

        self.expired.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    fn is_expired(&self, challenge: &Challenge, now: i64) -> bool {
        self.ttl_secs.is_some_and(|ttl| {
            let ttl = i64::try_from(ttl).unwrap_or(i64::MAX);
            now > challenge.created_at.saturating_add(ttl)
        })
    }
}

/// 128 random bits, URL-safe base64 without padding
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Background worker that periodically removes expired challenges
pub async fn sweeper_worker(
    registry: Arc<ChallengeRegistry>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    tracing::info!(
        ttl_secs = ?registry.ttl_secs(),
        interval_secs = interval.as_secs(),
        "🧹 Challenge sweeper started"
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let removed = registry.sweep_expired(chrono::Utc::now().timestamp()).await;
                if removed > 0 {
                    let remaining = registry.len().await;
                    tracing::debug!(removed, remaining, "Swept expired challenges");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("🧹 Challenge sweeper shutting down...");
                break;
            }
        }
    }
}
