//! Position verification.

use std::sync::atomic::{AtomicU64, Ordering};

use jigsaw_common::{ChallengeError, MatchRule, Verdict, matches};
use serde_json::Value;

use super::registry::ChallengeRegistry;

/// Challenge verifier service
pub struct ChallengeVerifier {
    rule: MatchRule,
    passed: AtomicU64,
    failed: AtomicU64,
}

impl ChallengeVerifier {
    pub fn new(rule: MatchRule) -> Self {
        Self {
            rule,
            passed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn rule(&self) -> MatchRule {
        self.rule
    }

    pub fn passed(&self) -> u64 {
        self.passed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Verify loosely typed submitted coordinates.
    ///
    /// Coordinates are validated before the registry is consulted, so a
    /// malformed submission is a bad request even for an unknown token.
    pub async fn verify(
        &self,
        registry: &ChallengeRegistry,
        token: &str,
        x: &Value,
        y: &Value,
    ) -> Result<Verdict, ChallengeError> {
        let x = parse_coordinate("x", x)?;
        let y = parse_coordinate("y", y)?;
        self.verify_position(registry, token, x, y).await
    }

    /// Verify an already validated position.
    ///
    /// The guess always takes its size from the stored solution. Verification
    /// does not consume the challenge.
    pub async fn verify_position(
        &self,
        registry: &ChallengeRegistry,
        token: &str,
        x: f64,
        y: f64,
    ) -> Result<Verdict, ChallengeError> {
        let challenge = registry
            .get(token)
            .await
            .ok_or_else(|| ChallengeError::NotFound(token.to_string()))?;

        let solution = challenge.solution;
        let outcome = matches(&solution.to_rect(), &solution.guess_at(x, y), self.rule);

        if outcome.success {
            self.passed.fetch_add(1, Ordering::Relaxed);
            tracing::info!(token = %token, score = ?outcome.score, "Challenge solved");
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                token = %token,
                x,
                y,
                solution_x = solution.x,
                solution_y = solution.y,
                score = ?outcome.score,
                "Challenge verification failed"
            );
        }

        Ok(Verdict {
            success: outcome.success,
            score: outcome.score,
        })
    }
}

/// Accept a JSON number or a numeric string; anything else, or a non-finite
/// value, is a bad request
pub fn parse_coordinate(name: &str, value: &Value) -> Result<f64, ChallengeError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| ChallengeError::BadRequest(format!("{name} must be a finite number, got {value}")))
}
