//! Challenge creation, image, and verification endpoints.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;

use super::ApiError;
use crate::state::AppState;
use jigsaw_common::constants::routes::CAPTCHA_PREFIX;
use jigsaw_common::{ChallengeError, ImageKind, IssuedChallenge, Verdict};

/// Route under which an image of a challenge is served
pub fn image_locator(token: &str, kind: ImageKind) -> String {
    format!("{CAPTCHA_PREFIX}/{token}/{}", kind.file_name())
}

/// Generate a new challenge
pub async fn create_challenge(State(state): State<AppState>) -> Result<Json<IssuedChallenge>, ApiError> {
    let token = state.generator.generate(&state.registry).await?;

    Ok(Json(IssuedChallenge {
        piece: image_locator(&token, ImageKind::Piece),
        puzzle: image_locator(&token, ImageKind::Puzzle),
        token,
    }))
}

/// Serve the piece or puzzle PNG of a challenge
pub async fn get_image(
    State(state): State<AppState>,
    Path((token, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let kind: ImageKind = file.parse().map_err(ChallengeError::BadRequest)?;
    tracing::debug!(token = %token, kind = %kind, "Serving challenge image");
    let bytes = state.registry.image(&token, kind).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        bytes,
    )
        .into_response())
}

/// Submitted piece position; values stay loosely typed until validated
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    x: Value,
    #[serde(default)]
    y: Value,
}

/// Verify a submitted piece position.
///
/// The body is parsed as JSON whatever its content type, since browser
/// clients commonly post a JSON string as text/plain. It must be an object;
/// a bare `[x, y]` array is rejected.
pub async fn check_challenge(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<Json<Verdict>, ApiError> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| ChallengeError::BadRequest(format!("invalid JSON body: {e}")))?;
    if !value.is_object() {
        return Err(ChallengeError::BadRequest("body must be a JSON object".to_string()).into());
    }
    let request: CheckRequest = serde_json::from_value(value)
        .map_err(|e| ChallengeError::BadRequest(format!("invalid JSON body: {e}")))?;

    tracing::debug!(token = %token, x = %request.x, y = %request.y, "Verifying challenge");

    let verdict = state
        .verifier
        .verify(&state.registry, &token, &request.x, &request.y)
        .await?;

    Ok(Json(verdict))
}
