//! HTTP route handlers for Jigsaw.

use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jigsaw_common::ChallengeError;
use jigsaw_common::constants::routes::{CAPTCHA_PREFIX, CHECK_SUFFIX};
use serde::Serialize;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::state::AppState;

mod captcha;
mod health;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))

        // Challenge endpoints
        .route(CAPTCHA_PREFIX, get(captcha::create_challenge))
        .route(&format!("{CAPTCHA_PREFIX}/{{token}}/{CHECK_SUFFIX}"), post(captcha::check_challenge))
        .route(&format!("{CAPTCHA_PREFIX}/{{token}}/{{file}}"), get(captcha::get_image));

    // Client assets (page + script) when configured
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .with_state(state)
}

/// JSON error body: `{"error": "<kind>", "message": "..."}`
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Handler error carrying a `ChallengeError` to the client
#[derive(Debug)]
pub struct ApiError(pub ChallengeError);

impl From<ChallengeError> for ApiError {
    fn from(err: ChallengeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_client_error() {
            tracing::debug!(error = %self.0, "Rejected request");
        } else {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::{Request, header};
    use jigsaw_common::{MatchRule, Placement};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn state_with_rule(rule: MatchRule) -> AppState {
        let mut config = AppConfig::default();
        config.captcha.match_rule = rule;
        AppState::new(config).await.unwrap()
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec(), content_type)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn check_req(token: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/captcha/{token}/check"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    async fn known_challenge(state: &AppState) -> String {
        state
            .registry
            .create(vec![0xAA], vec![0xBB], Placement::new(100, 120, 50, 50))
            .await
    }

    #[tokio::test]
    async fn test_create_then_fetch_images() {
        let state = state_with_rule(MatchRule::default()).await;

        let (status, body, _) = send(&state, get_req("/captcha")).await;
        assert_eq!(status, StatusCode::OK);
        let issued = json_body(&body);
        let token = issued["token"].as_str().unwrap().to_string();
        assert_eq!(issued["piece"], format!("/captcha/{token}/piece.png"));
        assert_eq!(issued["puzzle"], format!("/captcha/{token}/puzzle.png"));

        let (status, piece, content_type) = send(&state, get_req(&format!("/captcha/{token}/piece.png"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/png"));
        let piece = image::load_from_memory(&piece).unwrap();
        assert_eq!((piece.width(), piece.height()), (50, 50));

        let (status, puzzle, _) = send(&state, get_req(&format!("/captcha/{token}/puzzle.png"))).await;
        assert_eq!(status, StatusCode::OK);
        let puzzle = image::load_from_memory(&puzzle).unwrap();
        assert_eq!((puzzle.width(), puzzle.height()), (300, 300));
    }

    #[tokio::test]
    async fn test_image_of_unknown_challenge_is_404() {
        let state = state_with_rule(MatchRule::default()).await;

        let (status, body, _) = send(&state, get_req("/captcha/nope/piece.png")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)["error"], "not-found");
    }

    #[tokio::test]
    async fn test_unknown_image_selector_is_400() {
        let state = state_with_rule(MatchRule::default()).await;
        let token = known_challenge(&state).await;

        let (status, body, _) = send(&state, get_req(&format!("/captcha/{token}/solution.png"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["error"], "bad-request");
    }

    #[tokio::test]
    async fn test_check_scores_with_area_rule() {
        let state = state_with_rule(MatchRule::area_overlap()).await;
        let token = known_challenge(&state).await;

        let (status, body, _) = send(&state, check_req(&token, r#"{"x":100,"y":120}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"success": true, "score": 1.0}));

        let (status, body, _) = send(&state, check_req(&token, r#"{"x":"200","y":"220"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"success": false, "score": 0.0}));
    }

    #[tokio::test]
    async fn test_check_with_center_rule_omits_score() {
        let state = state_with_rule(MatchRule::center_distance()).await;
        let token = known_challenge(&state).await;

        let (status, body, _) = send(&state, check_req(&token, r#"{"x":110,"y":125}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"success": true}));
    }

    #[tokio::test]
    async fn test_check_rejects_bad_input() {
        let state = state_with_rule(MatchRule::default()).await;
        let token = known_challenge(&state).await;

        for body in [r#"{"x":"abc","y":0}"#, r#"{"y":0}"#, "not json", "", "[100,120]", "42"] {
            let (status, response, _) = send(&state, check_req(&token, body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json_body(&response)["error"], "bad-request");
        }
    }

    #[tokio::test]
    async fn test_check_accepts_text_plain_object() {
        let state = state_with_rule(MatchRule::default()).await;
        let token = known_challenge(&state).await;

        let request = Request::builder()
            .method("POST")
            .uri(format!("/captcha/{token}/check"))
            .header(header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(Body::from(r#"{"x":100,"y":120}"#))
            .unwrap();
        let (status, body, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"success": true}));
    }

    #[tokio::test]
    async fn test_check_unknown_token_is_404() {
        let state = state_with_rule(MatchRule::default()).await;

        let (status, body, _) = send(&state, check_req("unknown-token", r#"{"x":0,"y":0}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)["error"], "not-found");
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let state = state_with_rule(MatchRule::area_overlap()).await;
        let token = known_challenge(&state).await;
        send(&state, check_req(&token, r#"{"x":100,"y":120}"#)).await;
        send(&state, check_req(&token, r#"{"x":0,"y":0}"#)).await;

        let (status, body, _) = send(&state, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["status"], "ok");

        let (status, body, _) = send(&state, get_req("/metrics")).await;
        assert_eq!(status, StatusCode::OK);
        let metrics = json_body(&body);
        assert_eq!(metrics["active_challenges"], 1);
        assert_eq!(metrics["issued"], 1);
        assert_eq!(metrics["passed"], 1);
        assert_eq!(metrics["failed"], 1);
        assert_eq!(metrics["match_rule"], "area_overlap");
    }
}
