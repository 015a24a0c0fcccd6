use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::tracking::{NOT_FOUND_CODE, TrackingResult};
use crate::state::AppState;
use crate::tracking::service::{ReviewError, TrackError};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api",
        post(proxy)
            .options(preflight)
            .fallback(method_not_allowed),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    pub action: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub review: Option<String>,
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn proxy(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, AppError> {
    let request: ProxyRequest = serde_json::from_slice(&body)
        .map_err(|err| AppError::BadRequest(format!("invalid request body: {err}")))?;

    let start = Instant::now();
    let action = request.action.clone();
    let (outcome, result) = match action.as_str() {
        "track" => track(&state, request).await,
        "review" => review(&state, request).await,
        other => {
            warn!(action = other, "unrecognized proxy action");
            ("invalid_action", Err(AppError::InvalidAction(other.to_string())))
        }
    };

    let metric_action = match action.as_str() {
        "track" | "review" => action.as_str(),
        _ => "unknown",
    };
    state
        .metrics
        .observe_request(metric_action, outcome, start.elapsed().as_secs_f64());

    result
}

fn required_order_id(request: &ProxyRequest) -> Result<&str, AppError> {
    request
        .order_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("orderId is required".to_string()))
}

async fn track(
    state: &AppState,
    request: ProxyRequest,
) -> (&'static str, Result<Response, AppError>) {
    let order_id = match required_order_id(&request) {
        Ok(id) => id,
        Err(err) => return ("bad_request", Err(err)),
    };

    match state.service.fetch(order_id).await {
        Ok(info) => (
            "found",
            Ok(Json(TrackingResult::Info(Box::new(info))).into_response()),
        ),
        Err(err @ (TrackError::NotFound(_) | TrackError::InvalidRecord(_))) => {
            let outcome = match err {
                TrackError::NotFound(_) => "not_found",
                _ => "invalid_record",
            };
            (
                outcome,
                Ok(Json(TrackingResult::Error(err.to_tracking_error())).into_response()),
            )
        }
        Err(err) => {
            warn!(order_id, error = %err, "upstream tracking failure");
            (
                "upstream_error",
                Err(AppError::Upstream(err.to_tracking_error().message)),
            )
        }
    }
}

async fn review(
    state: &AppState,
    request: ProxyRequest,
) -> (&'static str, Result<Response, AppError>) {
    let order_id = match required_order_id(&request) {
        Ok(id) => id,
        Err(err) => return ("bad_request", Err(err)),
    };

    let rating = match request.rating.map(u8::try_from) {
        Some(Ok(rating)) => rating,
        Some(Err(_)) | None => {
            return (
                "bad_request",
                Err(AppError::BadRequest(
                    "rating must be an integer from 1 to 5".to_string(),
                )),
            );
        }
    };

    match state
        .service
        .submit_review(order_id, rating, request.review.as_deref())
        .await
    {
        Ok(()) => {
            info!(order_id, rating, "review stored");
            ("submitted", Ok(Json(json!({ "success": true })).into_response()))
        }
        Err(ReviewError::InvalidRating(_)) => (
            "bad_request",
            Err(AppError::BadRequest(
                "rating must be an integer from 1 to 5".to_string(),
            )),
        ),
        Err(ReviewError::NotFound(_)) => (
            "not_found",
            Ok(Json(json!({ "success": false, "error": NOT_FOUND_CODE })).into_response()),
        ),
        Err(ReviewError::Failed(msg)) => ("upstream_error", Err(AppError::Upstream(msg))),
    }
}
