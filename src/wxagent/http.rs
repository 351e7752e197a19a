// wxagent - conversational weather service with an operational metrics dashboard
//
// Copyright 2024 the wxagent authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! HTTP boundary: routing and payload shapes plus the producer-side
//! validation the store itself deliberately does not perform.

use crate::agent::{self, WeatherAgent};
use crate::dashboard::Dashboard;
use crate::event::{ErrorEvent, FeedbackEvent, RequestEvent};
use crate::store::EventStore;
use crate::summary::{self, Summary};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared state for all request handlers.
#[derive(Debug)]
pub struct AppContext {
    pub store: EventStore,
    pub agent: WeatherAgent,
    /// Default output directory for `POST /dashboard/generate`.
    pub dashboard_dir: PathBuf,
}

pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/feedback", post(feedback))
        .route("/metrics", get(metrics_summary))
        .route("/dashboard/generate", post(generate_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

fn internal_error(detail: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { detail: detail.into() }),
    )
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ts: f64,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub ts: f64,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub session_id: String,
    pub message: String,
    pub rating: u8,
    #[serde(default)]
    pub feedback_text: String,
    #[serde(default = "default_response_quality")]
    pub response_quality: String,
}

fn default_response_quality() -> String {
    "good".to_owned()
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateDashboardRequest {
    pub metrics_dir: Option<String>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateDashboardResponse {
    pub status: &'static str,
    pub html_path: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        ts: epoch_seconds(),
    })
}

async fn chat(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let start = Instant::now();
    tracing::info!(message = "chat request", session = %req.session_id);

    match ctx.agent.ask(&req.session_id, &req.message).await {
        Ok(reply) => {
            let response_time_ms = start.elapsed().as_secs_f64() * 1000.0;
            // derived here, at the producer, never recomputed by the store
            let weather_found =
                !reply.contains("City not found") && !reply.contains("Please specify");
            let city_extracted = agent::extract_city(&req.message);

            let event = RequestEvent::new(
                req.session_id.clone(),
                req.message.clone(),
                reply.clone(),
                response_time_ms,
                city_extracted.clone(),
                weather_found,
            );
            ctx.store
                .append_request(&event)
                .map_err(|e| internal_error(e.to_string()))?;

            tracing::info!(
                message = "chat request served",
                session = %req.session_id,
                response_time_ms = response_time_ms,
                weather_found = weather_found,
                city = %city_extracted,
            );
            Ok(Json(ChatResponse {
                session_id: req.session_id,
                reply,
                ts: epoch_seconds(),
            }))
        }
        Err(e) => {
            let response_time_ms = start.elapsed().as_secs_f64() * 1000.0;
            tracing::error!(message = "chat request failed", session = %req.session_id, error = %e);

            let event = ErrorEvent::new(
                req.session_id,
                "chat_error",
                e.to_string(),
                serde_json::json!({
                    "message": req.message,
                    "response_time_ms": response_time_ms,
                }),
            );
            if let Err(log_err) = ctx.store.append_error(&event) {
                tracing::error!(message = "failed to record error event", error = %log_err);
            }
            Err(internal_error(e.to_string()))
        }
    }
}

async fn feedback(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    if !(1..=5).contains(&req.rating) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                detail: "rating must be between 1 and 5".to_owned(),
            }),
        ));
    }

    tracing::info!(message = "feedback received", session = %req.session_id, rating = req.rating);
    let event = FeedbackEvent::new(
        req.session_id,
        req.message,
        req.rating,
        req.feedback_text,
        req.response_quality,
    );
    ctx.store
        .append_feedback(&event)
        .map_err(|e| internal_error(e.to_string()))?;

    Ok(Json(FeedbackResponse {
        status: "success",
        message: "Feedback recorded successfully",
    }))
}

async fn metrics_summary(State(ctx): State<Arc<AppContext>>) -> Result<Json<Summary>, ApiError> {
    let requests = ctx.store.load_requests().map_err(|e| internal_error(e.to_string()))?;
    let feedback = ctx.store.load_feedback().map_err(|e| internal_error(e.to_string()))?;
    let errors = ctx.store.load_errors().map_err(|e| internal_error(e.to_string()))?;
    Ok(Json(summary::summarize(&requests, &feedback, &errors)))
}

async fn generate_dashboard(
    State(ctx): State<Arc<AppContext>>,
    body: Option<Json<GenerateDashboardRequest>>,
) -> Result<Json<GenerateDashboardResponse>, ApiError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let metrics_dir = req
        .metrics_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| ctx.store.metrics_dir().to_path_buf());
    let output_dir = req
        .output_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| ctx.dashboard_dir.clone());

    let result = tokio::task::spawn_blocking(move || Dashboard::new(metrics_dir, output_dir).generate())
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    match result {
        Ok(path) => Ok(Json(GenerateDashboardResponse {
            status: "ok",
            html_path: path.display().to_string(),
        })),
        Err(e) => {
            tracing::error!(message = "dashboard generation failed", error = %e);
            Err(internal_error(e.to_string()))
        }
    }
}

fn epoch_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{WeatherClient, DEFAULT_FORECAST_URL, DEFAULT_GEOCODING_URL};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn context(dir: &std::path::Path) -> Arc<AppContext> {
        let store = EventStore::new(dir.join("metrics")).unwrap();
        let agent = WeatherAgent::new(WeatherClient::new(
            reqwest::Client::new(),
            DEFAULT_GEOCODING_URL,
            DEFAULT_FORECAST_URL,
        ));
        Arc::new(AppContext {
            store,
            agent,
            dashboard_dir: dir.join("dashboard"),
        })
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(context(dir.path()));

        let res = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
    }

    #[tokio::test]
    async fn feedback_is_validated_then_appended() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let app = router(Arc::clone(&ctx));

        let res = app
            .clone()
            .oneshot(json_request(
                "/feedback",
                r#"{"session_id":"s1","message":"weather in Oslo","rating":6}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(ctx.store.load_feedback().unwrap().is_empty());

        let res = app
            .oneshot(json_request(
                "/feedback",
                r#"{"session_id":"s1","message":"weather in Oslo","rating":4}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let events = ctx.store.load_feedback().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].rating, 4);
        assert_eq!(events[0].response_quality, "good");
    }

    #[tokio::test]
    async fn metrics_returns_summary_for_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(context(dir.path()));

        let res = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["requests"]["total"], 0);
        assert_eq!(parsed["requests"]["success_rate_pct"], 0.0);
        assert_eq!(parsed["feedback"]["total"], 0);
        assert_eq!(parsed["errors"]["total"], 0);
    }

    #[tokio::test]
    async fn generate_dashboard_returns_document_path() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let app = router(Arc::clone(&ctx));

        ctx.store
            .append_request(&RequestEvent::new("s1", "weather in Oslo", "Oslo, Norway: currently 8°C", 50.0, "Oslo", true))
            .unwrap();

        let res = app
            .oneshot(json_request("/dashboard/generate", "{}"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        let html_path = PathBuf::from(parsed["html_path"].as_str().unwrap());
        assert!(html_path.exists());
        assert!(html_path.starts_with(dir.path().join("dashboard")));
    }
}
