//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - Static UI from `static_dir` with index fallback
/// - CORS (allow any origin/method/headers); tighten for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, static_dir: &str) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir.trim_end_matches('/'))));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/curriculum", get(http::http_get_curriculum))
        .route("/api/v1/exam-question", post(http::http_post_exam_question))
        .route("/api/v1/worksheet", post(http::http_post_worksheet))
        .route("/api/v1/answer", post(http::http_post_answer))
        .route("/api/v1/similar", post(http::http_post_similar))
        .route("/api/v1/regenerate", post(http::http_post_regenerate))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::completion::fake::ScriptedCompletion;
    use crate::config::{GenerationSettings, Prompts};

    const EXAM_JSON: &str = r#"{"total_marks":25,"topic":"Algebra","difficulty":"Higher Level","parts":[{"label":"a","marks":10,"question":"x^2=4","solution":"x=\\pm2"}]}"#;

    fn app(replies: &[&str]) -> Router {
        let state = AppState::new(
            Some(Arc::new(ScriptedCompletion::replying(replies))),
            Prompts::default(),
            GenerationSettings::default(),
        );
        build_router(Arc::new(state), "./static")
    }

    async fn post(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(app: Router, path: &str) -> (StatusCode, Value) {
        let res = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_completion_availability() {
        let (status, body) = get_json(app(&[]), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "completion": true}));
    }

    #[tokio::test]
    async fn curriculum_lists_topics() {
        let (status, body) = get_json(app(&[]), "/api/v1/curriculum").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["exam_topics"][0], "Algebra");
    }

    #[tokio::test]
    async fn exam_question_returns_question_and_session() {
        let (status, body) =
            post(app(&[EXAM_JSON]), "/api/v1/exam-question", json!({"topic": "Algebra", "totalMarks": 25})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["question"]["parts"][0]["label"], "a");
        assert_eq!(body["question"]["parts"][0]["marks"], 10);
        assert_eq!(body["session"]["content"]["kind"], "exam_question");
        assert_eq!(body["session"]["last_request"]["total_marks"], 25);
    }

    #[tokio::test]
    async fn malformed_model_output_is_bad_gateway_with_raw_text() {
        let (status, body) =
            post(app(&["not json"]), "/api/v1/exam-question", json!({"topic": "Algebra", "totalMarks": 25})).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "MALFORMED_RESPONSE");
        assert_eq!(body["raw"], "not json");
    }

    #[tokio::test]
    async fn invalid_marks_are_bad_request() {
        let (status, body) =
            post(app(&[EXAM_JSON]), "/api/v1/exam-question", json!({"topic": "Algebra", "totalMarks": 40})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn worksheet_then_regenerate_with_returned_session() {
        let app = app(&["1. Solve $x+1=2$\n2. Solve $x+2=3$", "1. Solve $x+3=4$"]);
        let (status, body) = post(
            app.clone(),
            "/api/v1/worksheet",
            json!({"topic": "Algebra", "subtopics": ["Quadratics"], "difficulty": "Easy"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!(["Solve $x+1=2$", "Solve $x+2=3$"]));
        assert_eq!(body["mode"], "worksheet");

        let (status, again) = post(app, "/api/v1/regenerate", json!({"session": body["session"]})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(again["kind"], "worksheet");
        assert_eq!(again["items"], json!(["Solve $x+3=4$"]));
        assert_eq!(again["session"]["id"], body["session"]["id"]);
        assert_eq!(again["session"]["content"]["items"], json!(["Solve $x+3=4$"]));
    }

    #[tokio::test]
    async fn regenerate_with_fresh_session_is_bad_request() {
        let (status, body) = post(app(&[]), "/api/v1/regenerate", json!({"session": {"id": "s1"}})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "NOTHING_TO_REGENERATE");
    }

    #[tokio::test]
    async fn answer_and_similar_return_text() {
        let app = app(&["Step 1: $x=2$", "Solve $x^2=9$"]);
        let (status, body) =
            post(app.clone(), "/api/v1/answer", json!({"topic": "Algebra", "question": "Solve $x^2=4$"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"text": "Step 1: $x=2$"}));

        let (_, body) = post(app, "/api/v1/similar", json!({"topic": "Algebra", "question": "Solve $x^2=4$"})).await;
        assert_eq!(body["text"], "Solve $x^2=9$");
    }

    #[tokio::test]
    async fn no_api_key_is_service_unavailable() {
        let state = AppState::new(None, Prompts::default(), GenerationSettings::default());
        let app = build_router(Arc::new(state), "./static");
        let (status, body) =
            post(app, "/api/v1/answer", json!({"topic": "Algebra", "question": "Solve $x^2=4$"})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "UNAVAILABLE");
    }
}
