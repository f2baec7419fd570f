//! Router assembly: HTTP endpoints, WebSocket upgrade, status page, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket chat feed at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - HTML status page at `/`
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/", get(http::http_status_page))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/events", post(http::http_post_event))
        .route("/api/v1/quizzes", get(http::http_list_quizzes))
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
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::QuizSettings;

    fn app() -> Router {
        build_router(Arc::new(AppState::with_settings(QuizSettings::default())))
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), 1 << 20).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn post_event(sender: &str, text: &str) -> Request<Body> {
        let body = serde_json::json!({ "senderKey": sender, "chatId": "room", "senderName": "Léa", "text": text });
        Request::post("/api/v1/events")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let res = app()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v = json_body(res).await;
        assert_eq!(v["status"], "online");
        assert_eq!(v["quizzes"], 0);
        assert_eq!(v["drafts"], 0);
    }

    #[tokio::test]
    async fn events_endpoint_returns_replies() {
        let app = app();
        let res = app.clone().oneshot(post_event("s1", "/quiz créer")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v = json_body(res).await;
        assert_eq!(v["replies"][0]["chatId"], "room");
        assert!(v["replies"][0]["text"].as_str().unwrap().contains("Salut Léa"));

        let res = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(res).await["drafts"], 1);
    }

    #[tokio::test]
    async fn malformed_event_is_rejected() {
        let req = Request::post("/api/v1/events")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text":"hi"}"#))
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert!(res.status().is_client_error());
    }

    #[tokio::test]
    async fn status_page_is_html() {
        let res = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), 1 << 20).await.unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("Bot en ligne"));
        assert!(page.contains("durée de vie 24h"));
    }

    #[tokio::test]
    async fn quizzes_listing_hides_answers() {
        use crate::domain::{Category, Difficulty, PublishedQuiz, Question};

        let state = Arc::new(AppState::with_settings(QuizSettings::default()));
        let now = chrono::Utc::now();
        let mut question = Question::new("Quelle est la capitale du Japon?");
        question.options = vec!["Tokyo".into(), "Kyoto".into()];
        let quiz = PublishedQuiz {
            id: "Jp12Ab34".into(),
            title: "Capitales d'Asie".into(),
            category: Category::Geography,
            difficulty: Difficulty::Easy,
            creator: "Léa".into(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(24),
            questions: vec![question],
        };
        state.bot.router().registry().publish(quiz).await.unwrap();

        let res = build_router(state)
            .oneshot(Request::get("/api/v1/quizzes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let v = json_body(res).await;
        assert_eq!(v[0]["id"], "Jp12Ab34");
        assert_eq!(v[0]["category"], "geography");
        assert_eq!(v[0]["difficulty"], "easy");
        assert_eq!(v[0]["questions"], 1);
        assert!(v[0]["expiresAt"].is_string());
        assert!(v[0].get("correct").is_none());
    }

    #[tokio::test]
    async fn quizzes_listing_starts_empty() {
        let res = app()
            .oneshot(Request::get("/api/v1/quizzes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(res).await, serde_json::json!([]));
    }
}
