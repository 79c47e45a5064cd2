//! HTTP webhook.
//!
//! API endpoints:
//! - POST /api/messages - one activity in, JSON array of replies out
//! - GET  /healthz      - liveness probe

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use habot_bot::Bot;
use habot_dialog::Activity;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Builds the webhook router.
pub fn router(bot: Arc<Bot>) -> Router {
    Router::new()
        .route("/api/messages", post(messages))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(bot)
}

/// Serves the webhook on `addr` until the process is stopped.
pub async fn serve(addr: &str, bot: Arc<Bot>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(bot)).await?;
    Ok(())
}

async fn messages(State(bot): State<Arc<Bot>>, Json(activity): Json<Activity>) -> Response {
    if activity.conversation_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "conversationId is required".to_string(),
            }),
        )
            .into_response();
    }

    match bot.on_turn(activity).await {
        Ok(replies) => Json(replies).into_response(),
        Err(e) => {
            warn!("turn failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use habot_bot::{
        CognitiveSentiment, CognitiveTranscriber, HttpFetcher, Services, StaticIdentityTable,
        SttTransport, WorkflowConfig,
    };
    use habot_cognitive::Client;
    use habot_store::MemoryStore;
    use serde_json::{json, Value};

    use super::*;

    /// A bot whose backends point at a closed port. Menu turns never reach them.
    async fn offline_bot() -> Arc<Bot> {
        let client = Client::builder("test-key")
            .base_url("http://127.0.0.1:9")
            .max_retries(0)
            .build()
            .unwrap();
        let fetcher = Arc::new(HttpFetcher::default());
        let transcriber =
            CognitiveTranscriber::new(client.speech(), fetcher.clone(), SttTransport::Http, "en-US")
                .await;
        let services = Services {
            speaker: Arc::new(client.identification()),
            transcriber: Arc::new(transcriber),
            sentiment: Arc::new(CognitiveSentiment::new(client.sentiment(), "en")),
            fetcher,
            identities: Arc::new(StaticIdentityTable::builtin()),
            workflow: WorkflowConfig::default(),
        };
        Arc::new(Bot::new(services, Arc::new(MemoryStore::new())).unwrap())
    }

    async fn start() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(offline_bot().await);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_message_returns_replies() {
        let base = start().await;
        let http = reqwest::Client::new();

        let replies: Value = http
            .post(format!("{base}/api/messages"))
            .json(&json!({"type": "message", "conversationId": "c1", "text": "hi"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(replies[0]["text"], "What do you want to do?");
        assert_eq!(replies[0]["suggestedActions"][0], "Manage Profiles");

        let replies: Value = http
            .post(format!("{base}/api/messages"))
            .json(&json!({"type": "message", "conversationId": "c1", "text": "2"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(replies, json!([{"text": "Please upload a .wav file"}]));
    }

    #[tokio::test]
    async fn test_other_activities_get_empty_reply() {
        let base = start().await;
        let replies: Value = reqwest::Client::new()
            .post(format!("{base}/api/messages"))
            .json(&json!({"type": "conversationUpdate", "conversationId": "c1"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(replies, json!([]));
    }

    #[tokio::test]
    async fn test_rejects_blank_conversation() {
        let base = start().await;
        let response = reqwest::Client::new()
            .post(format!("{base}/api/messages"))
            .json(&json!({"type": "message", "conversationId": " ", "text": "hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let health = reqwest::get(format!("{base}/healthz")).await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");
    }
}
