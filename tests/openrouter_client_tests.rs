//! OpenRouter client against a local stand-in server.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde_json::{Value, json};

use edumate::prompts::FALLBACK_REPLY;
use edumate::{
    CompletionService, Config, ConversationController, LlmMessage, LlmRequest, OpenRouterClient,
    Origin, ReplyUnavailable,
};

const COMPLETIONS_ROUTE: &str = "/api/v1/chat/completions";

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Option<(HeaderMap, Value)>>>);

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{addr}/api/v1")
}

fn client_for(base_url: String) -> OpenRouterClient {
    let config = Config {
        api_key: Some("test-key".to_string()),
        base_url,
        request_timeout_secs: 5,
        ..Config::default()
    };
    OpenRouterClient::new(&config).expect("Failed to build client")
}

fn question() -> LlmRequest {
    LlmRequest::new(vec![
        LlmMessage::system("be brief"),
        LlmMessage::user("Explain binary search"),
    ])
}

async fn answer(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    *seen.0.lock().unwrap() = Some((headers, body));
    Json(json!({
        "id": "gen-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Binary search halves the range each step."},
            "finish_reason": "stop"
        }]
    }))
}

#[tokio::test]
async fn test_success_returns_first_choice_content() {
    let seen = Seen::default();
    let router = Router::new()
        .route(COMPLETIONS_ROUTE, post(answer))
        .with_state(seen.clone());
    let client = client_for(spawn_server(router).await);

    let reply = client.complete(question()).await.unwrap();

    assert_eq!(reply, "Binary search halves the range each step.");
}

#[tokio::test]
async fn test_request_carries_contract_headers_and_body() {
    let seen = Seen::default();
    let router = Router::new()
        .route(COMPLETIONS_ROUTE, post(answer))
        .with_state(seen.clone());
    let client = client_for(spawn_server(router).await);

    client.complete(question()).await.unwrap();

    let (headers, body) = seen.0.lock().unwrap().clone().expect("request was not captured");
    assert_eq!(headers["authorization"], "Bearer test-key");
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["x-title"], "EduMate Study Assistant");
    assert_eq!(headers["http-referer"], "http://localhost");

    assert_eq!(body["model"], "openai/gpt-4o-mini");
    assert_eq!(body["max_tokens"], 1500);
    assert_eq!(body["stream"], false);
    let temperature = body["temperature"].as_f64().unwrap();
    assert!((temperature - 0.7).abs() < 1e-6);
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "be brief"},
            {"role": "user", "content": "Explain binary search"}
        ])
    );
}

#[tokio::test]
async fn test_server_error_is_status_failure() {
    let router = Router::new().route(
        COMPLETIONS_ROUTE,
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let client = client_for(spawn_server(router).await);

    let err = client.complete(question()).await.unwrap_err();

    assert_eq!(
        err,
        ReplyUnavailable::Status {
            status: 500,
            body: "upstream exploded".to_string()
        }
    );
}

#[tokio::test]
async fn test_unauthorized_is_status_failure() {
    let router = Router::new().route(
        COMPLETIONS_ROUTE,
        post(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "No auth"}}))) }),
    );
    let client = client_for(spawn_server(router).await);

    let err = client.complete(question()).await.unwrap_err();
    assert_eq!(err.kind(), "status");
}

#[tokio::test]
async fn test_missing_choices_is_malformed() {
    let router = Router::new().route(
        COMPLETIONS_ROUTE,
        post(|| async { Json(json!({"id": "gen-2", "object": "chat.completion"})) }),
    );
    let client = client_for(spawn_server(router).await);

    let err = client.complete(question()).await.unwrap_err();
    assert_eq!(err.kind(), "malformed");
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let router = Router::new().route(COMPLETIONS_ROUTE, post(|| async { "<html>gateway</html>" }));
    let client = client_for(spawn_server(router).await);

    let err = client.complete(question()).await.unwrap_err();
    assert_eq!(err.kind(), "malformed");
}

#[tokio::test]
async fn test_refused_connection_is_network_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(format!("http://{addr}/api/v1"));

    let err = client.complete(question()).await.unwrap_err();
    assert_eq!(err.kind(), "network");
}

#[tokio::test]
async fn test_controller_turns_server_error_into_fallback() {
    let router = Router::new().route(
        COMPLETIONS_ROUTE,
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let client = client_for(spawn_server(router).await);
    let mut controller = ConversationController::new(Arc::new(client));

    controller.submit("hello");
    controller.next_reply().await.unwrap();

    let transcript: Vec<(Origin, &str)> = controller
        .history()
        .iter()
        .map(|m| (m.origin(), m.content()))
        .collect();
    assert_eq!(
        transcript,
        vec![(Origin::User, "hello"), (Origin::Assistant, FALLBACK_REPLY)]
    );
    assert!(!controller.is_pending());
}

#[tokio::test]
async fn test_controller_end_to_end_success() {
    let seen = Seen::default();
    let router = Router::new()
        .route(COMPLETIONS_ROUTE, post(answer))
        .with_state(seen.clone());
    let client = client_for(spawn_server(router).await);
    let mut controller = ConversationController::new(Arc::new(client));

    controller.submit("Explain binary search");
    let reply = controller.next_reply().await.unwrap();

    assert_eq!(reply.content(), "Binary search halves the range each step.");
    let (_, body) = seen.0.lock().unwrap().clone().unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}
