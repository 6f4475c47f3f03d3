//! HTTP API: account endpoints, contact book, chat/message listings.
//!
//! Domain failures (duplicate username, bad credentials, unknown QfChat
//! number) are reported as `{success: false, message}` with a 200 status;
//! clients branch on the flag, never on status codes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use qfchat_store::{Chat, ChatStore, ContactView, Message, UserSummary};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::relay::Relay;
use crate::ws;

#[derive(Clone)]
pub struct AppState {
    pub store: ChatStore,
    pub relay: Relay,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))
        .route("/api/search-user", post(search_user))
        .route("/api/add-contact", post(add_contact))
        .route("/api/contacts/:user_id", get(list_contacts))
        .route("/api/chats/:user_id", get(list_chats))
        .route("/api/messages/:chat_id", get(list_messages))
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the router until the listener fails or the task is dropped.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CredentialsRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchUserRequest {
    qf_number: QfNumberParam,
}

/// The original protocol compared QfChat numbers loosely, so clients may send
/// the code as a JSON number or a numeric string.  Both are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum QfNumberParam {
    Number(u32),
    Text(String),
}

impl QfNumberParam {
    fn value(&self) -> Option<u32> {
        match self {
            QfNumberParam::Number(n) => Some(*n),
            QfNumberParam::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddContactRequest {
    user_id: Uuid,
    contact_id: Uuid,
    #[serde(default)]
    nickname: String,
}

#[derive(Serialize)]
struct UserResponse {
    success: bool,
    user: UserSummary,
}

#[derive(Serialize)]
struct FailureResponse {
    success: bool,
    message: String,
}

#[derive(Serialize)]
struct AckResponse {
    success: bool,
}

#[derive(Serialize)]
struct ContactsResponse {
    contacts: Vec<ContactView>,
}

#[derive(Serialize)]
struct ChatsResponse {
    chats: Vec<Chat>,
}

#[derive(Serialize)]
struct MessagesResponse {
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    instance: String,
    version: &'static str,
}

fn user_ok(user: qfchat_store::User) -> Result<Json<serde_json::Value>, ServerError> {
    let body = UserResponse {
        success: true,
        user: user.summary(),
    };
    serde_json::to_value(body)
        .map(Json)
        .map_err(|e| ServerError::Internal(e.to_string()))
}

fn failure(message: String) -> Result<Json<serde_json::Value>, ServerError> {
    let body = FailureResponse {
        success: false,
        message,
    };
    serde_json::to_value(body)
        .map(Json)
        .map_err(|e| ServerError::Internal(e.to_string()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        instance: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    match state.store.signup(&req.username, &req.password).await {
        Ok(user) => user_ok(user),
        Err(e) => failure(e.to_string()),
    }
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    match state.store.login(&req.username, &req.password).await {
        Ok(user) => user_ok(user),
        Err(e) => failure(e.to_string()),
    }
}

async fn search_user(
    State(state): State<AppState>,
    Json(req): Json<SearchUserRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let Some(qf_number) = req.qf_number.value() else {
        return failure("User not found".to_string());
    };
    match state.store.find_by_qf_number(qf_number).await {
        Ok(user) => user_ok(user),
        Err(e) => failure(e.to_string()),
    }
}

async fn add_contact(
    State(state): State<AppState>,
    Json(req): Json<AddContactRequest>,
) -> Json<AckResponse> {
    // The handler supplies the fallback for an empty nickname: the contact's
    // current username, or "Unknown" for a dangling id.
    let nickname = if req.nickname.trim().is_empty() {
        state
            .store
            .get_user(req.contact_id)
            .await
            .map(|u| u.username)
            .unwrap_or_else(|| "Unknown".to_string())
    } else {
        req.nickname.clone()
    };

    state
        .store
        .add_contact(req.user_id, req.contact_id, &nickname)
        .await;

    Json(AckResponse { success: true })
}

async fn list_contacts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ContactsResponse>, ServerError> {
    let user_id = parse_user_id(&user_id)?;
    let contacts = state.store.list_contacts(user_id).await;
    Ok(Json(ContactsResponse { contacts }))
}

async fn list_chats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ChatsResponse>, ServerError> {
    let user_id = parse_user_id(&user_id)?;
    let chats = state.store.list_chats_for_user(user_id).await;
    Ok(Json(ChatsResponse { chats }))
}

async fn list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Json<MessagesResponse> {
    let messages = state.store.list_messages(&chat_id).await;
    Json(MessagesResponse { messages })
}

fn parse_user_id(raw: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|_| ServerError::BadRequest(format!("invalid user id: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_router() -> (Router, AppState) {
        let state = AppState {
            store: ChatStore::new(),
            relay: Relay::new(),
            config: Arc::new(ServerConfig::default()),
        };
        (build_router(state.clone()), state)
    }

    async fn post_json(router: &Router, path: &str, body: Value) -> Value {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get_json(router: &Router, path: &str) -> Value {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_signup_login_scenario() {
        let (router, _state) = test_router();

        let first = post_json(
            &router,
            "/api/signup",
            json!({ "username": "alice", "password": "pw1" }),
        )
        .await;
        assert_eq!(first["success"], true);
        let qf_number = first["user"]["qfNumber"].as_u64().unwrap();
        assert!((100_000..=999_999).contains(&qf_number));
        assert!(first["user"].get("password").is_none());

        let dup = post_json(
            &router,
            "/api/signup",
            json!({ "username": "alice", "password": "pw2" }),
        )
        .await;
        assert_eq!(dup["success"], false);
        assert_eq!(dup["message"], "Username already exists");

        let login_ok = post_json(
            &router,
            "/api/login",
            json!({ "username": "alice", "password": "pw1" }),
        )
        .await;
        assert_eq!(login_ok["success"], true);
        assert_eq!(login_ok["user"]["id"], first["user"]["id"]);
        assert_eq!(login_ok["user"]["qfNumber"], first["user"]["qfNumber"]);

        let login_bad = post_json(
            &router,
            "/api/login",
            json!({ "username": "alice", "password": "wrong" }),
        )
        .await;
        assert_eq!(login_bad["success"], false);
        assert_eq!(login_bad["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_search_user_accepts_number_and_string() {
        let (router, _state) = test_router();

        let signup = post_json(
            &router,
            "/api/signup",
            json!({ "username": "bob", "password": "pw" }),
        )
        .await;
        let qf_number = signup["user"]["qfNumber"].as_u64().unwrap();

        let by_number =
            post_json(&router, "/api/search-user", json!({ "qfNumber": qf_number })).await;
        assert_eq!(by_number["success"], true);
        assert_eq!(by_number["user"]["username"], "bob");

        let by_string = post_json(
            &router,
            "/api/search-user",
            json!({ "qfNumber": qf_number.to_string() }),
        )
        .await;
        assert_eq!(by_string["success"], true);

        let missing = post_json(&router, "/api/search-user", json!({ "qfNumber": 1 })).await;
        assert_eq!(missing["success"], false);
        assert_eq!(missing["message"], "User not found");
    }

    #[tokio::test]
    async fn test_add_contact_empty_nickname_falls_back_to_username() {
        let (router, _state) = test_router();

        let alice = post_json(
            &router,
            "/api/signup",
            json!({ "username": "alice", "password": "pw" }),
        )
        .await;
        let bob = post_json(
            &router,
            "/api/signup",
            json!({ "username": "bob", "password": "pw" }),
        )
        .await;
        let alice_id = alice["user"]["id"].as_str().unwrap();
        let bob_id = bob["user"]["id"].as_str().unwrap();

        let ack = post_json(
            &router,
            "/api/add-contact",
            json!({ "userId": alice_id, "contactId": bob_id, "nickname": "" }),
        )
        .await;
        assert_eq!(ack["success"], true);

        let contacts = get_json(&router, &format!("/api/contacts/{alice_id}")).await;
        assert_eq!(contacts["contacts"][0]["nickname"], "bob");
        assert_eq!(contacts["contacts"][0]["username"], "bob");
    }

    #[tokio::test]
    async fn test_chats_and_messages_listing() {
        let (router, state) = test_router();

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let chat = state.store.find_or_create_dm(a, b).await;
        state.store.append_message(&chat.id, a, "alice", "hi").await;

        let chats = get_json(&router, &format!("/api/chats/{a}")).await;
        assert_eq!(chats["chats"].as_array().unwrap().len(), 1);
        assert_eq!(chats["chats"][0]["type"], "dm");

        let messages = get_json(&router, &format!("/api/messages/{}", chat.id)).await;
        assert_eq!(messages["messages"].as_array().unwrap().len(), 1);
        assert_eq!(messages["messages"][0]["content"], "hi");
        assert_eq!(messages["messages"][0]["senderName"], "alice");

        let empty = get_json(&router, "/api/messages/dm_404").await;
        assert_eq!(empty["messages"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_invalid_user_id_is_bad_request() {
        let (router, _state) = test_router();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/contacts/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (router, _state) = test_router();
        let health = get_json(&router, "/health").await;
        assert_eq!(health["status"], "ok");
    }
}
