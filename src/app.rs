use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{IdentityResolver, TokenError, TokenService};
use crate::config::AppConfig;
use crate::database::{StoreHealth, Stores};
use crate::handlers;
use crate::services::{AccountService, NoteService};

/// Shared, immutable application state. Everything in here is built once at
/// startup from an explicit `AppConfig`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<AccountService>,
    pub notes: Arc<NoteService>,
    pub identity: Arc<IdentityResolver>,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores) -> Result<Self, TokenError> {
        let tokens = Arc::new(TokenService::new(&config.security)?);

        let accounts = AccountService::new(stores.users.clone(), tokens.clone(), config.password.clone());
        let identity = IdentityResolver::new(tokens, stores.users.clone());
        let notes = NoteService::new(stores.notes.clone());

        Ok(Self {
            config: Arc::new(config),
            accounts: Arc::new(accounts),
            notes: Arc::new(notes),
            identity: Arc::new(identity),
            health: stores.health,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);
    let body_limit = state.config.api.max_request_size_bytes;

    Router::new()
        // Public
        .route("/api", get(handlers::public::welcome))
        .route("/health", get(handlers::public::health))
        .merge(auth_routes())
        // Protected
        .merge(note_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register_post))
        .route("/api/auth/login", post(auth::login_post))
}

fn note_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::notes;

    Router::new()
        .route("/api/notes", get(notes::collection_get).post(notes::collection_post))
        .route("/api/notes/", get(notes::collection_get).post(notes::collection_post))
        .route(
            "/api/notes/:note_id",
            get(notes::record_get)
                .put(notes::record_put)
                .delete(notes::record_delete),
        )
        .route_layer(middleware::from_fn_with_state(state, crate::middleware::require_user))
}

/// `*` (or an empty list) allows any origin without credentials; otherwise
/// only the listed origins are allowed.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    base.allow_origin(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        test_state_with(|_| None)
    }

    fn test_state_with(extra: impl Fn(&str) -> Option<String>) -> AppState {
        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("router-test-secret".to_string()),
            "NOTES_STORE" => Some("memory".to_string()),
            _ => extra(key),
        })
        .unwrap();
        AppState::new(config, Stores::from_backend(Arc::new(MemoryStore::new()))).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn login_request(email: &str, password: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "username={}&password={}",
                email.replace('@', "%40"),
                password
            )))
            .unwrap()
    }

    #[tokio::test]
    async fn welcome_and_health() {
        let app = router(test_state());

        let (status, body) = send(&app, Request::get("/api").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to the Notes Taking App API");

        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl StoreHealth for Unreachable {
        async fn ping(&self) -> Result<(), crate::database::StoreError> {
            Err(crate::database::StoreError::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn health_reports_unreachable_store() {
        let mut state = test_state();
        state.health = Arc::new(Unreachable);
        let app = router(state);

        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
        assert!(!body["message"].as_str().unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn notes_require_a_token() {
        let app = router(test_state());

        let response = app
            .clone()
            .oneshot(Request::get("/api/notes/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

        let (status, body) = send(
            &app,
            Request::get("/api/notes/")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn register_login_and_crud() {
        let app = router(test_state());

        let (status, user) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({"user_name": "alice", "user_email": "a@x.com", "password": "pw1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["user_email"], "a@x.com");
        assert!(user.get("hashed_password").is_none());

        let (status, token) = send(&app, login_request("a@x.com", "pw1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(token["token_type"], "bearer");
        let token = token["access_token"].as_str().unwrap().to_string();

        let (status, note) = send(
            &app,
            json_request(
                "POST",
                "/api/notes/",
                Some(&token),
                json!({"note_title": "t", "note_content": "c"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(note["owner_id"], user["user_id"]);
        let note_id = note["note_id"].as_str().unwrap().to_string();

        let (status, list) = send(
            &app,
            Request::get("/api/notes")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = send(
            &app,
            Request::delete(format!("/api/notes/{}", note_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = router(test_state());

        let (status, body) = send(
            &app,
            json_request("POST", "/api/auth/register", None, json!({"user_email": "a@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let app = router(test_state_with(|key| {
            (key == "API_MAX_REQUEST_SIZE_BYTES").then(|| "256".to_string())
        }));

        let body = json!({"user_name": "alice", "user_email": "a@x.com", "password": "p".repeat(1024)});
        let (status, err) = send(&app, json_request("POST", "/api/auth/register", None, body)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err["code"], "PAYLOAD_TOO_LARGE");

        let form = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username=a%40x.com&password={}", "p".repeat(1024))))
            .unwrap();
        let (status, _) = send(&app, form).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        // Small bodies still pass the limit
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({"user_name": "alice", "user_email": "a@x.com", "password": "pw1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn duplicate_registration_is_bad_request() {
        let app = router(test_state());
        let body = json!({"user_name": "alice", "user_email": "a@x.com", "password": "pw1"});

        let (status, _) = send(&app, json_request("POST", "/api/auth/register", None, body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, err) = send(&app, json_request("POST", "/api/auth/register", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "EMAIL_CONFLICT");
    }
}
