//! Application setup and server configuration.

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    bot_handler, cancel_match_handler, chat_id_handler, chat_log_handler, chat_stream_handler,
    health_handler, logged_in_handler, login_handler, logout_handler, post_message_handler,
    profile_handler, register_handler, request_match_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: ServerDeps,
    /// Checked by /health; `None` when running on in-memory stores
    pub db_pool: Option<PgPool>,
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps, db_pool: Option<PgPool>, allowed_origins: &[String]) -> Router {
    let jwt_service = deps.jwt_service.clone();
    let sessions = deps.sessions.clone();

    let app_state = AxumAppState { deps, db_pool };

    Router::new()
        .route("/health", get(health_handler))
        // Accounts
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/loggedin", get(logged_in_handler))
        .route("/profile", get(profile_handler))
        // Matchmaking
        .route(
            "/matchmaking",
            post(request_match_handler).delete(cancel_match_handler),
        )
        // Chat
        .route("/chatid", get(chat_id_handler))
        .route("/chat/:chat_id", post(post_message_handler))
        .route("/chat/log/:chat_id", get(chat_log_handler))
        .route("/chat/:chat_id/stream", get(chat_stream_handler))
        // Prompt bot
        .route("/bot/:topic", get(bot_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), sessions.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS: any origin unless an explicit list is configured
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
