pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ai::llm::ChatModel;
use crate::chat::ChatService;
use crate::db::ChatRepository;

/// Shared application state, accessible from all handlers.
pub struct AppState<R, M> {
    pub chat: ChatService<R, M>,
}

/// Build the router with all routes, CORS and request tracing.
pub fn build_router<R: ChatRepository, M: ChatModel>(
    state: Arc<AppState<R, M>>,
    cors_origins: &[String],
) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/health", get(handlers::health::<R, M>))
        .route("/conversations/{user_id}", get(handlers::list_conversations::<R, M>))
        .route("/history/{conversation_id}", get(handlers::get_history::<R, M>))
        .route(
            "/conversation/{conversation_id}",
            delete(handlers::delete_conversation::<R, M>),
        )
        .route("/chat", post(handlers::chat::<R, M>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
