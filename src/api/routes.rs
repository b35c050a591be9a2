use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::auth::auth_middleware;
use super::chat::{chat, stop_generation};
use super::handlers::*;
use super::state::AppState;
use super::storage;

/// Zip uploads are far larger than axum's default body limit.
const STORAGE_BODY_LIMIT: usize = 100 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/models", get(list_models));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        // Generation
        .route("/api/chat", post(chat))
        .route("/api/chat/:chat_id/stop", post(stop_generation))
        .route("/api/projects/:project_id/generation", get(get_project_generation))

        // Chats and sessions
        .route("/api/chats", get(list_chats))
        .route("/api/chats/:chat_id", get(get_chat))
        .route("/api/chats/:chat_id", delete(delete_chat))
        .route("/api/chats/:chat_id/files", get(get_session_files))
        .route("/api/chats/:chat_id/files", put(update_session_files))
        .route("/api/chats/:chat_id/load", post(load_history))
        .route("/api/chats/:chat_id/flush", post(flush_session))

        // Storage
        .route("/api/storage/upload", post(storage::upload))
        .route("/api/storage/list", get(storage::list))
        .route("/api/storage/update", put(storage::update))
        .route("/api/storage/delete", delete(storage::delete))
        .route("/api/storage/download/*path", get(storage::download))
        .route("/api/storage/generate", post(storage::generate))
        .layer(DefaultBodyLimit::max(STORAGE_BODY_LIMIT))

        // Apply auth middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(cors)
}
