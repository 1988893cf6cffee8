use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    middleware::logging,
    routes::{chats, health, users},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    let chat_routes = Router::new()
        .route("/chats", get(chats::list_chats))
        .route("/new", post(chats::create_chat))
        .route("/tasks", get(chats::task_types))
        .route("/:chat_id/status", get(chats::chat_status))
        .route("/:chat_id/messages", get(chats::list_messages))
        .route("/:chat_id/message/new", post(chats::process_message))
        .route(
            "/:chat_id/message/new/:task_name",
            post(chats::process_message_task),
        )
        .route("/:chat_id", get(chats::get_chat).delete(chats::delete_chat));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/user/me", get(users::current_user))
        .nest("/chat", chat_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let parsed_origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}
