//! # wb-api
//!
//! The HTTP and WebSocket surface of Wassup-Board. Handlers stay thin: every
//! write goes through the [`Hub`], every read is a store snapshot.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ws;

use axum::{routing::get, Router};
use std::sync::Arc;
use wb_hub::Hub;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    /// Origins accepted for CORS and for WebSocket upgrades.
    pub allowed_origins: Arc<[String]>,
}

impl AppState {
    pub fn new(hub: Hub, allowed_origins: Vec<String>) -> Self {
        Self {
            hub,
            allowed_origins: allowed_origins.into(),
        }
    }

    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }
}

/// Builds the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = middleware::cors_policy(&state.allowed_origins);

    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/thread",
            get(handlers::list_threads).post(handlers::create_thread),
        )
        .route("/thread/{id}", get(handlers::get_thread))
        .route("/ws", get(ws::threads_ws))
        .route("/pair", get(ws::pair_ws))
        .layer(middleware::request_tracing())
        .layer(cors)
        .with_state(state)
}
