use axum::{Router, extract::DefaultBodyLimit, http::Method};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::render::Renderer;
use crate::server::config::ServerConfig;
use crate::web::routes::*;

pub mod error;
pub mod models;
pub mod routes;

pub struct AppState {
    pub renderer: Renderer,
}

pub fn create_axum_router(config: &ServerConfig, renderer: Renderer) -> Router {
    let app_state = Arc::new(AppState { renderer });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .merge(health_routes::create_health_router())
        .merge(render_routes::create_render_router())
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
