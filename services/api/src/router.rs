//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application:
//! the REST catalog endpoints, the WebSocket endpoint, and the OpenAPI
//! documentation.

use crate::{
    handlers,
    models::{ErrorResponse, ModuleInfo, TrackInfo},
    state::AppState,
    ws::ws_handler,
};

use axum::{Router, routing::get};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::list_tracks, handlers::list_track_modules),
    components(schemas(TrackInfo, ModuleInfo, ErrorResponse)),
    tags(
        (name = "Study Companion API", description = "Exam catalog and chat session endpoints")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/tracks", get(handlers::list_tracks))
        .route("/tracks/{track}/modules", get(handlers::list_track_modules))
        .route("/ws", get(ws_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
