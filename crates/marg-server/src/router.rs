use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all annotation endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handler::info_handler))
        .route(
            "/annotations",
            get(handler::list_handler).post(handler::create_handler),
        )
        .route(
            "/annotations/:id",
            get(handler::read_handler)
                .put(handler::update_handler)
                .delete(handler::delete_handler),
        )
        .route("/search", get(handler::search_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
