// routes.rs
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/polls", get(handlers::list_polls).post(handlers::create_poll))
        .route(
            "/polls/{id}",
            get(handlers::get_poll).delete(handlers::delete_poll),
        )
        .route("/polls/{id}/results", get(handlers::get_results))
        .route("/polls/{id}/vote", post(handlers::vote))
        .route("/polls/{id}/reconcile", post(handlers::reconcile_poll))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
