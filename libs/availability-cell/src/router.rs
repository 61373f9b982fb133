use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Routes mounted under /dentist.
pub fn dentist_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/candidates", get(handlers::get_candidates))
        .route(
            "/api/availability",
            get(handlers::get_my_availability).post(handlers::save_availability),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

/// Schedule administration routes mounted under /staff.
pub fn staff_schedule_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/schedules",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .route("/api/schedules/bulk", post(handlers::bulk_create_schedules))
        .route(
            "/api/schedules/{id}",
            put(handlers::update_schedule_status).delete(handlers::delete_schedule),
        )
        .route("/api/units", get(handlers::list_units))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
