use axum::{middleware, routing::{get, post}, Router};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Queue routes mounted under /staff.
pub fn staff_queue_routes(state: AppState) -> Router {
    Router::new()
        .route("/assign-queue", post(handlers::assign_queue))
        .route("/queue-data", get(handlers::get_queue_data))
        .route("/queue-master-data", get(handlers::get_queue_master_data))
        .route("/check-availability", get(handlers::check_availability))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

/// Appointment-request routes mounted under /patient.
pub fn patient_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/appointment-request",
            post(handlers::create_appointment_request),
        )
        .route(
            "/appointment-requests/{id}/cancel",
            post(handlers::cancel_appointment_request),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
