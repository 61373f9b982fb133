use axum::{routing::get, Router};

use availability_cell::router::{dentist_routes, staff_schedule_routes};
use queue_cell::router::{patient_routes, staff_queue_routes};
use shared_database::AppState;

pub fn create_router(state: AppState) -> Router {
    let staff = staff_queue_routes(state.clone()).merge(staff_schedule_routes(state.clone()));

    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/dentist", dentist_routes(state.clone()))
        .nest("/staff", staff)
        .nest("/patient", patient_routes(state))
}
