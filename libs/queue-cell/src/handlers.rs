use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::ensure_role;

use crate::models::{AssignQueueRequest, CreateRequestPayload};
use crate::services::assignment::AssignmentService;
use crate::services::queue::QueueService;
use crate::services::requests::RequestService;

#[derive(Debug, Deserialize)]
pub struct QueueDataQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityQuery {
    pub date: NaiveDate,
    pub dentist_id: i64,
    pub unit_id: i64,
    pub slot: String,
}

fn patient_identity(user: &User) -> Result<i64, AppError> {
    ensure_role(user, "patient")?;
    user.patient_id
        .ok_or_else(|| AppError::Auth("Patient session has no patient id".to_string()))
}

// ===== Staff endpoints =====

pub async fn assign_queue(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<AssignQueueRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = AssignmentService::new(&state.db);
    let response = service.assign(&payload).await?;

    Ok(Json(json!(response)))
}

pub async fn get_queue_data(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<QueueDataQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = QueueService::new(&state.db);
    let data = service.queue_data(query.date).await?;

    Ok(Json(json!({
        "queue_items": data.queue_items,
        "appointments": data.appointments,
        "availability": data.availability,
    })))
}

pub async fn get_queue_master_data(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = QueueService::new(&state.db);
    let (dentists, units) = service.master_data().await?;

    Ok(Json(json!({ "dentists": dentists, "units": units })))
}

pub async fn check_availability(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<CheckAvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = QueueService::new(&state.db);
    let check = service
        .check_availability(query.date, query.dentist_id, query.unit_id, &query.slot)
        .await?;

    Ok(Json(json!(check)))
}

// ===== Patient endpoints =====

pub async fn create_appointment_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<Json<Value>, AppError> {
    let patient_id = patient_identity(&user)?;

    let service = RequestService::new(&state.db);
    let request = service.create_request(patient_id, &payload).await?;

    Ok(Json(json!({ "ok": true, "request": request })))
}

pub async fn cancel_appointment_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let patient_id = patient_identity(&user)?;

    let service = RequestService::new(&state.db);
    let request = service.cancel_request(patient_id, id).await?;

    Ok(Json(json!({ "ok": true, "request": request })))
}
