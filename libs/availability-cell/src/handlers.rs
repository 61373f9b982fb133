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
use shared_utils::extractor::{ensure_any_role, ensure_role};

use crate::models::{
    BulkScheduleRequest, CreateScheduleRequest, SaveAvailabilityRequest,
    UpdateScheduleStatusRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::candidates::CandidateService;

#[derive(Debug, Deserialize)]
pub struct CandidatesQuery {
    pub date: NaiveDate,
    pub unit_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct MyAvailabilityQuery {
    pub date: NaiveDate,
    pub unit_id: Option<i64>,
    pub only_free: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleListQuery {
    pub date: Option<NaiveDate>,
    pub dentist_id: Option<i64>,
}

fn dentist_identity(user: &User) -> Result<i64, AppError> {
    ensure_role(user, "dentist")?;
    user.dentist_id
        .ok_or_else(|| AppError::Auth("Dentist session has no dentist id".to_string()))
}

// ===== Dentist endpoints =====

pub async fn get_candidates(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<CandidatesQuery>,
) -> Result<Json<Value>, AppError> {
    // Staff read the same view when assigning from the queue.
    ensure_any_role(&user, &["dentist", "staff"])?;

    let service = CandidateService::new(&state.db);
    let response = service.candidates(query.date, query.unit_id).await?;

    Ok(Json(json!(response)))
}

pub async fn get_my_availability(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<MyAvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let dentist_id = dentist_identity(&user)?;
    let only_free = matches!(query.only_free.as_deref(), Some("1") | Some("true"));

    let service = CandidateService::new(&state.db);
    let schedules = service
        .dentist_schedules(dentist_id, query.date, query.unit_id, only_free)
        .await?;

    Ok(Json(json!({ "schedules": schedules })))
}

pub async fn save_availability(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<SaveAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let dentist_id = dentist_identity(&user)?;

    let service = AvailabilityService::new(&state.db);
    let response = service.replace_for_dentist(dentist_id, &payload).await?;

    Ok(Json(json!(response)))
}

// ===== Staff schedule CRUD =====

pub async fn list_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ScheduleListQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = AvailabilityService::new(&state.db);
    let schedules = service.list_schedules(query.date, query.dentist_id).await?;

    Ok(Json(json!({ "schedules": schedules })))
}

pub async fn create_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = AvailabilityService::new(&state.db);
    let schedule = service.create_schedule(&payload).await?;

    Ok(Json(json!({ "ok": true, "schedule": schedule })))
}

pub async fn update_schedule_status(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateScheduleStatusRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = AvailabilityService::new(&state.db);
    let schedule = service.update_schedule_status(id, payload.status).await?;

    Ok(Json(json!({ "ok": true, "schedule": schedule })))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = AvailabilityService::new(&state.db);
    service.delete_schedule(id).await?;

    Ok(Json(json!({ "ok": true })))
}

pub async fn bulk_create_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<BulkScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = AvailabilityService::new(&state.db);
    let response = service.bulk_create(&payload).await?;

    Ok(Json(json!(response)))
}

pub async fn list_units(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&user, "staff")?;

    let service = AvailabilityService::new(&state.db);
    let units = service.list_active_units().await?;

    Ok(Json(json!({ "units": units })))
}
