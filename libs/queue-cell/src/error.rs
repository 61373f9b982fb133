use shared_models::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("Appointment request not found or already scheduled")]
    RequestUnavailable,

    #[error("Request does not belong to the given patient")]
    PatientMismatch,

    #[error("{0} not found")]
    EntityNotFound(&'static str),

    #[error("Slot is no longer available")]
    SlotUnavailable,

    #[error("Slot is already booked")]
    SlotTaken,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AssignmentError> for AppError {
    fn from(err: AssignmentError) -> Self {
        match err {
            // Precondition failures are client errors; the request body
            // referenced something that is not in an assignable state.
            AssignmentError::RequestUnavailable
            | AssignmentError::PatientMismatch => AppError::BadRequest(err.to_string()),
            AssignmentError::EntityNotFound(_) => AppError::BadRequest(err.to_string()),
            // Losing a race on the slot is a conflict; the client re-reads
            // candidates and retries.
            AssignmentError::SlotUnavailable | AssignmentError::SlotTaken => {
                AppError::Conflict(err.to_string())
            }
            AssignmentError::Validation(msg) => AppError::ValidationError(msg),
            AssignmentError::NotFound(msg) => AppError::NotFound(msg),
            AssignmentError::Conflict(msg) => AppError::Conflict(msg),
            AssignmentError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
