use shared_models::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schedule not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("All requested slots conflict")]
    AllSlotsConflict { conflicts: Vec<String> },

    #[error("Slot was taken by a concurrent save")]
    SlotRace { conflicts: Vec<String> },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Validation(msg) => AppError::ValidationError(msg),
            AvailabilityError::NotFound(msg) => AppError::NotFound(msg),
            AvailabilityError::Conflict(msg) => AppError::Conflict(msg),
            AvailabilityError::AllSlotsConflict { conflicts } => AppError::SlotConflict {
                message: "All requested slots are already taken".to_string(),
                conflicts,
            },
            AvailabilityError::SlotRace { conflicts } => AppError::SlotConflict {
                message: "Slot was just taken by another dentist, please retry".to_string(),
                conflicts,
            },
            AvailabilityError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
