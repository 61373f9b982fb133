use sqlx::PgPool;
use tracing::info;

use shared_models::slots::is_catalog_slot;

use crate::error::AssignmentError;
use crate::models::{AppointmentRequest, CreateRequestPayload, RequestStatus};

pub struct RequestService<'a> {
    db: &'a PgPool,
}

impl<'a> RequestService<'a> {
    pub fn new(db: &'a PgPool) -> Self {
        Self { db }
    }

    pub async fn create_request(
        &self,
        patient_id: i64,
        payload: &CreateRequestPayload,
    ) -> Result<AppointmentRequest, AssignmentError> {
        if payload.treatment.trim().is_empty() {
            return Err(AssignmentError::Validation(
                "Treatment is required".to_string(),
            ));
        }
        if !is_catalog_slot(&payload.requested_time_slot) {
            return Err(AssignmentError::Validation(format!(
                "Unknown slot label: {}",
                payload.requested_time_slot
            )));
        }

        let request = sqlx::query_as::<_, AppointmentRequest>(
            r#"
            INSERT INTO appointment_requests
                (patient_id, requested_date, requested_time_slot, treatment, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(patient_id)
        .bind(payload.requested_date)
        .bind(&payload.requested_time_slot)
        .bind(payload.treatment.trim())
        .bind(&payload.notes)
        .bind(RequestStatus::New.as_str())
        .fetch_one(self.db)
        .await?;

        info!(
            request_id = request.id,
            patient_id,
            %payload.requested_date,
            slot = %payload.requested_time_slot,
            "Appointment request created"
        );

        Ok(request)
    }

    /// Only the owning patient may cancel, and only while the request is
    /// still NEW. SCHEDULED and CANCELLED are terminal.
    pub async fn cancel_request(
        &self,
        patient_id: i64,
        request_id: i64,
    ) -> Result<AppointmentRequest, AssignmentError> {
        let cancelled = sqlx::query_as::<_, AppointmentRequest>(
            r#"
            UPDATE appointment_requests SET status = $3
            WHERE id = $1 AND patient_id = $2 AND status = $4
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(patient_id)
        .bind(RequestStatus::Cancelled.as_str())
        .bind(RequestStatus::New.as_str())
        .fetch_optional(self.db)
        .await?;

        if let Some(request) = cancelled {
            info!(request_id, patient_id, "Appointment request cancelled");
            return Ok(request);
        }

        // Distinguish "not yours / not there" from "already consumed".
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM appointment_requests WHERE id = $1 AND patient_id = $2",
        )
        .bind(request_id)
        .bind(patient_id)
        .fetch_optional(self.db)
        .await?;

        match status {
            Some(status) => Err(AssignmentError::Conflict(format!(
                "Request is {} and can no longer be cancelled",
                status
            ))),
            None => Err(AssignmentError::NotFound(format!(
                "appointment request {}",
                request_id
            ))),
        }
    }
}
