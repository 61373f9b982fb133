use sqlx::PgPool;
use tracing::{info, warn};

use shared_models::slots::slot_bounds;

use crate::error::AssignmentError;
use crate::models::{AssignQueueRequest, AssignQueueResponse, RequestStatus};

/// Turns a NEW appointment request into a confirmed appointment.
///
/// Every check and every write happens inside one transaction, and the rows
/// that decide the outcome (the request, the schedule slot, any appointment
/// already holding the unit slot) are read with FOR UPDATE. Two staff
/// members assigning the same slot serialize on those locks; the loser sees
/// a conflict and nothing else changes.
pub struct AssignmentService<'a> {
    db: &'a PgPool,
}

impl<'a> AssignmentService<'a> {
    pub fn new(db: &'a PgPool) -> Self {
        Self { db }
    }

    pub async fn assign(
        &self,
        req: &AssignQueueRequest,
    ) -> Result<AssignQueueResponse, AssignmentError> {
        let (start_time, end_time) =
            slot_bounds(req.date, &req.slot).map_err(AssignmentError::Validation)?;

        let mut tx = self.db.begin().await?;

        // The request row is the single consumption point: once it leaves
        // NEW it can never be assigned again.
        let request = sqlx::query_as::<_, (i64, String)>(
            "SELECT patient_id, status FROM appointment_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(req.request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (request_patient_id, request_status) = match request {
            Some(row) => row,
            None => return Err(AssignmentError::RequestUnavailable),
        };
        if request_status != RequestStatus::New.as_str() {
            warn!(
                request_id = req.request_id,
                status = %request_status,
                "Assignment rejected, request already consumed"
            );
            return Err(AssignmentError::RequestUnavailable);
        }
        if request_patient_id != req.patient_id {
            return Err(AssignmentError::PatientMismatch);
        }

        self.ensure_exists(&mut tx, "patients", req.patient_id, "Patient")
            .await?;
        self.ensure_exists(&mut tx, "dentists", req.dentist_id, "Dentist")
            .await?;
        self.ensure_exists(&mut tx, "dental_units", req.unit_id, "Dental unit")
            .await?;

        let schedule = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT id, status FROM schedules
            WHERE dentist_id = $1 AND unit_id = $2 AND date = $3 AND slot_label = $4
            FOR UPDATE
            "#,
        )
        .bind(req.dentist_id)
        .bind(req.unit_id)
        .bind(req.date)
        .bind(&req.slot)
        .fetch_optional(&mut *tx)
        .await?;

        let schedule_id = match schedule {
            Some((id, status)) if status == "FREE" => id,
            _ => {
                warn!(
                    dentist_id = req.dentist_id,
                    unit_id = req.unit_id,
                    slot = %req.slot,
                    "Assignment rejected, slot not FREE"
                );
                return Err(AssignmentError::SlotUnavailable);
            }
        };

        // Room-level double-booking guard: no dentist filter on purpose,
        // the unit chair is the contested resource.
        let existing = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM appointments
            WHERE date = $1 AND unit_id = $2 AND slot_label = $3
              AND status IN ('confirmed', 'pending')
            FOR UPDATE
            "#,
        )
        .bind(req.date)
        .bind(req.unit_id)
        .bind(&req.slot)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            return Err(AssignmentError::SlotTaken);
        }

        let appointment_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO appointments
                (patient_id, dentist_id, unit_id, date, slot_label,
                 start_time, end_time, status, notes, from_request_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'confirmed', $8, $9)
            RETURNING id
            "#,
        )
        .bind(req.patient_id)
        .bind(req.dentist_id)
        .bind(req.unit_id)
        .bind(req.date)
        .bind(&req.slot)
        .bind(start_time)
        .bind(end_time)
        .bind(&req.service_description)
        .bind(req.request_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE schedules SET status = 'BOOKED', updated_at = now() WHERE id = $1")
            .bind(schedule_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE appointment_requests SET status = $2 WHERE id = $1")
            .bind(req.request_id)
            .bind(RequestStatus::Scheduled.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            appointment_id,
            request_id = req.request_id,
            dentist_id = req.dentist_id,
            unit_id = req.unit_id,
            %req.date,
            slot = %req.slot,
            "Queue request assigned"
        );

        Ok(AssignQueueResponse {
            success: true,
            appointment_id,
        })
    }

    async fn ensure_exists(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        table: &str,
        id: i64,
        label: &'static str,
    ) -> Result<(), AssignmentError> {
        let query = format!("SELECT id FROM {} WHERE id = $1", table);
        let found = sqlx::query_scalar::<_, i64>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        if found.is_none() {
            return Err(AssignmentError::EntityNotFound(label));
        }
        Ok(())
    }
}
