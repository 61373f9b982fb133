use std::collections::HashSet;

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{info, warn};

use shared_models::slots::{is_catalog_slot, normalize_slots};

use crate::error::AvailabilityError;
use crate::models::{
    BulkScheduleRequest, BulkScheduleResponse, CreateScheduleRequest, DentalUnit,
    SaveAvailabilityRequest, SaveAvailabilityResponse, Schedule, ScheduleStatus,
    ScheduleWithNames,
};

pub struct AvailabilityService<'a> {
    db: &'a PgPool,
}

impl<'a> AvailabilityService<'a> {
    pub fn new(db: &'a PgPool) -> Self {
        Self { db }
    }

    /// Replace the calling dentist's availability for (unit, date).
    ///
    /// Slots already taken in the unit are reported back as conflicts rather
    /// than failing the whole save; only when every requested slot conflicts
    /// does the call fail and leave the store untouched. The delete+insert
    /// pair runs in one transaction, and the unit-level unique constraint
    /// turns a concurrent save of the same slot into a rollback instead of a
    /// double booking.
    pub async fn replace_for_dentist(
        &self,
        dentist_id: i64,
        req: &SaveAvailabilityRequest,
    ) -> Result<SaveAvailabilityResponse, AvailabilityError> {
        let wanted = normalize_slots(&req.slots);
        if wanted.is_empty() {
            return Err(AvailabilityError::Validation(
                "No valid slots in request".to_string(),
            ));
        }

        // Taken = any other dentist's row in the unit, the caller's own
        // BOOKED rows, and slots with an active appointment.
        let taken: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT slot_label FROM schedules
            WHERE unit_id = $1 AND date = $2
              AND (dentist_id <> $3 OR status = 'BOOKED')
            UNION
            SELECT slot_label FROM appointments
            WHERE unit_id = $1 AND date = $2
              AND status IN ('confirmed', 'pending')
            "#,
        )
        .bind(req.unit_id)
        .bind(req.date)
        .bind(dentist_id)
        .fetch_all(self.db)
        .await?;

        let taken: HashSet<String> = taken.into_iter().collect();
        let (ok, conflicts) = partition_conflicts(&wanted, &taken);

        if ok.is_empty() {
            warn!(
                dentist_id,
                unit_id = req.unit_id,
                %req.date,
                "Availability save rejected, all slots conflict"
            );
            return Err(AvailabilityError::AllSlotsConflict { conflicts });
        }

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM schedules
            WHERE dentist_id = $1 AND unit_id = $2 AND date = $3
              AND status <> 'BOOKED'
            "#,
        )
        .bind(dentist_id)
        .bind(req.unit_id)
        .bind(req.date)
        .execute(&mut *tx)
        .await?;

        for slot in &ok {
            let inserted = sqlx::query(
                r#"
                INSERT INTO schedules (dentist_id, unit_id, date, slot_label, status)
                VALUES ($1, $2, $3, $4, 'FREE')
                "#,
            )
            .bind(dentist_id)
            .bind(req.unit_id)
            .bind(req.date)
            .bind(slot)
            .execute(&mut *tx)
            .await;

            if let Err(e) = inserted {
                // Another dentist committed the same (unit, date, slot)
                // between our conflict read and this insert.
                if is_unique_violation(&e) {
                    warn!(
                        dentist_id,
                        unit_id = req.unit_id,
                        slot,
                        "Availability save lost a race on a unit slot"
                    );
                    return Err(AvailabilityError::SlotRace {
                        conflicts: vec![slot.clone()],
                    });
                }
                return Err(e.into());
            }
        }

        tx.commit().await?;

        info!(
            dentist_id,
            unit_id = req.unit_id,
            %req.date,
            saved = ok.len(),
            conflicts = conflicts.len(),
            "Availability replaced"
        );

        Ok(SaveAvailabilityResponse {
            ok: true,
            saved: ok.len(),
            conflicts,
        })
    }

    pub async fn list_schedules(
        &self,
        date: Option<NaiveDate>,
        dentist_id: Option<i64>,
    ) -> Result<Vec<ScheduleWithNames>, AvailabilityError> {
        let rows = sqlx::query_as::<_, ScheduleWithNames>(
            r#"
            SELECT s.id, s.dentist_id,
                   d.first_name || ' ' || d.last_name AS dentist_name,
                   s.unit_id, u.unit_name,
                   s.date, s.slot_label, s.status
            FROM schedules s
            JOIN dentists d ON d.id = s.dentist_id
            JOIN dental_units u ON u.id = s.unit_id
            WHERE ($1::date IS NULL OR s.date = $1)
              AND ($2::bigint IS NULL OR s.dentist_id = $2)
            ORDER BY s.date, s.unit_id, s.slot_label
            "#,
        )
        .bind(date)
        .bind(dentist_id)
        .fetch_all(self.db)
        .await?;

        Ok(rows)
    }

    pub async fn create_schedule(
        &self,
        req: &CreateScheduleRequest,
    ) -> Result<Schedule, AvailabilityError> {
        if !is_catalog_slot(&req.slot_label) {
            return Err(AvailabilityError::Validation(format!(
                "Unknown slot label: {}",
                req.slot_label
            )));
        }
        let status = req.status.unwrap_or(ScheduleStatus::Free);
        if !status.is_manual() {
            return Err(AvailabilityError::Validation(
                "Schedules cannot be created as BOOKED".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (dentist_id, unit_id, date, slot_label, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(req.dentist_id)
        .bind(req.unit_id)
        .bind(req.date)
        .bind(&req.slot_label)
        .bind(status.as_str())
        .fetch_one(self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AvailabilityError::Conflict(format!(
                    "Unit already has slot {} on {}",
                    req.slot_label, req.date
                ))
            } else {
                e.into()
            }
        })?;

        Ok(row)
    }

    pub async fn update_schedule_status(
        &self,
        id: i64,
        status: ScheduleStatus,
    ) -> Result<Schedule, AvailabilityError> {
        if !status.is_manual() {
            return Err(AvailabilityError::Validation(
                "BOOKED is set by queue assignment, not by hand".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, Schedule>(
            r#"
            UPDATE schedules SET status = $1, updated_at = now()
            WHERE id = $2 AND status <> 'BOOKED'
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(self.db)
        .await?;

        match updated {
            Some(row) => Ok(row),
            None => {
                if self.schedule_exists(id).await? {
                    Err(AvailabilityError::Conflict(
                        "Booked schedules cannot be changed".to_string(),
                    ))
                } else {
                    Err(AvailabilityError::NotFound(format!("schedule {}", id)))
                }
            }
        }
    }

    pub async fn delete_schedule(&self, id: i64) -> Result<(), AvailabilityError> {
        let deleted = sqlx::query_scalar::<_, i64>(
            "DELETE FROM schedules WHERE id = $1 AND status <> 'BOOKED' RETURNING id",
        )
        .bind(id)
        .fetch_optional(self.db)
        .await?;

        match deleted {
            Some(_) => Ok(()),
            None => {
                if self.schedule_exists(id).await? {
                    Err(AvailabilityError::Conflict(
                        "Booked schedules cannot be deleted".to_string(),
                    ))
                } else {
                    Err(AvailabilityError::NotFound(format!("schedule {}", id)))
                }
            }
        }
    }

    /// Bulk insert with per-slot tolerance: each slot succeeds or fails on
    /// its own, and the response carries the aggregate counts.
    pub async fn bulk_create(
        &self,
        req: &BulkScheduleRequest,
    ) -> Result<BulkScheduleResponse, AvailabilityError> {
        let status = req.status.unwrap_or(ScheduleStatus::Free);
        if !status.is_manual() {
            return Err(AvailabilityError::Validation(
                "Schedules cannot be created as BOOKED".to_string(),
            ));
        }

        let mut success = 0;
        let mut errors = Vec::new();

        for slot in &req.slot_labels {
            if !is_catalog_slot(slot) {
                errors.push(format!("{}: unknown slot label", slot));
                continue;
            }

            let result = sqlx::query(
                r#"
                INSERT INTO schedules (dentist_id, unit_id, date, slot_label, status)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(req.dentist_id)
            .bind(req.unit_id)
            .bind(req.date)
            .bind(slot)
            .bind(status.as_str())
            .execute(self.db)
            .await;

            match result {
                Ok(_) => success += 1,
                Err(e) if is_unique_violation(&e) => {
                    errors.push(format!("{}: already scheduled for this unit", slot));
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            dentist_id = req.dentist_id,
            unit_id = req.unit_id,
            %req.date,
            success,
            failed = errors.len(),
            "Bulk schedule insert finished"
        );

        Ok(BulkScheduleResponse {
            success,
            failed: errors.len(),
            errors,
        })
    }

    pub async fn list_active_units(&self) -> Result<Vec<DentalUnit>, AvailabilityError> {
        let units = sqlx::query_as::<_, DentalUnit>(
            "SELECT id, unit_name, status FROM dental_units WHERE status = 'ACTIVE' ORDER BY id",
        )
        .fetch_all(self.db)
        .await?;
        Ok(units)
    }

    async fn schedule_exists(&self, id: i64) -> Result<bool, AvailabilityError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db)
            .await?;
        Ok(found.is_some())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Split the wanted slots into (ok, conflicts) against the taken set,
/// both halves in catalog order.
pub fn partition_conflicts(
    wanted: &[String],
    taken: &HashSet<String>,
) -> (Vec<String>, Vec<String>) {
    wanted
        .iter()
        .cloned()
        .partition(|slot| !taken.contains(slot))
}
