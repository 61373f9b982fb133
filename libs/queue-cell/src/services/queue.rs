use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;

use crate::error::AssignmentError;
use crate::models::{
    AppointmentWithNames, AvailabilityCheck, DentistSummary, FreeScheduleSlot, QueueItem,
    UnitSummary,
};

/// Staff-facing reads over the queue, the day's appointments and the free
/// schedule slots. Advisory only; the assignment transaction re-checks
/// everything under locks.
pub struct QueueService<'a> {
    db: &'a PgPool,
}

pub struct QueueData {
    pub queue_items: Vec<QueueItem>,
    pub appointments: Vec<AppointmentWithNames>,
    pub availability: Vec<FreeScheduleSlot>,
}

impl<'a> QueueService<'a> {
    pub fn new(db: &'a PgPool) -> Self {
        Self { db }
    }

    pub async fn queue_data(&self, date: NaiveDate) -> Result<QueueData, AssignmentError> {
        let queue_items = sqlx::query_as::<_, QueueItem>(
            r#"
            SELECT r.id, r.patient_id,
                   p.first_name || ' ' || p.last_name AS patient_name,
                   r.requested_date, r.requested_time_slot,
                   r.treatment, r.notes, r.created_at
            FROM appointment_requests r
            JOIN patients p ON p.id = r.patient_id
            WHERE r.requested_date = $1 AND r.status = 'NEW'
            ORDER BY r.created_at
            "#,
        )
        .bind(date)
        .fetch_all(self.db)
        .await?;

        let appointments = sqlx::query_as::<_, AppointmentWithNames>(
            r#"
            SELECT a.id, a.patient_id,
                   p.first_name || ' ' || p.last_name AS patient_name,
                   a.dentist_id,
                   d.first_name || ' ' || d.last_name AS dentist_name,
                   a.unit_id, u.unit_name,
                   a.date, a.slot_label, a.status
            FROM appointments a
            JOIN patients p ON p.id = a.patient_id
            JOIN dentists d ON d.id = a.dentist_id
            JOIN dental_units u ON u.id = a.unit_id
            WHERE a.date = $1 AND a.status IN ('confirmed', 'pending')
            ORDER BY a.slot_label, a.unit_id
            "#,
        )
        .bind(date)
        .fetch_all(self.db)
        .await?;

        let availability = sqlx::query_as::<_, FreeScheduleSlot>(
            r#"
            SELECT s.id, s.dentist_id,
                   d.first_name || ' ' || d.last_name AS dentist_name,
                   s.unit_id, u.unit_name,
                   s.date, s.slot_label
            FROM schedules s
            JOIN dentists d ON d.id = s.dentist_id
            JOIN dental_units u ON u.id = s.unit_id
            WHERE s.date = $1 AND s.status = 'FREE'
            ORDER BY s.slot_label, s.unit_id
            "#,
        )
        .bind(date)
        .fetch_all(self.db)
        .await?;

        debug!(
            %date,
            queue = queue_items.len(),
            appointments = appointments.len(),
            free_slots = availability.len(),
            "Queue data resolved"
        );

        Ok(QueueData {
            queue_items,
            appointments,
            availability,
        })
    }

    pub async fn master_data(
        &self,
    ) -> Result<(Vec<DentistSummary>, Vec<UnitSummary>), AssignmentError> {
        let dentists = sqlx::query_as::<_, DentistSummary>(
            "SELECT id, pre_name, first_name, last_name FROM dentists ORDER BY id",
        )
        .fetch_all(self.db)
        .await?;

        let units = sqlx::query_as::<_, UnitSummary>(
            "SELECT id, unit_name FROM dental_units WHERE status = 'ACTIVE' ORDER BY id",
        )
        .fetch_all(self.db)
        .await?;

        Ok((dentists, units))
    }

    /// Pre-check for the assignment form. The answer can go stale the moment
    /// it is returned; POST /assign-queue decides for real.
    pub async fn check_availability(
        &self,
        date: NaiveDate,
        dentist_id: i64,
        unit_id: i64,
        slot: &str,
    ) -> Result<AvailabilityCheck, AssignmentError> {
        let schedule_status = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status FROM schedules
            WHERE dentist_id = $1 AND unit_id = $2 AND date = $3 AND slot_label = $4
            "#,
        )
        .bind(dentist_id)
        .bind(unit_id)
        .bind(date)
        .bind(slot)
        .fetch_optional(self.db)
        .await?;

        match schedule_status.as_deref() {
            None => {
                return Ok(AvailabilityCheck {
                    available: false,
                    reason: Some("No schedule for this dentist and unit slot".to_string()),
                })
            }
            Some("FREE") => {}
            Some(status) => {
                return Ok(AvailabilityCheck {
                    available: false,
                    reason: Some(format!("Schedule slot is {}", status)),
                })
            }
        }

        let booked = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM appointments
            WHERE date = $1 AND unit_id = $2 AND slot_label = $3
              AND status IN ('confirmed', 'pending')
            "#,
        )
        .bind(date)
        .bind(unit_id)
        .bind(slot)
        .fetch_optional(self.db)
        .await?;

        if booked.is_some() {
            return Ok(AvailabilityCheck {
                available: false,
                reason: Some("An appointment already occupies this unit slot".to_string()),
            });
        }

        Ok(AvailabilityCheck {
            available: true,
            reason: None,
        })
    }
}
