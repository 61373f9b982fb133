use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;

use shared_models::slots::SLOT_LABELS;

use crate::error::AvailabilityError;
use crate::models::{CandidatesResponse, Schedule};

/// Read-side resolver. Everything here is recomputed from the database on
/// every call; there is no cached view to go stale.
pub struct CandidateService<'a> {
    db: &'a PgPool,
}

impl<'a> CandidateService<'a> {
    pub fn new(db: &'a PgPool) -> Self {
        Self { db }
    }

    /// Slot labels with a confirmed or pending appointment for the scope.
    pub async fn booked_slots(
        &self,
        date: NaiveDate,
        unit_id: i64,
        dentist_id: Option<i64>,
    ) -> Result<Vec<String>, AvailabilityError> {
        let slots = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slot_label FROM appointments
            WHERE date = $1 AND unit_id = $2
              AND status IN ('confirmed', 'pending')
              AND ($3::bigint IS NULL OR dentist_id = $3)
            "#,
        )
        .bind(date)
        .bind(unit_id)
        .bind(dentist_id)
        .fetch_all(self.db)
        .await?;

        Ok(slots)
    }

    /// Slot labels any dentist already holds in the unit on that date.
    /// Room-level on purpose: a unit chair can only be used once per slot,
    /// so another dentist's row makes the slot a non-candidate for everyone.
    pub async fn saved_slots(
        &self,
        date: NaiveDate,
        unit_id: i64,
    ) -> Result<Vec<String>, AvailabilityError> {
        let slots = sqlx::query_scalar::<_, String>(
            "SELECT slot_label FROM schedules WHERE date = $1 AND unit_id = $2",
        )
        .bind(date)
        .bind(unit_id)
        .fetch_all(self.db)
        .await?;

        Ok(slots)
    }

    pub async fn candidates(
        &self,
        date: NaiveDate,
        unit_id: i64,
    ) -> Result<CandidatesResponse, AvailabilityError> {
        let saved = self.saved_slots(date, unit_id).await?;
        let booked = self.booked_slots(date, unit_id, None).await?;
        let candidates = subtract_slots(&saved, &booked);

        debug!(
            %date, unit_id,
            candidates = candidates.len(),
            "Resolved candidate slots"
        );

        Ok(CandidatesResponse {
            candidates,
            saved,
            booked,
        })
    }

    /// The calling dentist's own schedule rows, optionally narrowed to one
    /// unit and to FREE rows with no overlapping appointment.
    pub async fn dentist_schedules(
        &self,
        dentist_id: i64,
        date: NaiveDate,
        unit_id: Option<i64>,
        only_free: bool,
    ) -> Result<Vec<Schedule>, AvailabilityError> {
        let rows = if only_free {
            sqlx::query_as::<_, Schedule>(
                r#"
                SELECT s.* FROM schedules s
                WHERE s.dentist_id = $1 AND s.date = $2
                  AND ($3::bigint IS NULL OR s.unit_id = $3)
                  AND s.status = 'FREE'
                  AND NOT EXISTS (
                      SELECT 1 FROM appointments a
                      WHERE a.date = s.date AND a.unit_id = s.unit_id
                        AND a.slot_label = s.slot_label
                        AND a.status IN ('confirmed', 'pending')
                  )
                ORDER BY s.slot_label
                "#,
            )
        } else {
            sqlx::query_as::<_, Schedule>(
                r#"
                SELECT s.* FROM schedules s
                WHERE s.dentist_id = $1 AND s.date = $2
                  AND ($3::bigint IS NULL OR s.unit_id = $3)
                ORDER BY s.slot_label
                "#,
            )
        };

        let rows = rows
            .bind(dentist_id)
            .bind(date)
            .bind(unit_id)
            .fetch_all(self.db)
            .await?;

        Ok(rows)
    }
}

/// Catalog minus saved minus booked, in catalog order.
pub fn subtract_slots(saved: &[String], booked: &[String]) -> Vec<String> {
    SLOT_LABELS
        .iter()
        .filter(|label| {
            !saved.iter().any(|s| s == *label) && !booked.iter().any(|b| b == *label)
        })
        .map(|label| (*label).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn full_catalog_when_nothing_saved_or_booked() {
        let candidates = subtract_slots(&[], &[]);
        assert_eq!(candidates.len(), SLOT_LABELS.len());
        assert_eq!(candidates[0], "10:00-11:00");
    }

    #[test]
    fn saved_and_booked_are_both_removed() {
        let candidates = subtract_slots(
            &labels(&["10:00-11:00", "11:00-12:00"]),
            &labels(&["13:00-14:00"]),
        );
        assert!(!candidates.contains(&"10:00-11:00".to_string()));
        assert!(!candidates.contains(&"11:00-12:00".to_string()));
        assert!(!candidates.contains(&"13:00-14:00".to_string()));
        assert_eq!(candidates.len(), 5);
    }

    #[test]
    fn unknown_labels_in_inputs_are_harmless() {
        let candidates = subtract_slots(&labels(&["09:00-10:00"]), &[]);
        assert_eq!(candidates.len(), SLOT_LABELS.len());
    }

    #[test]
    fn result_keeps_catalog_order() {
        let candidates = subtract_slots(&labels(&["10:00-11:00"]), &labels(&["12:00-13:00"]));
        let mut sorted = candidates.clone();
        sorted.sort();
        assert_eq!(candidates, sorted);
    }
}
