use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of a schedule row. BOOKED rows are owned by the assignment
/// transaction and can never be written directly through the CRUD surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Free,
    Booked,
    Unavailable,
    Break,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Free => "FREE",
            ScheduleStatus::Booked => "BOOKED",
            ScheduleStatus::Unavailable => "UNAVAILABLE",
            ScheduleStatus::Break => "BREAK",
        }
    }

    /// Statuses staff may write by hand.
    pub fn is_manual(&self) -> bool {
        !matches!(self, ScheduleStatus::Booked)
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(ScheduleStatus::Free),
            "BOOKED" => Ok(ScheduleStatus::Booked),
            "UNAVAILABLE" => Ok(ScheduleStatus::Unavailable),
            "BREAK" => Ok(ScheduleStatus::Break),
            other => Err(format!("unknown schedule status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: i64,
    pub dentist_id: i64,
    pub unit_id: i64,
    pub date: NaiveDate,
    pub slot_label: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Schedule row joined with dentist and unit names for staff listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduleWithNames {
    pub id: i64,
    pub dentist_id: i64,
    pub dentist_name: String,
    pub unit_id: i64,
    pub unit_name: String,
    pub date: NaiveDate,
    pub slot_label: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DentalUnit {
    pub id: i64,
    pub unit_name: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveAvailabilityRequest {
    pub date: NaiveDate,
    pub unit_id: i64,
    pub slots: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveAvailabilityResponse {
    pub ok: bool,
    pub saved: usize,
    pub conflicts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<String>,
    pub saved: Vec<String>,
    pub booked: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub dentist_id: i64,
    pub unit_id: i64,
    pub date: NaiveDate,
    pub slot_label: String,
    pub status: Option<ScheduleStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleStatusRequest {
    pub status: ScheduleStatus,
}

#[derive(Debug, Deserialize)]
pub struct BulkScheduleRequest {
    pub dentist_id: i64,
    pub unit_id: i64,
    pub date: NaiveDate,
    pub slot_labels: Vec<String>,
    pub status: Option<ScheduleStatus>,
}

#[derive(Debug, Serialize)]
pub struct BulkScheduleResponse {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_status_round_trips_through_strings() {
        for status in [
            ScheduleStatus::Free,
            ScheduleStatus::Booked,
            ScheduleStatus::Unavailable,
            ScheduleStatus::Break,
        ] {
            assert_eq!(status.as_str().parse::<ScheduleStatus>().unwrap(), status);
        }
        assert!("booked".parse::<ScheduleStatus>().is_err());
    }

    #[test]
    fn booked_is_not_a_manual_status() {
        assert!(ScheduleStatus::Free.is_manual());
        assert!(ScheduleStatus::Break.is_manual());
        assert!(!ScheduleStatus::Booked.is_manual());
    }
}
