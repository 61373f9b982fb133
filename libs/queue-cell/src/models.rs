use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a patient appointment request. NEW is the only state the
/// assignment transaction consumes; SCHEDULED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    New,
    Scheduled,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::New => "NEW",
            RequestStatus::Scheduled => "SCHEDULED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(RequestStatus::New),
            "SCHEDULED" => Ok(RequestStatus::Scheduled),
            "CANCELLED" => Ok(RequestStatus::Cancelled),
            other => Err(format!("unknown request status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AppointmentRequest {
    pub id: i64,
    pub patient_id: i64,
    pub requested_date: NaiveDate,
    pub requested_time_slot: String,
    pub treatment: String,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub dentist_id: i64,
    pub unit_id: i64,
    pub date: NaiveDate,
    pub slot_label: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: String,
    pub notes: Option<String>,
    pub from_request_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// NEW request joined with the patient's name, for the staff queue view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueItem {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub requested_date: NaiveDate,
    pub requested_time_slot: String,
    pub treatment: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AppointmentWithNames {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub dentist_id: i64,
    pub dentist_name: String,
    pub unit_id: i64,
    pub unit_name: String,
    pub date: NaiveDate,
    pub slot_label: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FreeScheduleSlot {
    pub id: i64,
    pub dentist_id: i64,
    pub dentist_name: String,
    pub unit_id: i64,
    pub unit_name: String,
    pub date: NaiveDate,
    pub slot_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DentistSummary {
    pub id: i64,
    pub pre_name: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UnitSummary {
    pub id: i64,
    pub unit_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignQueueRequest {
    pub request_id: i64,
    pub patient_id: i64,
    pub dentist_id: i64,
    pub unit_id: i64,
    pub date: NaiveDate,
    pub slot: String,
    pub service_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignQueueResponse {
    pub success: bool,
    pub appointment_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestPayload {
    pub requested_date: NaiveDate,
    pub requested_time_slot: String,
    pub treatment: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityCheck {
    pub available: bool,
    pub reason: Option<String>,
}
