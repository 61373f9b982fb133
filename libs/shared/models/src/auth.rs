use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
    pub role: Option<String>,
    /// Row id in the patients table, present for patient sessions.
    pub patient_id: Option<i64>,
    /// Row id in the dentists table, present for dentist sessions.
    pub dentist_id: Option<i64>,
}

/// Authenticated user injected into request extensions by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub role: Option<String>,
    pub patient_id: Option<i64>,
    pub dentist_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}
