//! Domain model records.
//!
//! Every entity is a fixed-shape record with snake_case field names. Identifiers are opaque
//! positive integers assigned by the store; `created_at`/`updated_at` are always system-assigned.
//! Nullable attributes serialize as `null` rather than being omitted, so a record round-trips
//! through JSON unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Entity identifier, unique per entity type.
pub type Id = i64;

// ============================================================================
// Closed enums
// ============================================================================

/// Role tagged on a user account. Immutable after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Patient,
    Midwife,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Patient => "patient",
            UserRole::Midwife => "midwife",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    AppointmentReminder,
    AppointmentConfirmed,
    AppointmentCancelled,
    General,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::AppointmentReminder => "appointment_reminder",
            NotificationType::AppointmentConfirmed => "appointment_confirmed",
            NotificationType::AppointmentCancelled => "appointment_cancelled",
            NotificationType::General => "general",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A login account.
///
/// `password_hash` is an opaque PBKDF2 string; the plain password never leaves the login and
/// registration handlers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Patient profile, linked 1:1 to a user of role `patient`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub id: Id,
    pub user_id: Id,
    pub full_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Midwife profile, linked 1:1 to a user of role `midwife`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Midwife {
    pub id: Id,
    pub user_id: Id,
    pub full_name: String,
    pub phone: Option<String>,
    /// Unique across all midwives.
    pub license_number: String,
    pub specialization: Option<String>,
    pub years_experience: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bookable clinic service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Service {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    /// Price with two decimal places.
    pub price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: Id,
    pub patient_id: Id,
    pub midwife_id: Id,
    pub service_id: Id,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Clinical documentation of one visit. `appointment_id` is empty for walk-in visits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MedicalRecord {
    pub id: Id,
    pub patient_id: Id,
    pub midwife_id: Id,
    pub appointment_id: Option<Id>,
    pub visit_date: DateTime<Utc>,
    pub chief_complaint: Option<String>,
    pub examination_findings: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
    pub medications: Option<String>,
    pub follow_up_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted message for a user. `is_read` only ever moves from false to true.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Id,
    pub user_id: Id,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Composite results
// ============================================================================

/// Result of `login` and `registerPatient`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthRes {
    pub user: User,
    /// Opaque session credential; send back as `Authorization: Bearer <token>`.
    pub token: String,
}

/// Result of `registerMidwife`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MidwifeRegistrationRes {
    pub user: User,
    pub midwife: Midwife,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn appointment_round_trips_with_null_notes() {
        let appointment = Appointment {
            id: 7,
            patient_id: 1,
            midwife_id: 2,
            service_id: 3,
            appointment_date: at(10),
            status: AppointmentStatus::Confirmed,
            notes: None,
            created_at: at(8),
            updated_at: at(9),
        };

        let json = serde_json::to_value(&appointment).expect("serialize");
        assert_eq!(json["status"], "confirmed");
        assert!(json["notes"].is_null(), "notes should serialize as null");
        assert!(json.as_object().unwrap().contains_key("notes"));

        let back: Appointment = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, appointment);
    }

    #[test]
    fn notification_type_uses_type_key() {
        let notification = Notification {
            id: 1,
            user_id: 4,
            notification_type: NotificationType::AppointmentCancelled,
            title: "Cancelled".into(),
            message: "Your appointment was cancelled".into(),
            is_read: false,
            created_at: at(10),
        };

        let json = serde_json::to_value(&notification).expect("serialize");
        assert_eq!(json["type"], "appointment_cancelled");

        let back: Notification = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, notification);
    }

    #[test]
    fn enum_tokens_match_display() {
        for status in AppointmentStatus::ALL {
            let json = serde_json::to_value(status).expect("serialize");
            assert_eq!(json, status.to_string());
        }
        assert_eq!(serde_json::to_value(UserRole::Midwife).unwrap(), "midwife");
        assert_eq!(
            serde_json::to_value(NotificationType::AppointmentReminder).unwrap(),
            "appointment_reminder"
        );
    }

    #[test]
    fn unknown_status_token_is_rejected() {
        let err = serde_json::from_str::<AppointmentStatus>("\"rescheduled\"")
            .expect_err("should reject");
        assert!(err.to_string().contains("unknown variant"));
    }
}
