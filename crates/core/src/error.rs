use api_shared::{AppointmentStatus, Id};
use chrono::{DateTime, Utc};
use std::fmt;

/// Entity tables, used to name the target of a failed lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Patient,
    Midwife,
    Service,
    Appointment,
    MedicalRecord,
    Notification,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::User => "user",
            EntityKind::Patient => "patient",
            EntityKind::Midwife => "midwife",
            EntityKind::Service => "service",
            EntityKind::Appointment => "appointment",
            EntityKind::MedicalRecord => "medical record",
            EntityKind::Notification => "notification",
        })
    }
}

/// Coarse outcome class of a [`ClinicError`], used by the API layer to pick a response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Auth,
    Forbidden,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: Id },

    #[error("email address is already registered")]
    DuplicateEmail,
    #[error("license number is already registered")]
    DuplicateLicense,
    #[error("cannot change appointment status from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("midwife {midwife_id} already has an appointment at {at}")]
    MidwifeUnavailable { midwife_id: Id, at: DateTime<Utc> },
    #[error("appointment {appointment_id} does not belong to patient {patient_id}")]
    AppointmentPatientMismatch { appointment_id: Id, patient_id: Id },
    #[error("service {0} is not active")]
    ServiceInactive(Id),
    #[error("appointment date {0} is in the past")]
    AppointmentInPast(DateTime<Utc>),

    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is inactive")]
    InactiveAccount,
    #[error("session token is not recognised")]
    UnknownSession,
    #[error("session token has expired")]
    SessionExpired,
    #[error("patients may only access their own medical records")]
    ForeignMedicalRecords,

    #[error("stored password hash is malformed")]
    MalformedPasswordHash,
    #[error("store lock poisoned")]
    StorePoisoned,
    #[error("failed to read store snapshot: {0}")]
    SnapshotRead(std::io::Error),
    #[error("failed to write store snapshot: {0}")]
    SnapshotWrite(std::io::Error),
    #[error("failed to serialize store snapshot: {0}")]
    SnapshotSerialization(serde_json::Error),
    #[error("failed to deserialize store snapshot: {0}")]
    SnapshotDeserialization(serde_json::Error),
}

impl ClinicError {
    pub fn not_found(entity: EntityKind, id: Id) -> Self {
        ClinicError::NotFound { entity, id }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ClinicError::NotFound { .. } => ErrorCategory::NotFound,
            ClinicError::DuplicateEmail
            | ClinicError::DuplicateLicense
            | ClinicError::InvalidTransition { .. }
            | ClinicError::MidwifeUnavailable { .. }
            | ClinicError::AppointmentPatientMismatch { .. }
            | ClinicError::ServiceInactive(_)
            | ClinicError::AppointmentInPast(_) => ErrorCategory::Conflict,
            ClinicError::InvalidCredentials
            | ClinicError::InactiveAccount
            | ClinicError::UnknownSession
            | ClinicError::SessionExpired => ErrorCategory::Auth,
            ClinicError::ForeignMedicalRecords => ErrorCategory::Forbidden,
            ClinicError::InvalidInput(_)
            | ClinicError::MalformedPasswordHash
            | ClinicError::StorePoisoned
            | ClinicError::SnapshotRead(_)
            | ClinicError::SnapshotWrite(_)
            | ClinicError::SnapshotSerialization(_)
            | ClinicError::SnapshotDeserialization(_) => ErrorCategory::Internal,
        }
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_are_classified() {
        let err = ClinicError::InvalidTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Pending,
        };
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(
            err.to_string(),
            "cannot change appointment status from completed to pending"
        );
        assert_eq!(ClinicError::DuplicateEmail.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = ClinicError::not_found(EntityKind::MedicalRecord, 12);
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.to_string(), "medical record 12 not found");
    }

    #[test]
    fn login_failures_share_one_message() {
        assert_eq!(
            ClinicError::InvalidCredentials.to_string(),
            "invalid email or password"
        );
        assert_eq!(ClinicError::InvalidCredentials.category(), ErrorCategory::Auth);
    }
}
