//! Per-procedure input contracts.
//!
//! Each struct is the accepted shape of one procedure's payload; its [`Validate`] impl holds the
//! field constraints. Contracts are decoupled from the entity records in [`crate::model`]: they
//! carry plain client input, never ids or timestamps the system assigns.
//!
//! Nullable fields on create contracts may be sent as `null` or omitted. Update contracts use
//! [`Patch`] so that omission and `null` stay distinct.

use crate::model::{AppointmentStatus, Id, NotificationType};
use crate::validation::{Validate, Validator};
use chrono::{DateTime, Utc};
use midwifery_types::{timestamp, Patch};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Minimum password length accepted on login and registration.
pub const PASSWORD_MIN_LEN: usize = 6;

// ============================================================================
// Generic inputs
// ============================================================================

/// Payload of procedures that take no input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NoInput {}

impl Validate for NoInput {
    fn validate(&self, _v: &mut Validator) {}
}

/// Payload addressing a single entity by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ByIdInput {
    pub id: Id,
}

impl Validate for ByIdInput {
    fn validate(&self, v: &mut Validator) {
        v.id("id", self.id);
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl Validate for LoginInput {
    fn validate(&self, v: &mut Validator) {
        v.email("email", &self.email);
        v.min_chars("password", &self.password, PASSWORD_MIN_LEN);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegisterPatientInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub date_of_birth: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
}

impl Validate for RegisterPatientInput {
    fn validate(&self, v: &mut Validator) {
        v.email("email", &self.email);
        v.min_chars("password", &self.password, PASSWORD_MIN_LEN);
        v.text("full_name", &self.full_name);
    }
}

/// Registers a midwife account together with its profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegisterMidwifeInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub license_number: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub years_experience: Option<i64>,
}

impl Validate for RegisterMidwifeInput {
    fn validate(&self, v: &mut Validator) {
        v.email("email", &self.email);
        v.min_chars("password", &self.password, PASSWORD_MIN_LEN);
        v.text("full_name", &self.full_name);
        v.text("license_number", &self.license_number);
        if let Some(years) = self.years_experience {
            v.positive_int("years_experience", years);
        }
    }
}

// ============================================================================
// Services
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GetServicesInput {
    /// Include services that have been switched off. Defaults to `false`.
    #[serde(default)]
    pub include_inactive: bool,
}

impl Validate for GetServicesInput {
    fn validate(&self, _v: &mut Validator) {}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub price: f64,
}

impl Validate for CreateServiceInput {
    fn validate(&self, v: &mut Validator) {
        v.text("name", &self.name);
        v.positive_int("duration_minutes", self.duration_minutes);
        v.price("price", self.price);
    }
}

/// Partial service update: absent fields are left unchanged, `description: null` clears it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateServiceInput {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    #[schema(value_type = Option<String>)]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    #[schema(value_type = Option<i64>)]
    pub duration_minutes: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    #[schema(value_type = Option<f64>)]
    pub price: Patch<f64>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    #[schema(value_type = Option<bool>)]
    pub is_active: Patch<bool>,
}

impl UpdateServiceInput {
    /// An update that changes nothing but the timestamp.
    pub fn empty(id: Id) -> Self {
        Self {
            id,
            name: Patch::Unset,
            description: Patch::Unset,
            duration_minutes: Patch::Unset,
            price: Patch::Unset,
            is_active: Patch::Unset,
        }
    }
}

impl Validate for UpdateServiceInput {
    fn validate(&self, v: &mut Validator) {
        v.id("id", self.id);

        v.not_null("name", &self.name);
        if let Some(name) = self.name.value() {
            v.text("name", name);
        }

        v.not_null("duration_minutes", &self.duration_minutes);
        if let Some(duration) = self.duration_minutes.value() {
            v.positive_int("duration_minutes", *duration);
        }

        v.not_null("price", &self.price);
        if let Some(price) = self.price.value() {
            v.price("price", *price);
        }

        v.not_null("is_active", &self.is_active);
    }
}

// ============================================================================
// Appointments
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateAppointmentInput {
    pub patient_id: Id,
    pub midwife_id: Id,
    pub service_id: Id,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub appointment_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for CreateAppointmentInput {
    fn validate(&self, v: &mut Validator) {
        v.id("patient_id", self.patient_id);
        v.id("midwife_id", self.midwife_id);
        v.id("service_id", self.service_id);
    }
}

/// Moves an appointment to `status`. `notes` follows patch semantics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateAppointmentStatusInput {
    pub id: Id,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    #[schema(value_type = Option<String>)]
    pub notes: Patch<String>,
}

impl Validate for UpdateAppointmentStatusInput {
    fn validate(&self, v: &mut Validator) {
        v.id("id", self.id);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GetAppointmentsByPatientInput {
    pub patient_id: Id,
}

impl Validate for GetAppointmentsByPatientInput {
    fn validate(&self, v: &mut Validator) {
        v.id("patient_id", self.patient_id);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GetAppointmentsByMidwifeInput {
    pub midwife_id: Id,
}

impl Validate for GetAppointmentsByMidwifeInput {
    fn validate(&self, v: &mut Validator) {
        v.id("midwife_id", self.midwife_id);
    }
}

// ============================================================================
// Medical records
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateMedicalRecordInput {
    pub patient_id: Id,
    pub midwife_id: Id,
    #[serde(default)]
    pub appointment_id: Option<Id>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub visit_date: DateTime<Utc>,
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub examination_findings: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub treatment_plan: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub follow_up_notes: Option<String>,
}

impl Validate for CreateMedicalRecordInput {
    fn validate(&self, v: &mut Validator) {
        v.id("patient_id", self.patient_id);
        v.id("midwife_id", self.midwife_id);
        if let Some(appointment_id) = self.appointment_id {
            v.id("appointment_id", appointment_id);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GetMedicalRecordsByPatientInput {
    pub patient_id: Id,
}

impl Validate for GetMedicalRecordsByPatientInput {
    fn validate(&self, v: &mut Validator) {
        v.id("patient_id", self.patient_id);
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateNotificationInput {
    pub user_id: Id,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
}

impl Validate for CreateNotificationInput {
    fn validate(&self, v: &mut Validator) {
        v.id("user_id", self.user_id);
        v.text("title", &self.title);
        v.text("message", &self.message);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MarkNotificationReadInput {
    pub id: Id,
}

impl Validate for MarkNotificationReadInput {
    fn validate(&self, v: &mut Validator) {
        v.id("id", self.id);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GetNotificationsByUserInput {
    pub user_id: Id,
}

impl Validate for GetNotificationsByUserInput {
    fn validate(&self, v: &mut Validator) {
        v.id("user_id", self.user_id);
    }
}
