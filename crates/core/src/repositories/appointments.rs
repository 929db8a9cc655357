//! Appointment booking and status changes.
//!
//! A midwife cannot hold two live appointments at the same instant. "Live" means any status other
//! than `cancelled`, so cancelling an appointment frees its slot. The availability check and the
//! insert run in the same store transaction.

use crate::error::EntityKind;
use crate::lifecycle::ensure_transition;
use crate::repositories::notifications::push;
use crate::store::Tables;
use crate::{ClinicError, ClinicResult, ClinicStore, CoreConfig};
use api_shared::contracts::{CreateAppointmentInput, UpdateAppointmentStatusInput};
use api_shared::{Appointment, AppointmentStatus, Id, NotificationType};
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppointmentService {
    cfg: Arc<CoreConfig>,
    store: Arc<ClinicStore>,
}

fn display_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Notification sent to the patient when an appointment enters `status`.
fn status_notification(status: AppointmentStatus) -> Option<(NotificationType, &'static str)> {
    match status {
        AppointmentStatus::Pending => None,
        AppointmentStatus::Confirmed => Some((
            NotificationType::AppointmentConfirmed,
            "Appointment confirmed",
        )),
        AppointmentStatus::Cancelled => Some((
            NotificationType::AppointmentCancelled,
            "Appointment cancelled",
        )),
        AppointmentStatus::Completed => Some((NotificationType::General, "Appointment completed")),
    }
}

fn sorted(mut list: Vec<Appointment>) -> Vec<Appointment> {
    list.sort_by_key(|a| (a.appointment_date, a.id));
    list
}

fn listing(t: &Tables, keep: impl Fn(&Appointment) -> bool) -> Vec<Appointment> {
    sorted(t.appointments.values().filter(|a| keep(a)).cloned().collect())
}

impl AppointmentService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<ClinicStore>) -> Self {
        Self { cfg, store }
    }

    /// Books a `pending` appointment and notifies both the patient and the midwife.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::NotFound`] if the patient, midwife or service does not exist.
    /// - [`ClinicError::ServiceInactive`] if the service has been switched off.
    /// - [`ClinicError::AppointmentInPast`] if past bookings are disabled and the date has passed.
    /// - [`ClinicError::MidwifeUnavailable`] if the midwife is already booked at that time.
    pub fn create(&self, input: CreateAppointmentInput) -> ClinicResult<Appointment> {
        let reject_past = self.cfg.reject_past_bookings();

        let appointment = self.store.write(|t| {
            let now = Utc::now();
            let patient = t.patient(input.patient_id)?.clone();
            let midwife = t.midwife(input.midwife_id)?.clone();
            let service = t.service(input.service_id)?.clone();

            if !service.is_active {
                return Err(ClinicError::ServiceInactive(service.id));
            }
            if reject_past && input.appointment_date < now {
                return Err(ClinicError::AppointmentInPast(input.appointment_date));
            }
            if t.appointments.values().any(|a| {
                a.midwife_id == midwife.id
                    && a.appointment_date == input.appointment_date
                    && a.status != AppointmentStatus::Cancelled
            }) {
                tracing::warn!(
                    "Midwife {} is already booked at {}",
                    midwife.id,
                    input.appointment_date
                );
                return Err(ClinicError::MidwifeUnavailable {
                    midwife_id: midwife.id,
                    at: input.appointment_date,
                });
            }

            let id = t.next_id(EntityKind::Appointment);
            let appointment = Appointment {
                id,
                patient_id: patient.id,
                midwife_id: midwife.id,
                service_id: service.id,
                appointment_date: input.appointment_date,
                status: AppointmentStatus::Pending,
                notes: input.notes,
                created_at: now,
                updated_at: now,
            };
            t.appointments.insert(id, appointment.clone());

            let when = display_date(appointment.appointment_date);
            push(
                t,
                patient.user_id,
                NotificationType::General,
                "Appointment requested",
                format!(
                    "Your request for {} on {when} has been received and is awaiting confirmation.",
                    service.name
                ),
                now,
            );
            push(
                t,
                midwife.user_id,
                NotificationType::General,
                "New appointment request",
                format!(
                    "{} requested {} on {when}.",
                    patient.full_name, service.name
                ),
                now,
            );

            Ok(appointment)
        })?;

        tracing::info!(
            "Created appointment {} for patient {} with midwife {}",
            appointment.id,
            appointment.patient_id,
            appointment.midwife_id
        );
        Ok(appointment)
    }

    /// Moves an appointment along its lifecycle and notifies the patient.
    pub fn update_status(&self, input: UpdateAppointmentStatusInput) -> ClinicResult<Appointment> {
        let appointment = self.store.write(|t| {
            let now = Utc::now();
            let mut appointment = t.appointment(input.id)?.clone();

            if let Err(e) = ensure_transition(appointment.status, input.status) {
                tracing::warn!("Appointment {}: {}", appointment.id, e);
                return Err(e);
            }
            let patient_user = t.patient(appointment.patient_id)?.user_id;

            appointment.status = input.status;
            input.notes.apply_to(&mut appointment.notes);
            appointment.updated_at = now;
            t.appointments.insert(appointment.id, appointment.clone());

            if let Some((kind, title)) = status_notification(appointment.status) {
                push(
                    t,
                    patient_user,
                    kind,
                    title,
                    format!(
                        "Your appointment on {} is now {}.",
                        display_date(appointment.appointment_date),
                        appointment.status
                    ),
                    now,
                );
            }

            Ok(appointment)
        })?;

        tracing::info!(
            "Appointment {} is now {}",
            appointment.id,
            appointment.status
        );
        Ok(appointment)
    }

    pub fn by_patient(&self, patient_id: Id) -> ClinicResult<Vec<Appointment>> {
        self.store.read(|t| -> ClinicResult<Vec<Appointment>> {
            t.patient(patient_id)?;
            Ok(listing(t, |a| a.patient_id == patient_id))
        })?
    }

    pub fn by_midwife(&self, midwife_id: Id) -> ClinicResult<Vec<Appointment>> {
        self.store.read(|t| -> ClinicResult<Vec<Appointment>> {
            t.midwife(midwife_id)?;
            Ok(listing(t, |a| a.midwife_id == midwife_id))
        })?
    }

    pub fn all(&self) -> ClinicResult<Vec<Appointment>> {
        self.store.read(|t| listing(t, |_| true))
    }
}
