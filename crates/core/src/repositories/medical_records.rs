//! Medical records.
//!
//! Listings are most recent visit first. A patient caller only ever sees their own records.

use crate::error::EntityKind;
use crate::{Caller, ClinicError, ClinicResult, ClinicStore};
use api_shared::contracts::CreateMedicalRecordInput;
use api_shared::{Id, MedicalRecord};
use chrono::Utc;
use std::cmp::Reverse;
use std::sync::Arc;

#[derive(Clone)]
pub struct MedicalRecordService {
    store: Arc<ClinicStore>,
}

fn newest_first(mut list: Vec<MedicalRecord>) -> Vec<MedicalRecord> {
    list.sort_by_key(|r| Reverse((r.visit_date, r.id)));
    list
}

impl MedicalRecordService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// Records a visit. A linked appointment must belong to the same patient.
    pub fn create(&self, input: CreateMedicalRecordInput) -> ClinicResult<MedicalRecord> {
        let record = self.store.write(|t| {
            t.patient(input.patient_id)?;
            t.midwife(input.midwife_id)?;
            if let Some(appointment_id) = input.appointment_id {
                let appointment = t.appointment(appointment_id)?;
                if appointment.patient_id != input.patient_id {
                    return Err(ClinicError::AppointmentPatientMismatch {
                        appointment_id,
                        patient_id: input.patient_id,
                    });
                }
            }

            let now = Utc::now();
            let id = t.next_id(EntityKind::MedicalRecord);
            let record = MedicalRecord {
                id,
                patient_id: input.patient_id,
                midwife_id: input.midwife_id,
                appointment_id: input.appointment_id,
                visit_date: input.visit_date,
                chief_complaint: input.chief_complaint,
                examination_findings: input.examination_findings,
                diagnosis: input.diagnosis,
                treatment_plan: input.treatment_plan,
                medications: input.medications,
                follow_up_notes: input.follow_up_notes,
                created_at: now,
                updated_at: now,
            };
            t.medical_records.insert(id, record.clone());
            Ok(record)
        })?;

        tracing::info!(
            "Created medical record {} for patient {}",
            record.id,
            record.patient_id
        );
        Ok(record)
    }

    /// # Errors
    ///
    /// [`ClinicError::ForeignMedicalRecords`] when a patient asks for someone else's records.
    pub fn by_patient(&self, caller: &Caller, patient_id: Id) -> ClinicResult<Vec<MedicalRecord>> {
        if !caller.can_view_records_of(patient_id) {
            tracing::warn!(
                "User {:?} denied access to records of patient {}",
                caller.user_id(),
                patient_id
            );
            return Err(ClinicError::ForeignMedicalRecords);
        }

        let list = self.store.read(|t| -> ClinicResult<Vec<MedicalRecord>> {
            t.patient(patient_id)?;
            Ok(t.medical_records
                .values()
                .filter(|r| r.patient_id == patient_id)
                .cloned()
                .collect())
        })??;
        Ok(newest_first(list))
    }

    /// Every record the caller may see.
    pub fn all(&self, caller: &Caller) -> ClinicResult<Vec<MedicalRecord>> {
        let list = self.store.read(|t| {
            t.medical_records
                .values()
                .filter(|r| caller.can_view_records_of(r.patient_id))
                .cloned()
                .collect()
        })?;
        Ok(newest_first(list))
    }
}
