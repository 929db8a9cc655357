//! Read access to patient and midwife profiles.

use crate::{ClinicResult, ClinicStore};
use api_shared::{Id, Midwife, Patient};
use std::sync::Arc;

#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<ClinicStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// All patient profiles ordered by id.
    pub fn all_patients(&self) -> ClinicResult<Vec<Patient>> {
        self.store.read(|t| t.patients.values().cloned().collect())
    }

    pub fn patient_by_id(&self, id: Id) -> ClinicResult<Patient> {
        self.store.read(|t| t.patient(id).cloned())?
    }

    /// All midwife profiles ordered by id.
    pub fn all_midwives(&self) -> ClinicResult<Vec<Midwife>> {
        self.store.read(|t| t.midwives.values().cloned().collect())
    }

    pub fn midwife_by_id(&self, id: Id) -> ClinicResult<Midwife> {
        self.store.read(|t| t.midwife(id).cloned())?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::accounts::AccountService;
    use crate::repositories::test_support::fixtures;
    use crate::ClinicError;
    use api_shared::contracts::RegisterPatientInput;

    #[test]
    fn test_lookup_patients_by_id() {
        let (cfg, store) = fixtures();
        let accounts = AccountService::new(cfg, store.clone());
        let directory = DirectoryService::new(store);

        for (email, name) in [("a@clinic.example", "Ann"), ("b@clinic.example", "Bea")] {
            accounts
                .register_patient(RegisterPatientInput {
                    email: email.into(),
                    password: "secret1".into(),
                    full_name: name.into(),
                    phone: None,
                    date_of_birth: None,
                    address: Some("1 High Street".into()),
                    emergency_contact: None,
                })
                .expect("register should succeed");
        }

        let all = directory.all_patients().expect("list should succeed");
        assert_eq!(
            all.iter().map(|p| p.full_name.as_str()).collect::<Vec<_>>(),
            vec!["Ann", "Bea"]
        );

        let bea = directory.patient_by_id(all[1].id).expect("lookup should succeed");
        assert_eq!(bea.address.as_deref(), Some("1 High Street"));

        assert!(matches!(
            directory.patient_by_id(99),
            Err(ClinicError::NotFound { .. })
        ));
        assert!(matches!(
            directory.midwife_by_id(1),
            Err(ClinicError::NotFound { .. })
        ));
        assert!(directory.all_midwives().expect("list").is_empty());
    }
}
