//! # Midwifery Core
//!
//! Business logic for the midwifery clinic:
//! - account registration, login and session resolution
//! - service catalog, appointment booking and the appointment status lifecycle
//! - medical records and user notifications
//! - the in-process store those operations run against
//!
//! **No API concerns**: input contracts and validation live in `api-shared`; HTTP transport and
//! the procedure registry live in `api-rest`.

pub mod caller;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod lifecycle;
pub mod repositories;
pub mod store;

pub use caller::Caller;
pub use config::{AdminSeed, CoreConfig};
pub use error::{ClinicError, ClinicResult, EntityKind, ErrorCategory};
pub use store::ClinicStore;

use repositories::accounts::AccountService;
use repositories::appointments::AppointmentService;
use repositories::catalog::CatalogService;
use repositories::directory::DirectoryService;
use repositories::medical_records::MedicalRecordService;
use repositories::notifications::NotificationService;
use std::sync::Arc;

/// Every operation service, wired to one configuration and one store.
#[derive(Clone)]
pub struct ClinicServices {
    pub accounts: AccountService,
    pub directory: DirectoryService,
    pub catalog: CatalogService,
    pub appointments: AppointmentService,
    pub medical_records: MedicalRecordService,
    pub notifications: NotificationService,
}

impl ClinicServices {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<ClinicStore>) -> Self {
        Self {
            accounts: AccountService::new(cfg.clone(), store.clone()),
            directory: DirectoryService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            appointments: AppointmentService::new(cfg, store.clone()),
            medical_records: MedicalRecordService::new(store.clone()),
            notifications: NotificationService::new(store),
        }
    }

    /// Opens the store described by `cfg` and seeds the admin account if one is configured.
    pub fn open(cfg: Arc<CoreConfig>) -> ClinicResult<Self> {
        let store = Arc::new(ClinicStore::from_config(&cfg)?);
        let services = Self::new(cfg, store);
        services.accounts.seed_admin()?;
        Ok(services)
    }
}
