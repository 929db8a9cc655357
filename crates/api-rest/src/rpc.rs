//! Procedure registry.
//!
//! Maps every procedure name to its kind and to a type-erased handler. A handler parses and
//! validates its contract, calls the matching core service, and serializes the result. The
//! registry is built once at startup and shared read-only behind an `Arc`.
//!
//! Only procedures registered with [`ProcedureRegistry::register_scoped`] see the caller; every
//! other procedure is invoked as [`Caller::Anonymous`] and never reads the `Authorization` header.

use crate::error::{RpcError, RpcErrorCode};
use api_shared::contracts::{
    ByIdInput, CreateAppointmentInput, CreateMedicalRecordInput, CreateNotificationInput,
    CreateServiceInput, GetAppointmentsByMidwifeInput, GetAppointmentsByPatientInput,
    GetMedicalRecordsByPatientInput, GetNotificationsByUserInput, GetServicesInput, LoginInput,
    MarkNotificationReadInput, NoInput, RegisterMidwifeInput, RegisterPatientInput,
    UpdateAppointmentStatusInput, UpdateServiceInput,
};
use api_shared::validation::parse_contract;
use api_shared::{HealthService, Validate};
use midwifery_core::{Caller, ClinicResult, ClinicServices};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Queries may be called with `GET`; mutations only with `POST`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

type Handler =
    Box<dyn Fn(&ClinicServices, &Caller, Value) -> Result<Value, RpcError> + Send + Sync>;

pub struct Procedure {
    name: &'static str,
    kind: ProcedureKind,
    scoped: bool,
    handler: Handler,
}

impl Procedure {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ProcedureKind {
        self.kind
    }

    /// Whether the result depends on who is calling.
    pub fn uses_caller(&self) -> bool {
        self.scoped
    }

    /// Validates `payload` and runs the procedure.
    pub fn invoke(
        &self,
        services: &ClinicServices,
        caller: &Caller,
        payload: Value,
    ) -> Result<Value, RpcError> {
        (self.handler)(services, caller, payload)
    }
}

pub struct ProcedureRegistry {
    procedures: BTreeMap<&'static str, Arc<Procedure>>,
}

impl ProcedureRegistry {
    /// Builds the registry with every clinic procedure.
    pub fn new() -> Self {
        use ProcedureKind::{Mutation, Query};

        let mut r = Self {
            procedures: BTreeMap::new(),
        };

        r.register("healthcheck", Query, |_, _: NoInput| {
            Ok(HealthService::check_health())
        });

        // Accounts
        r.register("login", Mutation, |s, input: LoginInput| {
            s.accounts.login(input)
        });
        r.register("registerPatient", Mutation, |s, input: RegisterPatientInput| {
            s.accounts.register_patient(input)
        });
        r.register("registerMidwife", Mutation, |s, input: RegisterMidwifeInput| {
            s.accounts.register_midwife(input)
        });

        // Directory
        r.register("getAllPatients", Query, |s, _: NoInput| {
            s.directory.all_patients()
        });
        r.register("getPatientById", Query, |s, input: ByIdInput| {
            s.directory.patient_by_id(input.id)
        });
        r.register("getAllMidwives", Query, |s, _: NoInput| {
            s.directory.all_midwives()
        });
        r.register("getMidwifeById", Query, |s, input: ByIdInput| {
            s.directory.midwife_by_id(input.id)
        });

        // Services
        r.register("getServices", Query, |s, input: GetServicesInput| {
            s.catalog.services(input.include_inactive)
        });
        r.register("createService", Mutation, |s, input: CreateServiceInput| {
            s.catalog.create(input)
        });
        r.register("updateService", Mutation, |s, input: UpdateServiceInput| {
            s.catalog.update(input)
        });

        // Appointments
        r.register(
            "createAppointment",
            Mutation,
            |s, input: CreateAppointmentInput| s.appointments.create(input),
        );
        r.register(
            "getAppointmentsByPatient",
            Query,
            |s, input: GetAppointmentsByPatientInput| s.appointments.by_patient(input.patient_id),
        );
        r.register(
            "getAppointmentsByMidwife",
            Query,
            |s, input: GetAppointmentsByMidwifeInput| s.appointments.by_midwife(input.midwife_id),
        );
        r.register(
            "updateAppointmentStatus",
            Mutation,
            |s, input: UpdateAppointmentStatusInput| s.appointments.update_status(input),
        );
        r.register("getAllAppointments", Query, |s, _: NoInput| {
            s.appointments.all()
        });

        // Medical records
        r.register(
            "createMedicalRecord",
            Mutation,
            |s, input: CreateMedicalRecordInput| s.medical_records.create(input),
        );
        r.register_scoped(
            "getMedicalRecordsByPatient",
            Query,
            |s, caller, input: GetMedicalRecordsByPatientInput| {
                s.medical_records.by_patient(caller, input.patient_id)
            },
        );
        r.register_scoped("getAllMedicalRecords", Query, |s, caller, _: NoInput| {
            s.medical_records.all(caller)
        });

        // Notifications
        r.register(
            "createNotification",
            Mutation,
            |s, input: CreateNotificationInput| s.notifications.create(input),
        );
        r.register(
            "getNotificationsByUser",
            Query,
            |s, input: GetNotificationsByUserInput| s.notifications.by_user(input.user_id),
        );
        r.register(
            "markNotificationAsRead",
            Mutation,
            |s, input: MarkNotificationReadInput| s.notifications.mark_read(input.id),
        );

        r
    }

    fn register<I, O, F>(&mut self, name: &'static str, kind: ProcedureKind, f: F)
    where
        I: DeserializeOwned + Validate + 'static,
        O: Serialize + 'static,
        F: Fn(&ClinicServices, I) -> ClinicResult<O> + Send + Sync + 'static,
    {
        self.insert::<I, O, _>(
            name,
            kind,
            false,
            move |services: &ClinicServices, _: &Caller, input: I| f(services, input),
        );
    }

    fn register_scoped<I, O, F>(&mut self, name: &'static str, kind: ProcedureKind, f: F)
    where
        I: DeserializeOwned + Validate + 'static,
        O: Serialize + 'static,
        F: Fn(&ClinicServices, &Caller, I) -> ClinicResult<O> + Send + Sync + 'static,
    {
        self.insert(name, kind, true, f);
    }

    fn insert<I, O, F>(&mut self, name: &'static str, kind: ProcedureKind, scoped: bool, f: F)
    where
        I: DeserializeOwned + Validate + 'static,
        O: Serialize + 'static,
        F: Fn(&ClinicServices, &Caller, I) -> ClinicResult<O> + Send + Sync + 'static,
    {
        let handler: Handler = Box::new(
            move |services: &ClinicServices, caller: &Caller, payload: Value| {
                let input: I = parse_contract(payload)?;
                let output = f(services, caller, input)?;
                serde_json::to_value(output).map_err(|e| {
                    tracing::error!("Serialize {} result error: {:?}", name, e);
                    RpcError::new(RpcErrorCode::InternalServerError, "Internal error")
                })
            },
        );

        self.procedures.insert(
            name,
            Arc::new(Procedure {
                name,
                kind,
                scoped,
                handler,
            }),
        );
    }

    pub fn get(&self, name: &str) -> Option<Arc<Procedure>> {
        self.procedures.get(name).cloned()
    }

    /// Registered procedure names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.procedures.keys().copied()
    }
}

impl Default for ProcedureRegistry {
    fn default() -> Self {
        Self::new()
    }
}
