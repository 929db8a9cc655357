//! In-process clinic store.
//!
//! All entity tables live behind a single [`RwLock`]. Reads share the lock; every mutation runs
//! inside [`ClinicStore::write`], which stages the change on a copy of the tables, persists the
//! copy when a snapshot file is configured, and only then publishes it. A closure that returns an
//! error therefore leaves no trace, and check-then-insert sequences (unique emails, midwife
//! availability) are atomic with respect to concurrent requests.
//!
//! Staging clones every table and the snapshot is written while the write lock is held, so a
//! write costs time proportional to the whole store. Callers on an async runtime run store work
//! on the blocking pool.
//!
//! The snapshot is one JSON document, rewritten through a temporary file and a rename so that a
//! crash mid-write never leaves a truncated store behind.

use crate::constants::SNAPSHOT_TMP_SUFFIX;
use crate::error::EntityKind;
use crate::{ClinicError, ClinicResult, CoreConfig};
use api_shared::{Appointment, Id, MedicalRecord, Midwife, Notification, Patient, Service, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// An issued session, keyed in [`Tables::sessions`] by the token digest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Id,
    pub created_at: DateTime<Utc>,
}

/// Last identifier handed out per table. Identifiers are never reused.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sequences {
    users: Id,
    patients: Id,
    midwives: Id,
    services: Id,
    appointments: Id,
    medical_records: Id,
    notifications: Id,
}

impl Sequences {
    fn next(&mut self, kind: EntityKind) -> Id {
        let slot = match kind {
            EntityKind::User => &mut self.users,
            EntityKind::Patient => &mut self.patients,
            EntityKind::Midwife => &mut self.midwives,
            EntityKind::Service => &mut self.services,
            EntityKind::Appointment => &mut self.appointments,
            EntityKind::MedicalRecord => &mut self.medical_records,
            EntityKind::Notification => &mut self.notifications,
        };
        *slot += 1;
        *slot
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub users: BTreeMap<Id, User>,
    pub patients: BTreeMap<Id, Patient>,
    pub midwives: BTreeMap<Id, Midwife>,
    pub services: BTreeMap<Id, Service>,
    pub appointments: BTreeMap<Id, Appointment>,
    pub medical_records: BTreeMap<Id, MedicalRecord>,
    pub notifications: BTreeMap<Id, Notification>,
    pub sessions: BTreeMap<String, Session>,
    sequences: Sequences,
}

impl Tables {
    pub fn next_id(&mut self, kind: EntityKind) -> Id {
        self.sequences.next(kind)
    }

    pub fn user(&self, id: Id) -> ClinicResult<&User> {
        self.users
            .get(&id)
            .ok_or_else(|| ClinicError::not_found(EntityKind::User, id))
    }

    pub fn patient(&self, id: Id) -> ClinicResult<&Patient> {
        self.patients
            .get(&id)
            .ok_or_else(|| ClinicError::not_found(EntityKind::Patient, id))
    }

    pub fn midwife(&self, id: Id) -> ClinicResult<&Midwife> {
        self.midwives
            .get(&id)
            .ok_or_else(|| ClinicError::not_found(EntityKind::Midwife, id))
    }

    pub fn service(&self, id: Id) -> ClinicResult<&Service> {
        self.services
            .get(&id)
            .ok_or_else(|| ClinicError::not_found(EntityKind::Service, id))
    }

    pub fn appointment(&self, id: Id) -> ClinicResult<&Appointment> {
        self.appointments
            .get(&id)
            .ok_or_else(|| ClinicError::not_found(EntityKind::Appointment, id))
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email == email)
    }

    pub fn patient_by_user(&self, user_id: Id) -> Option<&Patient> {
        self.patients.values().find(|p| p.user_id == user_id)
    }
}

pub struct ClinicStore {
    tables: RwLock<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl ClinicStore {
    /// An empty store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            snapshot_path: None,
        }
    }

    /// Open a snapshot-backed store, loading `path` when it exists.
    pub fn open(path: impl Into<PathBuf>) -> ClinicResult<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let bytes = std::fs::read(&path).map_err(ClinicError::SnapshotRead)?;
            serde_json::from_slice(&bytes).map_err(ClinicError::SnapshotDeserialization)?
        } else {
            Tables::default()
        };

        tracing::info!(
            "Opened clinic store at {} ({} users)",
            path.display(),
            tables.users.len()
        );

        Ok(Self {
            tables: RwLock::new(tables),
            snapshot_path: Some(path),
        })
    }

    pub fn from_config(cfg: &CoreConfig) -> ClinicResult<Self> {
        match cfg.snapshot_path() {
            Some(path) => Self::open(path),
            None => Ok(Self::in_memory()),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> ClinicResult<R> {
        let guard = self.tables.read().map_err(|_| ClinicError::StorePoisoned)?;
        Ok(f(&guard))
    }

    /// Run `f` against a staged copy of the tables and publish it only if `f` succeeds and the
    /// snapshot (if any) was written.
    pub fn write<R>(&self, f: impl FnOnce(&mut Tables) -> ClinicResult<R>) -> ClinicResult<R> {
        let mut guard = self.tables.write().map_err(|_| ClinicError::StorePoisoned)?;
        let mut staged = guard.clone();
        let out = f(&mut staged)?;

        if let Some(path) = &self.snapshot_path {
            persist(path, &staged)?;
        }

        *guard = staged;
        Ok(out)
    }
}

fn persist(path: &Path, tables: &Tables) -> ClinicResult<()> {
    let bytes = serde_json::to_vec_pretty(tables).map_err(ClinicError::SnapshotSerialization)?;
    let tmp = path.with_extension(SNAPSHOT_TMP_SUFFIX);

    std::fs::write(&tmp, bytes).map_err(ClinicError::SnapshotWrite)?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        ClinicError::SnapshotWrite(e)
    })
}
