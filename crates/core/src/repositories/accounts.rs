//! Accounts: registration, login and session resolution.
//!
//! E-mail addresses are stored lower-cased, so uniqueness and login are case-insensitive. Password
//! hashing happens outside the store lock; only the uniqueness check and the inserts run inside
//! the write transaction.
//!
//! Sessions expire after the configured lifetime. Issuing a session prunes expired ones and keeps
//! at most [`MAX_SESSIONS_PER_USER`] per user, dropping the oldest first.

use crate::constants::MAX_SESSIONS_PER_USER;
use crate::credentials::{generate_token, hash_password, token_digest, verify_password};
use crate::error::EntityKind;
use crate::store::{Session, Tables};
use crate::{Caller, ClinicError, ClinicResult, ClinicStore, CoreConfig};
use api_shared::contracts::{LoginInput, RegisterMidwifeInput, RegisterPatientInput};
use api_shared::{AuthRes, Id, Midwife, MidwifeRegistrationRes, Patient, User, UserRole};
use chrono::{DateTime, Duration, Utc};
use midwifery_types::EmailAddress;
use std::sync::Arc;

#[derive(Clone)]
pub struct AccountService {
    cfg: Arc<CoreConfig>,
    store: Arc<ClinicStore>,
    /// Verified against when the e-mail is unknown, so both login failures cost one PBKDF2 run.
    dummy_hash: Arc<str>,
}

impl AccountService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<ClinicStore>) -> Self {
        let dummy_hash = Arc::from(hash_password(
            &generate_token(),
            cfg.password_iterations(),
        ));
        Self {
            cfg,
            store,
            dummy_hash,
        }
    }

    /// Creates a patient account with its profile and signs it in.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::DuplicateEmail`] if the address is already registered.
    pub fn register_patient(&self, input: RegisterPatientInput) -> ClinicResult<AuthRes> {
        let email = normalise_email(&input.email)?;
        let password_hash = hash_password(&input.password, self.cfg.password_iterations());
        let ttl = self.cfg.session_ttl();

        let (user, token) = self.store.write(|t| {
            let now = Utc::now();
            let user = insert_user(t, email.as_str(), password_hash, UserRole::Patient, now)?;

            let patient_id = t.next_id(EntityKind::Patient);
            t.patients.insert(
                patient_id,
                Patient {
                    id: patient_id,
                    user_id: user.id,
                    full_name: input.full_name.trim().to_string(),
                    phone: input.phone,
                    date_of_birth: input.date_of_birth,
                    address: input.address,
                    emergency_contact: input.emergency_contact,
                    created_at: now,
                    updated_at: now,
                },
            );

            let token = issue_session(t, user.id, now, ttl);
            Ok((user, token))
        })?;

        tracing::info!("Registered patient user {}", user.id);
        Ok(AuthRes { user, token })
    }

    /// Creates a midwife account with its profile. No session is issued.
    pub fn register_midwife(
        &self,
        input: RegisterMidwifeInput,
    ) -> ClinicResult<MidwifeRegistrationRes> {
        let email = normalise_email(&input.email)?;
        let license_number = input.license_number.trim().to_string();
        let password_hash = hash_password(&input.password, self.cfg.password_iterations());

        let res = self.store.write(|t| {
            if t
                .midwives
                .values()
                .any(|m| m.license_number == license_number)
            {
                return Err(ClinicError::DuplicateLicense);
            }

            let now = Utc::now();
            let user = insert_user(t, email.as_str(), password_hash, UserRole::Midwife, now)?;

            let midwife_id = t.next_id(EntityKind::Midwife);
            let midwife = Midwife {
                id: midwife_id,
                user_id: user.id,
                full_name: input.full_name.trim().to_string(),
                phone: input.phone,
                license_number,
                specialization: input.specialization,
                years_experience: input.years_experience,
                created_at: now,
                updated_at: now,
            };
            t.midwives.insert(midwife_id, midwife.clone());

            Ok(MidwifeRegistrationRes { user, midwife })
        })?;

        tracing::info!(
            "Registered midwife {} for user {}",
            res.midwife.id,
            res.user.id
        );
        Ok(res)
    }

    /// Verifies credentials and issues a new session token.
    ///
    /// Unknown e-mail and wrong password produce the same error and both run one PBKDF2
    /// verification. The active flag is only checked once the password has verified, so an
    /// inactive account is not revealed to a guesser.
    pub fn login(&self, input: LoginInput) -> ClinicResult<AuthRes> {
        let user = match EmailAddress::parse(&input.email) {
            Ok(email) => self
                .store
                .read(|t| t.user_by_email(email.as_str()).cloned())?,
            Err(_) => None,
        };
        let Some(user) = user else {
            verify_password(&input.password, &self.dummy_hash)?;
            tracing::warn!("Login rejected: unknown email");
            return Err(ClinicError::InvalidCredentials);
        };

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::warn!("Login rejected: bad password for user {}", user.id);
            return Err(ClinicError::InvalidCredentials);
        }
        if !user.is_active {
            tracing::warn!("Login rejected: user {} is inactive", user.id);
            return Err(ClinicError::InactiveAccount);
        }

        let ttl = self.cfg.session_ttl();
        let token = self.store.write(|t| {
            t.user(user.id)?;
            Ok(issue_session(t, user.id, Utc::now(), ttl))
        })?;

        tracing::info!("User {} logged in", user.id);
        Ok(AuthRes { user, token })
    }

    /// Resolves a bearer token to the caller it was issued to.
    ///
    /// # Errors
    ///
    /// [`ClinicError::UnknownSession`] for a token that was never issued or has been pruned,
    /// [`ClinicError::SessionExpired`] once the session is older than the configured lifetime.
    pub fn resolve_token(&self, token: &str) -> ClinicResult<Caller> {
        let digest = token_digest(token);
        let ttl = self.cfg.session_ttl();

        self.store.read(|t| -> ClinicResult<Caller> {
            let session = t.sessions.get(&digest).ok_or(ClinicError::UnknownSession)?;
            if Utc::now() - session.created_at >= ttl {
                return Err(ClinicError::SessionExpired);
            }
            let user = t.user(session.user_id)?;
            if !user.is_active {
                return Err(ClinicError::InactiveAccount);
            }

            let patient_id = match user.role {
                UserRole::Patient => t.patient_by_user(user.id).map(|p| p.id),
                _ => None,
            };

            Ok(Caller::User {
                user_id: user.id,
                role: user.role,
                patient_id,
            })
        })?
    }

    /// Creates the configured administrator unless the address is already registered.
    ///
    /// Returns the new user, or `None` when there was nothing to do.
    pub fn seed_admin(&self) -> ClinicResult<Option<User>> {
        let Some(seed) = self.cfg.admin_seed() else {
            return Ok(None);
        };

        if self
            .store
            .read(|t| t.user_by_email(seed.email.as_str()).is_some())?
        {
            tracing::debug!("Admin account {} already exists", seed.email);
            return Ok(None);
        }

        let password_hash = hash_password(&seed.password, self.cfg.password_iterations());
        let user = self.store.write(|t| {
            insert_user(t, seed.email.as_str(), password_hash, UserRole::Admin, Utc::now())
        })?;

        tracing::info!("Seeded admin account {}", user.email);
        Ok(Some(user))
    }
}

fn normalise_email(raw: &str) -> ClinicResult<EmailAddress> {
    EmailAddress::parse(raw).map_err(|e| ClinicError::InvalidInput(e.to_string()))
}

fn insert_user(
    t: &mut Tables,
    email: &str,
    password_hash: String,
    role: UserRole,
    now: DateTime<Utc>,
) -> ClinicResult<User> {
    if t.user_by_email(email).is_some() {
        tracing::warn!("Registration rejected: email already registered");
        return Err(ClinicError::DuplicateEmail);
    }

    let id = t.next_id(EntityKind::User);
    let user = User {
        id,
        email: email.to_string(),
        password_hash,
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    t.users.insert(id, user.clone());
    Ok(user)
}

fn issue_session(t: &mut Tables, user_id: Id, now: DateTime<Utc>, ttl: Duration) -> String {
    t.sessions.retain(|_, s| now - s.created_at < ttl);

    let mut own: Vec<(DateTime<Utc>, String)> = t
        .sessions
        .iter()
        .filter(|(_, s)| s.user_id == user_id)
        .map(|(digest, s)| (s.created_at, digest.clone()))
        .collect();
    if own.len() >= MAX_SESSIONS_PER_USER {
        own.sort();
        let excess = own.len() + 1 - MAX_SESSIONS_PER_USER;
        for (_, digest) in own.into_iter().take(excess) {
            t.sessions.remove(&digest);
        }
    }

    let token = generate_token();
    t.sessions.insert(
        token_digest(&token),
        Session {
            user_id,
            created_at: now,
        },
    );
    token
}
