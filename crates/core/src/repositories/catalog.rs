//! Clinic service catalog.

use crate::error::EntityKind;
use crate::{ClinicError, ClinicResult, ClinicStore};
use api_shared::contracts::{CreateServiceInput, UpdateServiceInput};
use api_shared::Service;
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<ClinicStore>,
}

/// Prices are kept to two decimal places.
fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

impl CatalogService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// Services ordered by id. Inactive services are left out unless `include_inactive` is set.
    pub fn services(&self, include_inactive: bool) -> ClinicResult<Vec<Service>> {
        self.store.read(|t| {
            t.services
                .values()
                .filter(|s| include_inactive || s.is_active)
                .cloned()
                .collect()
        })
    }

    pub fn create(&self, input: CreateServiceInput) -> ClinicResult<Service> {
        let service = self.store.write(|t| {
            let now = Utc::now();
            let id = t.next_id(EntityKind::Service);
            let service = Service {
                id,
                name: input.name.trim().to_string(),
                description: input.description,
                duration_minutes: input.duration_minutes,
                price: round_price(input.price),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            t.services.insert(id, service.clone());
            Ok(service)
        })?;

        tracing::info!("Created service {} ({})", service.id, service.name);
        Ok(service)
    }

    /// Applies a partial update. Absent fields are left as they are; `updated_at` is always
    /// refreshed.
    pub fn update(&self, input: UpdateServiceInput) -> ClinicResult<Service> {
        let service = self.store.write(|t| {
            let service = t
                .services
                .get_mut(&input.id)
                .ok_or_else(|| ClinicError::not_found(EntityKind::Service, input.id))?;

            input
                .name
                .map(|n| n.trim().to_string())
                .apply_required(&mut service.name);
            input.description.apply_to(&mut service.description);
            input
                .duration_minutes
                .apply_required(&mut service.duration_minutes);
            input.price.map(round_price).apply_required(&mut service.price);
            input.is_active.apply_required(&mut service.is_active);
            service.updated_at = Utc::now();

            Ok(service.clone())
        })?;

        tracing::info!("Updated service {}", service.id);
        Ok(service)
    }
}
