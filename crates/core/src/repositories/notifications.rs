//! User notifications.

use crate::error::EntityKind;
use crate::store::Tables;
use crate::{ClinicError, ClinicResult, ClinicStore};
use api_shared::contracts::CreateNotificationInput;
use api_shared::{Id, Notification, NotificationType};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::sync::Arc;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<ClinicStore>,
}

/// Inserts an unread notification inside an open write transaction.
pub(crate) fn push(
    t: &mut Tables,
    user_id: Id,
    notification_type: NotificationType,
    title: &str,
    message: String,
    now: DateTime<Utc>,
) -> Notification {
    let id = t.next_id(EntityKind::Notification);
    let notification = Notification {
        id,
        user_id,
        notification_type,
        title: title.to_string(),
        message,
        is_read: false,
        created_at: now,
    };
    t.notifications.insert(id, notification.clone());
    notification
}

impl NotificationService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, input: CreateNotificationInput) -> ClinicResult<Notification> {
        let notification = self.store.write(|t| {
            t.user(input.user_id)?;
            Ok(push(
                t,
                input.user_id,
                input.notification_type,
                input.title.trim(),
                input.message,
                Utc::now(),
            ))
        })?;

        tracing::info!(
            "Created {} notification {} for user {}",
            notification.notification_type,
            notification.id,
            notification.user_id
        );
        Ok(notification)
    }

    /// Read and unread notifications for `user_id`, newest first.
    pub fn by_user(&self, user_id: Id) -> ClinicResult<Vec<Notification>> {
        self.store.read(|t| -> ClinicResult<Vec<Notification>> {
            t.user(user_id)?;
            let mut list: Vec<Notification> = t
                .notifications
                .values()
                .filter(|n| n.user_id == user_id)
                .cloned()
                .collect();
            list.sort_by_key(|n| Reverse((n.created_at, n.id)));
            Ok(list)
        })?
    }

    /// Sets the read flag. Marking an already read notification again is a no-op.
    pub fn mark_read(&self, id: Id) -> ClinicResult<Notification> {
        self.store.write(|t| {
            let notification = t
                .notifications
                .get_mut(&id)
                .ok_or_else(|| ClinicError::not_found(EntityKind::Notification, id))?;
            notification.is_read = true;
            Ok(notification.clone())
        })
    }
}
