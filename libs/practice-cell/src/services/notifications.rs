use chrono::Utc;
use tracing::debug;

use shared_models::{EntityLink, LinkedEntity, Notification, NotificationKind};
use shared_utils::ids::timestamp_id;
use store_cell::StateStore;

use crate::services::required;
use crate::PracticeError;

pub struct NotificationService {
    store: StateStore,
}

impl NotificationService {
    pub fn new(store: &StateStore) -> Self {
        Self { store: store.clone() }
    }

    /// Newest first.
    pub async fn list(&self) -> Vec<Notification> {
        let mut notifications = self.store.snapshot().await.notifications;
        notifications.sort_by(|a, b| b.date.cmp(&a.date));
        notifications
    }

    pub async fn push(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        link: Option<(LinkedEntity, String)>,
    ) -> Result<Notification, PracticeError> {
        let notification = Notification {
            id: timestamp_id(),
            kind,
            title: required("title", title)?,
            message: message.trim().to_string(),
            link: link.map(|(kind, id)| EntityLink { kind, id }),
            read: false,
            date: Utc::now(),
        };

        debug!("Pushing notification {}: {}", notification.id, notification.title);
        let pushed = notification.clone();
        self.store.modify(move |data| data.notifications.push(notification)).await;
        Ok(pushed)
    }

    pub async fn mark_read(&self, id: &str) -> Result<Notification, PracticeError> {
        self.store
            .try_modify(|data| {
                let notification = data
                    .notifications
                    .iter_mut()
                    .find(|n| n.id == id)
                    .ok_or_else(|| PracticeError::not_found("Notification", id))?;
                notification.read = true;
                Ok(notification.clone())
            })
            .await
    }

    /// Returns how many notifications changed.
    /// Marks every unread notification as read and returns how many changed.
    pub async fn mark_all_read(&self) -> usize {
        self.store
            .modify_if_changed(|data| {
                let mut changed = 0;
                for notification in data.notifications.iter_mut().filter(|n| !n.read) {
                    notification.read = true;
                    changed += 1;
                }
                (changed > 0).then_some(changed)
            })
            .await
            .unwrap_or(0)
    }

    pub async fn unread_count(&self) -> usize {
        self.store
            .snapshot()
            .await
            .notifications
            .iter()
            .filter(|n| !n.read)
            .count()
    }
}
