use std::sync::Arc;

use tracing::{info, warn};

use shared_config::AppConfig;
use store_cell::{KeyValueStorage, StateStore, StoreConfig, StoreError};

/// Stores backing the clinician CRM and the patient portal.
///
/// Each surface is bound to its configured storage key. When both keys are
/// equal the surfaces share one store, otherwise they are fully isolated.
pub struct Surfaces {
    pub crm: StateStore,
    pub portal: StateStore,
}

impl Surfaces {
    pub async fn open(config: &AppConfig, storage: Arc<dyn KeyValueStorage>) -> Self {
        let debounce = config.autosave_debounce();
        let crm = StateStore::open(
            storage.clone(),
            StoreConfig::new(config.crm_storage_key.clone(), debounce),
        )
        .await;

        let portal = if config.surfaces_share_storage() {
            warn!("CRM and portal share storage key {}", config.crm_storage_key);
            crm.clone()
        } else {
            StateStore::open(storage, StoreConfig::new(config.portal_storage_key.clone(), debounce)).await
        };

        Self { crm, portal }
    }

    pub fn is_shared(&self) -> bool {
        self.crm.storage_key() == self.portal.storage_key()
    }

    /// Logs every theme switch so the change is visible outside the UI.
    pub fn spawn_theme_watchers(&self) {
        let mut stores = vec![("crm", self.crm.clone())];
        if !self.is_shared() {
            stores.push(("portal", self.portal.clone()));
        }

        for (surface, store) in stores {
            let mut themes = store.theme_changes();
            tokio::spawn(async move {
                while themes.changed().await.is_ok() {
                    let theme = *themes.borrow_and_update();
                    info!("Theme for {} switched to {:?}", surface, theme);
                }
            });
        }
    }

    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.crm.shutdown().await?;
        if !self.is_shared() {
            self.portal.shutdown().await?;
        }
        Ok(())
    }
}
