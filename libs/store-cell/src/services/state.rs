use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use shared_models::{
    Appointment, IntakeForm, MessageTemplate, Notification, Patient, PaymentRecord, Theme, UserRole,
};

use crate::services::autosave::debounce_changes;
use crate::snapshot::{CrmData, CrmField, LoadSource};
use crate::storage::KeyValueStorage;
use crate::StoreError;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub storage_key: String,
    pub debounce: Duration,
}

impl StoreConfig {
    pub fn new(storage_key: impl Into<String>, debounce: Duration) -> Self {
        Self {
            storage_key: storage_key.into(),
            debounce,
        }
    }
}

/// Owner of one surface's snapshot.
///
/// Cloning is cheap and every clone sees the same state. Each mutation bumps
/// a change counter; a background task persists the whole snapshot once the
/// counter has been quiet for the configured debounce window.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    storage_key: String,
    storage: Arc<dyn KeyValueStorage>,
    data: RwLock<CrmData>,
    version: watch::Sender<u64>,
    theme: watch::Sender<Theme>,
    saved_version: AtomicU64,
    // Serializes writes so an older snapshot never lands after a newer one.
    write_lock: Mutex<()>,
    load_source: LoadSource,
    autosave: Mutex<Option<JoinHandle<()>>>,
}

impl StateStore {
    /// Loads the snapshot stored under `config.storage_key` and starts the
    /// auto-save task. Unreadable snapshots are logged and replaced by defaults.
    #[instrument(skip(storage), fields(key = %config.storage_key))]
    pub async fn open(storage: Arc<dyn KeyValueStorage>, config: StoreConfig) -> Self {
        let (data, load_source) = load_snapshot(storage.as_ref(), &config.storage_key).await;

        let (version, changes) = watch::channel(0u64);
        let (theme, _) = watch::channel(data.theme);

        let inner = Arc::new(StoreInner {
            storage_key: config.storage_key,
            storage,
            data: RwLock::new(data),
            version,
            theme,
            saved_version: AtomicU64::new(0),
            write_lock: Mutex::new(()),
            load_source,
            autosave: Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let handle = tokio::spawn(debounce_changes(changes, config.debounce, move || {
            autosave(weak.clone())
        }));
        *inner.autosave.lock().await = Some(handle);

        info!(
            "Opened store {} (debounce {:?}, source {:?})",
            inner.storage_key, config.debounce, inner.load_source
        );

        Self { inner }
    }

    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    pub fn load_source(&self) -> &LoadSource {
        &self.inner.load_source
    }

    pub async fn snapshot(&self) -> CrmData {
        self.inner.data.read().await.clone()
    }

    /// Fires once per mutation; the value is a monotonically increasing counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Fires only when the theme actually changes.
    pub fn theme_changes(&self) -> watch::Receiver<Theme> {
        self.inner.theme.subscribe()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    /// Applies `f` under the write lock and notifies subscribers.
    pub async fn modify<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CrmData) -> R,
    {
        let mut data = self.inner.data.write().await;
        let result = f(&mut data);
        self.publish(&data);
        result
    }

    /// Like [`modify`](Self::modify), but an `Err` leaves subscribers
    /// untouched. `f` must validate before it mutates.
    pub async fn try_modify<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut CrmData) -> Result<T, E>,
    {
        let mut data = self.inner.data.write().await;
        let result = f(&mut data)?;
        self.publish(&data);
        Ok(result)
    }

    /// Like [`modify`](Self::modify), but only a `Some` result counts as a
    /// change. `None` leaves subscribers untouched, so `f` must return `Some`
    /// whenever it mutated anything.
    pub async fn modify_if_changed<F, T>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&mut CrmData) -> Option<T>,
    {
        let mut data = self.inner.data.write().await;
        let result = f(&mut data)?;
        self.publish(&data);
        Some(result)
    }

    // Called with the write guard held so the counter and the data move together.
    fn publish(&self, data: &CrmData) {
        self.inner.version.send_modify(|v| *v += 1);
        let theme = data.theme;
        self.inner.theme.send_if_modified(|current| {
            if *current != theme {
                *current = theme;
                true
            } else {
                false
            }
        });
    }

    pub async fn set_role(&self, role: UserRole) {
        self.modify(|data| data.role = role).await
    }

    pub async fn set_patients(&self, patients: Vec<Patient>) {
        debug!("Replacing patients ({} entries)", patients.len());
        self.modify(|data| data.patients = patients).await
    }

    pub async fn set_appointments(&self, appointments: Vec<Appointment>) {
        debug!("Replacing appointments ({} entries)", appointments.len());
        self.modify(|data| data.appointments = appointments).await
    }

    pub async fn set_message_templates(&self, templates: Vec<MessageTemplate>) {
        self.modify(|data| data.message_templates = templates).await
    }

    pub async fn set_payments(&self, payments: Vec<PaymentRecord>) {
        debug!("Replacing payments ({} entries)", payments.len());
        self.modify(|data| data.payments = payments).await
    }

    pub async fn set_notifications(&self, notifications: Vec<Notification>) {
        self.modify(|data| data.notifications = notifications).await
    }

    pub async fn set_intake_forms(&self, forms: Vec<IntakeForm>) {
        self.modify(|data| data.intake_forms = forms).await
    }

    pub async fn set_default_appointment_price(&self, price: f64) {
        self.modify(|data| data.default_appointment_price = price).await
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.modify(|data| data.theme = theme).await
    }

    /// Returns the new theme.
    pub async fn toggle_theme(&self) -> Theme {
        self.modify(|data| {
            data.theme = data.theme.toggled();
            data.theme
        })
        .await
    }

    pub async fn set_professional_name(&self, name: String) {
        self.modify(|data| data.professional_name = name).await
    }

    pub async fn set_credentials(&self, credentials: String) {
        self.modify(|data| data.credentials = credentials).await
    }

    pub async fn set_approach(&self, approach: String) {
        self.modify(|data| data.approach = approach).await
    }

    pub async fn set_extra_registration(&self, registration: String) {
        self.modify(|data| data.extra_registration = registration).await
    }

    pub async fn set_profile_photo(&self, photo_data_uri: String) {
        self.modify(|data| data.profile_photo = photo_data_uri).await
    }

    /// Whole-field replacement from an untyped JSON value.
    pub async fn replace_field(&self, field: CrmField, value: Value) -> Result<(), StoreError> {
        fn parse<T: serde::de::DeserializeOwned>(field: CrmField, value: Value) -> Result<T, StoreError> {
            serde_json::from_value(value).map_err(|e| StoreError::InvalidField {
                field: field.storage_name().to_string(),
                message: e.to_string(),
            })
        }

        match field {
            CrmField::Role => self.set_role(parse(field, value)?).await,
            CrmField::Patients => self.set_patients(parse(field, value)?).await,
            CrmField::Appointments => self.set_appointments(parse(field, value)?).await,
            CrmField::MessageTemplates => self.set_message_templates(parse(field, value)?).await,
            CrmField::Payments => self.set_payments(parse(field, value)?).await,
            CrmField::Notifications => self.set_notifications(parse(field, value)?).await,
            CrmField::IntakeForms => self.set_intake_forms(parse(field, value)?).await,
            CrmField::Theme => self.set_theme(parse(field, value)?).await,
            CrmField::DefaultAppointmentPrice => {
                self.set_default_appointment_price(parse(field, value)?).await
            }
            CrmField::ProfessionalName => self.set_professional_name(parse(field, value)?).await,
            CrmField::Credentials => self.set_credentials(parse(field, value)?).await,
            CrmField::Approach => self.set_approach(parse(field, value)?).await,
            CrmField::ExtraRegistration => self.set_extra_registration(parse(field, value)?).await,
            CrmField::ProfilePhoto => self.set_profile_photo(parse(field, value)?).await,
        }

        Ok(())
    }

    /// Writes the snapshot immediately, bypassing the debounce window.
    #[instrument(skip(self), fields(key = %self.inner.storage_key))]
    pub async fn save_now(&self) -> Result<(), StoreError> {
        self.inner.persist().await.map_err(|e| {
            error!("Manual save of {} failed: {}", self.inner.storage_key, e);
            e
        })
    }

    /// Stops auto-saving and writes any pending changes.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        if let Some(handle) = self.inner.autosave.lock().await.take() {
            handle.abort();
        }

        if self.is_dirty() {
            info!("Flushing pending changes for {} before shutdown", self.inner.storage_key);
            self.inner.persist().await?;
        }

        Ok(())
    }
}

impl StoreInner {
    async fn persist(&self) -> Result<(), StoreError> {
        let _write = self.write_lock.lock().await;

        let (payload, version) = {
            let data = self.data.read().await;
            let version = *self.version.borrow();
            (data.to_json()?, version)
        };

        self.storage.set_item(&self.storage_key, &payload).await?;
        self.saved_version.fetch_max(version, Ordering::SeqCst);

        debug!("Persisted {} at version {}", self.storage_key, version);
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        *self.version.borrow() > self.saved_version.load(Ordering::SeqCst)
    }
}

async fn autosave(store: Weak<StoreInner>) -> bool {
    let Some(inner) = store.upgrade() else {
        return false;
    };

    if !inner.is_dirty() {
        return true;
    }

    if let Err(e) = inner.persist().await {
        error!("Auto-save of {} failed: {}", inner.storage_key, e);
    }
    true
}

async fn load_snapshot(storage: &dyn KeyValueStorage, key: &str) -> (CrmData, LoadSource) {
    let raw = match storage.get_item(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No snapshot stored under {}, starting from defaults", key);
            return (CrmData::default(), LoadSource::Defaults);
        }
        Err(e) => {
            error!("Failed to read snapshot {}: {}", key, e);
            return (CrmData::default(), LoadSource::Recovered { reason: e.to_string() });
        }
    };

    match CrmData::merge_over_defaults(&raw) {
        Ok(merged) if merged.rejected.is_empty() => (merged.data, LoadSource::Persisted),
        Ok(merged) => {
            for rejected in &merged.rejected {
                error!(
                    "Field {} of snapshot {} is unreadable, keeping its default: {}",
                    rejected.field, key, rejected.reason
                );
            }
            back_up_snapshot(storage, key, &raw).await;
            (merged.data, LoadSource::Repaired { rejected: merged.rejected })
        }
        Err(e) => {
            error!("Discarding unreadable snapshot {}: {}", key, e);
            back_up_snapshot(storage, key, &raw).await;
            (CrmData::default(), LoadSource::Recovered { reason: e.to_string() })
        }
    }
}

/// Key under which a snapshot that did not load cleanly is kept.
pub fn backup_key(key: &str) -> String {
    format!("{}.corrupt", key)
}

/// Copies the raw blob aside before the first save replaces it.
async fn back_up_snapshot(storage: &dyn KeyValueStorage, key: &str, raw: &str) {
    let backup = backup_key(key);
    match storage.set_item(&backup, raw).await {
        Ok(()) => warn!("Kept a copy of snapshot {} under {}", key, backup),
        Err(e) => error!("Failed to back up snapshot {} to {}: {}", key, backup, e),
    }
}
