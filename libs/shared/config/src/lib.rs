use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_CRM_STORAGE_KEY: &str = "synapsa-crm-data";
pub const DEFAULT_PORTAL_STORAGE_KEY: &str = "synapsa-portal-data";
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub assistant_base_url: String,
    pub transcribe_base_url: String,
    pub app_url: String,
    pub data_dir: String,
    pub crm_storage_key: String,
    pub portal_storage_key: String,
    pub autosave_debounce_ms: u64,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assistant_base_url: "http://127.0.0.1:2024".to_string(),
            transcribe_base_url: "http://127.0.0.1:8000/api".to_string(),
            app_url: "http://localhost:8080".to_string(),
            data_dir: "./data".to_string(),
            crm_storage_key: DEFAULT_CRM_STORAGE_KEY.to_string(),
            portal_storage_key: DEFAULT_PORTAL_STORAGE_KEY.to_string(),
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            assistant_base_url: env::var("SYNAPSA_API_BASE")
                .unwrap_or_else(|_| {
                    warn!("SYNAPSA_API_BASE not set, using default");
                    defaults.assistant_base_url.clone()
                }),
            transcribe_base_url: env::var("SYNAPSA_TRANSCRIBE_BASE")
                .unwrap_or_else(|_| {
                    warn!("SYNAPSA_TRANSCRIBE_BASE not set, using default");
                    defaults.transcribe_base_url.clone()
                }),
            app_url: env::var("SYNAPSA_APP_URL")
                .unwrap_or_else(|_| {
                    warn!("SYNAPSA_APP_URL not set, using default");
                    defaults.app_url.clone()
                }),
            data_dir: env::var("SYNAPSA_DATA_DIR")
                .unwrap_or_else(|_| {
                    warn!("SYNAPSA_DATA_DIR not set, using default");
                    defaults.data_dir.clone()
                }),
            crm_storage_key: env::var("SYNAPSA_CRM_STORAGE_KEY")
                .unwrap_or_else(|_| defaults.crm_storage_key.clone()),
            portal_storage_key: env::var("SYNAPSA_PORTAL_STORAGE_KEY")
                .unwrap_or_else(|_| defaults.portal_storage_key.clone()),
            autosave_debounce_ms: match env::var("SYNAPSA_AUTOSAVE_DEBOUNCE_MS") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("SYNAPSA_AUTOSAVE_DEBOUNCE_MS is not a number ({}), using default", raw);
                    defaults.autosave_debounce_ms
                }),
                Err(_) => defaults.autosave_debounce_ms,
            },
            bind_addr: env::var("SYNAPSA_BIND_ADDR")
                .unwrap_or_else(|_| defaults.bind_addr.clone()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - empty endpoint or storage settings");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.assistant_base_url.is_empty()
            && !self.transcribe_base_url.is_empty()
            && !self.data_dir.is_empty()
            && !self.crm_storage_key.is_empty()
            && !self.portal_storage_key.is_empty()
    }

    /// Both surfaces read and write the same snapshot when their keys match.
    pub fn surfaces_share_storage(&self) -> bool {
        self.crm_storage_key == self.portal_storage_key
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// Absolute link from the landing site into the application.
    pub fn app_href(&self, path: AppPath) -> String {
        format!("{}{}", self.app_url.trim_end_matches('/'), path.route())
    }
}

/// Entry points the landing site links into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppPath {
    RoleSelect,
    Login,
    Register,
    Home,
}

impl AppPath {
    // Every entry point lands on role selection until dedicated screens exist.
    pub fn route(&self) -> &'static str {
        match self {
            AppPath::RoleSelect => "/role-select",
            AppPath::Login => "/role-select",
            AppPath::Register => "/role-select",
            AppPath::Home => "/role-select",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_configured() {
        let config = AppConfig::default();
        assert!(config.is_configured());
        assert!(!config.surfaces_share_storage());
        assert_eq!(config.autosave_debounce(), Duration::from_millis(600));
    }

    #[test]
    fn test_app_href_strips_trailing_slash() {
        let config = AppConfig {
            app_url: "https://app.synapsa.test/".to_string(),
            ..AppConfig::default()
        };

        assert_eq!(config.app_href(AppPath::Login), "https://app.synapsa.test/role-select");
        assert_eq!(config.app_href(AppPath::RoleSelect), "https://app.synapsa.test/role-select");
    }

    #[test]
    fn test_shared_storage_when_keys_match() {
        let config = AppConfig {
            portal_storage_key: DEFAULT_CRM_STORAGE_KEY.to_string(),
            ..AppConfig::default()
        };
        assert!(config.surfaces_share_storage());
    }
}
