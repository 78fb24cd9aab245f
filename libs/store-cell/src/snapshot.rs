//! Persisted snapshot format.
//!
//! One flat JSON object per storage key. There is no schema version: a blob
//! written by an older build is shallow-merged over [`CrmData::default`], so
//! fields it lacks come back with their defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shared_models::{
    default_message_templates, Appointment, IntakeForm, MessageTemplate, Notification, Patient,
    PaymentRecord, Theme, UserRole,
};

use crate::StoreError;

pub const DEFAULT_APPOINTMENT_PRICE: f64 = 200.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrmData {
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default = "default_message_templates")]
    pub message_templates: Vec<MessageTemplate>,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub intake_forms: Vec<IntakeForm>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_appointment_price")]
    pub default_appointment_price: f64,
    #[serde(default)]
    pub professional_name: String,
    #[serde(default)]
    pub credentials: String,
    #[serde(default)]
    pub approach: String,
    #[serde(default)]
    pub extra_registration: String,
    /// Data URI.
    #[serde(default)]
    pub profile_photo: String,
    /// Top-level keys this build does not know about, kept so they survive a save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_appointment_price() -> f64 {
    DEFAULT_APPOINTMENT_PRICE
}

impl Default for CrmData {
    fn default() -> Self {
        Self {
            role: UserRole::default(),
            patients: Vec::new(),
            appointments: Vec::new(),
            message_templates: default_message_templates(),
            payments: Vec::new(),
            notifications: Vec::new(),
            intake_forms: Vec::new(),
            theme: Theme::default(),
            default_appointment_price: DEFAULT_APPOINTMENT_PRICE,
            professional_name: String::new(),
            credentials: String::new(),
            approach: String::new(),
            extra_registration: String::new(),
            profile_photo: String::new(),
            extra: Map::new(),
        }
    }
}

impl CrmData {
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a persisted blob and overlays its top-level fields on the
    /// defaults. `null` values count as absent. A field whose stored value
    /// does not fit its type keeps the default and is reported in
    /// [`MergedSnapshot::rejected`]; the other fields are still loaded.
    pub fn merge_over_defaults(raw: &str) -> Result<MergedSnapshot, StoreError> {
        let persisted = match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::InvalidSnapshot(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut merged = match serde_json::to_value(CrmData::default())? {
            Value::Object(map) => map,
            _ => return Err(StoreError::InvalidSnapshot("defaults did not serialize to an object".into())),
        };

        let mut rejected = Vec::new();
        for (key, value) in persisted {
            if value.is_null() {
                continue;
            }

            // Every field has a serde default, so a one-key object checks this value alone.
            let single = Map::from_iter([(key.clone(), value.clone())]);
            match serde_json::from_value::<CrmData>(Value::Object(single)) {
                Ok(_) => {
                    merged.insert(key, value);
                }
                Err(e) => rejected.push(RejectedField {
                    field: key,
                    reason: e.to_string(),
                }),
            }
        }

        Ok(MergedSnapshot {
            data: serde_json::from_value(Value::Object(merged))?,
            rejected,
        })
    }
}

/// Outcome of [`CrmData::merge_over_defaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSnapshot {
    pub data: CrmData,
    pub rejected: Vec<RejectedField>,
}

/// A stored top-level field that could not be read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedField {
    pub field: String,
    pub reason: String,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Where the snapshot in memory came from at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LoadSource {
    /// Nothing stored under the key yet.
    Defaults,
    Persisted,
    /// Stored blob was loaded except for the listed fields, which kept their
    /// defaults. The original blob is copied to `<key>.corrupt`.
    Repaired { rejected: Vec<RejectedField> },
    /// Stored blob could not be used; defaults were loaded instead.
    Recovered { reason: String },
}

/// Top-level fields that can be replaced as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrmField {
    Role,
    Patients,
    Appointments,
    MessageTemplates,
    Payments,
    Notifications,
    IntakeForms,
    Theme,
    DefaultAppointmentPrice,
    ProfessionalName,
    Credentials,
    Approach,
    ExtraRegistration,
    ProfilePhoto,
}

impl CrmField {
    pub const ALL: [CrmField; 14] = [
        CrmField::Role,
        CrmField::Patients,
        CrmField::Appointments,
        CrmField::MessageTemplates,
        CrmField::Payments,
        CrmField::Notifications,
        CrmField::IntakeForms,
        CrmField::Theme,
        CrmField::DefaultAppointmentPrice,
        CrmField::ProfessionalName,
        CrmField::Credentials,
        CrmField::Approach,
        CrmField::ExtraRegistration,
        CrmField::ProfilePhoto,
    ];

    /// Key of this field inside the persisted object.
    pub fn storage_name(&self) -> &'static str {
        match self {
            CrmField::Role => "role",
            CrmField::Patients => "patients",
            CrmField::Appointments => "appointments",
            CrmField::MessageTemplates => "messageTemplates",
            CrmField::Payments => "payments",
            CrmField::Notifications => "notifications",
            CrmField::IntakeForms => "intakeForms",
            CrmField::Theme => "theme",
            CrmField::DefaultAppointmentPrice => "defaultAppointmentPrice",
            CrmField::ProfessionalName => "professionalName",
            CrmField::Credentials => "credentials",
            CrmField::Approach => "approach",
            CrmField::ExtraRegistration => "extraRegistration",
            CrmField::ProfilePhoto => "profilePhoto",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let data = CrmData::default();
        assert_eq!(data.message_templates.len(), 5);
        assert_eq!(data.default_appointment_price, 200.0);
        assert_eq!(data.theme, Theme::Light);
        assert!(data.patients.is_empty());
    }

    #[test]
    fn test_every_field_has_a_storage_key() {
        let value = serde_json::to_value(CrmData::default()).unwrap();
        let object = value.as_object().unwrap();
        for field in CrmField::ALL {
            assert!(object.contains_key(field.storage_name()), "missing {}", field.storage_name());
        }
        assert_eq!(object.len(), CrmField::ALL.len());
    }

    #[test]
    fn test_merge_keeps_defaults_for_missing_fields() {
        let raw = json!({ "theme": "dark", "professionalName": "Dra. Lia" }).to_string();
        let data = CrmData::merge_over_defaults(&raw).unwrap().data;

        assert_eq!(data.theme, Theme::Dark);
        assert_eq!(data.professional_name, "Dra. Lia");
        assert_eq!(data.message_templates, default_message_templates());
        assert_eq!(data.default_appointment_price, DEFAULT_APPOINTMENT_PRICE);
    }

    #[test]
    fn test_merge_treats_null_as_absent() {
        let raw = json!({ "patients": null, "defaultAppointmentPrice": null }).to_string();
        let data = CrmData::merge_over_defaults(&raw).unwrap().data;

        assert!(data.patients.is_empty());
        assert_eq!(data.default_appointment_price, DEFAULT_APPOINTMENT_PRICE);
    }

    #[test]
    fn test_merge_preserves_unknown_keys() {
        let raw = json!({ "futureFeature": { "enabled": true } }).to_string();
        let data = CrmData::merge_over_defaults(&raw).unwrap().data;
        assert_eq!(data.extra.get("futureFeature"), Some(&json!({ "enabled": true })));

        let reserialized: Value = serde_json::from_str(&data.to_json().unwrap()).unwrap();
        assert_eq!(reserialized["futureFeature"], json!({ "enabled": true }));
    }

    #[test]
    fn test_merge_rejects_non_objects() {
        assert_matches!(CrmData::merge_over_defaults("[1,2]"), Err(StoreError::InvalidSnapshot(_)));
        assert_matches!(CrmData::merge_over_defaults("{not json"), Err(StoreError::Serialization(_)));
    }

    #[test]
    fn test_merge_rejects_only_the_unreadable_field() {
        let raw = json!({
            "patients": [{ "id": "2", "name": "Bruno" }],
            "theme": "sepia",
            "professionalName": "Dra. Lia",
            "defaultAppointmentPrice": 350
        })
        .to_string();

        let merged = CrmData::merge_over_defaults(&raw).unwrap();

        assert!(merged.data.patients.is_empty());
        assert_eq!(merged.data.theme, Theme::Light);
        assert_eq!(merged.data.professional_name, "Dra. Lia");
        assert_eq!(merged.data.default_appointment_price, 350.0);

        let mut fields: Vec<&str> = merged.rejected.iter().map(|r| r.field.as_str()).collect();
        fields.sort();
        assert_eq!(fields, vec!["patients", "theme"]);
    }

    #[test]
    fn test_field_path_names() {
        let field: CrmField = serde_json::from_value(json!("message-templates")).unwrap();
        assert_eq!(field, CrmField::MessageTemplates);
        assert_eq!(field.storage_name(), "messageTemplates");
    }
}
