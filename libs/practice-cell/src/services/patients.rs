use chrono::Utc;
use tracing::{debug, info, instrument};

use shared_models::{
    Attachment, ClinicalRecord, CommunicationChannel, CommunicationEntry, HistoryEntry, Patient,
    PatientStatus,
};
use shared_utils::ids::timestamp_id;
use store_cell::StateStore;

use crate::models::{
    CreatePatientRequest, PatientSearchQuery, UpdateClinicalRecordRequest, UpdatePatientRequest,
};
use crate::services::{find_patient, find_patient_mut, non_blank, required};
use crate::PracticeError;

/// Owner assigned to patients created without one.
pub const DEFAULT_RESPONSIBLE: &str = "Agente Principal";

pub struct PatientService {
    store: StateStore,
}

impl PatientService {
    pub fn new(store: &StateStore) -> Self {
        Self { store: store.clone() }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PracticeError> {
        let name = required("name", &request.name)?;

        let patient = Patient {
            id: timestamp_id(),
            name,
            phone: non_blank(request.phone).unwrap_or_default(),
            email: non_blank(request.email).unwrap_or_default(),
            status: request.status.unwrap_or(PatientStatus::Active),
            next_appointment: None,
            last_appointment: None,
            primary_diagnosis: non_blank(request.primary_diagnosis),
            tags: parse_tags(request.tags.as_deref().unwrap_or("")),
            responsible: non_blank(request.responsible)
                .unwrap_or_else(|| DEFAULT_RESPONSIBLE.to_string()),
            notes: request.notes.unwrap_or_default(),
            clinical_record: ClinicalRecord::default(),
            communication_log: Vec::new(),
            created_at: Utc::now(),
        };

        let created = patient.clone();
        self.store.modify(move |data| data.patients.push(patient)).await;

        info!("Created patient {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn get_patient(&self, id: &str) -> Result<Patient, PracticeError> {
        let data = self.store.snapshot().await;
        find_patient(&data, id).cloned()
    }

    /// Case-insensitive match on name, email or phone, optionally narrowed by status.
    pub async fn search(&self, query: &PatientSearchQuery) -> Vec<Patient> {
        let needle = query.q.as_deref().unwrap_or("");
        let data = self.store.snapshot().await;

        data.patients
            .into_iter()
            .filter(|p| p.matches_text(needle))
            .filter(|p| query.status.map_or(true, |status| p.status == status))
            .collect()
    }

    pub async fn update_status(&self, id: &str, status: PatientStatus) -> Result<Patient, PracticeError> {
        debug!("Setting patient {} status to {}", id, status);
        self.store
            .try_modify(|data| {
                let patient = find_patient_mut(data, id)?;
                patient.status = status;
                Ok(patient.clone())
            })
            .await
    }

    /// Applies the fields present in `request`. A blank name is rejected; a
    /// blank diagnosis clears it.
    #[instrument(skip(self, request))]
    pub async fn update_patient(&self, id: &str, request: UpdatePatientRequest) -> Result<Patient, PracticeError> {
        let name = request.name.as_deref().map(|name| required("name", name)).transpose()?;

        self.store
            .try_modify(|data| {
                let patient = find_patient_mut(data, id)?;
                if let Some(name) = name {
                    patient.name = name;
                }
                if let Some(phone) = request.phone {
                    patient.phone = phone.trim().to_string();
                }
                if let Some(email) = request.email {
                    patient.email = email.trim().to_string();
                }
                if let Some(tags) = request.tags {
                    patient.tags = parse_tags(&tags);
                }
                if let Some(responsible) = request.responsible {
                    patient.responsible = responsible.trim().to_string();
                }
                if let Some(notes) = request.notes {
                    patient.notes = notes;
                }
                if request.primary_diagnosis.is_some() {
                    patient.primary_diagnosis = non_blank(request.primary_diagnosis);
                }
                Ok(patient.clone())
            })
            .await
    }

    /// Applies the clinical record fields present in `request`. History and
    /// attachments only grow through their own operations.
    pub async fn update_clinical_record(
        &self,
        id: &str,
        request: UpdateClinicalRecordRequest,
    ) -> Result<Patient, PracticeError> {
        self.store
            .try_modify(|data| {
                let patient = find_patient_mut(data, id)?;
                let record = &mut patient.clinical_record;
                if let Some(notes) = request.clinical_notes {
                    record.clinical_notes = notes;
                }
                if let Some(complaints) = request.current_complaints {
                    record.current_complaints = complaints;
                }
                if let Some(plan) = request.plan {
                    record.plan = plan;
                }
                if let Some(emotions) = request.frequent_emotions {
                    record.frequent_emotions = dedup_labels(emotions);
                }
                Ok(patient.clone())
            })
            .await
    }

    /// Adds `emotion` to the patient's frequent emotions, or removes it when
    /// already listed.
    pub async fn toggle_emotion(&self, id: &str, emotion: &str) -> Result<Patient, PracticeError> {
        let emotion = required("emotion", emotion)?;

        self.store
            .try_modify(|data| {
                let patient = find_patient_mut(data, id)?;
                let emotions = &mut patient.clinical_record.frequent_emotions;
                match emotions.iter().position(|e| *e == emotion) {
                    Some(index) => {
                        emotions.remove(index);
                    }
                    None => emotions.push(emotion),
                }
                Ok(patient.clone())
            })
            .await
    }

    pub async fn update_clinical_notes(&self, id: &str, notes: String) -> Result<Patient, PracticeError> {
        self.store
            .try_modify(|data| {
                let patient = find_patient_mut(data, id)?;
                patient.clinical_record.clinical_notes = notes;
                Ok(patient.clone())
            })
            .await
    }

    /// History is append-only; entries are never edited or removed.
    pub async fn add_history_entry(
        &self,
        id: &str,
        kind: &str,
        content: &str,
    ) -> Result<HistoryEntry, PracticeError> {
        let kind = required("kind", kind)?;
        let content = required("content", content)?;

        self.store
            .try_modify(|data| {
                let patient = find_patient_mut(data, id)?;
                let entry = HistoryEntry {
                    date: Utc::now(),
                    kind,
                    content,
                };
                patient.clinical_record.history.push(entry.clone());
                Ok(entry)
            })
            .await
    }

    pub async fn add_attachment(&self, id: &str, name: &str, url: &str) -> Result<Attachment, PracticeError> {
        let name = required("name", name)?;
        let url = required("url", url)?;

        self.store
            .try_modify(|data| {
                let patient = find_patient_mut(data, id)?;
                let attachment = Attachment {
                    name,
                    url,
                    date: Utc::now(),
                };
                patient.clinical_record.attachments.push(attachment.clone());
                Ok(attachment)
            })
            .await
    }

    pub async fn record_communication(
        &self,
        id: &str,
        channel: CommunicationChannel,
        message: &str,
        sent: bool,
    ) -> Result<CommunicationEntry, PracticeError> {
        let message = required("message", message)?;

        self.store
            .try_modify(|data| {
                let patient = find_patient_mut(data, id)?;
                let entry = CommunicationEntry {
                    date: Utc::now(),
                    channel,
                    message,
                    sent,
                };
                patient.communication_log.push(entry.clone());
                Ok(entry)
            })
            .await
    }

    /// Drops the patient. Appointments and payments keep their denormalized name.
    pub async fn remove_patient(&self, id: &str) -> Result<(), PracticeError> {
        self.store
            .try_modify(|data| {
                let before = data.patients.len();
                data.patients.retain(|p| p.id != id);
                if data.patients.len() == before {
                    return Err(PracticeError::not_found("Patient", id));
                }
                Ok(())
            })
            .await?;

        info!("Removed patient {}", id);
        Ok(())
    }
}

/// Splits a comma separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trims labels and drops blanks and repeats, keeping first occurrences.
fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for label in labels {
        let label = label.trim();
        if !label.is_empty() && !kept.iter().any(|k| k == label) {
            kept.push(label.to_string());
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_labels() {
        let labels = vec![" medo".to_string(), "".to_string(), "raiva".to_string(), "medo ".to_string()];
        assert_eq!(dedup_labels(labels), vec!["medo", "raiva"]);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("ansiedade, TCC ,, luto"), vec!["ansiedade", "TCC", "luto"]);
        assert!(parse_tags("  ").is_empty());
    }
}
