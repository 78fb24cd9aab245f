use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use tracing::{debug, info, instrument};

use shared_models::{Appointment, AppointmentStatus, HistoryEntry, Modality};
use shared_utils::ids::timestamp_id;
use store_cell::StateStore;

use crate::models::{AppointmentQuery, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::services::{
    find_appointment, find_appointment_mut, find_patient, find_patient_mut, non_blank,
};
use crate::PracticeError;

pub const DEFAULT_TIME: &str = "09:00";
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
pub const VIDEO_ROOM_BASE_URL: &str = "https://meet.google.com";
/// History kind recorded with a generated summary.
pub const SUMMARY_HISTORY_KIND: &str = "Consulta";

static TIME_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("time pattern is valid"));

pub fn validate_time(time: &str) -> Result<String, PracticeError> {
    let time = time.trim();
    if !TIME_OF_DAY.is_match(time) {
        return Err(PracticeError::Validation(format!(
            "time must be HH:MM, got {:?}",
            time
        )));
    }
    Ok(time.to_string())
}

pub struct AppointmentService {
    store: StateStore,
}

impl AppointmentService {
    pub fn new(store: &StateStore) -> Self {
        Self { store: store.clone() }
    }

    #[instrument(skip(self, request), fields(patient_id = %request.patient_id, date = %request.date))]
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, PracticeError> {
        let time = validate_time(request.time.as_deref().unwrap_or(DEFAULT_TIME))?;
        let duration_minutes = request.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        if duration_minutes == 0 {
            return Err(PracticeError::Validation("duration must be positive".into()));
        }

        let appointment = self
            .store
            .try_modify(move |data| {
                let patient = find_patient(data, &request.patient_id)?;
                let appointment = Appointment {
                    id: timestamp_id(),
                    patient_id: patient.id.clone(),
                    patient_name: patient.name.clone(),
                    date: request.date,
                    time,
                    duration_minutes,
                    modality: request.modality.unwrap_or(Modality::InPerson),
                    video_link: non_blank(request.video_link),
                    status: AppointmentStatus::Confirmed,
                    reason: non_blank(request.reason),
                    notes: non_blank(request.notes),
                    provisional_diagnosis: None,
                    ai_summary: None,
                };
                data.appointments.push(appointment.clone());
                Ok(appointment)
            })
            .await?;

        info!(
            "Scheduled appointment {} for {} on {} at {}",
            appointment.id, appointment.patient_name, appointment.date, appointment.time
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: &str) -> Result<Appointment, PracticeError> {
        let data = self.store.snapshot().await;
        find_appointment(&data, id).cloned()
    }

    /// Appointments matching the query, ordered by date then time.
    pub async fn list(&self, query: &AppointmentQuery) -> Vec<Appointment> {
        let data = self.store.snapshot().await;
        let mut appointments: Vec<Appointment> = data
            .appointments
            .into_iter()
            .filter(|a| query.date.map_or(true, |date| a.date == date))
            .filter(|a| query.patient_id.as_deref().map_or(true, |id| a.patient_id == id))
            .collect();
        appointments.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
        appointments
    }

    pub async fn on_date(&self, date: NaiveDate) -> Vec<Appointment> {
        self.list(&AppointmentQuery {
            date: Some(date),
            patient_id: None,
        })
        .await
    }

    pub async fn reschedule(
        &self,
        id: &str,
        date: NaiveDate,
        time: &str,
    ) -> Result<Appointment, PracticeError> {
        let time = validate_time(time)?;
        debug!("Rescheduling appointment {} to {} {}", id, date, time);

        self.store
            .try_modify(|data| {
                let appointment = find_appointment_mut(data, id)?;
                appointment.date = date;
                appointment.time = time;
                appointment.status = AppointmentStatus::Rescheduled;
                Ok(appointment.clone())
            })
            .await
    }

    /// Applies the fields present in `request`. A blank reason, note or
    /// diagnosis clears it.
    #[instrument(skip(self, request))]
    pub async fn update_appointment(
        &self,
        id: &str,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, PracticeError> {
        if request.duration_minutes == Some(0) {
            return Err(PracticeError::Validation("duration must be positive".into()));
        }

        self.store
            .try_modify(|data| {
                let appointment = find_appointment_mut(data, id)?;
                if let Some(modality) = request.modality {
                    appointment.modality = modality;
                }
                if let Some(duration_minutes) = request.duration_minutes {
                    appointment.duration_minutes = duration_minutes;
                }
                if request.reason.is_some() {
                    appointment.reason = non_blank(request.reason);
                }
                if request.notes.is_some() {
                    appointment.notes = non_blank(request.notes);
                }
                if request.provisional_diagnosis.is_some() {
                    appointment.provisional_diagnosis = non_blank(request.provisional_diagnosis);
                }
                Ok(appointment.clone())
            })
            .await
    }

    pub async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<Appointment, PracticeError> {
        debug!("Setting appointment {} status to {}", id, status);
        self.store
            .try_modify(|data| {
                let appointment = find_appointment_mut(data, id)?;
                appointment.status = status;
                Ok(appointment.clone())
            })
            .await
    }

    pub async fn cancel(&self, id: &str) -> Result<Appointment, PracticeError> {
        self.set_status(id, AppointmentStatus::Cancelled).await
    }

    /// `None` or a blank link clears it.
    pub async fn set_video_link(&self, id: &str, link: Option<String>) -> Result<Appointment, PracticeError> {
        let link = non_blank(link);
        self.store
            .try_modify(|data| {
                let appointment = find_appointment_mut(data, id)?;
                appointment.video_link = link;
                Ok(appointment.clone())
            })
            .await
    }

    /// Assigns a fresh video room link, replacing any existing one.
    pub async fn generate_video_link(&self, id: &str) -> Result<Appointment, PracticeError> {
        let link = format!("{}/{}", VIDEO_ROOM_BASE_URL, room_code());
        debug!("Generated video link {} for appointment {}", link, id);
        self.set_video_link(id, Some(link)).await
    }

    /// Builds a summary from the appointment's own fields and stores it on the
    /// appointment. When the patient still exists the summary also becomes
    /// their latest AI summary and is appended to their history.
    #[instrument(skip(self))]
    pub async fn generate_summary(&self, id: &str) -> Result<Appointment, PracticeError> {
        let appointment = self
            .store
            .try_modify(|data| {
                let appointment = find_appointment_mut(data, id)?;
                let summary = summarize(appointment);
                appointment.ai_summary = Some(summary.clone());
                let appointment = appointment.clone();

                if let Ok(patient) = find_patient_mut(data, &appointment.patient_id) {
                    patient.clinical_record.ai_summary = Some(summary.clone());
                    patient.clinical_record.history.push(HistoryEntry {
                        date: Utc::now(),
                        kind: SUMMARY_HISTORY_KIND.to_string(),
                        content: summary,
                    });
                }
                Ok::<_, PracticeError>(appointment)
            })
            .await?;

        info!("Generated summary for appointment {}", appointment.id);
        Ok(appointment)
    }

    pub async fn set_summary(&self, id: &str, summary: String) -> Result<Appointment, PracticeError> {
        self.store
            .try_modify(|data| {
                let appointment = find_appointment_mut(data, id)?;
                appointment.ai_summary = non_blank(Some(summary));
                Ok(appointment.clone())
            })
            .await
    }
}

/// Plain-text summary of a session, in the practice's language.
pub fn summarize(appointment: &Appointment) -> String {
    format!(
        "Resumo da consulta de {} em {}:\n\nMotivo: {}\nDuração: {} minutos\nLocal: {}\n\nObservações: {}",
        appointment.patient_name,
        appointment.date.format("%d/%m/%Y"),
        appointment.reason.as_deref().unwrap_or("Não especificado"),
        appointment.duration_minutes,
        match appointment.modality {
            Modality::Online => "Online",
            Modality::InPerson => "Presencial",
        },
        appointment.notes.as_deref().unwrap_or("Nenhuma observação registrada"),
    )
}

fn room_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
