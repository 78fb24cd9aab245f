use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument};

use shared_models::{
    Appointment, AppointmentStatus, CommunicationChannel, CommunicationEntry, MessageTemplate,
    Patient, TemplateKind,
};
use shared_utils::ids::timestamp_id;
use store_cell::{CrmData, StateStore};

use crate::models::{OutgoingMessage, TemplateRequest};
use crate::services::{find_appointment, find_patient, find_patient_mut, non_blank, required};
use crate::template::render_template;
use crate::PracticeError;

pub const NEW_TEMPLATE_NAME: &str = "Nova Mensagem";
pub const NEW_TEMPLATE_BODY: &str = "Digite sua mensagem aqui...";

pub struct MessagingService {
    store: StateStore,
}

impl MessagingService {
    pub fn new(store: &StateStore) -> Self {
        Self { store: store.clone() }
    }

    pub async fn templates(&self) -> Vec<MessageTemplate> {
        self.store.snapshot().await.message_templates
    }

    pub async fn create_custom_template(&self, request: TemplateRequest) -> Result<MessageTemplate, PracticeError> {
        let template = MessageTemplate {
            id: timestamp_id(),
            name: non_blank(request.name).unwrap_or_else(|| NEW_TEMPLATE_NAME.to_string()),
            kind: TemplateKind::Custom,
            body: request.body.unwrap_or_else(|| NEW_TEMPLATE_BODY.to_string()),
        };

        debug!("Creating custom template {}", template.id);
        let created = template.clone();
        self.store.modify(move |data| data.message_templates.push(template)).await;
        Ok(created)
    }

    /// Only the fields present in `request` change.
    pub async fn update_template(&self, id: &str, request: TemplateRequest) -> Result<MessageTemplate, PracticeError> {
        let name = match request.name {
            Some(name) => Some(required("name", &name)?),
            None => None,
        };

        self.store
            .try_modify(|data| {
                let template = data
                    .message_templates
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| PracticeError::not_found("Template", id))?;
                if let Some(name) = name {
                    template.name = name;
                }
                if let Some(body) = request.body {
                    template.body = body;
                }
                Ok(template.clone())
            })
            .await
    }

    pub async fn delete_template(&self, id: &str) -> Result<(), PracticeError> {
        self.store
            .try_modify(|data| {
                let before = data.message_templates.len();
                data.message_templates.retain(|t| t.id != id);
                if data.message_templates.len() == before {
                    return Err(PracticeError::not_found("Template", id));
                }
                Ok(())
            })
            .await
    }

    /// Renders the message of `kind` for one appointment without sending it.
    pub async fn compose(&self, kind: TemplateKind, appointment_id: &str) -> Result<OutgoingMessage, PracticeError> {
        let data = self.store.snapshot().await;
        let appointment = find_appointment(&data, appointment_id)?;
        let patient = find_patient(&data, &appointment.patient_id)?;
        Ok(compose_message(&data.message_templates, kind, appointment, patient))
    }

    /// Composes the reminder for one appointment and logs it in the patient's
    /// communication history.
    #[instrument(skip(self))]
    pub async fn send_reminder(&self, appointment_id: &str) -> Result<OutgoingMessage, PracticeError> {
        self.store
            .try_modify(|data| {
                let appointment = find_appointment(data, appointment_id)?.clone();
                let patient = find_patient(data, &appointment.patient_id)?;
                if !patient.has_phone() {
                    return Err(PracticeError::Validation(format!(
                        "patient {} has no phone number",
                        patient.id
                    )));
                }

                let message = compose_message(&data.message_templates, TemplateKind::Reminder, &appointment, patient);
                log_whatsapp(find_patient_mut(data, &message.patient_id)?, &message.text);
                Ok(message)
            })
            .await
    }

    /// Reminders for every non-cancelled appointment on `date` whose patient
    /// has a phone number, each logged in that patient's history.
    #[instrument(skip(self))]
    pub async fn reminders_for_date(&self, date: NaiveDate) -> Vec<OutgoingMessage> {
        let messages = self
            .store
            .modify_if_changed(|data| {
                let CrmData {
                    appointments,
                    patients,
                    message_templates,
                    ..
                } = data;

                let mut due: Vec<&Appointment> = appointments
                    .iter()
                    .filter(|a| a.date == date && a.status != AppointmentStatus::Cancelled)
                    .collect();
                due.sort_by(|a, b| a.time.cmp(&b.time));

                let mut messages = Vec::new();
                for appointment in due {
                    let Some(patient) = patients.iter_mut().find(|p| p.id == appointment.patient_id) else {
                        debug!("Skipping appointment {}: patient is gone", appointment.id);
                        continue;
                    };
                    if !patient.has_phone() {
                        debug!("Skipping appointment {}: no phone for {}", appointment.id, patient.name);
                        continue;
                    }

                    let message = compose_message(
                        message_templates.as_slice(),
                        TemplateKind::Reminder,
                        appointment,
                        &*patient,
                    );
                    log_whatsapp(patient, &message.text);
                    messages.push(message);
                }

                (!messages.is_empty()).then_some(messages)
            })
            .await
            .unwrap_or_default();

        info!("Prepared {} reminders for {}", messages.len(), date);
        messages
    }
}

/// Uses the first template of `kind`, or a built-in text when there is none.
pub fn compose_message(
    templates: &[MessageTemplate],
    kind: TemplateKind,
    appointment: &Appointment,
    patient: &Patient,
) -> OutgoingMessage {
    let date = appointment.date.format("%d/%m/%Y").to_string();

    let text = match templates.iter().find(|t| t.kind == kind) {
        Some(template) => {
            let vars = HashMap::from([
                ("data", date),
                ("hora", appointment.time.clone()),
                ("paciente", patient.name.clone()),
            ]);
            render_template(&template.body, &vars)
        }
        None => fallback_text(kind, &patient.name, &date, &appointment.time),
    };

    OutgoingMessage {
        patient_id: patient.id.clone(),
        patient_name: patient.name.clone(),
        phone: patient.phone.clone(),
        appointment_id: appointment.id.clone(),
        text,
    }
}

fn fallback_text(kind: TemplateKind, name: &str, date: &str, time: &str) -> String {
    match kind {
        TemplateKind::Reminder | TemplateKind::Custom => format!(
            "Olá {}, lembramos que você tem consulta agendada para {} às {}.",
            name, date, time
        ),
        TemplateKind::Reschedule => format!(
            "Olá {}, sua consulta foi reagendada para {} às {}.",
            name, date, time
        ),
        TemplateKind::Cancellation => format!(
            "Olá {}, informamos que sua consulta de {} às {} foi cancelada.",
            name, date, time
        ),
        TemplateKind::Thanks => format!("Olá {}, obrigado(a) pelo comparecimento!", name),
        TemplateKind::FollowUp => format!("Olá {}, como você está após nossa última sessão?", name),
    }
}

fn log_whatsapp(patient: &mut Patient, text: &str) {
    patient.communication_log.push(CommunicationEntry {
        date: Utc::now(),
        channel: CommunicationChannel::Whatsapp,
        message: text.to_string(),
        sent: true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::default_message_templates;
    use shared_utils::test_utils::{TestAppointment, TestPatient};

    fn fixture() -> (Patient, Appointment) {
        let ana = TestPatient::new("1", "Ana");
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let appointment = TestAppointment::new("10", &ana, date, "14:30");
        (ana, appointment)
    }

    #[test]
    fn test_compose_uses_template_of_kind() {
        let (ana, appointment) = fixture();
        let message = compose_message(&default_message_templates(), TemplateKind::Reschedule, &appointment, &ana);
        assert_eq!(message.text, "Sua consulta foi reagendada para 02/05/2024 às 14:30.");
        assert_eq!(message.phone, ana.phone);
    }

    #[test]
    fn test_compose_falls_back_without_template() {
        let (ana, appointment) = fixture();
        let message = compose_message(&[], TemplateKind::Cancellation, &appointment, &ana);
        assert_eq!(
            message.text,
            "Olá Ana, informamos que sua consulta de 02/05/2024 às 14:30 foi cancelada."
        );
    }

    #[test]
    fn test_compose_substitutes_patient_name() {
        let (ana, appointment) = fixture();
        let templates = vec![MessageTemplate {
            id: "9".into(),
            name: "Pessoal".into(),
            kind: TemplateKind::Custom,
            body: "Oi {{ paciente }}, até {{data}}! {{assinatura}}".into(),
        }];
        let message = compose_message(&templates, TemplateKind::Custom, &appointment, &ana);
        assert_eq!(message.text, "Oi Ana, até 02/05/2024! {{assinatura}}");
    }
}
