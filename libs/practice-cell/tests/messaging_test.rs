use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::NaiveDate;

use practice_cell::services::{FormService, MessagingService, NotificationService};
use practice_cell::{AddQuestionRequest, PracticeError, TemplateRequest, UpdateQuestionRequest};
use shared_models::{
    AppointmentStatus, CommunicationChannel, LinkedEntity, NotificationKind, QuestionKind,
    TemplateKind,
};
use shared_utils::test_utils::{TestAppointment, TestPatient};
use store_cell::{MemoryStorage, StateStore, StoreConfig};

async fn test_store() -> StateStore {
    StateStore::open(
        Arc::new(MemoryStorage::new()),
        StoreConfig::new("synapsa-crm-data", Duration::from_millis(600)),
    )
    .await
}

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

async fn seeded_schedule() -> StateStore {
    let store = test_store().await;
    let ana = TestPatient::new("1", "Ana");
    let bruno = TestPatient::without_phone("2", "Bruno");
    let carla = TestPatient::new("3", "Carla");
    store
        .set_appointments(vec![
            TestAppointment::new("10", &ana, may(3), "14:00"),
            TestAppointment::new("11", &bruno, may(3), "10:00"),
            TestAppointment::with_status("12", &carla, may(3), AppointmentStatus::Cancelled),
            TestAppointment::new("13", &carla, may(4), "09:00"),
        ])
        .await;
    store.set_patients(vec![ana, bruno, carla]).await;
    store
}

#[tokio::test]
async fn test_compose_uses_current_templates() {
    let store = seeded_schedule().await;
    let service = MessagingService::new(&store);

    let message = service.compose(TemplateKind::Reminder, "10").await.unwrap();
    assert_eq!(message.text, "Olá! Lembramos da sua consulta amanhã às 14:00.");
    assert_eq!(message.patient_name, "Ana");

    store.set_message_templates(vec![]).await;
    let message = service.compose(TemplateKind::Reminder, "10").await.unwrap();
    assert_eq!(
        message.text,
        "Olá Ana, lembramos que você tem consulta agendada para 03/05/2024 às 14:00."
    );

    assert_matches!(
        service.compose(TemplateKind::Reminder, "99").await,
        Err(PracticeError::NotFound { entity: "Appointment", .. })
    );
}

#[tokio::test]
async fn test_reminders_skip_patients_without_phone_and_cancelled_visits() {
    let store = seeded_schedule().await;
    let service = MessagingService::new(&store);

    let messages = service.reminders_for_date(may(3)).await;

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].patient_id, "1");
    assert_eq!(messages[0].appointment_id, "10");

    let patients = store.snapshot().await.patients;
    let ana = patients.iter().find(|p| p.id == "1").unwrap();
    assert_eq!(ana.communication_log.len(), 1);
    assert_eq!(ana.communication_log[0].channel, CommunicationChannel::Whatsapp);
    assert_eq!(ana.communication_log[0].message, messages[0].text);
    assert!(patients.iter().filter(|p| p.id != "1").all(|p| p.communication_log.is_empty()));
}

#[tokio::test]
async fn test_empty_reminder_batch_changes_nothing() {
    let store = seeded_schedule().await;
    store.save_now().await.unwrap();
    let changes = store.subscribe();

    let messages = MessagingService::new(&store).reminders_for_date(may(20)).await;

    assert!(messages.is_empty());
    assert!(!changes.has_changed().unwrap());
    assert!(!store.is_dirty());
}

#[tokio::test]
async fn test_send_reminder_requires_phone() {
    let store = seeded_schedule().await;
    let service = MessagingService::new(&store);

    let message = service.send_reminder("13").await.unwrap();
    assert_eq!(message.patient_name, "Carla");

    assert_matches!(service.send_reminder("11").await, Err(PracticeError::Validation(_)));
}

#[tokio::test]
async fn test_custom_templates() {
    let store = test_store().await;
    let service = MessagingService::new(&store);

    let created = service.create_custom_template(TemplateRequest::default()).await.unwrap();
    assert_eq!(created.name, "Nova Mensagem");
    assert_eq!(created.kind, TemplateKind::Custom);
    assert_eq!(service.templates().await.len(), 6);

    let updated = service
        .update_template(
            &created.id,
            TemplateRequest {
                name: None,
                body: Some("Oi {{paciente}}".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Nova Mensagem");
    assert_eq!(updated.body, "Oi {{paciente}}");

    assert_matches!(
        service
            .update_template(&created.id, TemplateRequest { name: Some(" ".into()), body: None })
            .await,
        Err(PracticeError::Validation(_))
    );

    service.delete_template(&created.id).await.unwrap();
    assert_eq!(service.templates().await.len(), 5);
}

#[tokio::test]
async fn test_notifications() {
    let store = test_store().await;
    let service = NotificationService::new(&store);

    let alert = service
        .push(
            NotificationKind::Alert,
            "Paciente em risco",
            "Ana faltou duas sessões",
            Some((LinkedEntity::Patient, "1".into())),
        )
        .await
        .unwrap();
    service
        .push(NotificationKind::Info, "Nova mensagem", "", None)
        .await
        .unwrap();
    assert_eq!(service.unread_count().await, 2);

    let read = service.mark_read(&alert.id).await.unwrap();
    assert!(read.read);
    assert_eq!(service.unread_count().await, 1);

    assert_eq!(service.mark_all_read().await, 1);
    assert_eq!(service.unread_count().await, 0);

    let changes = store.subscribe();
    assert_eq!(service.mark_all_read().await, 0);
    assert!(!changes.has_changed().unwrap());

    assert_matches!(
        service.push(NotificationKind::Info, " ", "x", None).await,
        Err(PracticeError::Validation(_))
    );
}

#[tokio::test]
async fn test_intake_forms() {
    let store = test_store().await;
    let service = FormService::new(&store);

    assert_matches!(service.create_form("").await, Err(PracticeError::Validation(_)));

    let form = service.create_form("Triagem inicial").await.unwrap();
    assert!(form.active);

    let form = service
        .add_question(
            &form.id,
            AddQuestionRequest {
                prompt: "Como você avalia seu sono?".into(),
                kind: QuestionKind::Scale,
                options: vec!["ignored".into()],
                required: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(form.questions.len(), 1);
    assert!(form.questions[0].options.is_empty());

    let single_option = AddQuestionRequest {
        prompt: "Modalidade preferida".into(),
        kind: QuestionKind::MultipleChoice,
        options: vec!["Online".into()],
        required: false,
    };
    assert_matches!(
        service.add_question(&form.id, single_option).await,
        Err(PracticeError::Validation(_))
    );

    let form = service.set_active(&form.id, false).await.unwrap();
    assert!(!form.active);
    assert_eq!(service.list().await.len(), 1);
}

#[tokio::test]
async fn test_edit_and_remove_questions() {
    let store = test_store().await;
    let service = FormService::new(&store);
    let form = service.create_form("Triagem").await.unwrap();
    let form = service
        .add_question(
            &form.id,
            AddQuestionRequest {
                prompt: "Preferência de modalidade".into(),
                kind: QuestionKind::Text,
                options: vec![],
                required: false,
            },
        )
        .await
        .unwrap();
    let question_id = form.questions[0].id.clone();

    let form = service
        .update_question(
            &form.id,
            &question_id,
            UpdateQuestionRequest {
                kind: Some(QuestionKind::MultipleChoice),
                options: Some(vec!["Presencial".into(), " Online ".into(), "".into()]),
                required: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let question = &form.questions[0];
    assert_eq!(question.prompt, "Preferência de modalidade");
    assert_eq!(question.kind, QuestionKind::MultipleChoice);
    assert_eq!(question.options, vec!["Presencial", "Online"]);
    assert!(question.required);

    // Dropping to one option is rejected and leaves the question intact.
    assert_matches!(
        service
            .update_question(
                &form.id,
                &question_id,
                UpdateQuestionRequest {
                    options: Some(vec!["Online".into()]),
                    ..Default::default()
                },
            )
            .await,
        Err(PracticeError::Validation(_))
    );
    assert_eq!(service.list().await[0].questions[0].options.len(), 2);

    let form = service
        .update_question(
            &form.id,
            &question_id,
            UpdateQuestionRequest {
                prompt: Some("Como prefere ser atendido?".into()),
                kind: Some(QuestionKind::Text),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(form.questions[0].prompt, "Como prefere ser atendido?");
    assert!(form.questions[0].options.is_empty());

    assert_matches!(
        service.update_question(&form.id, "404", UpdateQuestionRequest::default()).await,
        Err(PracticeError::NotFound { entity: "Question", .. })
    );

    let form = service.remove_question(&form.id, &question_id).await.unwrap();
    assert!(form.questions.is_empty());
    assert_matches!(
        service.remove_question(&form.id, &question_id).await,
        Err(PracticeError::NotFound { .. })
    );
}
