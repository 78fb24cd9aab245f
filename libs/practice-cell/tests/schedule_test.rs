use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::NaiveDate;

use practice_cell::services::{AppointmentService, FinanceService};
use practice_cell::{
    AddPaymentRequest, CreateAppointmentRequest, PracticeError, UpdateAppointmentRequest,
};
use shared_models::{AppointmentStatus, Modality, PaymentStatus};
use shared_utils::test_utils::{TestAppointment, TestPatient};
use store_cell::{MemoryStorage, StateStore, StoreConfig};

async fn store_with_ana() -> StateStore {
    let store = StateStore::open(
        Arc::new(MemoryStorage::new()),
        StoreConfig::new("synapsa-crm-data", Duration::from_millis(600)),
    )
    .await;
    store.set_patients(vec![TestPatient::new("1", "Ana")]).await;
    store
}

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

fn appointment_request(patient_id: &str, date: NaiveDate) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        patient_id: patient_id.to_string(),
        date,
        time: None,
        duration_minutes: None,
        modality: None,
        video_link: None,
        reason: None,
        notes: None,
    }
}

fn payment_request(patient_id: &str, amount: f64) -> AddPaymentRequest {
    AddPaymentRequest {
        patient_id: patient_id.to_string(),
        amount,
        date: None,
        payment_method: None,
        status: None,
        notes: None,
        appointment_id: None,
    }
}

#[tokio::test]
async fn test_create_appointment_applies_defaults() {
    let store = store_with_ana().await;
    let service = AppointmentService::new(&store);

    let appointment = service.create_appointment(appointment_request("1", may(2))).await.unwrap();

    assert_eq!(appointment.patient_name, "Ana");
    assert_eq!(appointment.time, "09:00");
    assert_eq!(appointment.duration_minutes, 60);
    assert_eq!(appointment.modality, Modality::InPerson);
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(store.snapshot().await.appointments.len(), 1);
}

#[tokio::test]
async fn test_create_appointment_validates_input() {
    let store = store_with_ana().await;
    let service = AppointmentService::new(&store);

    assert_matches!(
        service.create_appointment(appointment_request("404", may(2))).await,
        Err(PracticeError::NotFound { entity: "Patient", .. })
    );

    let mut bad_time = appointment_request("1", may(2));
    bad_time.time = Some("25:00".into());
    assert_matches!(service.create_appointment(bad_time).await, Err(PracticeError::Validation(_)));

    let mut zero = appointment_request("1", may(2));
    zero.duration_minutes = Some(0);
    assert_matches!(service.create_appointment(zero).await, Err(PracticeError::Validation(_)));

    assert!(store.snapshot().await.appointments.is_empty());
}

#[tokio::test]
async fn test_reschedule_and_cancel() {
    let store = store_with_ana().await;
    let service = AppointmentService::new(&store);
    let created = service.create_appointment(appointment_request("1", may(2))).await.unwrap();

    let moved = service.reschedule(&created.id, may(9), "15:30").await.unwrap();
    assert_eq!(moved.date, may(9));
    assert_eq!(moved.time, "15:30");
    assert_eq!(moved.status, AppointmentStatus::Rescheduled);

    assert_matches!(
        service.reschedule(&created.id, may(9), "3pm").await,
        Err(PracticeError::Validation(_))
    );

    let cancelled = service.cancel(&created.id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    // A cancelled visit can be booked again by moving it.
    let rebooked = service.reschedule(&created.id, may(10), "10:00").await.unwrap();
    assert_eq!(rebooked.status, AppointmentStatus::Rescheduled);
}

#[tokio::test]
async fn test_update_appointment_details() {
    let store = store_with_ana().await;
    let service = AppointmentService::new(&store);
    let mut request = appointment_request("1", may(2));
    request.reason = Some("Ansiedade".into());
    let created = service.create_appointment(request).await.unwrap();

    let updated = service
        .update_appointment(
            &created.id,
            UpdateAppointmentRequest {
                modality: Some(Modality::Online),
                duration_minutes: Some(50),
                notes: Some("Trazer diário do sono".into()),
                reason: Some(" ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.modality, Modality::Online);
    assert_eq!(updated.duration_minutes, 50);
    assert_eq!(updated.notes.as_deref(), Some("Trazer diário do sono"));
    assert_eq!(updated.reason, None);
    assert_eq!(updated.time, created.time);

    assert_matches!(
        service
            .update_appointment(
                &created.id,
                UpdateAppointmentRequest { duration_minutes: Some(0), ..Default::default() }
            )
            .await,
        Err(PracticeError::Validation(_))
    );
    assert_eq!(service.get_appointment(&created.id).await.unwrap().duration_minutes, 50);
}

#[tokio::test]
async fn test_generate_video_link() {
    let store = store_with_ana().await;
    let service = AppointmentService::new(&store);
    let created = service.create_appointment(appointment_request("1", may(2))).await.unwrap();

    let linked = service.generate_video_link(&created.id).await.unwrap();
    let link = linked.video_link.unwrap();
    let code = link.strip_prefix("https://meet.google.com/").unwrap();
    assert_eq!(code.len(), 9);

    assert_matches!(
        service.generate_video_link("404").await,
        Err(PracticeError::NotFound { entity: "Appointment", .. })
    );
}

#[tokio::test]
async fn test_generate_summary_updates_patient_record() {
    let store = store_with_ana().await;
    let service = AppointmentService::new(&store);
    let mut request = appointment_request("1", may(2));
    request.modality = Some(Modality::Online);
    request.duration_minutes = Some(50);
    request.reason = Some("Crises de ansiedade".into());
    let created = service.create_appointment(request).await.unwrap();

    let summarized = service.generate_summary(&created.id).await.unwrap();
    let summary = summarized.ai_summary.unwrap();
    assert_eq!(
        summary,
        "Resumo da consulta de Ana em 02/05/2024:\n\nMotivo: Crises de ansiedade\nDuração: 50 minutos\nLocal: Online\n\nObservações: Nenhuma observação registrada"
    );

    let ana = store.snapshot().await.patients.remove(0);
    assert_eq!(ana.clinical_record.ai_summary.as_deref(), Some(summary.as_str()));
    let last = ana.clinical_record.history.last().unwrap();
    assert_eq!(last.kind, "Consulta");
    assert_eq!(last.content, summary);

    // Without the patient only the appointment is updated.
    store.set_patients(vec![]).await;
    let again = service.generate_summary(&created.id).await.unwrap();
    assert!(again.ai_summary.is_some());
}

#[tokio::test]
async fn test_video_link_and_summary() {
    let store = store_with_ana().await;
    let service = AppointmentService::new(&store);
    let created = service.create_appointment(appointment_request("1", may(2))).await.unwrap();

    let updated = service
        .set_video_link(&created.id, Some("https://meet.example.com/abc".into()))
        .await
        .unwrap();
    assert_eq!(updated.video_link.as_deref(), Some("https://meet.example.com/abc"));

    let cleared = service.set_video_link(&created.id, Some("  ".into())).await.unwrap();
    assert_eq!(cleared.video_link, None);

    let summarized = service.set_summary(&created.id, "Paciente estável.".into()).await.unwrap();
    assert_eq!(summarized.ai_summary.as_deref(), Some("Paciente estável."));
}

#[tokio::test]
async fn test_on_date_is_sorted_by_time() {
    let store = store_with_ana().await;
    let ana = TestPatient::new("1", "Ana");
    store
        .set_appointments(vec![
            TestAppointment::new("a", &ana, may(2), "16:00"),
            TestAppointment::new("b", &ana, may(3), "08:00"),
            TestAppointment::new("c", &ana, may(2), "08:30"),
        ])
        .await;

    let day = AppointmentService::new(&store).on_date(may(2)).await;
    let ids: Vec<&str> = day.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);
}

#[tokio::test]
async fn test_add_payment_validates() {
    let store = store_with_ana().await;
    let service = FinanceService::new(&store);

    assert_matches!(
        service.add_payment(payment_request("1", 0.0), may(2)).await,
        Err(PracticeError::Validation(_))
    );
    assert_matches!(
        service.add_payment(payment_request("404", 100.0), may(2)).await,
        Err(PracticeError::NotFound { .. })
    );

    let payment = service.add_payment(payment_request("1", 180.0), may(2)).await.unwrap();
    assert_eq!(payment.patient_name, "Ana");
    assert_eq!(payment.date, may(2));
    assert_eq!(payment.payment_method, "pix");
    assert_eq!(payment.status, PaymentStatus::Pending);

    let paid = service.set_payment_status(&payment.id, PaymentStatus::Paid).await.unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_mark_appointment_paid_once() {
    let store = store_with_ana().await;
    store.set_default_appointment_price(250.0).await;
    let ana = TestPatient::new("1", "Ana");
    store
        .set_appointments(vec![TestAppointment::new("10", &ana, may(2), "14:00")])
        .await;
    let service = FinanceService::new(&store);

    let payment = service.mark_appointment_paid("10").await.unwrap();
    assert_eq!(payment.amount, 250.0);
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.payment_method, "pix");
    assert_eq!(payment.appointment_id.as_deref(), Some("10"));
    assert_eq!(payment.notes.as_deref(), Some("Consulta do dia 02/05/2024 às 14:00"));

    assert_matches!(service.mark_appointment_paid("10").await, Err(PracticeError::Conflict(_)));
    assert_matches!(service.mark_appointment_paid("99").await, Err(PracticeError::NotFound { .. }));
    assert_eq!(store.snapshot().await.payments.len(), 1);
}
