use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde_json::{json, Value};

use shared_models::error::AppError;
use store_cell::StateStore;

use crate::models::*;
use crate::services::*;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ==============================================================================
// PATIENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_patient(
    State(store): State<StateStore>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&store).create_patient(request).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(store): State<StateStore>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let patients = PatientService::new(&store).search(&query).await;
    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&store).get_patient(&patient_id).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn remove_patient(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    PatientService::new(&store).remove_patient(&patient_id).await?;
    Ok(Json(json!({ "removed": patient_id })))
}

#[axum::debug_handler]
pub async fn update_patient_status(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdatePatientStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&store)
        .update_status(&patient_id, request.status)
        .await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&store).update_patient(&patient_id, request).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_clinical_record(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdateClinicalRecordRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&store)
        .update_clinical_record(&patient_id, request)
        .await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn toggle_emotion(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
    Json(request): Json<ToggleEmotionRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&store)
        .toggle_emotion(&patient_id, &request.emotion)
        .await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_clinical_notes(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdateClinicalNotesRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&store)
        .update_clinical_notes(&patient_id, request.clinical_notes)
        .await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn add_history_entry(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
    Json(request): Json<AddHistoryEntryRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = PatientService::new(&store)
        .add_history_entry(&patient_id, &request.kind, &request.content)
        .await?;
    Ok(Json(json!(entry)))
}

#[axum::debug_handler]
pub async fn add_attachment(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
    Json(request): Json<AddAttachmentRequest>,
) -> Result<Json<Value>, AppError> {
    let attachment = PatientService::new(&store)
        .add_attachment(&patient_id, &request.name, &request.url)
        .await?;
    Ok(Json(json!(attachment)))
}

#[axum::debug_handler]
pub async fn record_communication(
    State(store): State<StateStore>,
    Path(patient_id): Path<String>,
    Json(request): Json<RecordCommunicationRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = PatientService::new(&store)
        .record_communication(&patient_id, request.channel, &request.message, request.sent)
        .await?;
    Ok(Json(json!(entry)))
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(store): State<StateStore>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store).create_appointment(request).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(store): State<StateStore>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = AppointmentService::new(&store).list(&query).await;
    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store).get_appointment(&appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store)
        .update_appointment(&appointment_id, request)
        .await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store)
        .reschedule(&appointment_id, request.date, &request.time)
        .await?;
    let message = MessagingService::new(&store)
        .compose(shared_models::TemplateKind::Reschedule, &appointment.id)
        .await
        .ok();

    Ok(Json(json!({
        "appointment": appointment,
        "message": message
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateAppointmentStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store)
        .set_status(&appointment_id, request.status)
        .await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store).cancel(&appointment_id).await?;
    let message = MessagingService::new(&store)
        .compose(shared_models::TemplateKind::Cancellation, &appointment.id)
        .await
        .ok();

    Ok(Json(json!({
        "appointment": appointment,
        "message": message
    })))
}

#[axum::debug_handler]
pub async fn set_video_link(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
    Json(request): Json<VideoLinkRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store)
        .set_video_link(&appointment_id, request.video_link)
        .await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn generate_video_link(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store)
        .generate_video_link(&appointment_id)
        .await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn generate_summary(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store)
        .generate_summary(&appointment_id)
        .await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn set_summary(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentService::new(&store)
        .set_summary(&appointment_id, request.summary)
        .await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn mark_appointment_paid(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let payment = FinanceService::new(&store)
        .mark_appointment_paid(&appointment_id)
        .await?;
    Ok(Json(json!(payment)))
}

#[axum::debug_handler]
pub async fn send_reminder(
    State(store): State<StateStore>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let message = MessagingService::new(&store).send_reminder(&appointment_id).await?;
    Ok(Json(json!(message)))
}

// ==============================================================================
// PAYMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_payments(
    State(store): State<StateStore>,
) -> Result<Json<Value>, AppError> {
    let payments = FinanceService::new(&store).list().await;
    Ok(Json(json!({
        "payments": payments,
        "total": payments.len()
    })))
}

#[axum::debug_handler]
pub async fn add_payment(
    State(store): State<StateStore>,
    Json(request): Json<AddPaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let payment = FinanceService::new(&store).add_payment(request, today()).await?;
    Ok(Json(json!(payment)))
}

#[axum::debug_handler]
pub async fn update_payment_status(
    State(store): State<StateStore>,
    Path(payment_id): Path<String>,
    Json(request): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let payment = FinanceService::new(&store)
        .set_payment_status(&payment_id, request.status)
        .await?;
    Ok(Json(json!(payment)))
}

// ==============================================================================
// NOTIFICATIONS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_notifications(
    State(store): State<StateStore>,
) -> Result<Json<Value>, AppError> {
    let service = NotificationService::new(&store);
    let notifications = service.list().await;
    let unread = service.unread_count().await;
    Ok(Json(json!({
        "notifications": notifications,
        "unread": unread
    })))
}

#[axum::debug_handler]
pub async fn push_notification(
    State(store): State<StateStore>,
    Json(request): Json<PushNotificationRequest>,
) -> Result<Json<Value>, AppError> {
    let link = match (request.link_kind, request.link_id) {
        (Some(kind), Some(id)) => Some((kind, id)),
        (None, None) => None,
        _ => {
            return Err(AppError::ValidationError(
                "link_kind and link_id must be given together".into(),
            ))
        }
    };

    let notification = NotificationService::new(&store)
        .push(request.kind, &request.title, &request.message, link)
        .await?;
    Ok(Json(json!(notification)))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(store): State<StateStore>,
    Path(notification_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let notification = NotificationService::new(&store).mark_read(&notification_id).await?;
    Ok(Json(json!(notification)))
}

#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    State(store): State<StateStore>,
) -> Result<Json<Value>, AppError> {
    let updated = NotificationService::new(&store).mark_all_read().await;
    Ok(Json(json!({ "updated": updated })))
}

// ==============================================================================
// INTAKE FORMS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_forms(
    State(store): State<StateStore>,
) -> Result<Json<Value>, AppError> {
    let forms = FormService::new(&store).list().await;
    Ok(Json(json!({ "forms": forms })))
}

#[axum::debug_handler]
pub async fn create_form(
    State(store): State<StateStore>,
    Json(request): Json<CreateFormRequest>,
) -> Result<Json<Value>, AppError> {
    let form = FormService::new(&store).create_form(&request.name).await?;
    Ok(Json(json!(form)))
}

#[axum::debug_handler]
pub async fn add_form_question(
    State(store): State<StateStore>,
    Path(form_id): Path<String>,
    Json(request): Json<AddQuestionRequest>,
) -> Result<Json<Value>, AppError> {
    let form = FormService::new(&store).add_question(&form_id, request).await?;
    Ok(Json(json!(form)))
}

#[axum::debug_handler]
pub async fn update_form_question(
    State(store): State<StateStore>,
    Path((form_id, question_id)): Path<(String, String)>,
    Json(request): Json<UpdateQuestionRequest>,
) -> Result<Json<Value>, AppError> {
    let form = FormService::new(&store)
        .update_question(&form_id, &question_id, request)
        .await?;
    Ok(Json(json!(form)))
}

#[axum::debug_handler]
pub async fn remove_form_question(
    State(store): State<StateStore>,
    Path((form_id, question_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let form = FormService::new(&store)
        .remove_question(&form_id, &question_id)
        .await?;
    Ok(Json(json!(form)))
}

#[axum::debug_handler]
pub async fn set_form_active(
    State(store): State<StateStore>,
    Path(form_id): Path<String>,
    Json(request): Json<SetFormActiveRequest>,
) -> Result<Json<Value>, AppError> {
    let form = FormService::new(&store).set_active(&form_id, request.active).await?;
    Ok(Json(json!(form)))
}

// ==============================================================================
// MESSAGING
// ==============================================================================

#[axum::debug_handler]
pub async fn list_templates(
    State(store): State<StateStore>,
) -> Result<Json<Value>, AppError> {
    let templates = MessagingService::new(&store).templates().await;
    Ok(Json(json!({ "templates": templates })))
}

#[axum::debug_handler]
pub async fn create_template(
    State(store): State<StateStore>,
    Json(request): Json<TemplateRequest>,
) -> Result<Json<Value>, AppError> {
    let template = MessagingService::new(&store).create_custom_template(request).await?;
    Ok(Json(json!(template)))
}

#[axum::debug_handler]
pub async fn update_template(
    State(store): State<StateStore>,
    Path(template_id): Path<String>,
    Json(request): Json<TemplateRequest>,
) -> Result<Json<Value>, AppError> {
    let template = MessagingService::new(&store)
        .update_template(&template_id, request)
        .await?;
    Ok(Json(json!(template)))
}

#[axum::debug_handler]
pub async fn delete_template(
    State(store): State<StateStore>,
    Path(template_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    MessagingService::new(&store).delete_template(&template_id).await?;
    Ok(Json(json!({ "removed": template_id })))
}

#[axum::debug_handler]
pub async fn compose_message(
    State(store): State<StateStore>,
    Json(request): Json<ComposeRequest>,
) -> Result<Json<Value>, AppError> {
    let message = MessagingService::new(&store)
        .compose(request.kind, &request.appointment_id)
        .await?;
    Ok(Json(json!(message)))
}

#[axum::debug_handler]
pub async fn send_reminders(
    State(store): State<StateStore>,
    Json(request): Json<RemindersRequest>,
) -> Result<Json<Value>, AppError> {
    let messages = MessagingService::new(&store).reminders_for_date(request.date).await;
    Ok(Json(json!({
        "date": request.date,
        "messages": messages,
        "total": messages.len()
    })))
}

// ==============================================================================
// METRICS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_metrics(
    State(store): State<StateStore>,
) -> Result<Json<Value>, AppError> {
    let metrics = MetricsService::new(&store).compute(today()).await;
    Ok(Json(json!(metrics)))
}
