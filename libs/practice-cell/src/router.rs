use axum::{
    routing::{get, patch, post, put},
    Router,
};

use store_cell::StateStore;

use crate::handlers::*;

pub fn create_practice_router(store: StateStore) -> Router {
    Router::new()
        // Patients
        .route("/patients", get(search_patients).post(create_patient))
        .route(
            "/patients/{id}",
            get(get_patient).patch(update_patient).delete(remove_patient),
        )
        .route("/patients/{id}/status", put(update_patient_status))
        .route("/patients/{id}/clinical-notes", put(update_clinical_notes))
        .route("/patients/{id}/clinical-record", patch(update_clinical_record))
        .route("/patients/{id}/emotions", post(toggle_emotion))
        .route("/patients/{id}/history", post(add_history_entry))
        .route("/patients/{id}/attachments", post(add_attachment))
        .route("/patients/{id}/communications", post(record_communication))
        // Appointments
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route("/appointments/{id}", get(get_appointment).patch(update_appointment))
        .route("/appointments/{id}/reschedule", post(reschedule_appointment))
        .route("/appointments/{id}/status", put(update_appointment_status))
        .route("/appointments/{id}/cancel", post(cancel_appointment))
        .route(
            "/appointments/{id}/video-link",
            put(set_video_link).post(generate_video_link),
        )
        .route("/appointments/{id}/summary", put(set_summary).post(generate_summary))
        .route("/appointments/{id}/pay", post(mark_appointment_paid))
        .route("/appointments/{id}/remind", post(send_reminder))
        // Payments
        .route("/payments", get(list_payments).post(add_payment))
        .route("/payments/{id}/status", put(update_payment_status))
        // Notifications
        .route("/notifications", get(list_notifications).post(push_notification))
        .route("/notifications/read-all", post(mark_all_notifications_read))
        .route("/notifications/{id}/read", post(mark_notification_read))
        // Intake forms
        .route("/forms", get(list_forms).post(create_form))
        .route("/forms/{id}/questions", post(add_form_question))
        .route(
            "/forms/{id}/questions/{question_id}",
            put(update_form_question).delete(remove_form_question),
        )
        .route("/forms/{id}/active", put(set_form_active))
        // Messaging
        .route("/messages/templates", get(list_templates).post(create_template))
        .route("/messages/templates/{id}", put(update_template).delete(delete_template))
        .route("/messages/compose", post(compose_message))
        .route("/messages/reminders", post(send_reminders))
        // Metrics
        .route("/metrics", get(get_metrics))
        .with_state(store)
}
