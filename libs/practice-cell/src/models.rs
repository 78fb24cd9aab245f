use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared_models::{
    AppointmentStatus, CommunicationChannel, LinkedEntity, Modality, NotificationKind,
    PatientStatus, PaymentStatus, QuestionKind, TemplateKind,
};

// ==============================================================================
// PATIENT REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Comma separated, e.g. `"ansiedade, TCC"`.
    pub tags: Option<String>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub primary_diagnosis: Option<String>,
    pub status: Option<PatientStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientSearchQuery {
    pub q: Option<String>,
    pub status: Option<PatientStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePatientStatusRequest {
    pub status: PatientStatus,
}

/// Partial patient edit; absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Comma separated; replaces the whole tag list.
    pub tags: Option<String>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub primary_diagnosis: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClinicalRecordRequest {
    pub clinical_notes: Option<String>,
    pub current_complaints: Option<String>,
    pub plan: Option<String>,
    pub frequent_emotions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleEmotionRequest {
    pub emotion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateClinicalNotesRequest {
    pub clinical_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddHistoryEntryRequest {
    pub kind: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAttachmentRequest {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCommunicationRequest {
    pub channel: CommunicationChannel,
    pub message: String,
    #[serde(default = "default_sent")]
    pub sent: bool,
}

fn default_sent() -> bool {
    true
}

// ==============================================================================
// APPOINTMENT REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub modality: Option<Modality>,
    pub video_link: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentQuery {
    pub date: Option<NaiveDate>,
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoLinkRequest {
    pub video_link: Option<String>,
}

/// Partial appointment edit; absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub modality: Option<Modality>,
    pub duration_minutes: Option<u32>,
    /// Blank clears.
    pub reason: Option<String>,
    /// Blank clears.
    pub notes: Option<String>,
    /// Blank clears.
    pub provisional_diagnosis: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub summary: String,
}

// ==============================================================================
// FINANCE REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPaymentRequest {
    pub patient_id: String,
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub status: Option<PaymentStatus>,
    pub notes: Option<String>,
    pub appointment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub status: PaymentStatus,
}

// ==============================================================================
// NOTIFICATION / FORM / MESSAGING REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushNotificationRequest {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link_kind: Option<LinkedEntity>,
    pub link_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFormRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddQuestionRequest {
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

/// Partial question edit; absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateQuestionRequest {
    pub prompt: Option<String>,
    pub kind: Option<QuestionKind>,
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetFormActiveRequest {
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateRequest {
    pub name: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeRequest {
    pub kind: TemplateKind,
    pub appointment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersRequest {
    pub date: NaiveDate,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

/// A rendered message ready to hand to an external messenger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutgoingMessage {
    pub patient_id: String,
    pub patient_name: String,
    pub phone: String,
    pub appointment_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PracticeMetrics {
    pub total_patients: usize,
    pub active_patients: usize,
    pub at_risk_patients: usize,
    pub discharged_patients: usize,
    pub appointments_today: usize,
    pub appointments_this_month: usize,
    pub completed_appointments: usize,
    pub revenue_this_month: f64,
    pub pending_count: usize,
    pub pending_total: f64,
    /// Percentage of payment records still pending, one decimal.
    pub pending_rate: f64,
    /// Percentage of appointments cancelled, one decimal.
    pub cancellation_rate: f64,
    /// Mean amount of paid records.
    pub average_ticket: f64,
}
