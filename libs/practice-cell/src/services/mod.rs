pub mod patients;
pub mod appointments;
pub mod finance;
pub mod notifications;
pub mod forms;
pub mod messaging;
pub mod metrics;

pub use patients::PatientService;
pub use appointments::AppointmentService;
pub use finance::FinanceService;
pub use notifications::NotificationService;
pub use forms::FormService;
pub use messaging::MessagingService;
pub use metrics::MetricsService;

use shared_models::{Appointment, Patient};
use store_cell::CrmData;

use crate::PracticeError;

pub(crate) fn find_patient<'a>(data: &'a CrmData, id: &str) -> Result<&'a Patient, PracticeError> {
    data.patients
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| PracticeError::not_found("Patient", id))
}

pub(crate) fn find_patient_mut<'a>(data: &'a mut CrmData, id: &str) -> Result<&'a mut Patient, PracticeError> {
    data.patients
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| PracticeError::not_found("Patient", id))
}

pub(crate) fn find_appointment<'a>(data: &'a CrmData, id: &str) -> Result<&'a Appointment, PracticeError> {
    data.appointments
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| PracticeError::not_found("Appointment", id))
}

pub(crate) fn find_appointment_mut<'a>(
    data: &'a mut CrmData,
    id: &str,
) -> Result<&'a mut Appointment, PracticeError> {
    data.appointments
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| PracticeError::not_found("Appointment", id))
}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required(field: &str, value: &str) -> Result<String, PracticeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PracticeError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// `Some` only for non-blank input.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
