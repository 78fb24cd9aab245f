use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use shared_models::{PaymentRecord, PaymentStatus};
use shared_utils::ids::timestamp_id;
use store_cell::StateStore;

use crate::models::AddPaymentRequest;
use crate::services::{find_appointment, find_patient, non_blank};
use crate::PracticeError;

pub const DEFAULT_PAYMENT_METHOD: &str = "pix";

pub struct FinanceService {
    store: StateStore,
}

impl FinanceService {
    pub fn new(store: &StateStore) -> Self {
        Self { store: store.clone() }
    }

    pub async fn list(&self) -> Vec<PaymentRecord> {
        let mut payments = self.store.snapshot().await.payments;
        payments.sort_by(|a, b| b.date.cmp(&a.date));
        payments
    }

    #[instrument(skip(self, request), fields(patient_id = %request.patient_id))]
    pub async fn add_payment(
        &self,
        request: AddPaymentRequest,
        today: NaiveDate,
    ) -> Result<PaymentRecord, PracticeError> {
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(PracticeError::Validation("amount must be greater than zero".into()));
        }

        let payment = self
            .store
            .try_modify(move |data| {
                let patient = find_patient(data, &request.patient_id)?;
                let payment = PaymentRecord {
                    id: timestamp_id(),
                    patient_id: patient.id.clone(),
                    patient_name: patient.name.clone(),
                    date: request.date.unwrap_or(today),
                    amount: request.amount,
                    payment_method: non_blank(request.payment_method)
                        .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
                    status: request.status.unwrap_or_default(),
                    notes: non_blank(request.notes),
                    appointment_id: non_blank(request.appointment_id),
                };
                data.payments.push(payment.clone());
                Ok(payment)
            })
            .await?;

        info!("Recorded payment {} of {:.2} for {}", payment.id, payment.amount, payment.patient_name);
        Ok(payment)
    }

    /// Books a paid record for the appointment at the default price. An
    /// appointment gets at most one financial record.
    #[instrument(skip(self))]
    pub async fn mark_appointment_paid(&self, appointment_id: &str) -> Result<PaymentRecord, PracticeError> {
        let payment = self
            .store
            .try_modify(|data| {
                if data
                    .payments
                    .iter()
                    .any(|p| p.appointment_id.as_deref() == Some(appointment_id))
                {
                    warn!("Appointment {} already has a payment record", appointment_id);
                    return Err(PracticeError::Conflict(format!(
                        "appointment {} already has a payment record",
                        appointment_id
                    )));
                }

                let appointment = find_appointment(data, appointment_id)?;
                find_patient(data, &appointment.patient_id)?;

                let payment = PaymentRecord {
                    id: timestamp_id(),
                    patient_id: appointment.patient_id.clone(),
                    patient_name: appointment.patient_name.clone(),
                    date: appointment.date,
                    amount: data.default_appointment_price,
                    payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
                    status: PaymentStatus::Paid,
                    notes: Some(format!(
                        "Consulta do dia {} às {}",
                        appointment.date.format("%d/%m/%Y"),
                        appointment.time
                    )),
                    appointment_id: Some(appointment.id.clone()),
                };
                data.payments.push(payment.clone());
                Ok(payment)
            })
            .await?;

        info!("Appointment {} marked as paid ({:.2})", appointment_id, payment.amount);
        Ok(payment)
    }

    pub async fn set_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, PracticeError> {
        self.store
            .try_modify(|data| {
                let payment = data
                    .payments
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| PracticeError::not_found("Payment", id))?;
                payment.status = status;
                Ok(payment.clone())
            })
            .await
    }
}
