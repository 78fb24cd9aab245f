use chrono::{Datelike, NaiveDate};

use shared_models::{AppointmentStatus, PatientStatus, PaymentStatus};
use store_cell::{CrmData, StateStore};

use crate::models::PracticeMetrics;

pub struct MetricsService {
    store: StateStore,
}

impl MetricsService {
    pub fn new(store: &StateStore) -> Self {
        Self { store: store.clone() }
    }

    pub async fn compute(&self, today: NaiveDate) -> PracticeMetrics {
        let data = self.store.snapshot().await;
        practice_metrics(&data, today)
    }
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

pub fn practice_metrics(data: &CrmData, today: NaiveDate) -> PracticeMetrics {
    let count_status = |status: PatientStatus| data.patients.iter().filter(|p| p.status == status).count();

    let cancelled = data
        .appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Cancelled)
        .count();

    let paid: Vec<f64> = data
        .payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Paid)
        .map(|p| p.amount)
        .collect();

    let pending: Vec<f64> = data
        .payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Pending)
        .map(|p| p.amount)
        .collect();

    let average_ticket = if paid.is_empty() {
        0.0
    } else {
        paid.iter().sum::<f64>() / paid.len() as f64
    };

    PracticeMetrics {
        total_patients: data.patients.len(),
        active_patients: count_status(PatientStatus::Active),
        at_risk_patients: count_status(PatientStatus::AtRisk),
        discharged_patients: count_status(PatientStatus::Discharged),
        appointments_today: data.appointments.iter().filter(|a| a.date == today).count(),
        appointments_this_month: data
            .appointments
            .iter()
            .filter(|a| same_month(a.date, today))
            .count(),
        completed_appointments: data
            .appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .count(),
        revenue_this_month: data
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Paid && same_month(p.date, today))
            .map(|p| p.amount)
            .sum(),
        pending_count: pending.len(),
        pending_total: pending.iter().sum(),
        pending_rate: percentage(pending.len(), data.payments.len()),
        cancellation_rate: percentage(cancelled, data.appointments.len()),
        average_ticket,
    }
}
