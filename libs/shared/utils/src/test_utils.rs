use chrono::{NaiveDate, Utc};
use serde_json::json;

use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentStatus, ClinicalRecord, Modality, Patient, PatientStatus,
    PaymentRecord, PaymentStatus,
};

pub struct TestConfig {
    pub assistant_base_url: String,
    pub transcribe_base_url: String,
    pub data_dir: String,
    pub debounce_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            assistant_base_url: "http://localhost:2024".to_string(),
            transcribe_base_url: "http://localhost:8000/api".to_string(),
            data_dir: std::env::temp_dir().join("synapsa-tests").display().to_string(),
            debounce_ms: 50,
        }
    }
}

impl TestConfig {
    /// Points both assistant endpoints at one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            assistant_base_url: uri.to_string(),
            transcribe_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            assistant_base_url: self.assistant_base_url.clone(),
            transcribe_base_url: self.transcribe_base_url.clone(),
            data_dir: self.data_dir.clone(),
            autosave_debounce_ms: self.debounce_ms,
            ..AppConfig::default()
        }
    }
}

pub struct TestPatient;

impl TestPatient {
    pub fn new(id: &str, name: &str) -> Patient {
        Patient {
            id: id.to_string(),
            name: name.to_string(),
            phone: "(11) 98765-4321".to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            status: PatientStatus::Active,
            next_appointment: None,
            last_appointment: None,
            primary_diagnosis: None,
            tags: vec![],
            responsible: "Agente Principal".to_string(),
            notes: String::new(),
            clinical_record: ClinicalRecord::default(),
            communication_log: vec![],
            created_at: Utc::now(),
        }
    }

    pub fn with_status(id: &str, name: &str, status: PatientStatus) -> Patient {
        Patient {
            status,
            ..Self::new(id, name)
        }
    }

    pub fn without_phone(id: &str, name: &str) -> Patient {
        Patient {
            phone: String::new(),
            ..Self::new(id, name)
        }
    }
}

pub struct TestAppointment;

impl TestAppointment {
    pub fn new(id: &str, patient: &Patient, date: NaiveDate, time: &str) -> Appointment {
        Appointment {
            id: id.to_string(),
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            date,
            time: time.to_string(),
            duration_minutes: 60,
            modality: Modality::InPerson,
            video_link: None,
            status: AppointmentStatus::Confirmed,
            reason: None,
            notes: None,
            provisional_diagnosis: None,
            ai_summary: None,
        }
    }

    pub fn with_status(
        id: &str,
        patient: &Patient,
        date: NaiveDate,
        status: AppointmentStatus,
    ) -> Appointment {
        Appointment {
            status,
            ..Self::new(id, patient, date, "09:00")
        }
    }
}

pub struct TestPayment;

impl TestPayment {
    pub fn new(id: &str, patient: &Patient, date: NaiveDate, amount: f64, status: PaymentStatus) -> PaymentRecord {
        PaymentRecord {
            id: id.to_string(),
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            date,
            amount,
            payment_method: "pix".to_string(),
            status,
            notes: None,
            appointment_id: None,
        }
    }
}

pub struct MockAssistantResponses;

impl MockAssistantResponses {
    pub fn output_reply(text: &str) -> serde_json::Value {
        json!({
            "output": text,
            "messages": []
        })
    }

    pub fn reply_text(text: &str) -> serde_json::Value {
        json!({
            "reply_text": text,
            "run_id": "run-test"
        })
    }

    pub fn transcription(text: &str) -> serde_json::Value {
        json!({ "text": text })
    }

    pub fn transcription_error(message: &str) -> serde_json::Value {
        json!({ "error": message })
    }
}
