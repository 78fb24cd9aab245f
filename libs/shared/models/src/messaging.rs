use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplate {
    pub id: String,
    pub name: String,
    pub kind: TemplateKind,
    /// Text with `{{variable}}` placeholders.
    pub body: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Reminder,
    Reschedule,
    Cancellation,
    Thanks,
    FollowUp,
    Custom,
}

/// Templates every new practice starts with.
pub fn default_message_templates() -> Vec<MessageTemplate> {
    vec![
        MessageTemplate {
            id: "1".to_string(),
            name: "Lembrete de Consulta".to_string(),
            kind: TemplateKind::Reminder,
            body: "Olá! Lembramos da sua consulta amanhã às {{hora}}.".to_string(),
        },
        MessageTemplate {
            id: "2".to_string(),
            name: "Reagendamento".to_string(),
            kind: TemplateKind::Reschedule,
            body: "Sua consulta foi reagendada para {{data}} às {{hora}}.".to_string(),
        },
        MessageTemplate {
            id: "3".to_string(),
            name: "Cancelamento".to_string(),
            kind: TemplateKind::Cancellation,
            body: "Sua consulta de {{data}} às {{hora}} foi cancelada.".to_string(),
        },
        MessageTemplate {
            id: "4".to_string(),
            name: "Agradecimento".to_string(),
            kind: TemplateKind::Thanks,
            body: "Obrigado(a) pelo comparecimento!".to_string(),
        },
        MessageTemplate {
            id: "5".to_string(),
            name: "Follow-up Pós-consulta".to_string(),
            kind: TemplateKind::FollowUp,
            body: "Como você está após nossa última sessão?".to_string(),
        },
    ]
}
