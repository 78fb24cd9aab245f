use tracing::{debug, info};

use shared_models::{IntakeForm, IntakeQuestion, QuestionKind};
use shared_utils::ids::timestamp_id;
use store_cell::StateStore;

use crate::models::{AddQuestionRequest, UpdateQuestionRequest};
use crate::services::required;
use crate::PracticeError;

pub struct FormService {
    store: StateStore,
}

impl FormService {
    pub fn new(store: &StateStore) -> Self {
        Self { store: store.clone() }
    }

    pub async fn list(&self) -> Vec<IntakeForm> {
        self.store.snapshot().await.intake_forms
    }

    /// New forms start active with no questions.
    pub async fn create_form(&self, name: &str) -> Result<IntakeForm, PracticeError> {
        let form = IntakeForm {
            id: timestamp_id(),
            name: required("name", name)?,
            questions: Vec::new(),
            active: true,
        };

        info!("Created intake form {} ({})", form.id, form.name);
        let created = form.clone();
        self.store.modify(move |data| data.intake_forms.push(form)).await;
        Ok(created)
    }

    pub async fn add_question(
        &self,
        form_id: &str,
        request: AddQuestionRequest,
    ) -> Result<IntakeForm, PracticeError> {
        let prompt = required("prompt", &request.prompt)?;
        let options = checked_options(request.kind, &request.options)?;

        let question = IntakeQuestion {
            id: timestamp_id(),
            prompt,
            kind: request.kind,
            options,
            required: request.required,
        };

        debug!("Adding question {} to form {}", question.id, form_id);
        self.store
            .try_modify(|data| {
                let form = find_form_mut(&mut data.intake_forms, form_id)?;
                form.questions.push(question);
                Ok(form.clone())
            })
            .await
    }

    /// Applies the fields present in `request` to one question. The merged
    /// question is validated like a new one before anything is written.
    pub async fn update_question(
        &self,
        form_id: &str,
        question_id: &str,
        request: UpdateQuestionRequest,
    ) -> Result<IntakeForm, PracticeError> {
        let prompt = request.prompt.as_deref().map(|p| required("prompt", p)).transpose()?;

        self.store
            .try_modify(|data| {
                let form = find_form_mut(&mut data.intake_forms, form_id)?;
                let question = form
                    .questions
                    .iter_mut()
                    .find(|q| q.id == question_id)
                    .ok_or_else(|| PracticeError::not_found("Question", question_id))?;

                let kind = request.kind.unwrap_or(question.kind);
                let options = checked_options(kind, request.options.as_ref().unwrap_or(&question.options))?;

                if let Some(prompt) = prompt {
                    question.prompt = prompt;
                }
                if let Some(is_required) = request.required {
                    question.required = is_required;
                }
                question.kind = kind;
                question.options = options;
                Ok(form.clone())
            })
            .await
    }

    pub async fn remove_question(&self, form_id: &str, question_id: &str) -> Result<IntakeForm, PracticeError> {
        self.store
            .try_modify(|data| {
                let form = find_form_mut(&mut data.intake_forms, form_id)?;
                let index = form
                    .questions
                    .iter()
                    .position(|q| q.id == question_id)
                    .ok_or_else(|| PracticeError::not_found("Question", question_id))?;
                form.questions.remove(index);
                Ok(form.clone())
            })
            .await
    }

    pub async fn set_active(&self, form_id: &str, active: bool) -> Result<IntakeForm, PracticeError> {
        self.store
            .try_modify(|data| {
                let form = find_form_mut(&mut data.intake_forms, form_id)?;
                form.active = active;
                Ok(form.clone())
            })
            .await
    }
}

/// Trimmed, non-blank options. Multiple choice needs at least two; other
/// kinds carry none.
fn checked_options(kind: QuestionKind, options: &[String]) -> Result<Vec<String>, PracticeError> {
    if kind != QuestionKind::MultipleChoice {
        return Ok(Vec::new());
    }

    let options: Vec<String> = options
        .iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if options.len() < 2 {
        return Err(PracticeError::Validation(
            "multiple choice questions need at least two options".into(),
        ));
    }
    Ok(options)
}

fn find_form_mut<'a>(forms: &'a mut [IntakeForm], id: &str) -> Result<&'a mut IntakeForm, PracticeError> {
    forms
        .iter_mut()
        .find(|f| f.id == id)
        .ok_or_else(|| PracticeError::not_found("Form", id))
}
