use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde_json::Value;
use tracing::{debug, error, instrument};

use shared_config::AppConfig;

use crate::error::AssistantError;
use crate::models::{
    AgentId, ChatReply, Configurable, InvokeBody, InvokeConfig, InvokeResponse, TranscribeResponse,
    ANONYMOUS_THREAD_ID,
};

/// Client for the agent server and the transcription service. Requests are
/// sent once; there is no retry.
#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    assistant_base_url: String,
    transcribe_base_url: String,
}

impl AssistantClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            assistant_base_url: config.assistant_base_url.trim_end_matches('/').to_string(),
            transcribe_base_url: config.transcribe_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sends `input` to `agent` on the given conversation thread. A blank
    /// thread id falls back to the anonymous thread.
    #[instrument(skip(self, input))]
    pub async fn chat(&self, agent: AgentId, thread_id: &str, input: &str) -> Result<ChatReply, AssistantError> {
        if input.trim().is_empty() {
            return Err(AssistantError::Validation("input must not be empty".into()));
        }

        let thread_id = match thread_id.trim() {
            "" => ANONYMOUS_THREAD_ID,
            id => id,
        };

        let url = format!("{}/assistants/{}/invoke", self.assistant_base_url, agent);
        debug!("Invoking agent at {}", url);

        let body = InvokeBody {
            input,
            config: InvokeConfig {
                configurable: Configurable { thread_id },
            },
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let response = check_status(response, "chat").await?;
        let payload: InvokeResponse = response.json().await?;

        let reply = match payload.output {
            Some(Value::String(text)) => text,
            _ => payload.reply_text.ok_or_else(|| {
                AssistantError::InvalidResponse("neither output nor reply_text present".into())
            })?,
        };

        Ok(ChatReply {
            agent,
            thread_id: thread_id.to_string(),
            reply,
        })
    }

    /// Uploads a WebM recording and returns the transcribed text.
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<String, AssistantError> {
        if audio.is_empty() {
            return Err(AssistantError::Validation("audio must not be empty".into()));
        }

        let url = format!("{}/transcribe", self.transcribe_base_url);
        debug!("Uploading audio to {}", url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "audio/webm")
            .body(audio)
            .send()
            .await?;
        let response = check_status(response, "transcribe").await?;
        let payload: TranscribeResponse = response.json().await?;

        match (payload.text, payload.error) {
            (Some(text), _) => Ok(text),
            (None, Some(message)) => Err(AssistantError::Transcription(message)),
            (None, None) => Err(AssistantError::InvalidResponse(
                "neither text nor error present".into(),
            )),
        }
    }
}

async fn check_status(response: Response, operation: &str) -> Result<Response, AssistantError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("{} failed ({}): {}", operation, status, body);
    Err(AssistantError::Upstream {
        status: status.as_u16(),
        body,
    })
}
