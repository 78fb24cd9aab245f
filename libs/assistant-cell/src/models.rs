use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Thread id used when the caller does not supply one.
pub const ANONYMOUS_THREAD_ID: &str = "web:anon";

/// Graph ids exposed by the agent server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Patient,
    Doctor,
}

impl AgentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Patient => "patient",
            AgentId::Doctor => "doctor",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    pub input: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub agent: AgentId,
    pub thread_id: String,
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcription {
    pub text: String,
}

/// Body of `POST /assistants/{agent}/invoke`.
#[derive(Debug, Serialize)]
pub(crate) struct InvokeBody<'a> {
    pub input: &'a str,
    pub config: InvokeConfig<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InvokeConfig<'a> {
    pub configurable: Configurable<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Configurable<'a> {
    pub thread_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InvokeResponse {
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub reply_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranscribeResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
