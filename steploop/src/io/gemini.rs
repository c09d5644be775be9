//! Gemini `generateContent` chat session.
//!
//! [`GeminiChat`] keeps the full `contents` history and resends it on every
//! call, which is how the service "remembers" earlier turns. Replies are
//! requested in JSON mode so they decode as steps.

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::transcript::Role;
use crate::io::conversation::Conversation;

/// Connection settings for a chat session.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    role: Role,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [PartRef<'a>; 1],
}

#[derive(Debug, Serialize)]
struct PartRef<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    system_instruction: SystemInstruction<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Stateful chat with one Gemini model.
pub struct GeminiChat {
    client: Client,
    settings: GeminiSettings,
    system_instruction: String,
    contents: Vec<Content>,
}

impl GeminiChat {
    pub fn new(settings: GeminiSettings, system_instruction: String) -> Result<Self> {
        // No request timeout: a slow reply blocks the session rather than failing it.
        let client = Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            settings,
            system_instruction,
            contents: Vec::new(),
        })
    }

    /// Number of messages and replies the session currently retains.
    pub fn retained_turns(&self) -> usize {
        self.contents.len()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn request_reply(&self) -> Result<String> {
        let request = GenerateContentRequest {
            contents: &self.contents,
            system_instruction: SystemInstruction {
                parts: [PartRef {
                    text: &self.system_instruction,
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&request)
            .send()
            .context("send generateContent request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(status = status.as_u16(), "generateContent failed");
            return Err(anyhow!("gemini returned {status}: {}", body.trim()));
        }

        let payload: GenerateContentResponse =
            response.json().context("decode generateContent response")?;
        let candidate = payload
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("gemini returned no candidates"))?;
        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();
        Ok(text)
    }
}

impl Conversation for GeminiChat {
    #[instrument(skip_all, fields(model = %self.settings.model, history = self.contents.len()))]
    fn send(&mut self, message: &str) -> Result<String> {
        self.contents.push(Content {
            role: Role::User,
            parts: vec![Part {
                text: message.to_string(),
            }],
        });

        match self.request_reply() {
            Ok(reply) => {
                debug!(bytes = reply.len(), "received reply");
                self.contents.push(Content {
                    role: Role::Model,
                    parts: vec![Part {
                        text: reply.clone(),
                    }],
                });
                Ok(reply)
            }
            Err(err) => {
                self.contents.pop();
                Err(err)
            }
        }
    }

    fn discard_last_reply(&mut self) {
        if self
            .contents
            .last()
            .is_some_and(|content| content.role == Role::Model)
        {
            info!("discarding unparseable reply from chat history");
            self.contents.pop();
        }
    }
}
