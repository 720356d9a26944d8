//! OpenAI Chat Completions client with structured (json_schema) output.

use async_trait::async_trait;
use creatives_core::{AdCreatives, AiServiceConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::client::check_status;
use crate::schema::{CREATIVES_TOOL, creatives_schema};
use crate::{AiClient, AiError, Prompt};

pub const PROVIDER: &str = "openAI";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Content of the first choice, if the completion carries any.
fn first_content(completion: &ChatCompletion) -> Option<&str> {
    let Some(choice) = completion.choices.first() else {
        warn!("no choices in completion");
        return None;
    };
    let Some(message) = &choice.message else {
        warn!("no message in first choice");
        return None;
    };
    if let Some(refusal) = &message.refusal {
        warn!(refusal = %refusal, "model refused the request");
        return None;
    }
    message.content.as_deref().filter(|c| !c.trim().is_empty())
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: None,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &AiServiceConfig) -> Self {
        let mut client = Self::new(&config.api_key, &config.model);
        client.temperature = config.temperature;
        client
    }

    /// Point at an OpenAI-compatible endpoint (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn chat(
        &self,
        prompt: &Prompt,
        response_format: Option<Value>,
    ) -> Result<ChatCompletion, AiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
            response_format,
        };

        info!(model = %self.model, "calling OpenAI chat completions");
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let resp = check_status(PROVIDER, resp).await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl AiClient for OpenAiClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_creatives(&self, prompt: &Prompt) -> Result<Option<AdCreatives>, AiError> {
        let response_format = json!({
            "type": "json_schema",
            "json_schema": {
                "name": CREATIVES_TOOL,
                "strict": true,
                "schema": creatives_schema(),
            }
        });
        let completion = self.chat(prompt, Some(response_format)).await?;

        let Some(content) = first_content(&completion) else {
            error!("OpenAI call was successful but no results were obtained");
            return Ok(None);
        };
        let output: Value = serde_json::from_str(content)?;
        Ok(AdCreatives::from_structured(&output, PROVIDER))
    }

    async fn complete_text(&self, prompt: &Prompt) -> Result<String, AiError> {
        let completion = self.chat(prompt, None).await?;
        first_content(&completion)
            .map(str::to_string)
            .ok_or_else(|| AiError::EmptyResponse(PROVIDER.to_string()))
    }
}
