//! Anthropic Messages API client. Structured output goes through a forced tool call.

use async_trait::async_trait;
use creatives_core::{AdCreatives, AiServiceConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::client::check_status;
use crate::schema::{CREATIVES_TOOL, creatives_schema};
use crate::{AiClient, AiError, Prompt};

pub const PROVIDER: &str = "anthropic";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1000;

pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    base_url: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        input: Value,
    },
    #[serde(other)]
    Other,
}

impl MessagesResponse {
    fn tool_input(&self) -> Option<&Value> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { input } if !input.is_null() => Some(input),
            _ => None,
        })
    }

    fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: None,
            base_url: ANTHROPIC_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &AiServiceConfig) -> Self {
        let mut client = Self::new(&config.api_key, &config.model);
        client.temperature = config.temperature;
        client
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn messages(
        &self,
        prompt: &Prompt,
        tools: Option<Vec<Value>>,
        tool_choice: Option<Value>,
    ) -> Result<MessagesResponse, AiError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: self.temperature,
            system: &prompt.system,
            messages: [UserMessage {
                role: "user",
                content: &prompt.user,
            }],
            tools,
            tool_choice,
        };

        info!(model = %self.model, "calling Anthropic messages");
        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;
        let resp = check_status(PROVIDER, resp).await?;
        Ok(resp.json().await?)
    }
}

fn creatives_tool() -> Value {
    json!({
        "name": CREATIVES_TOOL,
        "description": "Record ad creatives for a clinical trial recruitment campaign.",
        "input_schema": creatives_schema(),
    })
}

#[async_trait]
impl AiClient for AnthropicClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_creatives(&self, prompt: &Prompt) -> Result<Option<AdCreatives>, AiError> {
        let tool_choice = json!({"type": "tool", "name": CREATIVES_TOOL});
        let response = self
            .messages(prompt, Some(vec![creatives_tool()]), Some(tool_choice))
            .await?;

        let Some(input) = response.tool_input() else {
            error!("no valid tool use content in Anthropic response");
            return Ok(None);
        };
        Ok(AdCreatives::from_structured(input, PROVIDER))
    }

    async fn complete_text(&self, prompt: &Prompt) -> Result<String, AiError> {
        let response = self.messages(prompt, None, None).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse(PROVIDER.to_string()));
        }
        Ok(text)
    }
}
