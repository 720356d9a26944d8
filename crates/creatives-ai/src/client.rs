use async_trait::async_trait;
use creatives_core::AdCreatives;

use crate::{AiError, Prompt};

/// An LLM provider able to produce structured creatives and free text.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Registry key of the provider, e.g. `openAI`.
    fn provider(&self) -> &str;

    fn model(&self) -> &str;

    /// Ask for ad creatives in structured form.
    ///
    /// `Ok(None)` means the call succeeded but produced nothing usable.
    async fn generate_creatives(&self, prompt: &Prompt) -> Result<Option<AdCreatives>, AiError>;

    /// Plain text completion.
    async fn complete_text(&self, prompt: &Prompt) -> Result<String, AiError>;
}

/// Turn a non-2xx response into [`AiError::Api`].
pub(crate) async fn check_status(
    provider: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, AiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(AiError::Api {
        provider: provider.to_string(),
        status: status.as_u16(),
        body,
    })
}
