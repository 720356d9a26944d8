use async_trait::async_trait;
use creatives_core::RefinementRequest;
use creatives_sync::{RefineError, RefinementTransport};
use tracing::{info, warn};

use crate::{AiClient, refinement_prompt};

/// Answers refinement requests by asking an LLM directly instead of going
/// through the GraphQL service.
pub struct AiRefiner {
    client: Box<dyn AiClient>,
}

impl AiRefiner {
    pub fn new(client: Box<dyn AiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RefinementTransport for AiRefiner {
    async fn augment_question(
        &self,
        request: &RefinementRequest,
    ) -> Result<Option<String>, RefineError> {
        let prompt = refinement_prompt(request);
        info!(
            subject_id = request.subject_id(),
            provider = self.client.provider(),
            model = self.client.model(),
            "refining question with AI provider"
        );
        let text = self
            .client
            .complete_text(&prompt)
            .await
            .map_err(|e| RefineError::Provider(e.to_string()))?;

        let text = text.trim();
        if text.is_empty() {
            warn!(subject_id = request.subject_id(), "provider returned blank text");
            return Ok(None);
        }
        Ok(Some(text.to_string()))
    }
}
