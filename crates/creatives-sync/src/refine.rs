//! Text refinement client: one request, one response, no retry.

use async_trait::async_trait;
use creatives_core::{CoreError, RefinementRequest, RefinementResult};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::graphql::{GraphqlClient, GraphqlError};

pub const AUGMENT_MUTATION: &str = "\
mutation AugmentQuestion($id: ID!, $original: String!, $refinement: String!) {
  augmentQuestion(id: $id, original: $original, refinement: $refinement) {
    refinedContent
  }
}";

#[derive(Error, Debug)]
pub enum RefineError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] CoreError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("refinement service errors: {}", .0.join("; "))]
    Remote(Vec<String>),
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("refinement provider failed: {0}")]
    Provider(String),
    #[error("response contained no refined content")]
    MissingResult,
}

impl RefineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<GraphqlError> for RefineError {
    fn from(err: GraphqlError) -> Self {
        match err {
            GraphqlError::Http(e) => Self::Http(e),
            GraphqlError::Server { status, body } => Self::Server { status, body },
            GraphqlError::Remote(messages) => Self::Remote(messages),
            GraphqlError::Json(e) => Self::Json(e),
        }
    }
}

/// Something that can answer a refinement request.
///
/// Returns the raw `refinedContent`, which may be absent.
#[async_trait]
pub trait RefinementTransport: Send + Sync {
    async fn augment_question(
        &self,
        request: &RefinementRequest,
    ) -> Result<Option<String>, RefineError>;
}

#[derive(Deserialize)]
struct AugmentData {
    #[serde(rename = "augmentQuestion", default)]
    augment_question: Option<AugmentPayload>,
}

#[derive(Deserialize)]
struct AugmentPayload {
    #[serde(rename = "refinedContent", default)]
    refined_content: Option<String>,
}

#[async_trait]
impl RefinementTransport for GraphqlClient {
    async fn augment_question(
        &self,
        request: &RefinementRequest,
    ) -> Result<Option<String>, RefineError> {
        let data: Option<AugmentData> = self.execute(AUGMENT_MUTATION, request).await?;
        Ok(data
            .and_then(|d| d.augment_question)
            .and_then(|p| p.refined_content))
    }
}

/// Validate the instruction and submit a single refinement request.
///
/// A blank instruction fails with [`RefineError::Validation`] before the
/// transport is touched.
pub async fn refine<T>(
    transport: &T,
    subject_id: &str,
    original_text: &str,
    instruction: &str,
) -> Result<RefinementResult, RefineError>
where
    T: RefinementTransport + ?Sized,
{
    let request = RefinementRequest::new(subject_id, original_text, instruction)?;
    send(transport, &request).await
}

pub(crate) async fn send<T>(
    transport: &T,
    request: &RefinementRequest,
) -> Result<RefinementResult, RefineError>
where
    T: RefinementTransport + ?Sized,
{
    info!(subject = request.subject_id(), "submitting refinement request");
    match transport.augment_question(request).await? {
        Some(refined_text) if !refined_text.is_empty() => Ok(RefinementResult { refined_text }),
        _ => Err(RefineError::MissingResult),
    }
}
