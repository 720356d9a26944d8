//! Apply a refinement to a question draft.
//!
//! Every failure leaves the displayed text untouched and is reported back
//! as an [`AugmentOutcome`] the caller can show to the user.

use creatives_core::QuestionDraft;
use tracing::{error, info, warn};

use crate::refine::{self, RefineError, RefinementTransport};

#[derive(Debug)]
pub enum AugmentOutcome {
    /// The displayed text was replaced with the refined content.
    Refined,
    /// The instruction was blank; nothing was sent.
    MissingInstruction,
    /// The service answered without usable content.
    NoResult,
    /// Transport or remote failure.
    Failed(RefineError),
}

impl AugmentOutcome {
    pub fn is_refined(&self) -> bool {
        matches!(self, Self::Refined)
    }

    /// Message for the failure indicator, `None` on success.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Refined => None,
            Self::MissingInstruction => Some("User input is required.".to_string()),
            Self::NoResult => Some("The service returned no refined text.".to_string()),
            Self::Failed(e) => Some(format!("Refinement failed: {e}")),
        }
    }
}

/// Refine the draft's question text using its current instruction.
pub async fn augment<T>(draft: &mut QuestionDraft, transport: &T) -> AugmentOutcome
where
    T: RefinementTransport + ?Sized,
{
    let request = match draft.refinement_request() {
        Ok(request) => request,
        Err(_) => {
            warn!(subject = draft.subject_id(), "refinement instruction is required");
            return AugmentOutcome::MissingInstruction;
        }
    };

    match refine::send(transport, &request).await {
        Ok(result) => {
            info!(
                subject = draft.subject_id(),
                chars = result.refined_text.len(),
                "question text refined"
            );
            draft.replace_text(result.refined_text);
            AugmentOutcome::Refined
        }
        Err(RefineError::MissingResult) => {
            warn!(subject = draft.subject_id(), "no refined content returned");
            AugmentOutcome::NoResult
        }
        Err(e) => {
            error!(subject = draft.subject_id(), error = %e, "error calling refinement mutation");
            AugmentOutcome::Failed(e)
        }
    }
}
