//! Refinement request/response types shared by every transport.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Build the contextual text sent alongside a refinement instruction.
///
/// The service expects the generated question together with the eligibility
/// explanation it was derived from.
pub fn compose_original(title: &str, ai_explain: &str) -> String {
    format!("Question Generated: {title}; Eligibility Criteria: {ai_explain}")
}

/// A validated request to rewrite a subject's text.
///
/// Serializes to the mutation variables `id`, `original`, `refinement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefinementRequest {
    #[serde(rename = "id")]
    subject_id: String,
    #[serde(rename = "original")]
    original_text: String,
    #[serde(rename = "refinement")]
    instruction: String,
}

impl RefinementRequest {
    /// Create a request, trimming the instruction.
    ///
    /// Fails with [`CoreError::EmptyInstruction`] when the instruction is
    /// empty or whitespace-only, so an invalid request can never be sent.
    pub fn new(
        subject_id: impl Into<String>,
        original_text: impl Into<String>,
        instruction: &str,
    ) -> Result<Self, CoreError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(CoreError::EmptyInstruction);
        }
        Ok(Self {
            subject_id: subject_id.into(),
            original_text: original_text.into(),
            instruction: instruction.to_string(),
        })
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

/// Replacement text returned by the refinement service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementResult {
    pub refined_text: String,
}

/// Tone presets offered next to the instruction box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Empathetic,
    Simple,
    Friendly,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Empathetic, Tone::Simple, Tone::Friendly];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Empathetic => "Empathetic",
            Self::Simple => "Simple",
            Self::Friendly => "Friendly",
        }
    }

    /// The instruction text written into the instruction box for this tone.
    pub fn instruction(&self) -> String {
        format!(
            "Refine this text to be more {}.",
            self.label().to_lowercase()
        )
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<_> = Tone::ALL.iter().map(|t| t.label()).collect();
                format!("unknown tone '{s}' (expected one of: {})", known.join(", "))
            })
    }
}
