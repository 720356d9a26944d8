//! Editable state behind the "augment with AI" question field.

use crate::{CoreError, RefinementRequest, Tone, compose_original};

/// Component-local state for one generated prescreener question.
///
/// The displayed text starts as the generated title and is only ever
/// overwritten wholesale, either by the user or by a refinement result.
/// The title and eligibility explanation stay fixed: they are the context
/// sent with every refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    subject_id: String,
    title: String,
    ai_explain: String,
    text: String,
    instruction: String,
}

impl QuestionDraft {
    pub fn new(
        subject_id: impl Into<String>,
        title: impl Into<String>,
        ai_explain: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            subject_id: subject_id.into(),
            text: title.clone(),
            title,
            ai_explain: ai_explain.into(),
            instruction: String::new(),
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn ai_explain(&self) -> &str {
        &self.ai_explain
    }

    /// Currently displayed question text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn set_instruction(&mut self, instruction: impl Into<String>) {
        self.instruction = instruction.into();
    }

    /// Overwrite the instruction with the preset for `tone`.
    pub fn apply_tone(&mut self, tone: Tone) {
        self.instruction = tone.instruction();
    }

    pub fn original(&self) -> String {
        compose_original(&self.title, &self.ai_explain)
    }

    /// Build a request from the current instruction.
    pub fn refinement_request(&self) -> Result<RefinementRequest, CoreError> {
        RefinementRequest::new(&self.subject_id, self.original(), &self.instruction)
    }

    /// Replace the displayed text with a refinement result.
    pub fn replace_text(&mut self, refined: impl Into<String>) {
        self.text = refined.into();
    }
}
