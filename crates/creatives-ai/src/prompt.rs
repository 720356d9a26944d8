//! Structured prompts.
//!
//! A prompt is assembled from a problem definition, tagged inputs, an output
//! specification, constraints, quality guidelines, and task examples, then
//! flattened into a system/user message pair.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use creatives_core::RefinementRequest;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::AiError;
use crate::schema::creatives_schema;

const BUILTIN_CREATIVES_TEMPLATE: &str = include_str!("../templates/creatives_generator.json");

/// A flattened prompt ready to send to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Accept either a string or an array of strings joined with spaces.
fn string_or_lines<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Text::deserialize(deserializer)? {
        Text::One(s) => s,
        Text::Many(lines) => lines.join(" "),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemDefinition {
    #[serde(deserialize_with = "string_or_lines")]
    pub description: String,
    #[serde(default)]
    pub subproblems: Vec<String>,
}

impl fmt::Display for ProblemDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)?;
        for sub in &self.subproblems {
            write!(f, "\n{sub}")?;
        }
        Ok(())
    }
}

/// A tagged input value, rendered as `<key>value</key>`.
#[derive(Debug, Clone)]
pub struct InputElement {
    pub key: String,
    pub value: String,
}

impl InputElement {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for InputElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{0}>{1}</{0}>", self.key, self.value)
    }
}

#[derive(Debug, Clone)]
pub struct OutputSpecification {
    pub expected_format: String,
    pub schema: Option<String>,
    pub examples: Vec<String>,
}

impl Default for OutputSpecification {
    fn default() -> Self {
        Self {
            expected_format: "JSON".to_string(),
            schema: None,
            examples: Vec::new(),
        }
    }
}

impl fmt::Display for OutputSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<output>")?;
        writeln!(f, "<format>{}</format>", self.expected_format)?;
        if let Some(schema) = &self.schema {
            writeln!(f, "<schema>{schema}</schema>")?;
        }
        write!(f, "</output>")?;
        if !self.examples.is_empty() {
            write!(
                f,
                "\n<output_examples>\n{}\n</output_examples>",
                self.examples.join("\n")
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BehavioralConstraints {
    #[serde(default)]
    pub behavioral_constraints: Vec<String>,
    #[serde(default)]
    pub content_constraints: Vec<String>,
    #[serde(default)]
    pub default_responses: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QualityGuidelines {
    #[serde(default)]
    pub guidelines_for_quality: Vec<String>,
    #[serde(default)]
    pub norms_for_assumptions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StructuredPrompt {
    pub problem_definition: ProblemDefinition,
    pub inputs: Vec<InputElement>,
    pub output: OutputSpecification,
    pub constraints: BehavioralConstraints,
    pub guidelines: QualityGuidelines,
    pub task_examples: Vec<String>,
}

fn push_list(sections: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let body: Vec<String> = items.iter().map(|item| format!("- {item}")).collect();
    sections.push(format!("{heading}:\n{}", body.join("\n")));
}

impl StructuredPrompt {
    /// Flatten into a system/user pair. Inputs go in the user message;
    /// everything else goes in the system message.
    pub fn create_prompt(&self, include_output: bool) -> Prompt {
        let mut sections = vec![self.problem_definition.to_string()];
        if include_output {
            sections.push(self.output.to_string());
        }
        push_list(&mut sections, "Rules", &self.constraints.behavioral_constraints);
        push_list(&mut sections, "Never", &self.constraints.content_constraints);
        push_list(&mut sections, "Fallbacks", &self.constraints.default_responses);
        push_list(&mut sections, "Quality guidelines", &self.guidelines.guidelines_for_quality);
        push_list(&mut sections, "Assumptions", &self.guidelines.norms_for_assumptions);
        push_list(&mut sections, "Examples", &self.task_examples);

        let user = self
            .inputs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        Prompt {
            system: sections.join("\n\n"),
            user,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateOutput {
    #[serde(default)]
    pub examples: Vec<Value>,
}

/// JSON prompt template for a generation task.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplate {
    pub problem_definition: ProblemDefinition,
    #[serde(default)]
    pub output_specifications: TemplateOutput,
    #[serde(default)]
    pub manage_constraints: BehavioralConstraints,
    #[serde(default)]
    pub parameterize_behavior: QualityGuidelines,
    #[serde(default)]
    pub task_examples: Vec<BTreeMap<String, String>>,
}

impl PromptTemplate {
    pub fn from_json_str(json: &str) -> Result<Self, AiError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, AiError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AiError::Template(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// The creatives template shipped with the crate.
    pub fn builtin_creatives() -> Result<Self, AiError> {
        Self::from_json_str(BUILTIN_CREATIVES_TEMPLATE)
    }
}

fn example_lines(examples: &[BTreeMap<String, String>]) -> impl Iterator<Item = String> + '_ {
    examples
        .iter()
        .flat_map(|task| task.iter().map(|(k, v)| format!("{k}: {v}")))
}

/// Build the creatives prompt for one trial.
pub fn creatives_prompt(
    customer_id: &str,
    description: &str,
    eligibility: &str,
    template: &PromptTemplate,
    extra_examples: &[BTreeMap<String, String>],
) -> Result<Prompt, AiError> {
    if customer_id.trim().is_empty() {
        return Err(AiError::MissingPromptInput("customer_id"));
    }
    if description.trim().is_empty() {
        return Err(AiError::MissingPromptInput("description"));
    }
    if eligibility.trim().is_empty() {
        return Err(AiError::MissingPromptInput("eligibility"));
    }

    let output = OutputSpecification {
        expected_format: "JSON".to_string(),
        schema: Some(creatives_schema().to_string()),
        examples: template
            .output_specifications
            .examples
            .iter()
            .map(|ex| match ex {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    };

    let prompt = StructuredPrompt {
        problem_definition: template.problem_definition.clone(),
        inputs: vec![
            InputElement::new("description", description),
            InputElement::new("eligibility", eligibility),
        ],
        output,
        constraints: template.manage_constraints.clone(),
        guidelines: template.parameterize_behavior.clone(),
        task_examples: example_lines(&template.task_examples)
            .chain(example_lines(extra_examples))
            .collect(),
    };
    debug!(customer_id, "built creatives prompt");
    Ok(prompt.create_prompt(true))
}

/// Build the prompt asking a provider to rewrite a question.
pub fn refinement_prompt(request: &RefinementRequest) -> Prompt {
    let prompt = StructuredPrompt {
        problem_definition: ProblemDefinition {
            description: "You edit prescreener questions for clinical trial recruitment.".to_string(),
            subproblems: vec![
                "1. Read the generated question and its eligibility criteria from <original>.".to_string(),
                "2. Rewrite the question following the instruction in <refinement>.".to_string(),
            ],
        },
        inputs: vec![
            InputElement::new("original", request.original_text()),
            InputElement::new("refinement", request.instruction()),
        ],
        constraints: BehavioralConstraints {
            behavioral_constraints: vec![
                "Respond with the rewritten question only, without quotes or commentary.".to_string(),
                "Keep the question answerable the same way as the original.".to_string(),
            ],
            content_constraints: vec!["Change the eligibility meaning of the question.".to_string()],
            default_responses: Vec::new(),
        },
        ..Default::default()
    };
    prompt.create_prompt(false)
}
