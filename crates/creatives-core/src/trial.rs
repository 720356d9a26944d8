//! ClinicalTrials.gov study documents and the summary fed to prompts.
//!
//! Only the modules needed for creatives are modelled; everything else in the
//! v2 study JSON is ignored.

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    #[serde(default)]
    pub protocol_section: Option<ProtocolSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSection {
    #[serde(default)]
    pub identification_module: Option<IdentificationModule>,
    #[serde(default)]
    pub description_module: Option<DescriptionModule>,
    #[serde(default)]
    pub eligibility_module: Option<EligibilityModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationModule {
    pub nct_id: Option<String>,
    pub brief_title: Option<String>,
    pub official_title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionModule {
    pub brief_summary: Option<String>,
    pub detailed_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityModule {
    pub eligibility_criteria: Option<String>,
    pub healthy_volunteers: Option<bool>,
    pub sex: Option<String>,
    pub minimum_age: Option<String>,
    pub maximum_age: Option<String>,
    #[serde(default)]
    pub std_ages: Vec<String>,
}

impl EligibilityModule {
    /// Render the module as prompt text: criteria first, then one line per
    /// populated demographic field.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        if let Some(criteria) = self.eligibility_criteria.as_deref() {
            lines.push(criteria.trim().to_string());
        }
        if let Some(sex) = &self.sex {
            lines.push(format!("Sex: {sex}"));
        }
        if let Some(min) = &self.minimum_age {
            lines.push(format!("Minimum age: {min}"));
        }
        if let Some(max) = &self.maximum_age {
            lines.push(format!("Maximum age: {max}"));
        }
        if !self.std_ages.is_empty() {
            lines.push(format!("Age groups: {}", self.std_ages.join(", ")));
        }
        if let Some(healthy) = self.healthy_volunteers {
            lines.push(format!(
                "Healthy volunteers: {}",
                if healthy { "yes" } else { "no" }
            ));
        }
        lines.join("\n")
    }
}

/// The two trial fields the creatives prompt is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialSummary {
    pub nct_id: String,
    pub brief_title: Option<String>,
    pub brief_summary: String,
    pub eligibility: String,
}

impl TrialSummary {
    /// Extract the summary from a study document.
    ///
    /// Both a non-empty brief summary and an eligibility module are required.
    pub fn from_study(nct_id: &str, study: &Study) -> Result<Self, CoreError> {
        let incomplete = || CoreError::IncompleteTrial(nct_id.to_string());
        let protocol = study.protocol_section.as_ref().ok_or_else(incomplete)?;

        let brief_summary = protocol
            .description_module
            .as_ref()
            .and_then(|d| d.brief_summary.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(incomplete)?;

        let eligibility = protocol
            .eligibility_module
            .as_ref()
            .map(EligibilityModule::render)
            .filter(|s| !s.is_empty())
            .ok_or_else(incomplete)?;

        let identification = protocol.identification_module.as_ref();
        let nct_id = identification
            .and_then(|i| i.nct_id.clone())
            .unwrap_or_else(|| nct_id.to_string());
        let brief_title = identification.and_then(|i| i.brief_title.clone());

        Ok(Self {
            nct_id,
            brief_title,
            brief_summary: brief_summary.to_string(),
            eligibility,
        })
    }
}
