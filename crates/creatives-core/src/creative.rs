//! Ad creative types shared between the generators and the CLI.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A single ad variant produced by an LLM provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCreative {
    pub target_demo: Vec<String>,
    pub headline: String,
    pub primary_text: String,
    /// Shown as the byline under the headline.
    pub description: String,
    pub call_to_action: String,
    pub prompt_for_ad_image: String,
}

/// All creatives returned by one provider for one trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCreatives {
    #[serde(default)]
    pub source: Option<String>,
    pub creatives: Vec<AdCreative>,
}

impl AdCreatives {
    /// Build from a provider's structured output (`{"creatives": [...]}`).
    ///
    /// Returns `None` when the `creatives` array is missing or empty.
    /// Elements that fail validation are logged and skipped.
    pub fn from_structured(output: &Value, source: &str) -> Option<Self> {
        let items = output.get("creatives")?.as_array()?;
        if items.is_empty() {
            return None;
        }

        let creatives = items
            .iter()
            .filter_map(|item| match serde_json::from_value::<AdCreative>(item.clone()) {
                Ok(creative) => Some(creative),
                Err(e) => {
                    warn!(source, error = %e, "ignoring creative that failed validation");
                    None
                }
            })
            .collect();

        Some(Self {
            source: Some(source.to_string()),
            creatives,
        })
    }
}

/// The action offered by the publish toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    Publish,
    Unpublish,
}

impl PublishAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Publish => "Publish",
            Self::Unpublish => "Unpublish",
        }
    }
}

/// A creative as listed for a campaign, with its publish state.
///
/// The initial publish state is always supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeItem {
    pub id: String,
    pub creative: AdCreative,
    published: bool,
}

impl CreativeItem {
    pub fn new(id: impl Into<String>, creative: AdCreative, published: bool) -> Self {
        Self {
            id: id.into(),
            creative,
            published,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Flip the publish state, returning the new state.
    pub fn toggle_publish(&mut self) -> bool {
        self.published = !self.published;
        self.published
    }

    pub fn publish_action(&self) -> PublishAction {
        if self.published {
            PublishAction::Unpublish
        } else {
            PublishAction::Publish
        }
    }
}
