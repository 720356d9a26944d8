use std::collections::HashMap;

use creatives_core::AiServiceConfig;
use tracing::error;

use crate::{AiClient, AnthropicClient, OpenAiClient, anthropic, openai};

/// Builds a client from a resolved service config.
pub type ClientFactory = fn(&AiServiceConfig) -> Box<dyn AiClient>;

/// Provider key → client constructor.
///
/// Keys match the provider names used in the service registry.
pub struct ClientRegistry {
    factories: HashMap<String, ClientFactory>,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(openai::PROVIDER, openai_client);
        registry.register(anthropic::PROVIDER, anthropic_client);
        registry
    }
}

fn openai_client(config: &AiServiceConfig) -> Box<dyn AiClient> {
    Box::new(OpenAiClient::from_config(config))
}

fn anthropic_client(config: &AiServiceConfig) -> Box<dyn AiClient> {
    Box::new(AnthropicClient::from_config(config))
}

impl ClientRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) the factory for `key`.
    pub fn register(&mut self, key: impl Into<String>, factory: ClientFactory) {
        self.factories.insert(key.into(), factory);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Build the client for `key`, or log and return `None` if none is registered.
    pub fn get_client(&self, key: &str, config: &AiServiceConfig) -> Option<Box<dyn AiClient>> {
        let Some(factory) = self.factories.get(key) else {
            error!(key, "no AI client registered for key");
            return None;
        };
        Some(factory(config))
    }
}
