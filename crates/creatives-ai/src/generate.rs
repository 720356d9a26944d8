//! Creatives generation: one trial, every configured provider, results
//! streamed back in completion order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use creatives_core::{AdCreatives, ServiceRegistry};
use creatives_sync::TrialSource;
use futures::future;
use futures::stream::{BoxStream, FuturesUnordered, StreamExt};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{AiClient, AiError, ClientRegistry, Prompt, PromptTemplate, creatives_prompt};

/// Service name under which creatives providers are configured.
pub const CREATIVES_SERVICE: &str = "creatives";

/// One provider's creatives, tagged with timing.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCreatives {
    pub provider: String,
    pub model: String,
    pub elapsed_ms: u64,
    pub received_at: DateTime<Utc>,
    #[serde(flatten)]
    pub creatives: AdCreatives,
}

pub struct CreativesGenerator<'a> {
    clients: &'a ClientRegistry,
    services: &'a ServiceRegistry,
    trials: &'a dyn TrialSource,
    template: &'a PromptTemplate,
    extra_examples: Vec<BTreeMap<String, String>>,
}

impl<'a> CreativesGenerator<'a> {
    pub fn new(
        clients: &'a ClientRegistry,
        services: &'a ServiceRegistry,
        trials: &'a dyn TrialSource,
        template: &'a PromptTemplate,
    ) -> Self {
        Self {
            clients,
            services,
            trials,
            template,
            extra_examples: Vec::new(),
        }
    }

    /// Task examples appended after the template's own.
    pub fn with_examples(mut self, examples: Vec<BTreeMap<String, String>>) -> Self {
        self.extra_examples = examples;
        self
    }

    /// Build one client per valid `creatives` config for `customer`.
    fn build_clients(&self, customer: &str) -> Result<Vec<Box<dyn AiClient>>, AiError> {
        let resolved = self.services.ai_service_configs(customer, CREATIVES_SERVICE)?;
        for (provider, problems) in &resolved.invalid {
            warn!(customer, provider = %provider, problems = %problems, "skipping invalid provider config");
        }

        let clients: Vec<_> = resolved
            .configs
            .iter()
            .filter_map(|(key, config)| self.clients.get_client(key, config))
            .collect();
        if clients.is_empty() {
            return Err(AiError::NoClients {
                customer: customer.to_string(),
                service: CREATIVES_SERVICE.to_string(),
            });
        }
        Ok(clients)
    }

    /// Generate creatives for `nct_id` with every provider `customer` has
    /// configured.
    ///
    /// Trial, prompt and configuration problems fail before any provider is
    /// called. After that, each provider yields at most one item; failures
    /// and empty results are logged and dropped.
    pub async fn generate(
        &self,
        customer: &str,
        nct_id: &str,
    ) -> Result<BoxStream<'static, GeneratedCreatives>, AiError> {
        let trial = self.trials.trial_summary(nct_id).await?;
        let prompt = creatives_prompt(
            customer,
            &trial.brief_summary,
            &trial.eligibility,
            self.template,
            &self.extra_examples,
        )?;
        let clients = self.build_clients(customer)?;

        info!(
            customer,
            nct_id = %trial.nct_id,
            providers = clients.len(),
            "generating creatives"
        );
        let prompt = Arc::new(prompt);
        let pending: FuturesUnordered<_> = clients
            .into_iter()
            .map(|client| invoke(client, Arc::clone(&prompt)))
            .collect();
        Ok(pending.filter_map(future::ready).boxed())
    }
}

async fn invoke(client: Box<dyn AiClient>, prompt: Arc<Prompt>) -> Option<GeneratedCreatives> {
    let provider = client.provider().to_string();
    let model = client.model().to_string();
    let started = Instant::now();

    let result = client.generate_creatives(&prompt).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(Some(creatives)) => {
            info!(provider = %provider, model = %model, elapsed_ms, count = creatives.creatives.len(), "creatives received");
            Some(GeneratedCreatives {
                provider,
                model,
                elapsed_ms,
                received_at: Utc::now(),
                creatives,
            })
        }
        Ok(None) => {
            warn!(provider = %provider, model = %model, elapsed_ms, "provider returned no creatives");
            None
        }
        Err(e) => {
            error!(provider = %provider, model = %model, elapsed_ms, error = %e, "creatives generation failed");
            None
        }
    }
}
