//! AI service registry: which providers and models each customer uses per service.
//!
//! The layout mirrors a service-discovery tree:
//!
//! ```text
//! /<customer>/aiProviders/<provider>       credentials
//! /<customer>/<service>/[ {<provider>: settings} ]
//! ```
//!
//! A provider only applies to a service when the customer also has
//! credentials for it under `aiProviders`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::CoreError;

/// Resolved settings for calling one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiServiceConfig {
    /// Registry key, e.g. `openAI` or `anthropic`.
    pub provider: String,
    pub model: String,
    pub temperature: Option<f32>,
    #[serde(skip_serializing)]
    pub api_key: String,
}

/// Credentials for one provider. A literal key wins over the env var.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderCredentials {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl ProviderCredentials {
    fn from_env(var: &str) -> Self {
        Self {
            api_key: None,
            api_key_env: Some(var.to_string()),
        }
    }

    fn resolve(&self) -> Result<String, String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }
        match self.api_key_env.as_deref() {
            Some(var) => std::env::var(var)
                .ok()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| format!("api_key: environment variable {var} is not set")),
            None => Err("api_key: missing".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Temperature {
    Number(f32),
    Text(String),
}

/// Per-service model settings for one provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelSettings {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    temperature: Option<Temperature>,
}

impl ModelSettings {
    fn new(model: &str, temperature: f32) -> Self {
        Self {
            model: Some(model.to_string()),
            temperature: Some(Temperature::Number(temperature)),
        }
    }
}

/// One provider-to-settings map per list entry.
pub type ServiceEntries = Vec<BTreeMap<String, ModelSettings>>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawCustomerConfig")]
pub struct CustomerConfig {
    pub ai_providers: BTreeMap<String, ProviderCredentials>,
    pub services: BTreeMap<String, ServiceEntries>,
}

/// Customer entry as written. `aiProviders` may be null and any other key
/// may hold something that is not a service list.
#[derive(Deserialize)]
struct RawCustomerConfig {
    #[serde(rename = "aiProviders", default)]
    ai_providers: Option<BTreeMap<String, ProviderCredentials>>,
    #[serde(flatten)]
    other: BTreeMap<String, Value>,
}

impl From<RawCustomerConfig> for CustomerConfig {
    fn from(raw: RawCustomerConfig) -> Self {
        let services = raw
            .other
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<ServiceEntries>(value) {
                Ok(entries) => Some((key, entries)),
                Err(e) => {
                    warn!(key = %key, error = %e, "ignoring customer key that is not a service list");
                    None
                }
            })
            .collect();
        Self {
            ai_providers: raw.ai_providers.unwrap_or_default(),
            services,
        }
    }
}

/// Outcome of resolving a customer's configs for one service.
///
/// Providers whose entries failed validation are reported in `invalid`
/// with a description of each problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedServiceConfigs {
    pub configs: BTreeMap<String, AiServiceConfig>,
    pub invalid: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ServiceRegistry {
    customers: BTreeMap<String, CustomerConfig>,
}

impl ServiceRegistry {
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a registry from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let registry = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            customers = registry.customers.len(),
            "loaded AI service registry"
        );
        Ok(registry)
    }

    /// Default registry: `acmeinc` on OpenAI and Anthropic, keys from the environment.
    pub fn builtin() -> Self {
        let ai_providers = BTreeMap::from([
            ("openAI".to_string(), ProviderCredentials::from_env("OPENAI_API_KEY")),
            (
                "anthropic".to_string(),
                ProviderCredentials::from_env("ANTHROPIC_API_KEY"),
            ),
        ]);

        let single = |provider: &str, model: &str, temperature: f32| {
            BTreeMap::from([(provider.to_string(), ModelSettings::new(model, temperature))])
        };
        let creatives = vec![
            single("openAI", "gpt-4o-2024-08-06", 0.7),
            single("anthropic", "claude-3-5-sonnet-20240620", 0.7),
        ];
        let prescreener = vec![BTreeMap::from([
            (
                "openAI".to_string(),
                ModelSettings::new("gpt-4o-2024-08-06", 0.5),
            ),
            (
                "anthropic".to_string(),
                ModelSettings::new("claude-3-5-sonnet-20240620", 0.5),
            ),
        ])];

        let acme = CustomerConfig {
            ai_providers,
            services: BTreeMap::from([
                ("creatives".to_string(), creatives),
                ("prescreener".to_string(), prescreener),
            ]),
        };
        Self {
            customers: BTreeMap::from([("acmeinc".to_string(), acme)]),
        }
    }

    pub fn customer(&self, customer: &str) -> Option<&CustomerConfig> {
        self.customers.get(customer)
    }

    /// Resolve the provider configs `customer` has for `service`.
    pub fn ai_service_configs(
        &self,
        customer: &str,
        service: &str,
    ) -> Result<ResolvedServiceConfigs, CoreError> {
        let Some(customer_config) = self.customers.get(customer) else {
            error!(customer, "customer not found");
            return Err(CoreError::UnknownCustomer(customer.to_string()));
        };
        if customer_config.ai_providers.is_empty() {
            error!(customer, "customer has no AI subscriptions");
            return Err(CoreError::NoAiProviders(customer.to_string()));
        }
        let no_config = || CoreError::NoServiceConfig {
            customer: customer.to_string(),
            service: service.to_string(),
        };
        let Some(entries) = customer_config.services.get(service) else {
            error!(customer, service, "no AI configs for service");
            return Err(no_config());
        };

        let mut resolved = ResolvedServiceConfigs::default();
        for (provider, settings) in entries.iter().flat_map(|entry| entry.iter()) {
            let Some(credentials) = customer_config.ai_providers.get(provider) else {
                continue;
            };
            match validate(provider, settings, credentials) {
                Ok(config) => {
                    resolved.invalid.remove(provider);
                    resolved.configs.insert(provider.clone(), config);
                }
                Err(errors) => {
                    error!(customer, service, provider = %provider, errors = %errors, "invalid AI service config");
                    resolved.configs.remove(provider);
                    resolved.invalid.insert(provider.clone(), errors);
                }
            }
        }

        if resolved.configs.is_empty() && resolved.invalid.is_empty() {
            return Err(no_config());
        }
        info!(
            customer,
            service,
            valid = resolved.configs.len(),
            invalid = resolved.invalid.len(),
            "resolved AI service configs"
        );
        Ok(resolved)
    }
}

fn validate(
    provider: &str,
    settings: &ModelSettings,
    credentials: &ProviderCredentials,
) -> Result<AiServiceConfig, String> {
    let mut errors = Vec::new();

    let model = settings
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string);
    if model.is_none() {
        errors.push("model: missing".to_string());
    }

    let temperature = match &settings.temperature {
        None => None,
        Some(Temperature::Number(t)) => Some(*t),
        Some(Temperature::Text(raw)) => match raw.trim().parse::<f32>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push(format!("temperature: invalid value '{raw}'"));
                None
            }
        },
    };

    let api_key = credentials.resolve().map_err(|e| errors.push(e)).ok();

    match (model, api_key) {
        (Some(model), Some(api_key)) if errors.is_empty() => Ok(AiServiceConfig {
            provider: provider.to_string(),
            model,
            temperature,
            api_key,
        }),
        _ => Err(errors.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"{
        "acmeinc": {
            "aiProviders": {
                "openAI": {"api_key": "sk-test-openai"},
                "anthropic": {"api_key": "sk-test-anthropic"}
            },
            "creatives": [
                {"openAI": {"model": "gpt-4o-2024-08-06", "temperature": "0.7"}},
                {"anthropic": {"model": "claude-3-5-sonnet-20240620", "temperature": 0.7}},
                {"replicate": {"model": "llama-3"}}
            ],
            "prescreener": [
                {"openAI": {"temperature": "0.5"},
                 "anthropic": {"model": "claude-3-5-sonnet-20240620", "temperature": "warm"}}
            ]
        },
        "nosubs": {
            "creatives": [{"openAI": {"model": "gpt-4o"}}]
        },
        "unkeyed": {
            "aiProviders": {"openAI": {"api_key_env": "CREATIVES_TEST_KEY_THAT_IS_NEVER_SET"}},
            "creatives": [{"openAI": {"model": "gpt-4o"}}]
        }
    }"#;

    fn registry() -> ServiceRegistry {
        ServiceRegistry::from_json_str(REGISTRY).unwrap()
    }

    #[test]
    fn resolves_subscribed_providers() {
        let resolved = registry().ai_service_configs("acmeinc", "creatives").unwrap();
        assert!(resolved.invalid.is_empty());
        assert_eq!(resolved.configs.len(), 2);

        let openai = &resolved.configs["openAI"];
        assert_eq!(openai.provider, "openAI");
        assert_eq!(openai.model, "gpt-4o-2024-08-06");
        assert_eq!(openai.temperature, Some(0.7));
        assert_eq!(openai.api_key, "sk-test-openai");

        let anthropic = &resolved.configs["anthropic"];
        assert_eq!(anthropic.model, "claude-3-5-sonnet-20240620");
    }

    #[test]
    fn unsubscribed_provider_is_skipped() {
        let resolved = registry().ai_service_configs("acmeinc", "creatives").unwrap();
        assert!(!resolved.configs.contains_key("replicate"));
        assert!(!resolved.invalid.contains_key("replicate"));
    }

    #[test]
    fn invalid_entries_are_reported_per_provider() {
        let resolved = registry()
            .ai_service_configs("acmeinc", "prescreener")
            .unwrap();
        assert!(resolved.configs.is_empty());
        assert_eq!(resolved.invalid["openAI"], "model: missing");
        assert_eq!(
            resolved.invalid["anthropic"],
            "temperature: invalid value 'warm'"
        );
    }

    #[test]
    fn unset_key_env_is_invalid() {
        let resolved = registry().ai_service_configs("unkeyed", "creatives").unwrap();
        assert!(resolved.configs.is_empty());
        assert!(resolved.invalid["openAI"].contains("CREATIVES_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn unknown_customer_errors() {
        let err = registry().ai_service_configs("globex", "creatives").unwrap_err();
        assert!(matches!(err, CoreError::UnknownCustomer(c) if c == "globex"));
    }

    #[test]
    fn customer_without_subscriptions_errors() {
        let err = registry().ai_service_configs("nosubs", "creatives").unwrap_err();
        assert!(matches!(err, CoreError::NoAiProviders(_)));
    }

    #[test]
    fn unknown_service_errors() {
        let err = registry().ai_service_configs("acmeinc", "website").unwrap_err();
        assert_eq!(err.to_string(), "no valid website config for acmeinc");
    }

    #[test]
    fn non_list_keys_are_ignored() {
        let registry = ServiceRegistry::from_json_str(
            r#"{
                "acmeinc": {
                    "name": "Acme",
                    "active": true,
                    "aiProviders": {"openAI": {"api_key": "sk-test"}},
                    "creatives": [{"openAI": {"model": "gpt-4o"}}]
                }
            }"#,
        )
        .unwrap();
        let acme = registry.customer("acmeinc").unwrap();
        assert_eq!(acme.services.len(), 1);
        let resolved = registry.ai_service_configs("acmeinc", "creatives").unwrap();
        assert_eq!(resolved.configs["openAI"].model, "gpt-4o");
        let err = registry.ai_service_configs("acmeinc", "name").unwrap_err();
        assert!(matches!(err, CoreError::NoServiceConfig { .. }));
    }

    #[test]
    fn null_ai_providers_affects_only_that_customer() {
        let registry = ServiceRegistry::from_json_str(
            r#"{
                "acmeinc": {
                    "aiProviders": {"openAI": {"api_key": "sk-test"}},
                    "creatives": [{"openAI": {"model": "gpt-4o"}}]
                },
                "lapsed": {
                    "aiProviders": null,
                    "creatives": [{"openAI": {"model": "gpt-4o"}}]
                }
            }"#,
        )
        .unwrap();
        let err = registry.ai_service_configs("lapsed", "creatives").unwrap_err();
        assert!(matches!(err, CoreError::NoAiProviders(c) if c == "lapsed"));
        assert!(registry.ai_service_configs("acmeinc", "creatives").is_ok());
    }

    #[test]
    fn builtin_has_acme_creatives() {
        let registry = ServiceRegistry::builtin();
        let acme = registry.customer("acmeinc").unwrap();
        assert_eq!(acme.services["creatives"].len(), 2);
        assert_eq!(acme.services["prescreener"][0].len(), 2);
        assert!(acme.ai_providers.contains_key("openAI"));
        assert!(acme.ai_providers.contains_key("anthropic"));
    }

    #[test]
    fn api_key_is_not_serialized() {
        let config = AiServiceConfig {
            provider: "openAI".into(),
            model: "gpt-4o".into(),
            temperature: None,
            api_key: "secret".into(),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn load_missing_file_errors() {
        let err = ServiceRegistry::load(Path::new("/nonexistent/creatives.json")).unwrap_err();
        assert!(matches!(err, CoreError::ConfigNotFound(_)));
    }
}
