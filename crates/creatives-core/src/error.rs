use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("refinement instruction is required")]
    EmptyInstruction,

    #[error("customer '{0}' not found")]
    UnknownCustomer(String),

    #[error("customer '{0}' has no AI subscriptions")]
    NoAiProviders(String),

    #[error("no valid {service} config for {customer}")]
    NoServiceConfig { customer: String, service: String },

    #[error("brief summary or eligibility missing for {0}")]
    IncompleteTrial(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
