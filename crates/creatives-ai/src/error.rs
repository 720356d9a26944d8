use creatives_core::CoreError;
use creatives_sync::CtGovError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} returned no usable content")]
    EmptyResponse(String),

    #[error("cannot create a prompt without {0}")]
    MissingPromptInput(&'static str),

    #[error("prompt template error: {0}")]
    Template(String),

    #[error("no usable AI clients for {customer}/{service}")]
    NoClients { customer: String, service: String },

    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Trial(#[from] CtGovError),
}
