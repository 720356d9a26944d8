//! AI layer: LLM provider clients, structured prompts, creatives generation,
//! and an LLM-backed refinement transport.

mod anthropic;
mod client;
mod error;
pub mod generate;
mod openai;
pub mod prompt;
mod refiner;
mod registry;
pub mod schema;

pub use anthropic::AnthropicClient;
pub use client::AiClient;
pub use error::AiError;
pub use generate::{CREATIVES_SERVICE, CreativesGenerator, GeneratedCreatives};
pub use openai::OpenAiClient;
pub use prompt::{Prompt, PromptTemplate, StructuredPrompt, creatives_prompt, refinement_prompt};
pub use refiner::AiRefiner;
pub use registry::{ClientFactory, ClientRegistry};
