//! Core types for ad creatives and AI-assisted question refinement.

pub mod config;
pub mod creative;
mod error;
pub mod question;
pub mod refinement;
pub mod trial;

pub use config::{AiServiceConfig, ResolvedServiceConfigs, ServiceRegistry};
pub use creative::{AdCreative, AdCreatives, CreativeItem, PublishAction};
pub use error::CoreError;
pub use question::QuestionDraft;
pub use refinement::{RefinementRequest, RefinementResult, Tone, compose_original};
pub use trial::{Study, TrialSummary};
