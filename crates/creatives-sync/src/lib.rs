//! Remote I/O: GraphQL refinement mutation, question augmentation, ClinicalTrials.gov.

pub mod augment;
pub mod ctgov;
pub mod graphql;
pub mod refine;

pub use augment::{AugmentOutcome, augment};
pub use ctgov::{CtGovClient, CtGovError, RetryPolicy, TrialSource};
pub use graphql::{GraphqlClient, GraphqlError};
pub use refine::{AUGMENT_MUTATION, RefineError, RefinementTransport, refine};
