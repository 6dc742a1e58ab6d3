//! # Promoter AWS Orchestrator
//!
//! AWS bindings for the promotion engine in `promoter-core`.
//!
//! ## Architecture
//!
//! ```text
//! PromotionOrchestrator (core)
//! ├── StsCredentialBroker   AssumeRole, one hop, never retried
//! └── AwsClientFactory      clients bound to an Environment
//!     ├── ConnectAssociations   ListLambdaFunctions / AssociateLambdaFunction
//!     ├── LambdaFunctions       ListFunctions
//!     ├── ConnectFlows          ListContactFlows / DescribeContactFlow
//!     └── ConnectProfiles       ListRoutingProfiles / DescribeRoutingProfile
//! ```
//!
//! Every SDK failure is mapped into a [`promoter_core::PromotionError`] at
//! the call site, so callers only ever see the core error type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clients;
pub mod connect;
pub mod error;
pub mod lambda;
pub mod sts;

pub use clients::AwsClientFactory;
pub use connect::{ConnectAssociations, ConnectFlows, ConnectProfiles};
pub use lambda::LambdaFunctions;
pub use sts::StsCredentialBroker;

/// Region used for the federation endpoint when no region is configured
pub const DEFAULT_REGION: &str = "us-east-1";
