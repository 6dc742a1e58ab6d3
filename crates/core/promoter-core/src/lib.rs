//! # Promoter Core
//!
//! Cross-environment reconciliation engine for contact-center promotion.
//!
//! ```text
//! PromotionOrchestrator
//!  ├── CredentialBroker       (role assumption, cross-account only)
//!  ├── ClientFactory          (clients bound to an Environment)
//!  ├── pagination::collect_all (one per remote collection)
//!  ├── reconcile::diff        (pure set difference)
//!  └── AssociationExecutor    (concurrent fan-out, all-or-nothing result)
//! ```
//!
//! Nothing here talks to a network directly; remote collaborators are
//! reached through the traits in [`traits`].

pub mod config;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod pagination;
pub mod reconcile;
pub mod traits;
pub mod types;

pub use config::{AssociateRequest, EnvironmentTarget, PromoteRequest};
pub use error::{PromotionError, ResourceKind, Result};
pub use executor::AssociationExecutor;
pub use orchestrator::{PromotionOrchestrator, RunPhase, RunTracker};
pub use pagination::{PageSizes, collect_all, paginate};
pub use reconcile::{Diff, diff};
pub use traits::*;
pub use types::*;
