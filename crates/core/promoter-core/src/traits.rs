//! Service traits for the remote collaborators
//!
//! The reconciliation engine works through these interfaces ONLY. Concrete
//! bindings (AWS SDK, in-memory fakes) live outside this crate.

use async_trait::async_trait;

use crate::error::{ResourceKind, Result};
use crate::types::*;

/// One page returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent when the remote has nothing more to return
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// Final page of a listing
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

/// Obtains short-lived credentials by federating through a trust relationship
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Single role assumption. Rejections surface as `Authorization` and are never retried.
    async fn assume(&self, role_arn: &str, session_label: &str) -> Result<Credentials>;
}

/// Inventory of compute functions in an environment
#[async_trait]
pub trait FunctionInventory: Send + Sync {
    async fn list_functions(
        &self,
        cursor: Option<String>,
        page_size: i32,
    ) -> Result<Page<FunctionSummary>>;
}

/// Function associations of a contact-center instance
#[async_trait]
pub trait AssociationService: Send + Sync {
    /// ARNs of the functions currently associated with `instance_id`
    async fn list_associations(
        &self,
        instance_id: &str,
        cursor: Option<String>,
        page_size: i32,
    ) -> Result<Page<ResourceIdentifier>>;

    /// Idempotent: creating an existing association is harmless
    async fn create_association(&self, association: &Association) -> Result<()>;
}

/// Read side of a named artifact collection (contact flows, routing profiles)
#[async_trait]
pub trait ArtifactInventory: Send + Sync {
    type Definition: Send + Sync + 'static;

    fn kind(&self) -> ResourceKind;

    async fn list_summaries(
        &self,
        instance_id: &str,
        cursor: Option<String>,
        page_size: i32,
    ) -> Result<Page<ArtifactSummary>>;

    async fn describe(&self, instance_id: &str, artifact_id: &str) -> Result<Self::Definition>;
}

/// Writes a fetched definition into a destination instance.
///
/// Extension point: the orchestrator hands definitions to a writer only when
/// one is attached and a destination is given. No AWS writer exists yet.
#[async_trait]
pub trait ArtifactWriter<D: Sync>: Send + Sync {
    async fn write(&self, destination: &Environment, definition: &D) -> Result<()>;
}

/// Builds clients bound to an environment.
///
/// Construction performs no I/O and never fails; only use can fail. Clients
/// built from the same environment must not share mutable state.
pub trait ClientFactory: Send + Sync {
    type Associations: AssociationService;
    type Functions: FunctionInventory;
    type Flows: ArtifactInventory<Definition = ContactFlowDefinition>;
    type Profiles: ArtifactInventory<Definition = RoutingProfileDefinition>;

    fn associations(&self, env: &Environment) -> Self::Associations;
    fn functions(&self, env: &Environment) -> Self::Functions;
    fn flows(&self, env: &Environment) -> Self::Flows;
    fn profiles(&self, env: &Environment) -> Self::Profiles;
}
