//! Request-scoped value objects shared by every component

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque ARN or name. Compared by exact string equality, never normalized.
pub type ResourceIdentifier = String;

/// Short-lived credentials issued by the federation service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiry: DateTime<Utc>,
}

impl Credentials {
    /// Whether these credentials are unusable at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Where an environment's credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountCredentials {
    /// The caller's own credentials (default provider chain)
    Ambient,
    /// Credentials brokered through role assumption
    Federated(Credentials),
}

/// One account/region pairing hosting a contact-center instance.
///
/// Immutable after construction; credentials are only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    credentials: AccountCredentials,
    region: String,
    instance_id: String,
}

impl Environment {
    /// Environment acting with the caller's own credentials
    pub fn ambient(region: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            credentials: AccountCredentials::Ambient,
            region: region.into(),
            instance_id: instance_id.into(),
        }
    }

    /// Replace the credentials with brokered ones
    pub fn with_credentials(self, credentials: Credentials) -> Self {
        Self {
            credentials: AccountCredentials::Federated(credentials),
            ..self
        }
    }

    pub fn credentials(&self) -> &AccountCredentials {
        &self.credentials
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Whether this environment crossed an account boundary
    pub fn is_federated(&self) -> bool {
        matches!(self.credentials, AccountCredentials::Federated(_))
    }
}

/// A function wired into a contact-center instance
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Association {
    pub function_arn: ResourceIdentifier,
    pub instance_id: String,
}

impl Association {
    pub fn new(function_arn: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            function_arn: function_arn.into(),
            instance_id: instance_id.into(),
        }
    }
}

/// Entry of the function inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSummary {
    pub name: String,
    pub arn: ResourceIdentifier,
}

impl FunctionSummary {
    pub fn new(name: impl Into<String>, arn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arn: arn.into(),
        }
    }
}

/// Entry of a flow or routing-profile listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub id: String,
    pub name: String,
}

impl ArtifactSummary {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Full contact flow as fetched from an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFlowDefinition {
    pub id: String,
    pub name: String,
    /// Serialized flow graph, passed through untouched
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_type: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Channel concurrency limit of a routing profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConcurrency {
    pub channel: String,
    pub concurrency: i32,
}

/// Queue wiring of a routing profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingQueueConfig {
    pub channel: String,
    pub queue_id: String,
    pub priority: i32,
    pub delay: i32,
}

/// Full routing profile as fetched from an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingProfileDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_outbound_queue_id: Option<String>,
    #[serde(default)]
    pub media_concurrencies: Vec<MediaConcurrency>,
    #[serde(default)]
    pub queue_configs: Vec<RoutingQueueConfig>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Outcome of an "associate functions" run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationOutcome {
    pub instance_id: String,
    /// Associations created by this run
    pub created: Vec<Association>,
    /// Requested ARNs that were already associated
    pub already_associated: Vec<ResourceIdentifier>,
    /// Associated ARNs that were not requested; reported, never removed
    pub unmanaged: Vec<ResourceIdentifier>,
}
