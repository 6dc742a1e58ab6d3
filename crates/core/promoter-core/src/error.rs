//! Error types for promotion runs

use std::fmt;
use thiserror::Error;

/// Result type for every promotion operation
pub type Result<T> = std::result::Result<T, PromotionError>;

/// Kind of resource a requested name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Compute (Lambda) function
    Function,
    /// Contact flow
    ContactFlow,
    /// Routing profile
    RoutingProfile,
}

impl ResourceKind {
    /// Remote listing call for this kind of resource
    pub fn list_operation(&self) -> &'static str {
        match self {
            ResourceKind::Function => "ListFunctions",
            ResourceKind::ContactFlow => "ListContactFlows",
            ResourceKind::RoutingProfile => "ListRoutingProfiles",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Function => write!(f, "function"),
            ResourceKind::ContactFlow => write!(f, "contact flow"),
            ResourceKind::RoutingProfile => write!(f, "routing profile"),
        }
    }
}

/// Every way a promotion run can fail. All of them are fatal to the run.
#[derive(Error, Debug)]
pub enum PromotionError {
    /// Role assumption rejected, or credentials unusable
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// One or more requested names could not be resolved
    #[error("{kind} not found: {}", names.join(", "))]
    ResourceNotFound {
        /// Kind of resource that was looked up
        kind: ResourceKind,
        /// Every unresolved name, sorted
        names: Vec<String>,
    },

    /// A listing, describe or create call failed
    #[error("Remote operation {operation} failed: {message}")]
    RemoteOperation {
        /// Name of the remote call
        operation: String,
        /// Rendered failure
        message: String,
    },

    /// Required run parameters absent or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PromotionError {
    /// Create an authorization error
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Create a remote operation error
    pub fn remote(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::RemoteOperation {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a not-found error; names are sorted and de-duplicated
    pub fn not_found<I, S>(kind: ResourceKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self::ResourceNotFound { kind, names }
    }
}
