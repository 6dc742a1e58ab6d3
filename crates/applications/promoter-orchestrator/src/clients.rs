//! Clients bound to an environment
//!
//! Ambient environments use the default credential chain of the process.
//! Federated environments get a static provider holding the brokered
//! session, so every client built for them acts in the other account.

use crate::connect::{ConnectAssociations, ConnectFlows, ConnectProfiles};
use crate::lambda::LambdaFunctions;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::Credentials as SdkCredentials;
use aws_types::region::Region;
use promoter_core::{AccountCredentials, ClientFactory, Environment, PageSizes};
use std::time::SystemTime;
use tracing::debug;

/// Provider name reported by credentials issued through role assumption
const FEDERATED_PROVIDER: &str = "promoter-sts";

/// Builds AWS clients for an environment. Construction performs no I/O.
#[derive(Debug, Clone)]
pub struct AwsClientFactory {
    base: SdkConfig,
    profile_queue_page_size: i32,
}

impl AwsClientFactory {
    /// Create a factory on top of an already loaded config
    pub fn new(base: SdkConfig) -> Self {
        Self {
            base,
            profile_queue_page_size: PageSizes::default().profile_queues,
        }
    }

    /// Load the default config chain (environment, profile, instance metadata)
    pub async fn from_env() -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(base)
    }

    /// Apply the page size used when listing routing-profile queues
    pub fn with_page_sizes(mut self, page_sizes: PageSizes) -> Self {
        self.profile_queue_page_size = page_sizes.profile_queues;
        self
    }

    /// Shared config the clients are derived from
    pub fn base(&self) -> &SdkConfig {
        &self.base
    }

    /// Connect client for `env`
    pub fn connect_client(&self, env: &Environment) -> aws_sdk_connect::Client {
        debug!(region = %env.region(), federated = env.is_federated(), "Creating Connect client");

        let mut builder = aws_sdk_connect::config::Builder::from(&self.base)
            .region(Region::new(env.region().to_string()));
        if let Some(credentials) = federated_credentials(env) {
            builder = builder.credentials_provider(credentials);
        }

        aws_sdk_connect::Client::from_conf(builder.build())
    }

    /// Lambda client for `env`
    pub fn lambda_client(&self, env: &Environment) -> aws_sdk_lambda::Client {
        debug!(region = %env.region(), federated = env.is_federated(), "Creating Lambda client");

        let mut builder = aws_sdk_lambda::config::Builder::from(&self.base)
            .region(Region::new(env.region().to_string()));
        if let Some(credentials) = federated_credentials(env) {
            builder = builder.credentials_provider(credentials);
        }

        aws_sdk_lambda::Client::from_conf(builder.build())
    }
}

fn federated_credentials(env: &Environment) -> Option<SdkCredentials> {
    match env.credentials() {
        AccountCredentials::Ambient => None,
        AccountCredentials::Federated(credentials) => Some(SdkCredentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            Some(SystemTime::from(credentials.expiry)),
            FEDERATED_PROVIDER,
        )),
    }
}

impl ClientFactory for AwsClientFactory {
    type Associations = ConnectAssociations;
    type Functions = LambdaFunctions;
    type Flows = ConnectFlows;
    type Profiles = ConnectProfiles;

    fn associations(&self, env: &Environment) -> ConnectAssociations {
        ConnectAssociations::new(self.connect_client(env))
    }

    fn functions(&self, env: &Environment) -> LambdaFunctions {
        LambdaFunctions::new(self.lambda_client(env))
    }

    fn flows(&self, env: &Environment) -> ConnectFlows {
        ConnectFlows::new(self.connect_client(env))
    }

    fn profiles(&self, env: &Environment) -> ConnectProfiles {
        ConnectProfiles::new(self.connect_client(env), self.profile_queue_page_size)
    }
}
