//! Credential broker backed by AWS STS
//!
//! One `AssumeRole` call per run. Rejections are never retried; the SDK's own
//! retry policy is turned off so a rejected trust relationship surfaces
//! immediately.

use crate::error;
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_sdk_sts::Client as StsClient;
use aws_types::region::Region;
use chrono::DateTime;
use promoter_core::{CredentialBroker, Credentials, PromotionError, Result};
use tracing::{debug, info};

/// Shortest session STS accepts
pub const MIN_SESSION_DURATION_SECS: i32 = 900;

/// Brokers cross-account credentials through role assumption
pub struct StsCredentialBroker {
    client: StsClient,
    /// Optional duration hint for issued sessions
    duration_secs: Option<i32>,
}

impl StsCredentialBroker {
    /// Create a new broker
    pub fn new(client: StsClient) -> Self {
        Self {
            client,
            duration_secs: None,
        }
    }

    /// Create from AWS config, falling back to `region` when the config has none
    pub fn from_config(config: &aws_config::SdkConfig, region: &str) -> Self {
        let region = config
            .region()
            .cloned()
            .unwrap_or_else(|| Region::new(region.to_string()));

        let sts_config = aws_sdk_sts::config::Builder::from(config)
            .region(region)
            .retry_config(RetryConfig::disabled())
            .build();

        Self::new(StsClient::from_conf(sts_config))
    }

    /// Request sessions of the given length (clamped to the STS minimum)
    pub fn with_duration(mut self, secs: Option<i32>) -> Self {
        self.duration_secs = secs.map(|s| s.max(MIN_SESSION_DURATION_SECS));
        self
    }
}

#[async_trait]
impl CredentialBroker for StsCredentialBroker {
    async fn assume(&self, role_arn: &str, session_label: &str) -> Result<Credentials> {
        info!(
            role_arn = %role_arn,
            session = %session_label,
            "Assuming role"
        );

        let response = self
            .client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_label)
            .set_duration_seconds(self.duration_secs)
            .send()
            .await
            .map_err(|e| error::assume_role(role_arn, e))?;

        let credentials = response.credentials().ok_or_else(|| {
            PromotionError::authorization(format!(
                "AssumeRole for {role_arn} returned no credentials"
            ))
        })?;

        let credentials = credentials_from_sts(credentials)?;
        debug!(expiry = %credentials.expiry, "Role assumed");

        Ok(credentials)
    }
}

/// Convert STS credentials into the core credentials type
pub fn credentials_from_sts(credentials: &aws_sdk_sts::types::Credentials) -> Result<Credentials> {
    let expiration = credentials.expiration();
    let expiry = DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos())
        .ok_or_else(|| error::missing_field("AssumeRole", "Credentials.Expiration"))?;

    Ok(Credentials {
        access_key_id: credentials.access_key_id().to_string(),
        secret_access_key: credentials.secret_access_key().to_string(),
        session_token: credentials.session_token().to_string(),
        expiry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::BehaviorVersion;
    use aws_sdk_sts::primitives::DateTime as SmithyDateTime;

    #[test]
    fn test_credentials_from_sts() {
        let sts = aws_sdk_sts::types::Credentials::builder()
            .access_key_id("ASIAEXAMPLE")
            .secret_access_key("secret")
            .session_token("token")
            .expiration(SmithyDateTime::from_secs(1_700_000_000))
            .build()
            .unwrap();

        let credentials = credentials_from_sts(&sts).unwrap();
        assert_eq!(credentials.access_key_id, "ASIAEXAMPLE");
        assert_eq!(credentials.secret_access_key, "secret");
        assert_eq!(credentials.session_token, "token");
        assert_eq!(credentials.expiry.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_duration_clamped_to_minimum() {
        let config = aws_config::SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .build();

        let broker = StsCredentialBroker::from_config(&config, "us-east-1");
        let broker = broker.with_duration(Some(60));
        assert_eq!(broker.duration_secs, Some(MIN_SESSION_DURATION_SECS));

        let broker = StsCredentialBroker::from_config(&config, "us-east-1");
        let broker = broker.with_duration(Some(3600));
        assert_eq!(broker.duration_secs, Some(3600));
    }

    #[test]
    fn test_region_falls_back_when_config_has_none() {
        let config = aws_config::SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .build();

        let broker = StsCredentialBroker::from_config(&config, "eu-west-2");
        assert_eq!(
            broker.client.config().region().map(|r| r.as_ref()),
            Some("eu-west-2")
        );
    }
}
