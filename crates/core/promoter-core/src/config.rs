//! Validated run parameters
//!
//! Each operation takes its own request type with enumerated required fields.
//! `validate()` runs before any network call and reports problems as
//! [`PromotionError::Configuration`].

use crate::error::{PromotionError, Result};
use crate::types::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role session names accepted by the federation service
const SESSION_LABEL_MIN_LEN: usize = 2;
const SESSION_LABEL_MAX_LEN: usize = 64;

/// A contact-center instance in some account/region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentTarget {
    pub region: String,
    pub instance_id: String,
    /// Role to assume when the instance lives in another account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_arn: Option<String>,
}

impl EnvironmentTarget {
    pub fn new(region: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            instance_id: instance_id.into(),
            assume_role_arn: None,
        }
    }

    /// Reach this instance through role assumption
    pub fn with_assume_role(mut self, role_arn: impl Into<String>) -> Self {
        self.assume_role_arn = Some(role_arn.into());
        self
    }

    /// Environment for this target, acting with the caller's own credentials
    pub fn environment(&self) -> Environment {
        Environment::ambient(&self.region, &self.instance_id)
    }

    fn validate(&self, role: &str) -> Result<()> {
        require(&self.region, &format!("{role} region"))?;
        require(&self.instance_id, &format!("{role} instance id"))?;
        if let Some(arn) = &self.assume_role_arn {
            validate_role_arn(arn)
                .map_err(|e| PromotionError::config(format!("{role} role: {e}")))?;
        }
        Ok(())
    }
}

/// Parameters of an "associate functions" run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateRequest {
    pub destination: EnvironmentTarget,
    /// Function names or ARNs
    pub functions: Vec<String>,
    /// Unique per run; required whenever a role is assumed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_label: Option<String>,
}

impl AssociateRequest {
    pub fn new<I, S>(destination: EnvironmentTarget, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            destination,
            functions: functions.into_iter().map(Into::into).collect(),
            session_label: None,
        }
    }

    pub fn with_session_label(mut self, label: impl Into<String>) -> Self {
        self.session_label = Some(label.into());
        self
    }

    /// Requested functions with duplicates collapsed
    pub fn requested(&self) -> BTreeSet<String> {
        self.functions.iter().cloned().collect()
    }

    pub fn validate(&self) -> Result<()> {
        self.destination.validate("destination")?;
        require_names(&self.functions, "function")?;
        validate_session(self.session_label.as_deref(), [&self.destination])
    }
}

/// Parameters of a contact-flow or routing-profile promotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoteRequest {
    pub source: EnvironmentTarget,
    /// Where definitions would be written; credentials are acquired for it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<EnvironmentTarget>,
    /// Artifact names
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_label: Option<String>,
}

impl PromoteRequest {
    pub fn new<I, S>(source: EnvironmentTarget, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source,
            destination: None,
            names: names.into_iter().map(Into::into).collect(),
            session_label: None,
        }
    }

    pub fn with_destination(mut self, destination: EnvironmentTarget) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_session_label(mut self, label: impl Into<String>) -> Self {
        self.session_label = Some(label.into());
        self
    }

    /// Requested names with duplicates collapsed
    pub fn requested(&self) -> BTreeSet<String> {
        self.names.iter().cloned().collect()
    }

    pub fn validate(&self) -> Result<()> {
        self.source.validate("source")?;
        if let Some(destination) = &self.destination {
            destination.validate("destination")?;
        }
        require_names(&self.names, "artifact")?;
        validate_session(
            self.session_label.as_deref(),
            std::iter::once(&self.source).chain(self.destination.as_ref()),
        )
    }
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PromotionError::config(format!("{field} is required")));
    }
    Ok(())
}

fn require_names(names: &[String], what: &str) -> Result<()> {
    if names.is_empty() {
        return Err(PromotionError::config(format!(
            "at least one {what} name is required"
        )));
    }
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(PromotionError::config(format!("blank {what} name")));
    }
    Ok(())
}

fn validate_session<'a>(
    label: Option<&str>,
    targets: impl IntoIterator<Item = &'a EnvironmentTarget>,
) -> Result<()> {
    let assumes_role = targets.into_iter().any(|t| t.assume_role_arn.is_some());
    match label {
        Some(label) => validate_session_label(label),
        None if assumes_role => Err(PromotionError::config(
            "a session label is required when assuming a role",
        )),
        None => Ok(()),
    }
}

/// Check a role-session label: 2-64 characters of `[A-Za-z0-9_=,.@-]`
pub fn validate_session_label(label: &str) -> Result<()> {
    let len = label.chars().count();
    if !(SESSION_LABEL_MIN_LEN..=SESSION_LABEL_MAX_LEN).contains(&len) {
        return Err(PromotionError::config(format!(
            "session label must be {}-{} characters, got {len}",
            SESSION_LABEL_MIN_LEN, SESSION_LABEL_MAX_LEN
        )));
    }
    if let Some(bad) = label
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || "_=,.@-".contains(*c)))
    {
        return Err(PromotionError::config(format!(
            "session label contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

/// Check the shape `arn:<partition>:iam::<12-digit account>:role/<name>`
pub fn validate_role_arn(arn: &str) -> Result<()> {
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    let valid = matches!(
        parts.as_slice(),
        ["arn", partition, "iam", "", account, resource]
            if !partition.is_empty()
                && account.len() == 12
                && account.chars().all(|c| c.is_ascii_digit())
                && resource.strip_prefix("role/").is_some_and(|name| !name.is_empty())
    );
    if !valid {
        return Err(PromotionError::config(format!("not an IAM role ARN: {arn}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLE: &str = "arn:aws:iam::538718130184:role/cross-account-promoter";

    fn target() -> EnvironmentTarget {
        EnvironmentTarget::new("us-east-1", "2c0e519a-a65c-455b-836b-dd2d3fa07b32")
    }

    #[test]
    fn test_role_arn_shapes() {
        assert!(validate_role_arn(ROLE).is_ok());
        assert!(validate_role_arn("arn:aws-us-gov:iam::123456789012:role/path/name").is_ok());
        assert!(validate_role_arn("arn:aws:iam::12345:role/x").is_err());
        assert!(validate_role_arn("arn:aws:iam::538718130184:user/x").is_err());
        assert!(validate_role_arn("arn:aws:iam::538718130184:role/").is_err());
        assert!(validate_role_arn("arn:aws:sts::538718130184:role/x").is_err());
        assert!(validate_role_arn("role/x").is_err());
    }

    #[test]
    fn test_session_label_rules() {
        assert!(validate_session_label("pipeline-session").is_ok());
        assert!(validate_session_label("run_1=a,b.c@d").is_ok());
        assert!(validate_session_label("x").is_err());
        assert!(validate_session_label(&"a".repeat(65)).is_err());
        assert!(validate_session_label("has space").is_err());
    }

    #[test]
    fn test_associate_requires_functions() {
        let request = AssociateRequest::new(target(), Vec::<String>::new());
        let err = request.validate().unwrap_err();
        assert!(matches!(err, PromotionError::Configuration(_)));

        let request = AssociateRequest::new(target(), ["ok", "  "]);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_associate_requires_instance_and_region() {
        let request = AssociateRequest::new(EnvironmentTarget::new("", "i"), ["fn"]);
        assert_eq!(
            request.validate().unwrap_err().to_string(),
            "Configuration error: destination region is required"
        );

        let request = AssociateRequest::new(EnvironmentTarget::new("us-east-1", " "), ["fn"]);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_role_requires_session_label() {
        let request = AssociateRequest::new(target().with_assume_role(ROLE), ["fn"]);
        assert!(request.validate().is_err());
        assert!(request.with_session_label("run-42").validate().is_ok());
    }

    #[test]
    fn test_promote_destination_role_requires_session_label() {
        let request = PromoteRequest::new(target(), ["_test"])
            .with_destination(EnvironmentTarget::new("us-west-2", "dest").with_assume_role(ROLE));
        assert!(request.validate().is_err());
        assert!(request.with_session_label("run-42").validate().is_ok());
    }

    #[test]
    fn test_requested_collapses_duplicates() {
        let request = PromoteRequest::new(target(), ["b", "a", "b"]);
        let requested: Vec<String> = request.requested().into_iter().collect();
        assert_eq!(requested, vec!["a", "b"]);
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "source": {"region": "us-east-1", "instance_id": "src"},
            "destination": {
                "region": "us-east-1",
                "instance_id": "dst",
                "assume_role_arn": "arn:aws:iam::538718130184:role/cross-account-promoter"
            },
            "names": ["_test", "_test2"],
            "session_label": "pipeline-session"
        }"#;

        let request: PromoteRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.destination.unwrap().assume_role_arn.as_deref(), Some(ROLE));
    }
}
