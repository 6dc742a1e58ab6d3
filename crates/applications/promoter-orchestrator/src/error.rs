//! Conversion of AWS SDK failures into promotion errors

use aws_sdk_sts::error::{DisplayErrorContext, SdkError};
use aws_sdk_sts::operation::assume_role::AssumeRoleError;
use promoter_core::PromotionError;
use std::error::Error;
use std::fmt::Debug;

/// Wrap any SDK failure as a failed remote operation, keeping the full cause chain
pub fn remote<E>(operation: &str, err: E) -> PromotionError
where
    E: Error,
{
    PromotionError::remote(operation, DisplayErrorContext(err))
}

/// Error codes STS uses when the caller may not assume the role
const TRUST_REJECTION_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "ExpiredToken",
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "UnrecognizedClientException",
];

/// Classify a role-assumption failure.
///
/// Only a trust or permission rejection is an authorization failure. Other
/// service errors (disabled region, oversized or malformed session policy)
/// and transport failures are remote failures.
pub fn assume_role<R>(role_arn: &str, err: SdkError<AssumeRoleError, R>) -> PromotionError
where
    R: Debug,
{
    let rejected = match &err {
        SdkError::ServiceError(context) => is_trust_rejection(context.err()),
        _ => false,
    };

    if rejected {
        PromotionError::authorization(format!(
            "assuming {role_arn} was rejected: {}",
            DisplayErrorContext(&err)
        ))
    } else {
        remote("AssumeRole", err)
    }
}

fn is_trust_rejection(err: &AssumeRoleError) -> bool {
    err.is_expired_token_exception()
        || err
            .meta()
            .code()
            .is_some_and(|code| TRUST_REJECTION_CODES.contains(&code))
}

/// A response that lacks a field the model promises
pub fn missing_field(operation: &str, field: &str) -> PromotionError {
    PromotionError::remote(operation, format!("response missing {field}"))
}
