//! Batch association creation
//!
//! All creation calls are issued at once and joined before returning. If any
//! call fails the batch fails as a whole and no partial-success value is
//! handed back. Calls that did succeed stay in effect: there is no rollback,
//! re-running the promotion is the recovery path.

use crate::error::{PromotionError, Result};
use crate::traits::AssociationService;
use crate::types::Association;
use futures::future::join_all;
use tracing::{debug, info, warn};

/// Operation name reported when a batch fails
pub const CREATE_ASSOCIATION_OPERATION: &str = "AssociateLambdaFunction";

/// Applies a batch of association creations against one destination
pub struct AssociationExecutor<'a, S: ?Sized> {
    service: &'a S,
}

impl<'a, S> AssociationExecutor<'a, S>
where
    S: AssociationService + ?Sized,
{
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Create every association, concurrently.
    ///
    /// Completes only once every call has completed. Returns the created
    /// associations, or one error naming every failed association.
    pub async fn execute(&self, associations: &[Association]) -> Result<Vec<Association>> {
        if associations.is_empty() {
            debug!("No associations to create");
            return Ok(Vec::new());
        }

        info!(count = associations.len(), "Creating associations");

        let outcomes = join_all(associations.iter().map(|association| async move {
            let outcome = self.service.create_association(association).await;
            (association, outcome)
        }))
        .await;

        let mut failures = Vec::new();
        for (association, outcome) in outcomes {
            match outcome {
                Ok(()) => debug!(
                    function_arn = %association.function_arn,
                    instance_id = %association.instance_id,
                    "Association created"
                ),
                Err(e) => {
                    warn!(
                        function_arn = %association.function_arn,
                        instance_id = %association.instance_id,
                        error = %e,
                        "Association failed"
                    );
                    failures.push(format!("{} ({})", association.function_arn, e));
                }
            }
        }

        if !failures.is_empty() {
            return Err(PromotionError::remote(
                CREATE_ASSOCIATION_OPERATION,
                format!(
                    "{} of {} associations failed, others may already be applied: {}",
                    failures.len(),
                    associations.len(),
                    failures.join("; ")
                ),
            ));
        }

        info!(count = associations.len(), "All associations created");
        Ok(associations.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Page;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    #[derive(Default)]
    struct RecordingAssociations {
        fail_on: BTreeSet<String>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl RecordingAssociations {
        fn failing_on(arns: &[&str]) -> Self {
            Self {
                fail_on: arns.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl AssociationService for RecordingAssociations {
        async fn list_associations(
            &self,
            _instance_id: &str,
            _cursor: Option<String>,
            _page_size: i32,
        ) -> Result<Page<String>> {
            Ok(Page::last(Vec::new()))
        }

        async fn create_association(&self, association: &Association) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(association.function_arn.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::task::yield_now().await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail_on.contains(&association.function_arn) {
                return Err(PromotionError::remote(
                    CREATE_ASSOCIATION_OPERATION,
                    "AccessDenied",
                ));
            }
            Ok(())
        }
    }

    fn batch(arns: &[&str]) -> Vec<Association> {
        arns.iter().map(|a| Association::new(*a, "inst-1")).collect()
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let service = RecordingAssociations::default();
        let created = assert_ok!(
            AssociationExecutor::new(&service)
                .execute(&batch(&["arn:1", "arn:2"]))
                .await
        );
        assert_eq!(created, batch(&["arn:1", "arn:2"]));
    }

    #[tokio::test]
    async fn test_empty_batch_issues_no_calls() {
        let service = RecordingAssociations::default();
        let created = assert_ok!(AssociationExecutor::new(&service).execute(&[]).await);
        assert!(created.is_empty());
        assert!(service.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_batch_but_every_call_is_issued() {
        let service = RecordingAssociations::failing_on(&["arn:2"]);

        let result = AssociationExecutor::new(&service)
            .execute(&batch(&["arn:1", "arn:2", "arn:3"]))
            .await;

        let err = assert_err!(result);
        match err {
            PromotionError::RemoteOperation { operation, message } => {
                assert_eq!(operation, CREATE_ASSOCIATION_OPERATION);
                assert!(message.starts_with("1 of 3 associations failed"));
                assert!(message.contains("arn:2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let calls = service.calls.lock().unwrap();
        assert!(calls.contains(&"arn:1".to_string()));
        assert!(calls.contains(&"arn:3".to_string()));
        assert_eq!(calls.len(), 3);
    }

    #[tokio::test]
    async fn test_calls_are_fanned_out() {
        let service = RecordingAssociations::default();
        assert_ok!(
            AssociationExecutor::new(&service)
                .execute(&batch(&["arn:1", "arn:2", "arn:3"]))
                .await
        );
        assert_eq!(service.peak_in_flight.load(Ordering::SeqCst), 3);
    }
}
