//! Promotion orchestration
//!
//! Coordinates one run of either operation:
//!
//! ```text
//! Idle
//!  ├── CredentialsAcquired   (only when a role is assumed)
//!  ├── SourceInventoried     (paginated listings)
//!  ├── Reconciled            (resolve names, diff)
//!  ├── Applied               (create associations / hand to writer)
//!  └── Done
//! ```
//!
//! Any failure moves the run to `Failed` and is returned verbatim. There is
//! no retry and no resumption; every run starts at `Idle` and recomputes
//! state from the live environments.

use crate::config::{AssociateRequest, EnvironmentTarget, PromoteRequest};
use crate::error::{PromotionError, ResourceKind, Result};
use crate::executor::AssociationExecutor;
use crate::pagination::{PageSizes, collect_all};
use crate::reconcile::{diff, resolve_functions, select_artifacts};
use crate::traits::{
    ArtifactInventory, ArtifactWriter, AssociationService, ClientFactory, CredentialBroker,
    FunctionInventory,
};
use crate::types::*;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Operation name of the association listing
pub const LIST_ASSOCIATIONS_OPERATION: &str = "ListLambdaFunctions";

/// Phase of a single promotion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    CredentialsAcquired,
    SourceInventoried,
    Reconciled,
    Applied,
    Done,
    Failed,
}

/// Tracks and logs the phase transitions of one run
#[derive(Debug)]
pub struct RunTracker {
    operation: &'static str,
    history: Vec<RunPhase>,
}

impl RunTracker {
    pub fn new(operation: &'static str) -> Self {
        info!(operation, "Run started");
        Self {
            operation,
            history: vec![RunPhase::Idle],
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.history.last().copied().unwrap_or(RunPhase::Idle)
    }

    /// Every phase visited so far, in order
    pub fn history(&self) -> &[RunPhase] {
        &self.history
    }

    pub fn advance(&mut self, next: RunPhase) {
        info!(
            operation = self.operation,
            from = ?self.phase(),
            to = ?next,
            "Run phase"
        );
        self.history.push(next);
    }

    /// Close the run: `Done` on success, `Failed` otherwise
    pub fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.advance(RunPhase::Done),
            Err(e) => {
                error!(
                    operation = self.operation,
                    phase = ?self.phase(),
                    error = %e,
                    "Run failed"
                );
                self.history.push(RunPhase::Failed);
            }
        }
        result
    }
}

/// Environments a promotion run acts on
#[derive(Debug, Clone)]
struct PromotionEnvironments {
    source: Environment,
    destination: Option<Environment>,
}

/// Drives "associate functions" and artifact promotion runs.
///
/// Holds no per-run state: every call builds its own environments and
/// clients, so concurrent runs never share anything mutable.
pub struct PromotionOrchestrator<B, F> {
    broker: B,
    factory: F,
    page_sizes: PageSizes,
    flow_writer: Option<Arc<dyn ArtifactWriter<ContactFlowDefinition>>>,
    profile_writer: Option<Arc<dyn ArtifactWriter<RoutingProfileDefinition>>>,
}

impl<B, F> PromotionOrchestrator<B, F>
where
    B: CredentialBroker,
    F: ClientFactory,
{
    pub fn new(broker: B, factory: F) -> Self {
        Self {
            broker,
            factory,
            page_sizes: PageSizes::default(),
            flow_writer: None,
            profile_writer: None,
        }
    }

    pub fn with_page_sizes(mut self, page_sizes: PageSizes) -> Self {
        self.page_sizes = page_sizes;
        self
    }

    /// Attach a writer for promoted contact flows
    pub fn with_flow_writer(
        mut self,
        writer: Arc<dyn ArtifactWriter<ContactFlowDefinition>>,
    ) -> Self {
        self.flow_writer = Some(writer);
        self
    }

    /// Attach a writer for promoted routing profiles
    pub fn with_profile_writer(
        mut self,
        writer: Arc<dyn ArtifactWriter<RoutingProfileDefinition>>,
    ) -> Self {
        self.profile_writer = Some(writer);
        self
    }

    pub fn page_sizes(&self) -> PageSizes {
        self.page_sizes
    }

    /// Associate the requested functions with the destination instance.
    ///
    /// Names resolve against the destination's own function inventory. Only
    /// associations missing from the instance are created, so a second run
    /// with the same request issues no creation calls.
    pub async fn associate_functions(
        &self,
        request: &AssociateRequest,
    ) -> Result<AssociationOutcome> {
        let mut run = RunTracker::new("associate-functions");
        let result = self.run_associate(request, &mut run).await;
        run.finish(result)
    }

    /// Fetch the named contact flows from the source instance
    pub async fn promote_flows(
        &self,
        request: &PromoteRequest,
    ) -> Result<Vec<ContactFlowDefinition>> {
        let mut run = RunTracker::new("promote-flows");
        let result = async {
            let envs = self.prepare_promotion(request, &mut run).await?;
            let inventory = self.factory.flows(&envs.source);
            let page_size = self.page_sizes.flows;
            let writer = self.flow_writer.as_deref();
            self.promote_with(&inventory, writer, page_size, request, &envs, &mut run).await
        }
        .await;
        run.finish(result)
    }

    /// Fetch the named routing profiles from the source instance
    pub async fn promote_profiles(
        &self,
        request: &PromoteRequest,
    ) -> Result<Vec<RoutingProfileDefinition>> {
        let mut run = RunTracker::new("promote-profiles");
        let result = async {
            let envs = self.prepare_promotion(request, &mut run).await?;
            let inventory = self.factory.profiles(&envs.source);
            let page_size = self.page_sizes.profiles;
            let writer = self.profile_writer.as_deref();
            self.promote_with(&inventory, writer, page_size, request, &envs, &mut run).await
        }
        .await;
        run.finish(result)
    }

    async fn run_associate(
        &self,
        request: &AssociateRequest,
        run: &mut RunTracker,
    ) -> Result<AssociationOutcome> {
        request.validate()?;

        let env = self
            .acquire(&request.destination, request.session_label.as_deref())
            .await?;
        if env.is_federated() {
            run.advance(RunPhase::CredentialsAcquired);
        }

        let functions = self.factory.functions(&env);
        let associations = self.factory.associations(&env);
        let instance_id = env.instance_id();

        let inventory = collect_all(
            ResourceKind::Function.list_operation(),
            self.page_sizes.functions,
            |cursor, size| functions.list_functions(cursor, size),
        )
        .await?;
        let resolved = resolve_functions(&request.requested(), &inventory)?;

        let observed: BTreeSet<ResourceIdentifier> = collect_all(
            LIST_ASSOCIATIONS_OPERATION,
            self.page_sizes.associations,
            |cursor, size| associations.list_associations(instance_id, cursor, size),
        )
        .await?
        .into_iter()
        .collect();
        run.advance(RunPhase::SourceInventoried);

        info!(
            instance_id = %instance_id,
            functions = inventory.len(),
            associated = observed.len(),
            "Destination inventoried"
        );

        let desired: BTreeSet<ResourceIdentifier> = resolved.into_values().collect();
        let changes = diff(&desired, &observed);
        run.advance(RunPhase::Reconciled);

        info!(
            to_create = changes.to_create.len(),
            unmanaged = changes.to_remove.len(),
            "Reconciled associations"
        );

        let to_create: Vec<Association> = changes
            .to_create
            .iter()
            .map(|arn| Association::new(arn.clone(), instance_id))
            .collect();
        let created = AssociationExecutor::new(&associations)
            .execute(&to_create)
            .await?;
        run.advance(RunPhase::Applied);

        Ok(AssociationOutcome {
            instance_id: instance_id.to_string(),
            created,
            already_associated: desired.intersection(&observed).cloned().collect(),
            unmanaged: changes.to_remove.into_iter().collect(),
        })
    }

    async fn prepare_promotion(
        &self,
        request: &PromoteRequest,
        run: &mut RunTracker,
    ) -> Result<PromotionEnvironments> {
        request.validate()?;

        let label = request.session_label.as_deref();
        let source = self.acquire(&request.source, label).await?;
        let destination = match &request.destination {
            Some(target) => Some(self.acquire(target, label).await?),
            None => None,
        };

        if source.is_federated() || destination.as_ref().is_some_and(Environment::is_federated) {
            run.advance(RunPhase::CredentialsAcquired);
        }

        Ok(PromotionEnvironments {
            source,
            destination,
        })
    }

    async fn promote_with<I>(
        &self,
        inventory: &I,
        writer: Option<&dyn ArtifactWriter<I::Definition>>,
        page_size: i32,
        request: &PromoteRequest,
        envs: &PromotionEnvironments,
        run: &mut RunTracker,
    ) -> Result<Vec<I::Definition>>
    where
        I: ArtifactInventory,
    {
        let kind = inventory.kind();
        let source_instance = envs.source.instance_id();

        let summaries = collect_all(kind.list_operation(), page_size, |cursor, size| {
            inventory.list_summaries(source_instance, cursor, size)
        })
        .await?;
        run.advance(RunPhase::SourceInventoried);

        info!(
            kind = %kind,
            instance_id = %source_instance,
            available = summaries.len(),
            "Source inventoried"
        );

        let selected = select_artifacts(kind, &request.requested(), &summaries)?;
        run.advance(RunPhase::Reconciled);

        let mut definitions = Vec::with_capacity(selected.len());
        for summary in &selected {
            debug!(kind = %kind, id = %summary.id, name = %summary.name, "Fetching definition");
            definitions.push(inventory.describe(source_instance, &summary.id).await?);
        }

        // Applying is a no-op unless both a destination and a writer are present
        match (&envs.destination, writer) {
            (Some(destination), Some(writer)) => {
                for definition in &definitions {
                    writer.write(destination, definition).await?;
                }
                info!(
                    kind = %kind,
                    instance_id = %destination.instance_id(),
                    count = definitions.len(),
                    "Definitions written to destination"
                );
            }
            (Some(destination), None) => {
                info!(
                    kind = %kind,
                    instance_id = %destination.instance_id(),
                    "No writer attached; returning definitions"
                );
            }
            (None, _) => {}
        }
        run.advance(RunPhase::Applied);

        Ok(definitions)
    }

    /// Build the environment for `target`, assuming its role when it has one
    async fn acquire(
        &self,
        target: &EnvironmentTarget,
        session_label: Option<&str>,
    ) -> Result<Environment> {
        let env = target.environment();
        let Some(role_arn) = &target.assume_role_arn else {
            return Ok(env);
        };

        let label = session_label.ok_or_else(|| {
            PromotionError::config("a session label is required when assuming a role")
        })?;

        info!(
            role_arn = %role_arn,
            region = %target.region,
            instance_id = %target.instance_id,
            "Assuming role"
        );
        let credentials = self.broker.assume(role_arn, label).await?;

        if credentials.is_expired_at(Utc::now()) {
            return Err(PromotionError::authorization(format!(
                "credentials for {role_arn} expired at {}",
                credentials.expiry
            )));
        }

        Ok(env.with_credentials(credentials))
    }
}
