//! Amazon Connect bindings
//!
//! Associations, contact flows and routing profiles of one instance. Each
//! wrapper owns its own client; nothing is shared between them.

use crate::error;
use async_trait::async_trait;
use aws_sdk_connect::Client as ConnectClient;
use aws_sdk_connect::types::{ContactFlow, RoutingProfile, RoutingProfileQueueConfigSummary};
use promoter_core::{
    ArtifactInventory, ArtifactSummary, Association, AssociationService, ContactFlowDefinition,
    MediaConcurrency, Page, ResourceIdentifier, ResourceKind, Result, RoutingProfileDefinition,
    RoutingQueueConfig, collect_all,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Function associations of an instance
#[derive(Debug, Clone)]
pub struct ConnectAssociations {
    client: ConnectClient,
}

impl ConnectAssociations {
    /// Create a new association service
    pub fn new(client: ConnectClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssociationService for ConnectAssociations {
    async fn list_associations(
        &self,
        instance_id: &str,
        cursor: Option<String>,
        page_size: i32,
    ) -> Result<Page<ResourceIdentifier>> {
        let response = self
            .client
            .list_lambda_functions()
            .instance_id(instance_id)
            .set_next_token(cursor)
            .max_results(page_size)
            .send()
            .await
            .map_err(|e| error::remote("ListLambdaFunctions", e))?;

        Ok(Page::new(
            response.lambda_functions().to_vec(),
            response.next_token().map(str::to_string),
        ))
    }

    async fn create_association(&self, association: &Association) -> Result<()> {
        info!(
            instance_id = %association.instance_id,
            function_arn = %association.function_arn,
            "Associating function"
        );

        self.client
            .associate_lambda_function()
            .instance_id(&association.instance_id)
            .function_arn(&association.function_arn)
            .send()
            .await
            .map_err(|e| error::remote("AssociateLambdaFunction", e))?;

        Ok(())
    }
}

/// Contact flows of an instance
#[derive(Debug, Clone)]
pub struct ConnectFlows {
    client: ConnectClient,
}

impl ConnectFlows {
    /// Create a new contact-flow inventory
    pub fn new(client: ConnectClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtifactInventory for ConnectFlows {
    type Definition = ContactFlowDefinition;

    fn kind(&self) -> ResourceKind {
        ResourceKind::ContactFlow
    }

    async fn list_summaries(
        &self,
        instance_id: &str,
        cursor: Option<String>,
        page_size: i32,
    ) -> Result<Page<ArtifactSummary>> {
        let response = self
            .client
            .list_contact_flows()
            .instance_id(instance_id)
            .set_next_token(cursor)
            .max_results(page_size)
            .send()
            .await
            .map_err(|e| error::remote("ListContactFlows", e))?;

        let summaries = response
            .contact_flow_summary_list()
            .iter()
            .filter_map(|s| Some(ArtifactSummary::new(s.id()?, s.name()?)))
            .collect();

        Ok(Page::new(summaries, response.next_token().map(str::to_string)))
    }

    async fn describe(&self, instance_id: &str, flow_id: &str) -> Result<ContactFlowDefinition> {
        debug!(instance_id = %instance_id, flow_id = %flow_id, "Describing contact flow");

        let response = self
            .client
            .describe_contact_flow()
            .instance_id(instance_id)
            .contact_flow_id(flow_id)
            .send()
            .await
            .map_err(|e| error::remote("DescribeContactFlow", e))?;

        let flow = response
            .contact_flow()
            .ok_or_else(|| error::missing_field("DescribeContactFlow", "ContactFlow"))?;

        flow_definition(flow)
    }
}

/// Routing profiles of an instance, including their queue wiring
#[derive(Debug, Clone)]
pub struct ConnectProfiles {
    client: ConnectClient,
    queue_page_size: i32,
}

impl ConnectProfiles {
    /// Create a new routing-profile inventory
    pub fn new(client: ConnectClient, queue_page_size: i32) -> Self {
        Self {
            client,
            queue_page_size,
        }
    }

    async fn list_queues(
        &self,
        instance_id: &str,
        profile_id: &str,
        cursor: Option<String>,
        page_size: i32,
    ) -> Result<Page<RoutingQueueConfig>> {
        let response = self
            .client
            .list_routing_profile_queues()
            .instance_id(instance_id)
            .routing_profile_id(profile_id)
            .set_next_token(cursor)
            .max_results(page_size)
            .send()
            .await
            .map_err(|e| error::remote("ListRoutingProfileQueues", e))?;

        Ok(Page::new(
            response
                .routing_profile_queue_config_summary_list()
                .iter()
                .map(queue_config)
                .collect(),
            response.next_token().map(str::to_string),
        ))
    }
}

#[async_trait]
impl ArtifactInventory for ConnectProfiles {
    type Definition = RoutingProfileDefinition;

    fn kind(&self) -> ResourceKind {
        ResourceKind::RoutingProfile
    }

    async fn list_summaries(
        &self,
        instance_id: &str,
        cursor: Option<String>,
        page_size: i32,
    ) -> Result<Page<ArtifactSummary>> {
        let response = self
            .client
            .list_routing_profiles()
            .instance_id(instance_id)
            .set_next_token(cursor)
            .max_results(page_size)
            .send()
            .await
            .map_err(|e| error::remote("ListRoutingProfiles", e))?;

        let summaries = response
            .routing_profile_summary_list()
            .iter()
            .filter_map(|s| Some(ArtifactSummary::new(s.id()?, s.name()?)))
            .collect();

        Ok(Page::new(summaries, response.next_token().map(str::to_string)))
    }

    async fn describe(
        &self,
        instance_id: &str,
        profile_id: &str,
    ) -> Result<RoutingProfileDefinition> {
        debug!(instance_id = %instance_id, profile_id = %profile_id, "Describing routing profile");

        let response = self
            .client
            .describe_routing_profile()
            .instance_id(instance_id)
            .routing_profile_id(profile_id)
            .send()
            .await
            .map_err(|e| error::remote("DescribeRoutingProfile", e))?;

        let profile = response
            .routing_profile()
            .ok_or_else(|| error::missing_field("DescribeRoutingProfile", "RoutingProfile"))?;

        let queues = collect_all("ListRoutingProfileQueues", self.queue_page_size, |cursor, size| {
            self.list_queues(instance_id, profile_id, cursor, size)
        })
        .await?;

        profile_definition(profile, queues)
    }
}

fn sorted_tags(tags: Option<&HashMap<String, String>>) -> BTreeMap<String, String> {
    tags.map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

/// Convert a described contact flow
pub fn flow_definition(flow: &ContactFlow) -> Result<ContactFlowDefinition> {
    let id = flow
        .id()
        .ok_or_else(|| error::missing_field("DescribeContactFlow", "ContactFlow.Id"))?;
    let content = flow
        .content()
        .ok_or_else(|| error::missing_field("DescribeContactFlow", "ContactFlow.Content"))?;

    Ok(ContactFlowDefinition {
        id: id.to_string(),
        name: flow.name().unwrap_or_default().to_string(),
        content: content.to_string(),
        description: flow.description().map(str::to_string),
        flow_type: flow.r#type().map(|t| t.as_str().to_string()),
        tags: sorted_tags(flow.tags()),
    })
}

/// Convert a described routing profile plus its queue wiring
pub fn profile_definition(
    profile: &RoutingProfile,
    queue_configs: Vec<RoutingQueueConfig>,
) -> Result<RoutingProfileDefinition> {
    let id = profile.routing_profile_id().ok_or_else(|| {
        error::missing_field("DescribeRoutingProfile", "RoutingProfile.RoutingProfileId")
    })?;

    Ok(RoutingProfileDefinition {
        id: id.to_string(),
        name: profile.name().unwrap_or_default().to_string(),
        description: profile.description().unwrap_or_default().to_string(),
        default_outbound_queue_id: profile.default_outbound_queue_id().map(str::to_string),
        media_concurrencies: profile
            .media_concurrencies()
            .iter()
            .map(|m| MediaConcurrency {
                channel: m.channel().as_str().to_string(),
                concurrency: m.concurrency(),
            })
            .collect(),
        queue_configs,
        tags: sorted_tags(profile.tags()),
    })
}

fn queue_config(summary: &RoutingProfileQueueConfigSummary) -> RoutingQueueConfig {
    RoutingQueueConfig {
        channel: summary.channel().as_str().to_string(),
        queue_id: summary.queue_id().to_string(),
        priority: summary.priority(),
        delay: summary.delay(),
    }
}
