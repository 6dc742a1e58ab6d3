//! Promoter - cross-environment contact-center promotion
//!
//! ## Usage
//!
//! ```bash
//! # Associate functions with an instance (idempotent)
//! promoter associate-functions --region us-east-1 --instance-id <id> \
//!     --function kraus-team7-foo --function kraus-team7-bar
//!
//! # Same, in another account
//! promoter associate-functions --region us-east-1 --instance-id <id> \
//!     --assume-role-arn arn:aws:iam::123456789012:role/promoter --function foo
//!
//! # Fetch contact flows / routing profiles by name
//! promoter promote-flows --region us-east-1 --instance-id <id> --name _krausTest
//! promoter promote-profiles --request-file promote.json --output profiles.json
//! ```

use anyhow::Context;
use aws_config::BehaviorVersion;
use clap::{Args, Parser, Subcommand};
use promoter_core::{AssociateRequest, EnvironmentTarget, PromoteRequest, PromotionOrchestrator};
use promoter_orchestrator::{AwsClientFactory, DEFAULT_REGION, StsCredentialBroker};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Promoter: move contact-center configuration between environments
#[derive(Parser, Debug)]
#[command(name = "promoter")]
#[command(about = "Cross-environment contact-center promotion", long_about = None)]
struct Cli {
    /// Write the JSON result to this file instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Requested lifetime of assumed-role sessions (minimum 900)
    #[arg(long, global = true)]
    session_duration_secs: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Associate functions with an instance, creating only missing associations
    AssociateFunctions(AssociateArgs),
    /// Fetch contact flows by name
    PromoteFlows(PromoteArgs),
    /// Fetch routing profiles by name
    PromoteProfiles(PromoteArgs),
}

/// Where an instance lives
#[derive(Args, Debug, Default)]
struct TargetArgs {
    /// Instance region
    #[arg(long)]
    region: Option<String>,

    /// Instance id
    #[arg(long)]
    instance_id: Option<String>,

    /// Role to assume when the instance lives in another account
    #[arg(long)]
    assume_role_arn: Option<String>,
}

impl TargetArgs {
    fn target(&self, what: &str) -> anyhow::Result<EnvironmentTarget> {
        let region = self
            .region
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--region required for the {what}"))?;
        let instance_id = self
            .instance_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--instance-id required for the {what}"))?;

        let mut target = EnvironmentTarget::new(region, instance_id);
        if let Some(role) = &self.assume_role_arn {
            target = target.with_assume_role(role);
        }
        Ok(target)
    }
}

#[derive(Args, Debug)]
struct AssociateArgs {
    /// Read the whole request from a JSON file
    #[arg(long, conflicts_with_all = ["region", "instance_id", "assume_role_arn", "functions"])]
    request_file: Option<PathBuf>,

    #[command(flatten)]
    destination: TargetArgs,

    /// Function name or ARN (repeatable)
    #[arg(long = "function")]
    functions: Vec<String>,

    /// Session label for role assumption
    #[arg(long)]
    session_label: Option<String>,
}

#[derive(Args, Debug)]
struct PromoteArgs {
    /// Read the whole request from a JSON file
    #[arg(
        long,
        conflicts_with_all = [
            "region",
            "instance_id",
            "assume_role_arn",
            "dest_region",
            "dest_instance_id",
            "dest_assume_role_arn",
            "names",
        ]
    )]
    request_file: Option<PathBuf>,

    #[command(flatten)]
    source: TargetArgs,

    /// Destination region
    #[arg(long)]
    dest_region: Option<String>,

    /// Destination instance id
    #[arg(long)]
    dest_instance_id: Option<String>,

    /// Role to assume for the destination account
    #[arg(long)]
    dest_assume_role_arn: Option<String>,

    /// Artifact name (repeatable)
    #[arg(long = "name")]
    names: Vec<String>,

    /// Session label for role assumption
    #[arg(long)]
    session_label: Option<String>,
}

impl PromoteArgs {
    fn destination(&self) -> Option<TargetArgs> {
        if self.dest_region.is_none()
            && self.dest_instance_id.is_none()
            && self.dest_assume_role_arn.is_none()
        {
            return None;
        }
        Some(TargetArgs {
            region: self.dest_region.clone(),
            instance_id: self.dest_instance_id.clone(),
            assume_role_arn: self.dest_assume_role_arn.clone(),
        })
    }
}

/// What gets printed for a run
#[derive(Serialize, Debug)]
struct Report<T> {
    operation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_label: Option<String>,
    result: T,
}

fn read_request<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid request file {}", path.display()))
}

/// Label used for role assumption when the caller gave none
fn generated_session_label() -> String {
    format!("promoter-{}", uuid::Uuid::new_v4().simple())
}

fn associate_request(args: &AssociateArgs) -> anyhow::Result<AssociateRequest> {
    let mut request = match &args.request_file {
        Some(path) => read_request::<AssociateRequest>(path)?,
        None => AssociateRequest::new(args.destination.target("destination")?, &args.functions),
    };

    if let Some(label) = &args.session_label {
        request.session_label = Some(label.clone());
    }
    if request.session_label.is_none() && request.destination.assume_role_arn.is_some() {
        request.session_label = Some(generated_session_label());
    }
    Ok(request)
}

fn promote_request(args: &PromoteArgs) -> anyhow::Result<PromoteRequest> {
    let mut request = match &args.request_file {
        Some(path) => read_request::<PromoteRequest>(path)?,
        None => {
            let mut request = PromoteRequest::new(args.source.target("source")?, &args.names);
            if let Some(destination) = args.destination() {
                request = request.with_destination(destination.target("destination")?);
            }
            request
        }
    };

    if let Some(label) = &args.session_label {
        request.session_label = Some(label.clone());
    }
    let needs_role = request.source.assume_role_arn.is_some()
        || request
            .destination
            .as_ref()
            .is_some_and(|d| d.assume_role_arn.is_some());
    if request.session_label.is_none() && needs_role {
        request.session_label = Some(generated_session_label());
    }
    Ok(request)
}

fn emit<T: Serialize>(report: &Report<T>, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Result written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promoter=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    debug!(?cli, "Parsed arguments");

    let base = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let broker = StsCredentialBroker::from_config(&base, DEFAULT_REGION)
        .with_duration(cli.session_duration_secs);
    let orchestrator = PromotionOrchestrator::new(broker, AwsClientFactory::new(base));
    let output = cli.output.as_deref();

    match &cli.command {
        Commands::AssociateFunctions(args) => {
            let request = associate_request(args)?;
            let outcome = orchestrator.associate_functions(&request).await?;
            info!(
                created = outcome.created.len(),
                already_associated = outcome.already_associated.len(),
                "Functions associated"
            );
            emit(
                &Report {
                    operation: "associate-functions",
                    session_label: request.session_label,
                    result: outcome,
                },
                output,
            )
        }
        Commands::PromoteFlows(args) => {
            let request = promote_request(args)?;
            let flows = orchestrator.promote_flows(&request).await?;
            info!(count = flows.len(), "Contact flows fetched");
            emit(
                &Report {
                    operation: "promote-flows",
                    session_label: request.session_label,
                    result: flows,
                },
                output,
            )
        }
        Commands::PromoteProfiles(args) => {
            let request = promote_request(args)?;
            let profiles = orchestrator.promote_profiles(&request).await?;
            info!(count = profiles.len(), "Routing profiles fetched");
            emit(
                &Report {
                    operation: "promote-profiles",
                    session_label: request.session_label,
                    result: profiles,
                },
                output,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_associate_from_flags() {
        let cli = assert_ok!(Cli::try_parse_from([
            "promoter",
            "associate-functions",
            "--region",
            "us-east-1",
            "--instance-id",
            "instance-1",
            "--function",
            "kraus-team7-foo",
            "--function",
            "kraus-team7-bar",
        ]));

        let Commands::AssociateFunctions(args) = cli.command else {
            panic!("wrong subcommand");
        };
        let request = assert_ok!(associate_request(&args));
        assert_eq!(request.destination.instance_id, "instance-1");
        assert_eq!(request.functions, vec!["kraus-team7-foo", "kraus-team7-bar"]);
        assert_eq!(request.session_label, None);
    }

    #[test]
    fn test_session_label_generated_for_role() {
        let cli = assert_ok!(Cli::try_parse_from([
            "promoter",
            "associate-functions",
            "--region",
            "us-east-1",
            "--instance-id",
            "instance-1",
            "--assume-role-arn",
            "arn:aws:iam::123456789012:role/promoter",
            "--function",
            "foo",
        ]));

        let Commands::AssociateFunctions(args) = cli.command else {
            panic!("wrong subcommand");
        };
        let request = assert_ok!(associate_request(&args));
        let label = request.session_label.clone().unwrap();
        assert!(label.starts_with("promoter-"));
        assert_ok!(request.validate());
    }

    #[test]
    fn test_missing_instance_id_is_rejected() {
        let cli = assert_ok!(Cli::try_parse_from([
            "promoter",
            "promote-flows",
            "--region",
            "us-east-1",
            "--name",
            "_krausTest",
        ]));

        let Commands::PromoteFlows(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert_err!(promote_request(&args));
    }

    #[test]
    fn test_promote_with_destination() {
        let cli = assert_ok!(Cli::try_parse_from([
            "promoter",
            "--output",
            "flows.json",
            "promote-flows",
            "--region",
            "us-east-1",
            "--instance-id",
            "source-1",
            "--dest-region",
            "us-west-2",
            "--dest-instance-id",
            "dest-1",
            "--dest-assume-role-arn",
            "arn:aws:iam::123456789012:role/promoter",
            "--name",
            "_krausTest",
        ]));

        assert_eq!(cli.output.as_deref(), Some(Path::new("flows.json")));
        let Commands::PromoteFlows(args) = cli.command else {
            panic!("wrong subcommand");
        };
        let request = assert_ok!(promote_request(&args));
        let destination = request.destination.clone().unwrap();
        assert_eq!(destination.region, "us-west-2");
        assert_eq!(destination.instance_id, "dest-1");
        assert!(request.session_label.is_some());
        assert_ok!(request.validate());
    }

    #[test]
    fn test_request_file_conflicts_with_flags() {
        assert_err!(Cli::try_parse_from([
            "promoter",
            "promote-profiles",
            "--request-file",
            "promote.json",
            "--name",
            "Basic",
        ]));
    }

    #[test]
    fn test_request_file_conflicts_with_destination_flags() {
        for flag in ["--dest-region", "--dest-instance-id", "--dest-assume-role-arn"] {
            assert_err!(Cli::try_parse_from([
                "promoter",
                "promote-flows",
                "--request-file",
                "promote.json",
                flag,
                "value",
            ]));
        }
    }

    #[test]
    fn test_report_shape() {
        let report = Report {
            operation: "promote-flows",
            session_label: None,
            result: vec!["a"],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["operation"], "promote-flows");
        assert!(value.get("session_label").is_none());
        assert_eq!(value["result"][0], "a");
    }
}
