//! CLI binary for the cloud-lookup crate.

use std::collections::BTreeMap;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cloud_lookup::{
    normalize_json, ApiClient, CloudProvider, CustomFilter, Ec2, LookupError, SubnetQuery,
    VmExtensionConfig, VmExtensions, VpcQuery,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const ENV_LOG: &str = "CLOUD_LOOKUP_LOG";

#[derive(Parser)]
#[command(name = "cloud-lookup")]
#[command(
    author,
    version,
    about = "Look up AWS networking resources and manage Azure VM extensions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find exactly one subnet matching the given constraints
    Subnet {
        /// Subnet ID
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        availability_zone: Option<String>,

        #[arg(long)]
        cidr_block: Option<String>,

        /// Match only (or never) the default subnet of its availability zone
        #[arg(long)]
        default_for_az: Option<bool>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        vpc_id: Option<String>,

        #[command(flatten)]
        common: Ec2Args,
    },

    /// Find exactly one VPC matching the given constraints
    Vpc {
        /// VPC ID
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        cidr_block: Option<String>,

        #[arg(long)]
        dhcp_options_id: Option<String>,

        /// Match only (or never) the account's default VPC
        #[arg(long)]
        default: Option<bool>,

        #[arg(long)]
        state: Option<String>,

        #[command(flatten)]
        common: Ec2Args,
    },

    /// Manage Azure virtual machine extensions
    VmExtension {
        #[command(flatten)]
        arm: ArmArgs,

        #[command(subcommand)]
        action: ExtensionAction,
    },
}

#[derive(Args)]
struct Ec2Args {
    /// Additional filter, as name=value1,value2 (repeatable)
    #[arg(long = "filter", value_name = "NAME=VALUES", value_parser = parse_filter)]
    filters: Vec<CustomFilter>,

    /// Tag constraint, as key=value (repeatable)
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag)]
    tags: Vec<(String, String)>,

    /// EC2 API endpoint
    #[arg(long, env = "CLOUD_LOOKUP_EC2_ENDPOINT")]
    endpoint: Option<String>,
}

impl Ec2Args {
    fn tag_map(&self) -> BTreeMap<String, String> {
        self.tags.iter().cloned().collect()
    }

    fn client(&self) -> Result<Ec2, LookupError> {
        match &self.endpoint {
            Some(endpoint) => Ec2::with_base_url(endpoint),
            None => Ec2::new(),
        }
    }
}

#[derive(Args)]
struct ArmArgs {
    /// Resource Manager endpoint
    #[arg(long, env = "CLOUD_LOOKUP_ARM_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer token for Resource Manager requests
    #[arg(long, env = "AZURE_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl ArmArgs {
    fn extensions(&self) -> Result<VmExtensions, LookupError> {
        let client = match &self.endpoint {
            Some(endpoint) => ApiClient::with_base_url(endpoint)?,
            None => ApiClient::for_provider(CloudProvider::Azure)?,
        };
        let client = match &self.token {
            Some(token) => client.with_bearer_token(token),
            None => client,
        };
        Ok(VmExtensions::with_client(client))
    }
}

#[derive(Subcommand)]
enum ExtensionAction {
    /// Install an extension and wait for it to be provisioned
    Create {
        #[arg(long)]
        name: String,

        /// Resource ID of the target virtual machine
        #[arg(long)]
        target_vm_id: String,

        /// Extension type, e.g. CustomScriptForLinux
        #[arg(long)]
        extension_name: String,

        #[arg(long)]
        publisher_name: String,

        /// Type handler version, e.g. 1.2
        #[arg(long)]
        version: String,

        /// Public settings as a JSON object
        #[arg(long)]
        public_config: Option<String>,

        /// Protected settings as a JSON object
        #[arg(long)]
        private_config: Option<String>,
    },

    /// Show an extension by resource ID
    Read { id: String },

    /// Delete an extension by resource ID
    Delete { id: String },
}

fn parse_filter(s: &str) -> Result<CustomFilter, String> {
    s.parse().map_err(|e: LookupError| e.to_string())
}

fn parse_tag(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {:?}", s)),
    }
}

/// Normalize a `--public-config` / `--private-config` document.
fn parse_config_arg(raw: Option<String>) -> Result<Option<String>, LookupError> {
    raw.as_deref().map(normalize_json).transpose()
}

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), LookupError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), LookupError> {
    match cli.command {
        Commands::Subnet {
            id,
            availability_zone,
            cidr_block,
            default_for_az,
            state,
            vpc_id,
            common,
        } => {
            let query = SubnetQuery {
                id,
                availability_zone,
                cidr_block,
                default_for_az,
                state,
                vpc_id,
                filters: common.filters.clone(),
                tags: common.tag_map(),
            };
            let subnet = common.client()?.subnet(&query).await?;
            print_json(&subnet)
        }

        Commands::Vpc {
            id,
            cidr_block,
            dhcp_options_id,
            default,
            state,
            common,
        } => {
            let query = VpcQuery {
                id,
                cidr_block,
                dhcp_options_id,
                default,
                state,
                filters: common.filters.clone(),
                tags: common.tag_map(),
            };
            let vpc = common.client()?.vpc(&query).await?;
            print_json(&vpc)
        }

        Commands::VmExtension { arm, action } => {
            let extensions = arm.extensions()?;
            match action {
                ExtensionAction::Create {
                    name,
                    target_vm_id,
                    extension_name,
                    publisher_name,
                    version,
                    public_config,
                    private_config,
                } => {
                    let config = VmExtensionConfig {
                        name,
                        target_vm_id,
                        extension_name,
                        publisher_name,
                        version,
                        public_config: parse_config_arg(public_config)?,
                        private_config: parse_config_arg(private_config)?,
                    };
                    let extension = extensions.create(&config).await?;
                    print_json(&extension)
                }
                ExtensionAction::Read { id } => match extensions.read(&id).await? {
                    Some(extension) => print_json(&extension),
                    None => Err(LookupError::NotFound),
                },
                ExtensionAction::Delete { id } => extensions.delete(&id).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(
            parse_tag("env=prod").unwrap(),
            ("env".to_string(), "prod".to_string())
        );
        assert_eq!(
            parse_tag("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_tag("=prod").is_err());
        assert!(parse_tag("prod").is_err());
    }

    #[test]
    fn test_parse_config_arg() {
        assert_eq!(parse_config_arg(None).unwrap(), None);
        assert_eq!(
            parse_config_arg(Some("{ \"fileUris\": [\"a.sh\"] }".into())).unwrap(),
            Some(r#"{"fileUris":["a.sh"]}"#.to_string())
        );
        assert!(matches!(
            parse_config_arg(Some("{".into())),
            Err(LookupError::Json(_))
        ));
    }

    #[test]
    fn test_parse_subnet_args() {
        let cli = Cli::try_parse_from([
            "cloud-lookup",
            "subnet",
            "--vpc-id",
            "vpc-1",
            "--default-for-az",
            "false",
            "--filter",
            "state=available,pending",
            "--tag",
            "Name=web",
        ])
        .unwrap();

        match cli.command {
            Commands::Subnet {
                vpc_id,
                default_for_az,
                common,
                ..
            } => {
                assert_eq!(vpc_id.as_deref(), Some("vpc-1"));
                assert_eq!(default_for_az, Some(false));
                assert_eq!(common.filters[0].values(), ["available", "pending"]);
                assert_eq!(common.tag_map().get("Name").map(String::as_str), Some("web"));
            }
            _ => panic!("expected subnet command"),
        }
    }
}
