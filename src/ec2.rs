//! EC2 data source facade.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::LookupError;
use crate::provider::CloudProvider;
use crate::providers::aws;
use crate::subnet::{Subnet, SubnetQuery};
use crate::vpc::{Vpc, VpcQuery};

/// Read-only lookups of existing EC2 networking resources.
///
/// # Example
///
/// ```ignore
/// use cloud_lookup::{Ec2, SubnetQuery};
///
/// let ec2 = Ec2::new()?;
/// let subnet = ec2
///     .subnet(&SubnetQuery {
///         vpc_id: Some("vpc-1a2b3c4d".into()),
///         availability_zone: Some("us-east-1a".into()),
///         ..Default::default()
///     })
///     .await?;
/// println!("{}", subnet.cidr_block);
/// ```
#[derive(Debug, Clone)]
pub struct Ec2 {
    client: ApiClient,
}

impl Ec2 {
    /// Create a facade for the default EC2 endpoint.
    pub fn new() -> Result<Self, LookupError> {
        Ok(Self {
            client: ApiClient::for_provider(CloudProvider::Aws)?,
        })
    }

    /// Create a facade for a custom endpoint.
    pub fn with_base_url(base_url: &str) -> Result<Self, LookupError> {
        Ok(Self {
            client: ApiClient::with_base_url(base_url)?,
        })
    }

    /// Create a facade from a preconfigured client.
    pub fn with_client(client: ApiClient) -> Self {
        Self { client }
    }

    /// Find the single subnet matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NoMatch` if nothing matches and
    /// `LookupError::MultipleMatches` if the query is not specific enough.
    pub async fn subnet(&self, query: &SubnetQuery) -> Result<Subnet, LookupError> {
        let filters = query.filters();
        debug!(id = ?query.subnet_id(), ?filters, "DescribeSubnets");
        let items =
            aws::describe_subnets(&self.client, query.subnet_id(), filters.as_deref()).await?;
        exactly_one(items, "subnet").map(Subnet::from)
    }

    /// Find the single VPC matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NoMatch` if nothing matches and
    /// `LookupError::MultipleMatches` if the query is not specific enough.
    pub async fn vpc(&self, query: &VpcQuery) -> Result<Vpc, LookupError> {
        let filters = query.filters();
        debug!(id = ?query.vpc_id(), ?filters, "DescribeVpcs");
        let items = aws::describe_vpcs(&self.client, query.vpc_id(), filters.as_deref()).await?;
        exactly_one(items, "VPC").map(Vpc::from)
    }
}

/// Require a query to have matched exactly one item.
fn exactly_one<T>(items: Vec<T>, kind: &'static str) -> Result<T, LookupError> {
    if items.len() > 1 {
        return Err(LookupError::MultipleMatches(kind));
    }
    items.into_iter().next().ok_or(LookupError::NoMatch(kind))
}
