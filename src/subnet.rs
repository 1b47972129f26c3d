//! Subnet data source.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::{self, AttributeFilterMap, AttributeValue, CustomFilter, Filter};
use crate::providers::aws::SubnetItem;

/// Query attributes that map directly onto `DescribeSubnets` filters.
pub const SUBNET_FILTER_ATTRIBUTES: &AttributeFilterMap = &[
    ("availability_zone", "availabilityZone"),
    ("cidr_block", "cidrBlock"),
    ("default_for_az", "defaultForAz"),
    ("state", "state"),
    ("vpc_id", "vpc-id"),
];

/// Constraints for looking up a single subnet.
///
/// Every field is optional; unset fields do not constrain the lookup.
#[derive(Debug, Clone, Default)]
pub struct SubnetQuery {
    pub id: Option<String>,
    pub availability_zone: Option<String>,
    pub cidr_block: Option<String>,
    pub default_for_az: Option<bool>,
    pub state: Option<String>,
    pub vpc_id: Option<String>,
    pub filters: Vec<CustomFilter>,
    pub tags: BTreeMap<String, String>,
}

impl SubnetQuery {
    /// Value of a filterable attribute, if the caller set it.
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "availability_zone" => non_empty(&self.availability_zone),
            "cidr_block" => non_empty(&self.cidr_block),
            "default_for_az" => self.default_for_az.map(AttributeValue::Bool),
            "state" => non_empty(&self.state),
            "vpc_id" => non_empty(&self.vpc_id),
            _ => None,
        }
    }

    /// Subnet ID to pin the lookup to, if any.
    pub fn subnet_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Filters to send with `DescribeSubnets`.
    pub fn filters(&self) -> Option<Vec<Filter>> {
        filter::compose(
            SUBNET_FILTER_ATTRIBUTES,
            |name| self.attribute(name),
            &self.filters,
            &self.tags,
        )
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<AttributeValue> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(AttributeValue::from)
}

/// A subnet returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subnet {
    pub id: String,
    pub vpc_id: String,
    pub availability_zone: String,
    pub cidr_block: String,
    pub default_for_az: bool,
    pub state: String,
    pub tags: BTreeMap<String, String>,
}

impl From<SubnetItem> for Subnet {
    fn from(item: SubnetItem) -> Self {
        Self {
            id: item.subnet_id,
            vpc_id: item.vpc_id,
            availability_zone: item.availability_zone,
            cidr_block: item.cidr_block,
            default_for_az: item.default_for_az,
            state: item.state,
            tags: item
                .tag_set
                .items
                .into_iter()
                .map(|tag| (tag.key, tag.value))
                .collect(),
        }
    }
}
