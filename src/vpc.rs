//! VPC data source.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::{self, AttributeFilterMap, AttributeValue, CustomFilter, Filter};
use crate::providers::aws::VpcItem;
use crate::subnet::non_empty;

/// Query attributes that map directly onto `DescribeVpcs` filters.
pub const VPC_FILTER_ATTRIBUTES: &AttributeFilterMap = &[
    ("cidr_block", "cidr"),
    ("dhcp_options_id", "dhcp-options-id"),
    ("default", "isDefault"),
    ("state", "state"),
];

/// Constraints for looking up a single VPC.
#[derive(Debug, Clone, Default)]
pub struct VpcQuery {
    pub id: Option<String>,
    pub cidr_block: Option<String>,
    pub dhcp_options_id: Option<String>,
    pub default: Option<bool>,
    pub state: Option<String>,
    pub filters: Vec<CustomFilter>,
    pub tags: BTreeMap<String, String>,
}

impl VpcQuery {
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "cidr_block" => non_empty(&self.cidr_block),
            "dhcp_options_id" => non_empty(&self.dhcp_options_id),
            "default" => self.default.map(AttributeValue::Bool),
            "state" => non_empty(&self.state),
            _ => None,
        }
    }

    pub fn vpc_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn filters(&self) -> Option<Vec<Filter>> {
        filter::compose(
            VPC_FILTER_ATTRIBUTES,
            |name| self.attribute(name),
            &self.filters,
            &self.tags,
        )
    }
}

/// A VPC returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vpc {
    pub id: String,
    pub cidr_block: String,
    pub dhcp_options_id: String,
    pub instance_tenancy: String,
    pub default: bool,
    pub state: String,
    pub tags: BTreeMap<String, String>,
}

impl From<VpcItem> for Vpc {
    fn from(item: VpcItem) -> Self {
        Self {
            id: item.vpc_id,
            cidr_block: item.cidr_block,
            dhcp_options_id: item.dhcp_options_id,
            instance_tenancy: item.instance_tenancy,
            default: item.is_default,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vpc_filters_in_table_order() {
        let mut tags = BTreeMap::new();
        tags.insert("Name".to_string(), "main".to_string());
        let query = VpcQuery {
            state: Some("available".into()),
            default: Some(true),
            cidr_block: Some("10.0.0.0/16".into()),
            filters: vec![CustomFilter::new("owner-id", ["123456789012"]).unwrap()],
            tags,
            ..Default::default()
        };
        assert_eq!(
            query.filters().unwrap(),
            vec![
                Filter::single("cidr", "10.0.0.0/16"),
                Filter::single("isDefault", "true"),
                Filter::single("state", "available"),
                Filter::single("owner-id", "123456789012"),
                Filter::single("tag:Name", "main"),
            ]
        );
    }

    #[test]
    fn test_vpc_id() {
        let query = VpcQuery {
            id: Some("vpc-1".into()),
            ..Default::default()
        };
        assert_eq!(query.vpc_id(), Some("vpc-1"));
        assert_eq!(query.filters(), None);
    }
}
