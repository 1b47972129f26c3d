//! EC2 Query API wire layer.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::LookupError;
use crate::filter::Filter;

/// EC2 API version sent with every request.
const API_VERSION: &str = "2016-11-15";

const DESCRIBE_SUBNETS: &str = "DescribeSubnets";
const DESCRIBE_VPCS: &str = "DescribeVpcs";

/// `<item>` list wrapper used by every EC2 response set.
#[derive(Debug, Deserialize)]
pub struct ItemSet<T> {
    #[serde(rename = "item", default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for ItemSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagItem {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetItem {
    pub subnet_id: String,
    #[serde(default)]
    pub vpc_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub cidr_block: String,
    #[serde(default)]
    pub availability_zone: String,
    #[serde(default)]
    pub default_for_az: bool,
    #[serde(default)]
    pub tag_set: ItemSet<TagItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcItem {
    pub vpc_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub cidr_block: String,
    #[serde(default)]
    pub dhcp_options_id: String,
    #[serde(default)]
    pub instance_tenancy: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub tag_set: ItemSet<TagItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeSubnetsResponse {
    #[serde(default)]
    subnet_set: ItemSet<SubnetItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeVpcsResponse {
    #[serde(default)]
    vpc_set: ItemSet<VpcItem>,
}

/// `<Response><Errors><Error>...` document returned on failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorResponse {
    errors: ErrorList,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorList {
    #[serde(default)]
    error: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    code: String,
    #[serde(default)]
    message: String,
}

/// Encode a filter list as `Filter.N.Name` / `Filter.N.Value.M` parameters.
pub fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for (i, filter) in filters.iter().enumerate() {
        let n = i + 1;
        params.push((format!("Filter.{n}.Name"), filter.key().to_string()));
        for (j, value) in filter.values().iter().enumerate() {
            params.push((format!("Filter.{n}.Value.{}", j + 1), value.clone()));
        }
    }
    params
}

/// Build the full parameter list for a Describe* action.
fn describe_params(
    action: &str,
    id_param: &str,
    id: Option<&str>,
    filters: Option<&[Filter]>,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("Action".to_string(), action.to_string()),
        ("Version".to_string(), API_VERSION.to_string()),
    ];
    if let Some(id) = id {
        params.push((format!("{id_param}.1"), id.to_string()));
    }
    if let Some(filters) = filters {
        params.extend(filter_params(filters));
    }
    params
}

/// Send a Query API request and decode the XML body.
async fn query<T: DeserializeOwned>(
    client: &ApiClient,
    params: &[(String, String)],
) -> Result<T, LookupError> {
    let url = format!("{}/", client.base_url());
    debug!(?params, "EC2 query");

    let response = client
        .authorize(client.inner().get(&url).query(params))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    quick_xml::de::from_str(&body).map_err(LookupError::from)
}

/// Turn a failed response into the most specific error available.
fn api_error(status: u16, body: &str) -> LookupError {
    match quick_xml::de::from_str::<ErrorResponse>(body) {
        Ok(doc) => match doc.errors.error.into_iter().next() {
            Some(err) => LookupError::Api {
                code: err.code,
                message: err.message,
            },
            None => LookupError::Http(status),
        },
        Err(_) => LookupError::Http(status),
    }
}

/// Call `DescribeSubnets`.
pub async fn describe_subnets(
    client: &ApiClient,
    subnet_id: Option<&str>,
    filters: Option<&[Filter]>,
) -> Result<Vec<SubnetItem>, LookupError> {
    let params = describe_params(DESCRIBE_SUBNETS, "SubnetId", subnet_id, filters);
    let response: DescribeSubnetsResponse = query(client, &params).await?;
    Ok(response.subnet_set.items)
}

/// Call `DescribeVpcs`.
pub async fn describe_vpcs(
    client: &ApiClient,
    vpc_id: Option<&str>,
    filters: Option<&[Filter]>,
) -> Result<Vec<VpcItem>, LookupError> {
    let params = describe_params(DESCRIBE_VPCS, "VpcId", vpc_id, filters);
    let response: DescribeVpcsResponse = query(client, &params).await?;
    Ok(response.vpc_set.items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_params() {
        let filters = vec![
            Filter::single("vpc-id", "vpc-1"),
            Filter::single("tag:Name", "web"),
        ];
        let params = filter_params(&filters);
        assert_eq!(
            params,
            vec![
                ("Filter.1.Name".to_string(), "vpc-id".to_string()),
                ("Filter.1.Value.1".to_string(), "vpc-1".to_string()),
                ("Filter.2.Name".to_string(), "tag:Name".to_string()),
                ("Filter.2.Value.1".to_string(), "web".to_string()),
            ]
        );
    }

    #[test]
    fn test_describe_params_without_filters() {
        let params = describe_params(DESCRIBE_VPCS, "VpcId", Some("vpc-1"), None);
        assert_eq!(
            params,
            vec![
                ("Action".to_string(), "DescribeVpcs".to_string()),
                ("Version".to_string(), "2016-11-15".to_string()),
                ("VpcId.1".to_string(), "vpc-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_subnets_response() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeSubnetsResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>7a62c49f-347e-4fc4-9331-6e8eEXAMPLE</requestId>
    <subnetSet>
        <item>
            <subnetId>subnet-9d4a7b6c</subnetId>
            <state>available</state>
            <vpcId>vpc-1a2b3c4d</vpcId>
            <cidrBlock>10.0.1.0/24</cidrBlock>
            <availableIpAddressCount>251</availableIpAddressCount>
            <availabilityZone>us-east-1a</availabilityZone>
            <defaultForAz>false</defaultForAz>
            <tagSet>
                <item><key>Name</key><value>web</value></item>
            </tagSet>
        </item>
    </subnetSet>
</DescribeSubnetsResponse>"#;
        let response: DescribeSubnetsResponse = quick_xml::de::from_str(xml).unwrap();
        let items = response.subnet_set.items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subnet_id, "subnet-9d4a7b6c");
        assert_eq!(items[0].availability_zone, "us-east-1a");
        assert!(!items[0].default_for_az);
        assert_eq!(items[0].tag_set.items[0].key, "Name");
        assert_eq!(items[0].tag_set.items[0].value, "web");
    }

    #[test]
    fn test_parse_empty_vpc_set() {
        let xml = r#"<DescribeVpcsResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>req</requestId>
    <vpcSet/>
</DescribeVpcsResponse>"#;
        let response: DescribeVpcsResponse = quick_xml::de::from_str(xml).unwrap();
        assert!(response.vpc_set.items.is_empty());
    }

    #[test]
    fn test_api_error_document() {
        let xml = r#"<Response><Errors><Error><Code>InvalidVpcID.NotFound</Code><Message>The vpc ID 'vpc-1' does not exist</Message></Error></Errors><RequestID>req</RequestID></Response>"#;
        match api_error(400, xml) {
            LookupError::Api { code, message } => {
                assert_eq!(code, "InvalidVpcID.NotFound");
                assert_eq!(message, "The vpc ID 'vpc-1' does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_status() {
        assert!(matches!(
            api_error(503, "Service Unavailable"),
            LookupError::Http(503)
        ));
    }
}
