//! Azure Resource Manager wire layer for virtual machines and their extensions.

use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::LookupError;

/// Compute resource provider API version.
const COMPUTE_API_VERSION: &str = "2016-03-30";

/// Resource provider namespace for virtual machines.
const COMPUTE_PROVIDER: &str = "Microsoft.Compute";

/// Address of a virtual machine within a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualMachineRef {
    pub subscription_id: String,
    pub resource_group: String,
    pub vm_name: String,
}

impl VirtualMachineRef {
    /// Resource ID path of the virtual machine.
    pub fn path(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/virtualMachines/{}",
            self.subscription_id, self.resource_group, COMPUTE_PROVIDER, self.vm_name
        )
    }

    fn extension_path(&self, extension: &str) -> String {
        format!("{}/extensions/{}", self.path(), extension)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirtualMachine {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtualMachineExtension {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: ExtensionProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub extension_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_handler_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_upgrade_minor_version: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected_settings: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// `{"error": {"code": ..., "message": ...}}` body returned on failure.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

/// Map a non-success response to an error, preferring the ARM error body.
async fn error_from(response: Response) -> LookupError {
    let status = response.status().as_u16();
    match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => LookupError::Api {
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => LookupError::Http(status),
    }
}

fn url(client: &ApiClient, path: &str) -> String {
    format!("{}{}", client.base_url(), path)
}

/// Fetch a virtual machine.
pub async fn get_virtual_machine(
    client: &ApiClient,
    vm: &VirtualMachineRef,
) -> Result<VirtualMachine, LookupError> {
    let url = url(client, &vm.path());
    debug!(%url, "get virtual machine");

    let response = client
        .authorize(client.inner().get(&url))
        .query(&[("api-version", COMPUTE_API_VERSION)])
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(LookupError::NotFound);
    }
    if !status.is_success() {
        return Err(error_from(response).await);
    }

    Ok(response.json().await?)
}

/// Create or update an extension; returns the accepted resource.
pub async fn create_or_update_extension(
    client: &ApiClient,
    vm: &VirtualMachineRef,
    name: &str,
    extension: &VirtualMachineExtension,
) -> Result<VirtualMachineExtension, LookupError> {
    let url = url(client, &vm.extension_path(name));
    debug!(%url, "put virtual machine extension");

    let response = client
        .authorize(client.inner().put(&url))
        .query(&[("api-version", COMPUTE_API_VERSION)])
        .json(extension)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(error_from(response).await);
    }

    Ok(response.json().await?)
}

/// Fetch an extension. Returns `None` if it does not exist.
pub async fn get_extension(
    client: &ApiClient,
    vm: &VirtualMachineRef,
    name: &str,
) -> Result<Option<VirtualMachineExtension>, LookupError> {
    let url = url(client, &vm.extension_path(name));
    debug!(%url, "get virtual machine extension");

    let response = client
        .authorize(client.inner().get(&url))
        .query(&[("api-version", COMPUTE_API_VERSION)])
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(error_from(response).await);
    }

    Ok(Some(response.json().await?))
}

/// Delete an extension. A missing extension counts as deleted.
pub async fn delete_extension(
    client: &ApiClient,
    vm: &VirtualMachineRef,
    name: &str,
) -> Result<(), LookupError> {
    let url = url(client, &vm.extension_path(name));
    debug!(%url, "delete virtual machine extension");

    let response = client
        .authorize(client.inner().delete(&url))
        .query(&[("api-version", COMPUTE_API_VERSION)])
        .send()
        .await?;

    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_FOUND {
        return Ok(());
    }
    Err(error_from(response).await)
}
