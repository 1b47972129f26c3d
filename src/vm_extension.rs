//! Azure virtual machine extension lifecycle.
//!
//! An extension is a sub-resource of a virtual machine. Creation is accepted
//! immediately by Resource Manager and then provisioned in the background, so
//! [`VmExtensions::create`] polls until the extension leaves the `Creating`
//! state before reading it back.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::client::ApiClient;
use crate::error::LookupError;
use crate::provider::CloudProvider;
use crate::providers::azure::{self, ExtensionProperties, VirtualMachineExtension, VirtualMachineRef};
use crate::resource_id::ResourceId;
use crate::state::StateChangeConf;

/// Maximum time to wait for an extension to finish provisioning.
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Minimum interval between provisioning state checks.
pub const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_secs(30);

const PENDING_STATES: &[&str] = &["Creating"];
const TARGET_STATES: &[&str] = &["Succeeded"];

/// Desired configuration of a virtual machine extension.
#[derive(Debug, Clone, Default)]
pub struct VmExtensionConfig {
    /// Name of the extension resource.
    pub name: String,
    /// Resource ID of the virtual machine to install on.
    pub target_vm_id: String,
    /// Extension type, e.g. `CustomScriptForLinux`.
    pub extension_name: String,
    pub publisher_name: String,
    /// Type handler version, e.g. `1.2`.
    pub version: String,
    /// JSON object passed as public settings.
    pub public_config: Option<String>,
    /// JSON object passed as protected settings.
    pub private_config: Option<String>,
}

/// Observed state of a virtual machine extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VmExtension {
    pub id: String,
    pub name: String,
    pub target_vm_id: String,
    pub extension_name: String,
    pub publisher_name: String,
    pub version: String,
    pub location: String,
    pub provisioning_state: String,
    /// Public settings in [`normalize_json`] form, empty if none.
    pub public_config: String,
}

/// Create, read and delete virtual machine extensions.
#[derive(Debug, Clone)]
pub struct VmExtensions {
    client: ApiClient,
    create_timeout: Duration,
    min_poll_interval: Duration,
}

impl VmExtensions {
    /// Create a manager for the public Resource Manager endpoint.
    pub fn new(token: &str) -> Result<Self, LookupError> {
        Ok(Self::with_client(
            ApiClient::for_provider(CloudProvider::Azure)?.with_bearer_token(token),
        ))
    }

    /// Create a manager for a custom endpoint without credentials.
    pub fn with_base_url(base_url: &str) -> Result<Self, LookupError> {
        Ok(Self::with_client(ApiClient::with_base_url(base_url)?))
    }

    pub fn with_client(client: ApiClient) -> Self {
        Self {
            client,
            create_timeout: DEFAULT_CREATE_TIMEOUT,
            min_poll_interval: DEFAULT_MIN_POLL_INTERVAL,
        }
    }

    /// Override how long `create` waits for provisioning.
    pub fn with_create_timeout(mut self, timeout: Duration) -> Self {
        self.create_timeout = timeout;
        self
    }

    /// Override the minimum interval between provisioning checks.
    pub fn with_min_poll_interval(mut self, interval: Duration) -> Self {
        self.min_poll_interval = interval;
        self
    }

    /// Install an extension and wait until it is provisioned.
    ///
    /// # Errors
    ///
    /// Fails if the target VM ID is malformed or the VM does not exist, if
    /// either config is not a JSON object, or if provisioning does not reach
    /// `Succeeded` in time (`LookupError::Wait`).
    pub async fn create(&self, config: &VmExtensionConfig) -> Result<VmExtension, LookupError> {
        let vm = vm_ref(&config.target_vm_id.parse()?)?;
        let vm_info = azure::get_virtual_machine(&self.client, &vm).await?;

        let extension = VirtualMachineExtension {
            name: Some(config.name.clone()),
            location: Some(vm_info.location),
            properties: ExtensionProperties {
                publisher: Some(config.publisher_name.clone()),
                extension_type: Some(config.extension_name.clone()),
                type_handler_version: Some(config.version.clone()),
                auto_upgrade_minor_version: Some(false),
                settings: parse_config(config.public_config.as_deref())?,
                protected_settings: parse_config(config.private_config.as_deref())?,
                provisioning_state: None,
            },
            ..Default::default()
        };

        let accepted =
            azure::create_or_update_extension(&self.client, &vm, &config.name, &extension).await?;
        let id = accepted
            .id
            .unwrap_or_else(|| format!("{}/extensions/{}", vm.path(), config.name));
        info!(%id, "virtual machine extension accepted");

        let conf = StateChangeConf::new(PENDING_STATES, TARGET_STATES, self.create_timeout)
            .with_min_timeout(self.min_poll_interval);
        conf.wait_for_state(|| provisioning_state(&self.client, &vm, &config.name))
            .await
            .map_err(|source| LookupError::Wait {
                what: format!("Virtual Machine Extension ({})", config.name),
                source: Box::new(source),
            })?;

        self.read(&id).await?.ok_or(LookupError::NotFound)
    }

    /// Read an extension by resource ID. Returns `None` if it no longer exists.
    pub async fn read(&self, id: &str) -> Result<Option<VmExtension>, LookupError> {
        let resource_id: ResourceId = id.parse()?;
        let vm = vm_ref(&resource_id)?;
        let name = resource_id.segment("extensions")?;

        let extension = azure::get_extension(&self.client, &vm, name)
            .await
            .map_err(|source| LookupError::Read {
                extension: name.to_string(),
                vm: vm.vm_name.clone(),
                source: Box::new(source),
            })?;
        let Some(extension) = extension else {
            info!(%id, scope = %resource_id, "virtual machine extension is gone");
            return Ok(None);
        };

        let properties = extension.properties;
        let public_config = match properties.settings {
            Some(settings) => serde_json::to_string(&settings)?,
            None => String::new(),
        };
        Ok(Some(VmExtension {
            id: id.to_string(),
            name: name.to_string(),
            target_vm_id: vm.path(),
            extension_name: properties.extension_type.unwrap_or_default(),
            publisher_name: properties.publisher.unwrap_or_default(),
            version: properties.type_handler_version.unwrap_or_default(),
            location: extension.location.unwrap_or_default(),
            provisioning_state: properties.provisioning_state.unwrap_or_default(),
            public_config,
        }))
    }

    /// Delete an extension by resource ID.
    pub async fn delete(&self, id: &str) -> Result<(), LookupError> {
        let resource_id: ResourceId = id.parse()?;
        let vm = vm_ref(&resource_id)?;
        let name = resource_id.segment("extensions")?;

        azure::delete_extension(&self.client, &vm, name).await?;
        info!(%id, scope = %resource_id, "virtual machine extension deleted");
        Ok(())
    }
}

fn vm_ref(id: &ResourceId) -> Result<VirtualMachineRef, LookupError> {
    Ok(VirtualMachineRef {
        subscription_id: id.subscription_id.clone(),
        resource_group: id.resource_group.clone(),
        vm_name: id.segment("virtualMachines")?.to_string(),
    })
}

async fn provisioning_state(
    client: &ApiClient,
    vm: &VirtualMachineRef,
    name: &str,
) -> Result<Option<((), String)>, LookupError> {
    let extension = azure::get_extension(client, vm, name).await?;
    Ok(extension.map(|ext| ((), ext.properties.provisioning_state.unwrap_or_default())))
}

/// Parse an optional JSON object config. Empty means unset.
fn parse_config(raw: Option<&str>) -> Result<Option<Map<String, Value>>, LookupError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(Some(map)),
            other => Err(LookupError::InvalidConfig(format!(
                "expected a JSON object, got {other}"
            ))),
        },
    }
}

/// Canonical compact form of a JSON config string, so that equivalent
/// configs compare equal. Empty input stays empty.
pub fn normalize_json(raw: &str) -> Result<String, LookupError> {
    if raw.trim().is_empty() {
        return Ok(String::new());
    }
    let value: Value = serde_json::from_str(raw)?;
    Ok(serde_json::to_string(&value)?)
}
