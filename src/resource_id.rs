//! Azure Resource Manager resource ID parsing.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::LookupError;

/// A parsed ARM resource ID such as
/// `/subscriptions/{s}/resourceGroups/{rg}/providers/Microsoft.Compute/virtualMachines/{vm}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: Option<String>,
    /// Remaining type/name pairs keyed by type, e.g. `virtualMachines`.
    pub path: HashMap<String, String>,
}

impl ResourceId {
    /// Name stored under a path segment type.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidResourceId` if the segment is missing.
    pub fn segment(&self, key: &str) -> Result<&str, LookupError> {
        self.path
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| LookupError::InvalidResourceId(format!("missing {key} segment")))
    }
}

impl FromStr for ResourceId {
    type Err = LookupError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let trimmed = id.trim_matches('/');
        if trimmed.is_empty() {
            return Err(LookupError::InvalidResourceId("empty id".to_string()));
        }

        let components: Vec<&str> = trimmed.split('/').collect();
        if components.len() % 2 != 0 {
            return Err(LookupError::InvalidResourceId(format!(
                "{id}: number of segments is not divisible by 2"
            )));
        }

        let mut subscription_id = None;
        let mut resource_group = None;
        let mut provider = None;
        let mut path = HashMap::new();

        for pair in components.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() || value.is_empty() {
                return Err(LookupError::InvalidResourceId(format!(
                    "{id}: empty segment"
                )));
            }
            match key {
                "subscriptions" => subscription_id = Some(value.to_string()),
                "resourceGroups" | "resourcegroups" => resource_group = Some(value.to_string()),
                "providers" => provider = Some(value.to_string()),
                _ => {
                    path.insert(key.to_string(), value.to_string());
                }
            }
        }

        let subscription_id = subscription_id
            .ok_or_else(|| LookupError::InvalidResourceId(format!("{id}: no subscription ID")))?;
        let resource_group = resource_group
            .ok_or_else(|| LookupError::InvalidResourceId(format!("{id}: no resource group")))?;

        Ok(Self {
            subscription_id,
            resource_group,
            provider,
            path,
        })
    }
}

/// Formats the resource group scope, `/subscriptions/{s}/resourceGroups/{rg}`.
impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )
    }
}
