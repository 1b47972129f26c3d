//! Cloud provider enumeration.

use std::fmt;

/// Cloud providers the crate talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudProvider {
    /// Amazon Web Services (EC2 Query API)
    Aws,
    /// Microsoft Azure (Resource Manager REST API)
    Azure,
}

impl CloudProvider {
    /// Default API endpoint for this provider.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            CloudProvider::Aws => crate::client::DEFAULT_EC2_ENDPOINT,
            CloudProvider::Azure => crate::client::DEFAULT_ARM_ENDPOINT,
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudProvider::Aws => write!(f, "AWS"),
            CloudProvider::Azure => write!(f, "Azure"),
        }
    }
}
