//! Provider-specific wire layers.

pub mod aws;
pub mod azure;
