//! Error types for cloud lookup and provisioning operations.

use thiserror::Error;

/// Errors that can occur while querying or provisioning cloud resources.
#[derive(Debug, Error)]
pub enum LookupError {
    /// A data source query returned no results.
    #[error("no matching {0} found")]
    NoMatch(&'static str),

    /// A data source query returned more than one result.
    #[error("multiple {0}s matched; use additional constraints to reduce matches to a single {0}")]
    MultipleMatches(&'static str),

    /// HTTP error with status code.
    #[error("http {0}")]
    Http(u16),

    /// Error document returned by the cloud API.
    #[error("{code}: {message}")]
    Api {
        /// Provider error code, e.g. `InvalidParameterValue`.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// The requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// A resource ID could not be parsed.
    #[error("invalid resource id: {0}")]
    InvalidResourceId(String),

    /// A custom filter was declared without any values.
    #[error("filter {0:?} has no values")]
    EmptyFilterValues(String),

    /// User-supplied configuration is malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Waiting for a resource state ran out of time.
    #[error("timeout while waiting for state to become '{expected}' (last state: '{last_state}')")]
    Timeout {
        /// Target states joined with `", "`.
        expected: String,
        /// The last observed state, empty if none was seen.
        last_state: String,
    },

    /// A resource reached a state that is neither pending nor a target.
    #[error("unexpected state '{state}', wanted target '{expected}'")]
    UnexpectedState {
        /// The observed state.
        state: String,
        /// Target states joined with `", "`.
        expected: String,
    },

    /// Waiting for a resource failed; wraps the underlying cause.
    #[error("Error waiting for {what} to become available: {source}")]
    Wait {
        /// Description of the resource being waited on.
        what: String,
        /// The underlying failure.
        #[source]
        source: Box<LookupError>,
    },

    /// Reading an existing extension failed; wraps the underlying cause.
    #[error("Error making read request on Azure Virtual Machine Extension {extension} on Virtual Machine {vm}: {source}")]
    Read {
        /// Extension name.
        extension: String,
        /// Virtual machine name.
        vm: String,
        /// The underlying failure.
        #[source]
        source: Box<LookupError>,
    },

    /// JSON (de)serialization error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// XML deserialization error.
    #[error("xml: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// HTTP request error.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
