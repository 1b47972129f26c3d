//! Filtered lookups of existing cloud resources and Azure VM extension
//! lifecycle management.
//!
//! This crate provides two kinds of operations:
//!
//! - **Data sources**: read-only lookups that find exactly one AWS subnet or VPC
//!   matching a set of attributes, ad hoc filters and tags.
//! - **Resources**: create, read and delete an Azure virtual machine extension,
//!   waiting for asynchronous provisioning to finish.
//!
//! # Features
//!
//! - Ordered filter composition ([`filter::compose`]) shared by all EC2 lookups
//! - Distinct errors for "nothing matched" and "too many matched"
//! - Configurable polling for long-running provisioning ([`StateChangeConf`])
//! - ARM resource ID parsing ([`ResourceId`])
//!
//! # Example
//!
//! ```ignore
//! use cloud_lookup::{CustomFilter, Ec2, LookupError, VpcQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), LookupError> {
//!     let ec2 = Ec2::new()?;
//!
//!     let vpc = ec2
//!         .vpc(&VpcQuery {
//!             default: Some(true),
//!             filters: vec![CustomFilter::new("owner-id", ["123456789012"])?],
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     println!("{} {}", vpc.id, vpc.cidr_block);
//!     Ok(())
//! }
//! ```
//!
//! # Filter Order
//!
//! | Segment | Source | Order |
//! |---------|--------|-------|
//! | 1 | Query attributes | Attribute table order |
//! | 2 | Custom filters | Input order |
//! | 3 | Tags (`tag:<key>`) | Sorted by tag key |

mod client;
mod ec2;
mod error;
pub mod filter;
mod provider;
pub mod providers;
mod resource_id;
mod state;
mod subnet;
mod vm_extension;
mod vpc;

pub use client::ApiClient;
pub use ec2::Ec2;
pub use error::LookupError;
pub use filter::{AttributeValue, CustomFilter, Filter};
pub use provider::CloudProvider;
pub use resource_id::ResourceId;
pub use state::StateChangeConf;
pub use subnet::{Subnet, SubnetQuery, SUBNET_FILTER_ATTRIBUTES};
pub use vm_extension::{normalize_json, VmExtension, VmExtensionConfig, VmExtensions};
pub use vpc::{Vpc, VpcQuery, VPC_FILTER_ATTRIBUTES};
