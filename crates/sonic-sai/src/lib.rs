//! SAI (Switch Abstraction Interface) object model.
//!
//! This crate holds everything the convergence engine needs to know about
//! switch objects without talking to a vendor library:
//!
//! - [`types`]: virtual/real object ids and object types
//! - [`entry`]: structured keys of non-OID entries
//! - [`meta`]: static attribute registry and attribute values
//! - [`api`]: the device interface trait with bulk variants
//! - [`vs`]: an in-memory virtual switch implementing the device interface
//! - [`error`]: status codes and error handling

pub mod api;
pub mod entry;
pub mod error;
pub mod meta;
pub mod types;
pub mod vs;

pub use api::{BulkOpErrorMode, BulkResponse, SaiInterface};
pub use entry::{EntryKey, IpPrefix, MacAddress, ObjectKey};
pub use error::{SaiError, SaiResult, SaiStatus};
pub use meta::{AttrMeta, AttrValue, SaiAttribute};
pub use types::{ObjectType, Oid, Rid, SaiObjectId, Vid};
pub use vs::VirtualSwitch;
