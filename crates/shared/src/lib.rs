//! TenantSite Shared Types and Utilities
//!
//! This crate contains the tenant/domain data model, the record store and
//! the tenant-scoped mutation rules shared across the TenantSite platform.

pub mod db;
pub mod error;
pub mod hostname;
pub mod records;
pub mod shutdown;
pub mod store;
pub mod telemetry;
pub mod types;

pub use db::*;
pub use error::*;
pub use records::Records;
pub use store::{PgRecordStore, RecordStore};
#[cfg(any(test, feature = "test-util"))]
pub use store::MemoryRecordStore;
pub use types::*;
