//! core
//!
//! Domain types shared by the commit pipeline and the stores.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RefName
//! - [`signature`] - Caller-supplied signature fields and their canonical form
//! - [`status`] - Staging-area status entries
//! - [`config`] - Configuration schema and loading

pub mod config;
pub mod signature;
pub mod status;
pub mod types;
