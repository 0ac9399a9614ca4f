//! OVF import orchestration.
//!
//! This crate drives one import of an OVF package into a remote
//! hypervisor inventory. It is a library crate with no SOAP or session
//! code: callers provide [`ImportApi`] and [`InventoryResolver`]
//! implementations for their endpoint, and a
//! [`FileTransport`](ovfpush_transfer::FileTransport) for the bytes.
//!
//! # Pipeline
//!
//! 1. **Load**: read and normalize the descriptor
//! 2. **Resolve**: datacenter, datastore, folder, resource pool
//! 3. **Spec**: create the import spec, reject hard errors
//! 4. **Lease**: open the import lease and wait for transfer endpoints
//! 5. **Upload**: send each file in turn while the lease heartbeat runs
//! 6. **Complete**: finalize the lease (or abort it on upload failure)

pub mod api;
pub mod artifact;
pub mod config;
pub mod error;
pub mod importer;
pub mod post_processor;

// Re-export primary types for convenience.
pub use api::{ImportApi, ImportLease, InventoryResolver, RemoteFuture, resolve_device_url};
pub use artifact::{Artifact, BUILTIN_BUILDERS, builder_kind, select_descriptor};
pub use config::{ConfigError, ImportConfig};
pub use error::ImportError;
pub use importer::OvfImporter;
pub use post_processor::PostProcessor;
