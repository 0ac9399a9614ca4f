pub mod constants;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{DEFAULT_ENTITY_NAME, LEASE_PROGRESS_INTERVAL};
pub use types::{
    DeviceUrl, DiskProvisioning, ImportSpecParams, ImportSpecResult, LeaseInfo,
    ManagedObjectRef, OvfFileItem, UploadMethod,
};
