use std::time::Duration;

/// How often the aggregate upload percentage is reported to the lease.
///
/// The remote side only renews an import lease when it receives a
/// progress report, so this must stay well below the lease timeout.
pub const LEASE_PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// Entity name used when neither the config nor the descriptor provides one.
pub const DEFAULT_ENTITY_NAME: &str = "Packer uploaded VMDK";

/// Content type for stream-optimized disk uploads.
pub const STREAM_VMDK_CONTENT_TYPE: &str = "application/x-vnd.vmware-streamVmdk";

/// Header sent with every non-disk (create) upload.
pub const OVERWRITE_HEADER: &str = "Overwrite";

/// Value of [`OVERWRITE_HEADER`].
pub const OVERWRITE_VALUE: &str = "t";
