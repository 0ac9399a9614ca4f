//! Import error types.

/// Errors produced during an import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("descriptor error: {0}")]
    Descriptor(#[from] ovfpush_descriptor::DescriptorError),

    #[error("transfer error: {0}")]
    Transfer(#[from] ovfpush_transfer::TransferError),

    #[error("{kind} '{name}' not found: {reason}")]
    Inventory {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("import spec rejected: {0}")]
    ImportSpec(String),

    #[error("invalid transfer URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unknown artifact type, can't import: {0}")]
    UnknownArtifact(String),

    #[error("artifact has no OVF/VMDK pair")]
    MissingDescriptor,
}
