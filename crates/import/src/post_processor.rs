//! Post-processor entry point: import a finished build into the inventory.

use std::path::Path;

use ovfpush_protocol::ManagedObjectRef;
use ovfpush_transfer::FileTransport;
use tracing::info;

use crate::api::{ImportApi, InventoryResolver};
use crate::artifact::{Artifact, select_descriptor};
use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::importer::OvfImporter;

/// Imports build artifacts as templates.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    config: ImportConfig,
}

impl PostProcessor {
    /// Validates `config` and builds a post-processor around it.
    pub fn configure(config: ImportConfig) -> Result<Self, ImportError> {
        Ok(Self {
            config: config.validated()?,
        })
    }

    /// Parses and validates a TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ImportError> {
        Self::configure(ImportConfig::from_toml_str(content)?)
    }

    /// Loads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        Self::configure(ImportConfig::load(path)?)
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Imports `artifact` and marks the result as a template.
    ///
    /// The artifact is checked before anything remote is touched.
    pub async fn post_process(
        &self,
        artifact: &Artifact,
        api: &dyn ImportApi,
        inventory: &dyn InventoryResolver,
        transport: &dyn FileTransport,
    ) -> Result<ManagedObjectRef, ImportError> {
        let descriptor = select_descriptor(artifact)?;
        info!(
            builder = %artifact.builder_id,
            descriptor = %descriptor.display(),
            "importing build artifact"
        );

        OvfImporter::new(api, inventory, transport, &self.config)
            .handle_ovf(descriptor)
            .await
    }
}
