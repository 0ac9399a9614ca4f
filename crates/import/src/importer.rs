//! Import of one OVF package through a remote import lease.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use ovfpush_descriptor::Descriptor;
use ovfpush_protocol::{LeaseInfo, ManagedObjectRef, OvfFileItem};
use ovfpush_transfer::{FileTransport, ItemProgress, TransferItem, UploadCoordinator, UploadOptions};
use tracing::{debug, info, warn};

use crate::api::{ImportApi, ImportLease, InventoryResolver, resolve_device_url};
use crate::config::{ConfigError, ImportConfig};
use crate::error::ImportError;

/// Inventory objects an import lands in.
struct Target {
    datastore: ManagedObjectRef,
    folder: ManagedObjectRef,
    resource_pool: ManagedObjectRef,
}

/// Drives one import against a remote endpoint.
pub struct OvfImporter<'a> {
    api: &'a dyn ImportApi,
    inventory: &'a dyn InventoryResolver,
    transport: &'a dyn FileTransport,
    config: &'a ImportConfig,
}

impl<'a> OvfImporter<'a> {
    pub fn new(
        api: &'a dyn ImportApi,
        inventory: &'a dyn InventoryResolver,
        transport: &'a dyn FileTransport,
        config: &'a ImportConfig,
    ) -> Self {
        Self {
            api,
            inventory,
            transport,
            config,
        }
    }

    /// Imports the descriptor at `path` and converts the result into a template.
    pub async fn handle_ovf(&self, path: &Path) -> Result<ManagedObjectRef, ImportError> {
        let entity = self.import(path).await?;

        info!(entity = %entity, "marking imported entity as template");
        self.api.mark_as_template(&entity).await?;

        Ok(entity)
    }

    /// Runs the full import and returns the created entity.
    ///
    /// The pipeline:
    /// 1. Load and normalize the descriptor
    /// 2. Resolve the target inventory objects
    /// 3. Create the import spec
    /// 4. Open the lease and wait for its transfer endpoints
    /// 5. Upload every file, one at a time, with the heartbeat running
    /// 6. Complete the lease
    ///
    /// Nothing is retried. A failed upload aborts the lease; earlier
    /// failures leave any opened lease to expire on the remote side.
    pub async fn import(&self, path: &Path) -> Result<ManagedObjectRef, ImportError> {
        if self.config.progress_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval.into());
        }

        // 1. Descriptor
        let descriptor = Descriptor::load(path, &self.config.normalize_options())?;
        let params = self.config.spec_params(descriptor.envelope());
        info!(
            descriptor = %path.display(),
            entity = %params.entity_name,
            "configuring import location"
        );

        // 2. Inventory
        let target = self.resolve_target().await?;

        // 3. Import spec
        info!(descriptor = %descriptor.path().display(), "creating import spec");
        let spec = self
            .api
            .create_import_spec(
                descriptor.content(),
                &target.resource_pool,
                &target.datastore,
                &params,
            )
            .await?;
        if let Some(error) = spec.first_error() {
            return Err(ImportError::ImportSpec(error.to_string()));
        }
        for warning in &spec.warnings {
            warn!(warning = %warning, "import spec warning");
        }

        // 4. Lease
        info!(entity = %params.entity_name, "creating import lease");
        let lease = self
            .api
            .import_vapp(&spec.import_spec, &target.folder, &target.resource_pool)
            .await?;
        let lease_info = lease.wait().await?;

        // 5. Upload
        let (items, progress) = self.build_items(&spec.file_items, &lease_info)?;
        let coordinator =
            UploadCoordinator::start(Arc::clone(&lease), progress, self.config.progress_interval());

        let mut pending = VecDeque::from(items);
        let uploaded = self.upload_items(&descriptor, &mut pending).await;
        coordinator.stop().await;
        drop(pending);

        // 6. Finalize
        match uploaded {
            Ok(()) => {
                lease.complete().await?;
                info!(entity = %lease_info.entity, "import complete");
                Ok(lease_info.entity)
            }
            Err(e) => {
                abort_lease(lease.as_ref(), &e).await;
                Err(e)
            }
        }
    }

    async fn resolve_target(&self) -> Result<Target, ImportError> {
        let config = self.config;

        debug!(datacenter = %config.datacenter, "resolving datacenter");
        let datacenter = self.inventory.datacenter(&config.datacenter).await?;

        debug!(datastore = %config.datastore, "resolving datastore");
        let datastore = self
            .inventory
            .datastore(&datacenter, &config.datastore)
            .await?;

        let folder_path = config.folder_path();
        debug!(folder = %folder_path, "resolving folder");
        let folder = self.inventory.folder(&datacenter, &folder_path).await?;

        debug!(resource_pool = %config.resource_pool, "resolving resource pool");
        let resource_pool = self
            .inventory
            .resource_pool(&datacenter, &config.resource_pool)
            .await?;

        Ok(Target {
            datastore,
            folder,
            resource_pool,
        })
    }

    /// Pairs each lease endpoint with the spec file for the same device.
    ///
    /// Items follow the order of the lease's endpoints.
    fn build_items(
        &self,
        files: &[OvfFileItem],
        lease_info: &LeaseInfo,
    ) -> Result<(Vec<TransferItem>, Vec<ItemProgress>), ImportError> {
        let mut items = Vec::new();
        let mut progress = Vec::new();

        for device in &lease_info.device_urls {
            for file in files.iter().filter(|f| f.device_id == device.import_key) {
                let url = resolve_device_url(&device.url, self.api.host())?;
                debug!(file = %file.path, url = %url, "created upload item");

                let (item, rx) = TransferItem::new(url, file.clone());
                items.push(item);
                progress.push(rx);
            }
        }

        for file in files {
            let matched = lease_info
                .device_urls
                .iter()
                .any(|d| d.import_key == file.device_id);
            if !matched {
                warn!(file = %file.path, device = %file.device_id, "no transfer endpoint for file");
            }
        }

        Ok((items, progress))
    }

    /// Uploads items in order, stopping at the first failure.
    ///
    /// Items not yet attempted stay in `pending`, so their progress channels
    /// remain open until the coordinator is stopped.
    async fn upload_items(
        &self,
        descriptor: &Descriptor,
        pending: &mut VecDeque<TransferItem>,
    ) -> Result<(), ImportError> {
        while let Some(item) = pending.pop_front() {
            self.upload_item(descriptor, item).await?;
        }
        Ok(())
    }

    async fn upload_item(
        &self,
        descriptor: &Descriptor,
        item: TransferItem,
    ) -> Result<(), ImportError> {
        let (url, file_item, sink) = item.into_parts();
        let path = descriptor.resolve_file(&file_item.path);

        let (file, size) = match open_local(&path).await {
            Ok(opened) => opened,
            Err(e) => {
                sink.fail(e.to_string()).await;
                return Err(e.into());
            }
        };
        let options = UploadOptions::for_item(&file_item, size);

        info!(
            file = %path.display(),
            bytes = size,
            url = %url,
            method = options.method.http_method(),
            "uploading file"
        );

        self.transport.upload(file, &url, &options, sink).await?;

        Ok(())
    }
}

/// Opens a local file; its length is the request's content length.
async fn open_local(path: &Path) -> std::io::Result<(tokio::fs::File, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    Ok((file, size))
}

/// Best-effort abort after a failed upload.
async fn abort_lease(lease: &dyn ImportLease, cause: &ImportError) {
    let reason = cause.to_string();
    match lease.abort(&reason).await {
        Ok(()) => debug!(reason = %reason, "import lease aborted"),
        Err(e) => warn!(error = %e, "failed to abort import lease"),
    }
}
