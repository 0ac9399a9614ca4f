//! Remote import API boundary.
//!
//! The orchestrator only talks to the hypervisor through these traits.
//! Using traits keeps import logic decoupled from the SOAP session and
//! testable with mocks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use ovfpush_protocol::{ImportSpecParams, ImportSpecResult, LeaseInfo, ManagedObjectRef};
use ovfpush_transfer::{LeaseProgress, Url};

use crate::error::ImportError;

/// Boxed future returned by every remote call.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ImportError>> + Send + 'a>>;

/// Import operations of the remote endpoint.
pub trait ImportApi: Send + Sync {
    /// Host of the current session, substituted into `*` transfer URLs.
    fn host(&self) -> &str;

    /// Validates `descriptor` against the target and builds an import spec.
    fn create_import_spec<'a>(
        &'a self,
        descriptor: &'a str,
        resource_pool: &'a ManagedObjectRef,
        datastore: &'a ManagedObjectRef,
        params: &'a ImportSpecParams,
    ) -> RemoteFuture<'a, ImportSpecResult>;

    /// Opens an import lease for `import_spec`.
    fn import_vapp<'a>(
        &'a self,
        import_spec: &'a serde_json::Value,
        folder: &'a ManagedObjectRef,
        resource_pool: &'a ManagedObjectRef,
    ) -> RemoteFuture<'a, Arc<dyn ImportLease>>;

    /// Converts an imported virtual machine into a template.
    fn mark_as_template<'a>(&'a self, entity: &'a ManagedObjectRef) -> RemoteFuture<'a, ()>;
}

/// An open import transaction.
///
/// Progress reports (via [`LeaseProgress`]) renew it; it is finalized once,
/// by [`complete`](Self::complete) or [`abort`](Self::abort).
pub trait ImportLease: LeaseProgress {
    /// Waits until the lease is ready and returns its transfer endpoints.
    fn wait(&self) -> RemoteFuture<'_, LeaseInfo>;

    /// Marks every file as received.
    fn complete(&self) -> RemoteFuture<'_, ()>;

    /// Gives up on the import.
    fn abort<'a>(&'a self, reason: &'a str) -> RemoteFuture<'a, ()>;
}

/// Looks up inventory objects by name.
pub trait InventoryResolver: Send + Sync {
    fn datacenter<'a>(&'a self, name: &'a str) -> RemoteFuture<'a, ManagedObjectRef>;

    fn datastore<'a>(
        &'a self,
        datacenter: &'a ManagedObjectRef,
        name: &'a str,
    ) -> RemoteFuture<'a, ManagedObjectRef>;

    /// `path` is an inventory path such as `/dc1/vm/templates`.
    fn folder<'a>(
        &'a self,
        datacenter: &'a ManagedObjectRef,
        path: &'a str,
    ) -> RemoteFuture<'a, ManagedObjectRef>;

    fn resource_pool<'a>(
        &'a self,
        datacenter: &'a ManagedObjectRef,
        name: &'a str,
    ) -> RemoteFuture<'a, ManagedObjectRef>;
}

/// Parses a lease transfer URL.
///
/// Hosts report `*` as the host part when the URL is reachable through
/// the address the session was opened against.
pub fn resolve_device_url(raw: &str, host: &str) -> Result<Url, ImportError> {
    let resolved = match raw.split_once("://") {
        Some((scheme, rest)) => match rest.strip_prefix('*') {
            Some(tail) => format!("{scheme}://{host}{tail}"),
            None => raw.to_string(),
        },
        None => raw.to_string(),
    };

    Url::parse(&resolved).map_err(|e| ImportError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_host_is_replaced() {
        let url = resolve_device_url("https://*/nfc/52a1/disk-0.vmdk", "vcenter.example").unwrap();
        assert_eq!(url.as_str(), "https://vcenter.example/nfc/52a1/disk-0.vmdk");
    }

    #[test]
    fn wildcard_host_keeps_port() {
        let url = resolve_device_url("https://*:8443/nfc/disk-0.vmdk", "esx1").unwrap();
        assert_eq!(url.host_str(), Some("esx1"));
        assert_eq!(url.port(), Some(8443));
    }

    #[test]
    fn concrete_host_is_kept() {
        let url = resolve_device_url("https://esx1.example/nfc/disk-0.vmdk", "vcenter").unwrap();
        assert_eq!(url.host_str(), Some("esx1.example"));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = resolve_device_url("not a url", "vcenter").unwrap_err();
        assert!(matches!(err, ImportError::InvalidUrl { .. }));
    }
}
