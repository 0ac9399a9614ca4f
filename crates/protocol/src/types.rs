use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to an object in the remote inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedObjectRef {
    /// Object type, e.g. `VirtualMachine` or `ResourcePool`.
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl ManagedObjectRef {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ManagedObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// Disk allocation policy requested for imported disks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiskProvisioning {
    #[default]
    Thin,
    Thick,
    EagerZeroedThick,
}

/// Parameters for creating an import specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpecParams {
    pub entity_name: String,
    pub disk_provisioning: DiskProvisioning,
}

/// A file the remote side expects to receive for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvfFileItem {
    /// Matches [`DeviceUrl::import_key`] of the lease.
    pub device_id: String,
    /// Path of the file, relative to the descriptor.
    pub path: String,
    /// Declared size in bytes, as computed by the remote side.
    pub size: u64,
    /// `true` for plain files (created with PUT), `false` for disk streams.
    #[serde(default)]
    pub create: bool,
}

impl OvfFileItem {
    /// Returns the HTTP upload method this file needs.
    pub fn upload_method(&self) -> UploadMethod {
        if self.create {
            UploadMethod::Create
        } else {
            UploadMethod::Append
        }
    }
}

/// Result of asking the remote side to build an import specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpecResult {
    /// Opaque spec handed back verbatim when opening the lease.
    pub import_spec: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_items: Vec<OvfFileItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ImportSpecResult {
    /// Returns the first hard error reported for the spec, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

/// Transfer endpoint for one device of a lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUrl {
    pub import_key: String,
    pub url: String,
}

/// State of a lease once it is ready to receive files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseInfo {
    /// The entity being created by the import.
    pub entity: ManagedObjectRef,
    #[serde(default)]
    pub device_urls: Vec<DeviceUrl>,
}

/// How a file is sent to its transfer endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    /// Plain file (e.g. `.iso`): `PUT` with an overwrite directive.
    Create,
    /// Disk stream: `POST`.
    Append,
}

impl UploadMethod {
    pub fn http_method(self) -> &'static str {
        match self {
            Self::Create => "PUT",
            Self::Append => "POST",
        }
    }
}
