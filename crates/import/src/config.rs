//! Import configuration.
//!
//! Stored as TOML, e.g.:
//!
//! ```toml
//! host = "vcenter.example.com"
//! username = "packer"
//! password = "secret"
//! datacenter = "dc1"
//! datastore = "ssd-01"
//! folder = "templates"
//! resource_pool = "build"
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ovfpush_descriptor::{
    DEFAULT_HARDWARE_VERSION, DEFAULT_OS_ID, DEFAULT_OS_TYPE, Envelope, NormalizeOptions,
};
use ovfpush_protocol::{DiskProvisioning, ImportSpecParams, LEASE_PROGRESS_INTERVAL};

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{}", missing_message(.0))]
    Missing(Vec<&'static str>),

    #[error("progress interval must be at least one second")]
    InvalidInterval,
}

fn missing_message(keys: &[&'static str]) -> String {
    keys.iter()
        .map(|key| format!("{key} must be set"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Where and how to import an OVF package.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub datacenter: String,
    #[serde(default)]
    pub datastore: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Folder below the datacenter's `vm` folder.
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub resource_pool: String,

    /// Overrides the entity name taken from the descriptor.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vm_name: String,

    #[serde(default = "default_os_type")]
    pub os_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_version: String,
    #[serde(default = "default_os_id")]
    pub os_id: String,
    #[serde(default = "default_hardware_version")]
    pub hardware_version: String,

    #[serde(default)]
    pub disk_provisioning: DiskProvisioning,

    /// Seconds between lease progress reports.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
}

fn default_os_type() -> String {
    DEFAULT_OS_TYPE.into()
}

fn default_os_id() -> String {
    DEFAULT_OS_ID.into()
}

fn default_hardware_version() -> String {
    DEFAULT_HARDWARE_VERSION.into()
}

fn default_progress_interval() -> u64 {
    LEASE_PROGRESS_INTERVAL.as_secs()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            datacenter: String::new(),
            datastore: String::new(),
            host: String::new(),
            username: String::new(),
            password: String::new(),
            folder: String::new(),
            resource_pool: String::new(),
            vm_name: String::new(),
            os_type: default_os_type(),
            os_version: String::new(),
            os_id: default_os_id(),
            hardware_version: default_hardware_version(),
            disk_provisioning: DiskProvisioning::default(),
            progress_interval_secs: default_progress_interval(),
        }
    }
}

impl fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportConfig")
            .field("datacenter", &self.datacenter)
            .field("datastore", &self.datastore)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("folder", &self.folder)
            .field("resource_pool", &self.resource_pool)
            .field("vm_name", &self.vm_name)
            .field("os_type", &self.os_type)
            .field("os_version", &self.os_version)
            .field("os_id", &self.os_id)
            .field("hardware_version", &self.hardware_version)
            .field("disk_provisioning", &self.disk_provisioning)
            .field("progress_interval_secs", &self.progress_interval_secs)
            .finish()
    }
}

impl ImportConfig {
    /// Loads a TOML config file. The result is not validated yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Fills empty optional fields with defaults and checks required ones.
    ///
    /// Every missing required key is reported, not only the first.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.os_type.is_empty() {
            self.os_type = default_os_type();
        }
        if self.os_id.is_empty() {
            self.os_id = default_os_id();
        }
        if self.hardware_version.is_empty() {
            self.hardware_version = default_hardware_version();
        }

        let required = [
            ("datacenter", &self.datacenter),
            ("host", &self.host),
            ("password", &self.password),
            ("username", &self.username),
            ("datastore", &self.datastore),
            ("folder", &self.folder),
            ("resource_pool", &self.resource_pool),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        if self.progress_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        Ok(self)
    }

    /// Descriptor rewrite settings.
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            os_id: self.os_id.clone(),
            os_type: self.os_type.clone(),
            os_version: (!self.os_version.is_empty()).then(|| self.os_version.clone()),
            hardware_version: self.hardware_version.clone(),
        }
    }

    /// Import spec parameters for a descriptor with `envelope`.
    pub fn spec_params(&self, envelope: &Envelope) -> ImportSpecParams {
        ImportSpecParams {
            entity_name: envelope.entity_name(Some(&self.vm_name)),
            disk_provisioning: self.disk_provisioning,
        }
    }

    /// Inventory path of the target folder.
    pub fn folder_path(&self) -> String {
        format!("/{}/vm/{}", self.datacenter, self.folder)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}
