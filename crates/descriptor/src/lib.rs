//! OVF descriptor handling.
//!
//! Loads an exported `.ovf`, extracts the little the importer needs from the
//! envelope, and rewrites VirtualBox-specific sections into something a
//! vSphere host accepts.

mod envelope;
mod normalize;

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tracing::warn;

pub use envelope::{Envelope, VirtualSystem};
pub use normalize::{
    DEFAULT_HARDWARE_VERSION, DEFAULT_OS_ID, DEFAULT_OS_TYPE, NormalizeOptions, normalize,
};

/// Errors produced while loading a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OVF at {0} has an empty envelope")]
    EmptyEnvelope(String),
}

/// A loaded, normalized descriptor ready to be submitted.
#[derive(Debug, Clone)]
pub struct Descriptor {
    path: PathBuf,
    envelope: Envelope,
    content: String,
}

impl Descriptor {
    /// Reads `path`, parses its envelope and normalizes the content.
    pub fn load(path: &Path, options: &NormalizeOptions) -> Result<Self, DescriptorError> {
        let bytes = std::fs::read(path)?;
        let raw = String::from_utf8_lossy(&bytes);
        if matches!(raw, Cow::Owned(_)) {
            warn!(path = %path.display(), "descriptor is not valid UTF-8, replacing invalid bytes");
        }
        let envelope = Envelope::parse(&raw)
            .ok_or_else(|| DescriptorError::EmptyEnvelope(path.display().to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            envelope,
            content: normalize(&raw, options),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// The normalized document body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Resolves a file referenced by the descriptor to a local path.
    ///
    /// References are relative to the descriptor's directory.
    pub fn resolve_file(&self, reference: &str) -> PathBuf {
        let reference = Path::new(reference);
        if reference == self.path.as_path() {
            return self.path.clone();
        }
        match self.path.parent() {
            Some(dir) => dir.join(reference),
            None => reference.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<?xml version="1.0"?>
<Envelope ovf:version="1.0" xmlns="http://schemas.dmtf.org/ovf/envelope/1">
  <VirtualSystem ovf:id="centos-7">
    <OperatingSystemSection ovf:id="80">
      <Description>RedHat_64</Description>
    </OperatingSystemSection>
  </VirtualSystem>
</Envelope>
"#;

    #[test]
    fn load_normalizes_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.ovf");
        std::fs::write(&path, MINIMAL).unwrap();

        let descriptor = Descriptor::load(&path, &NormalizeOptions::default()).unwrap();
        assert_eq!(descriptor.path(), path.as_path());
        assert_eq!(descriptor.envelope().entity_name(None), "centos-7");
        assert!(descriptor
            .content()
            .contains(r#"<OperatingSystemSection ovf:id="107" vmw:osType="centos64Guest">"#));
    }

    #[test]
    fn load_rejects_missing_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.ovf");
        std::fs::write(&path, "<NotAnEnvelope/>").unwrap();

        let err = Descriptor::load(&path, &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, DescriptorError::EmptyEnvelope(_)));
    }

    #[test]
    fn load_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.ovf");
        let mut bytes = MINIMAL.replace("RedHat_64", "RedHat_64 \u{1}").into_bytes();
        let marker = bytes.iter().position(|b| *b == 1).unwrap();
        bytes[marker] = 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let descriptor = Descriptor::load(&path, &NormalizeOptions::default()).unwrap();
        assert_eq!(descriptor.envelope().entity_name(None), "centos-7");
        assert!(descriptor.content().contains("RedHat_64 \u{FFFD}"));
    }

    #[test]
    fn load_missing_file() {
        let err = Descriptor::load(
            Path::new("/nonexistent/box.ovf"),
            &NormalizeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::Io(_)));
    }

    #[test]
    fn resolve_file_relative_to_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.ovf");
        std::fs::write(&path, MINIMAL).unwrap();

        let descriptor = Descriptor::load(&path, &NormalizeOptions::default()).unwrap();
        assert_eq!(
            descriptor.resolve_file("box-disk1.vmdk"),
            dir.path().join("box-disk1.vmdk")
        );
        assert_eq!(descriptor.resolve_file(path.to_str().unwrap()), path);
    }
}
