//! Build artifacts handed to the post-processor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Builder ids whose artifacts can be imported, with the builder family.
pub const BUILTIN_BUILDERS: &[(&str, &str)] = &[
    ("mitchellh.virtualbox", "virtualbox"),
    ("mitchellh.vmware", "vmware"),
    ("mitchellh.vmware-esx", "vmware"),
];

/// Returns the builder family for `builder_id`, if it is supported.
pub fn builder_kind(builder_id: &str) -> Option<&'static str> {
    BUILTIN_BUILDERS
        .iter()
        .find(|(id, _)| *id == builder_id)
        .map(|(_, kind)| *kind)
}

/// Output of a build step: the builder that made it and the files it left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub builder_id: String,
    pub files: Vec<PathBuf>,
}

impl Artifact {
    pub fn new(builder_id: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            builder_id: builder_id.into(),
            files,
        }
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// Picks the descriptor to import from `artifact`.
///
/// Only the `.ovf` is imported; its disks are referenced from it. The
/// artifact must still carry at least one `.vmdk`.
pub fn select_descriptor(artifact: &Artifact) -> Result<&Path, ImportError> {
    if builder_kind(&artifact.builder_id).is_none() {
        return Err(ImportError::UnknownArtifact(artifact.builder_id.clone()));
    }

    let ovf = artifact.files.iter().find(|p| has_extension(p, "ovf"));
    let has_disk = artifact.files.iter().any(|p| has_extension(p, "vmdk"));

    match ovf {
        Some(ovf) if has_disk => Ok(ovf.as_path()),
        _ => Err(ImportError::MissingDescriptor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(builder: &str, files: &[&str]) -> Artifact {
        Artifact::new(builder, files.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn builder_kinds() {
        assert_eq!(builder_kind("mitchellh.virtualbox"), Some("virtualbox"));
        assert_eq!(builder_kind("mitchellh.vmware-esx"), Some("vmware"));
        assert_eq!(builder_kind("hashicorp.qemu"), None);
    }

    #[test]
    fn selects_ovf() {
        let a = artifact(
            "mitchellh.virtualbox",
            &["out/box.ovf", "out/box-disk1.vmdk"],
        );
        assert_eq!(select_descriptor(&a).unwrap(), Path::new("out/box.ovf"));
    }

    #[test]
    fn disk_listed_before_descriptor() {
        let a = artifact("mitchellh.vmware", &["out/box-disk1.vmdk", "out/box.ovf"]);
        assert_eq!(select_descriptor(&a).unwrap(), Path::new("out/box.ovf"));
    }

    #[test]
    fn unknown_builder_rejected() {
        let a = artifact("hashicorp.qemu", &["out/box.ovf", "out/box.vmdk"]);
        match select_descriptor(&a) {
            Err(ImportError::UnknownArtifact(id)) => assert_eq!(id, "hashicorp.qemu"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn requires_both_files() {
        let only_ovf = artifact("mitchellh.virtualbox", &["box.ovf", "box.mf"]);
        assert!(matches!(
            select_descriptor(&only_ovf),
            Err(ImportError::MissingDescriptor)
        ));

        let only_disk = artifact("mitchellh.virtualbox", &["box-disk1.vmdk"]);
        assert!(matches!(
            select_descriptor(&only_disk),
            Err(ImportError::MissingDescriptor)
        ));
    }

    #[test]
    fn extension_must_match_exactly() {
        let a = artifact("mitchellh.virtualbox", &["box.ovf.bak", "box.vmdk"]);
        assert!(matches!(
            select_descriptor(&a),
            Err(ImportError::MissingDescriptor)
        ));
    }
}
