use std::sync::LazyLock;

use regex::Regex;

use ovfpush_protocol::DEFAULT_ENTITY_NAME;

static ENVELOPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:ovf:)?Envelope[\s>/]").expect("valid envelope regex"));

static VIRTUAL_SYSTEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<(?:ovf:)?VirtualSystem\s[^>]*?ovf:id="([^"]*)"[^>]*>(.*?)</(?:ovf:)?VirtualSystem>"#)
        .expect("valid virtual system regex")
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:ovf:)?Name>\s*([^<]*?)\s*</(?:ovf:)?Name>").expect("valid name regex")
});

/// The parts of an OVF envelope the importer cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub virtual_system: Option<VirtualSystem>,
}

/// First `VirtualSystem` of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualSystem {
    pub id: String,
    pub name: Option<String>,
}

impl Envelope {
    /// Parses an envelope summary. Returns `None` if there is no envelope.
    pub fn parse(content: &str) -> Option<Self> {
        if !ENVELOPE_RE.is_match(content) {
            return None;
        }

        let virtual_system = VIRTUAL_SYSTEM_RE.captures(content).map(|caps| {
            let name = NAME_RE
                .captures(&caps[2])
                .map(|n| n[1].to_string())
                .filter(|n| !n.is_empty());
            VirtualSystem {
                id: caps[1].to_string(),
                name,
            }
        });

        Some(Self { virtual_system })
    }

    /// Name for the imported entity.
    ///
    /// Precedence: `override_name`, the virtual system's name, its id,
    /// then [`DEFAULT_ENTITY_NAME`].
    pub fn entity_name(&self, override_name: Option<&str>) -> String {
        if let Some(name) = override_name.filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match &self.virtual_system {
            Some(VirtualSystem {
                name: Some(name), ..
            }) => name.clone(),
            Some(vs) if !vs.id.is_empty() => vs.id.clone(),
            _ => DEFAULT_ENTITY_NAME.to_string(),
        }
    }
}
