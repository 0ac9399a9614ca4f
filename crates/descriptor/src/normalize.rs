//! VirtualBox-to-vSphere descriptor rewriting.

use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};
use tracing::debug;

pub const DEFAULT_OS_TYPE: &str = "centos64Guest";
pub const DEFAULT_OS_ID: &str = "107";
pub const DEFAULT_HARDWARE_VERSION: &str = "vmx-10";

const HARDWARE_SECTION_END: &str = "</VirtualHardwareSection>";

/// VMware tools hooks appended to every virtual hardware section.
const TOOLS_CONFIG_SECTION_END: &str = r#"
		<vmw:Config ovf:required="false" vmw:key="tools.afterPowerOn" vmw:value="true"/>
		<vmw:Config ovf:required="false" vmw:key="tools.afterResume" vmw:value="true"/>
		<vmw:Config ovf:required="false" vmw:key="tools.beforeGuestShutdown" vmw:value="true"/>
		<vmw:Config ovf:required="false" vmw:key="tools.beforeGuestStandby" vmw:value="true"/>
	</VirtualHardwareSection>
	"#;

const NAT_CONNECTION: &str = "<rasd:Connection>NAT</rasd:Connection>";

static VIRTUALBOX_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<vssd:VirtualSystemType>virtualbox-(\d)+(\.(\d)+)?</vssd:VirtualSystemType>")
        .expect("valid system type regex")
});

static VIRTUALBOX_OS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<OperatingSystemSection ovf:id="(\d)+">"#).expect("valid os section regex")
});

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Item>(.*?)</Item>").expect("valid item regex"));

static VBOX_MACHINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<vbox:Machine.*</vbox:Machine>").expect("valid vbox machine regex")
});

/// Guest OS and hardware identity written into the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub os_id: String,
    pub os_type: String,
    pub os_version: Option<String>,
    pub hardware_version: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            os_id: DEFAULT_OS_ID.into(),
            os_type: DEFAULT_OS_TYPE.into(),
            os_version: None,
            hardware_version: DEFAULT_HARDWARE_VERSION.into(),
        }
    }
}

impl NormalizeOptions {
    fn os_section(&self) -> String {
        match self.os_version.as_deref().filter(|v| !v.is_empty()) {
            Some(version) => format!(
                r#"<OperatingSystemSection ovf:id="{}" ovf:version="{}" vmw:osType="{}">"#,
                self.os_id, version, self.os_type
            ),
            None => format!(
                r#"<OperatingSystemSection ovf:id="{}" vmw:osType="{}">"#,
                self.os_id, self.os_type
            ),
        }
    }

    fn system_type(&self) -> String {
        format!(
            "<vssd:VirtualSystemType>{}</vssd:VirtualSystemType>",
            self.hardware_version
        )
    }
}

/// Rewrites a VirtualBox export so a vSphere host accepts it.
///
/// - adds VMware tools hooks to the virtual hardware section
/// - drops NAT network adapters
/// - drops the `vbox:Machine` block
/// - replaces the guest OS section and the virtual system type
pub fn normalize(content: &str, options: &NormalizeOptions) -> String {
    let content = content.replace(HARDWARE_SECTION_END, TOOLS_CONFIG_SECTION_END);

    let content = ITEM_RE.replace_all(&content, |caps: &Captures| {
        if caps[0].contains(NAT_CONNECTION) {
            debug!("dropping NAT network adapter");
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    let content = VBOX_MACHINE_RE.replace_all(&content, "");

    let os_section = options.os_section();
    let content = VIRTUALBOX_OS_RE.replace_all(&content, NoExpand(&os_section));

    let system_type = options.system_type();
    VIRTUALBOX_TYPE_RE
        .replace_all(&content, NoExpand(&system_type))
        .into_owned()
}
