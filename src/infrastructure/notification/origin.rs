//! Provenance attached to every outbound notification

/// Where a notification came from.
///
/// Several event sources may feed one receiver; these fields let the
/// receiver tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginInfo {
    pub machine_name: String,
    pub software_name: String,
    pub software_version: String,
    pub platform_name: String,
    pub platform_version: String,
}

impl OriginInfo {
    /// Describe the current host and this build
    pub fn detect() -> Self {
        let machine_name = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());

        let platform_name =
            sysinfo::System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
        let platform_version = sysinfo::System::long_os_version()
            .or_else(sysinfo::System::os_version)
            .unwrap_or_else(|| format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH));

        Self {
            machine_name,
            software_name: env!("CARGO_PKG_NAME").to_string(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            platform_name,
            platform_version,
        }
    }

    /// GNTP `Origin-*` header pairs
    pub fn headers(&self) -> [(&'static str, &str); 5] {
        [
            ("Origin-Machine-Name", &self.machine_name),
            ("Origin-Software-Name", &self.software_name),
            ("Origin-Software-Version", &self.software_version),
            ("Origin-Platform-Name", &self.platform_name),
            ("Origin-Platform-Version", &self.platform_version),
        ]
    }
}
