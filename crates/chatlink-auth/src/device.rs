//! Stable device identity derived from a machine fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Device id and platform label sent with every login and session frame.
///
/// Derived once per installation and persisted with the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    /// Hex SHA-256 of the machine fingerprint
    pub device_id: String,
    /// Platform label, e.g. `linux-x86_64`
    pub platform: String,
}

impl DeviceIdentity {
    /// Explicit identity
    pub fn new(device_id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            platform: platform.into(),
        }
    }

    /// Fingerprint the current machine.
    ///
    /// Sources that cannot be read contribute an empty component, so the
    /// result is stable for a given machine but never fails.
    pub fn detect() -> Self {
        let machine_id = MACHINE_ID_PATHS
            .iter()
            .find_map(|path| std::fs::read_to_string(path).ok())
            .map(|id| id.trim().to_string())
            .unwrap_or_default();
        let hostname = std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
            .map(|name| name.trim().to_string())
            .unwrap_or_default();

        let identity = Self::from_components(&[
            &machine_id,
            &hostname,
            std::env::consts::OS,
            std::env::consts::ARCH,
        ]);
        debug!("derived device id {}", identity.device_id);
        identity
    }

    /// Identity for the given fingerprint components on this platform
    pub fn from_components(components: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for component in components {
            hasher.update(component.as_bytes());
            hasher.update([0u8]);
        }
        Self {
            device_id: hex::encode(hasher.finalize()),
            platform: platform_label(),
        }
    }
}

/// `<os>-<arch>` of the running binary
pub fn platform_label() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = DeviceIdentity::from_components(&["m1", "host", "linux", "x86_64"]);
        let b = DeviceIdentity::from_components(&["m1", "host", "linux", "x86_64"]);
        assert_eq!(a, b);
        assert_eq!(a.device_id.len(), 64);
    }

    #[test]
    fn test_component_boundaries_matter() {
        let a = DeviceIdentity::from_components(&["ab", "c"]);
        let b = DeviceIdentity::from_components(&["a", "bc"]);
        assert_ne!(a.device_id, b.device_id);
    }

    #[test]
    fn test_detect_carries_platform() {
        let identity = DeviceIdentity::detect();
        assert_eq!(identity.platform, platform_label());
        assert!(identity.device_id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
