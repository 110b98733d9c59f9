//! Fixed device-emulation profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const MOBILE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) \
                         AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";
const TABLET_UA: &str = "Mozilla/5.0 (iPad; CPU OS 14_0 like Mac OS X) \
                         AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";

/// The emulated device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 3] = [DeviceKind::Desktop, DeviceKind::Mobile, DeviceKind::Tablet];

    /// Resolve a device name. Total: anything unrecognized is `Desktop`.
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mobile" => DeviceKind::Mobile,
            "tablet" => DeviceKind::Tablet,
            _ => DeviceKind::Desktop,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Desktop => "desktop",
            DeviceKind::Mobile => "mobile",
            DeviceKind::Tablet => "tablet",
        }
    }

    /// The fixed emulation table entry for this device.
    pub fn profile(self) -> DeviceProfile {
        match self {
            DeviceKind::Desktop => DeviceProfile {
                kind: self,
                width: 1280,
                height: 800,
                user_agent: DESKTOP_UA,
                device_scale_factor: 1.0,
                is_mobile: false,
                has_touch: false,
            },
            DeviceKind::Mobile => DeviceProfile {
                kind: self,
                width: 375,
                height: 667,
                user_agent: MOBILE_UA,
                device_scale_factor: 2.0,
                is_mobile: true,
                has_touch: true,
            },
            DeviceKind::Tablet => DeviceProfile {
                kind: self,
                width: 768,
                height: 1024,
                user_agent: TABLET_UA,
                device_scale_factor: 2.0,
                is_mobile: true,
                has_touch: true,
            },
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Viewport, user agent, scale and touch settings for one device class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceProfile {
    pub kind: DeviceKind,
    pub width: u32,
    pub height: u32,
    pub user_agent: &'static str,
    pub device_scale_factor: f64,
    pub is_mobile: bool,
    pub has_touch: bool,
}

impl DeviceProfile {
    pub fn resolve(name: &str) -> Self {
        DeviceKind::resolve(name).profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_is_total() {
        assert_eq!(DeviceKind::resolve("desktop"), DeviceKind::Desktop);
        assert_eq!(DeviceKind::resolve("Mobile"), DeviceKind::Mobile);
        assert_eq!(DeviceKind::resolve(" tablet "), DeviceKind::Tablet);
        assert_eq!(DeviceKind::resolve("smartwatch"), DeviceKind::Desktop);
        assert_eq!(DeviceKind::resolve(""), DeviceKind::Desktop);
    }

    #[test]
    fn test_profile_table() {
        let desktop = DeviceProfile::resolve("desktop");
        assert_eq!((desktop.width, desktop.height), (1280, 800));
        assert!(!desktop.has_touch);

        let mobile = DeviceProfile::resolve("mobile");
        assert_eq!((mobile.width, mobile.height), (375, 667));
        assert_eq!(mobile.device_scale_factor, 2.0);
        assert!(mobile.has_touch && mobile.is_mobile);
        assert!(mobile.user_agent.contains("iPhone"));

        let tablet = DeviceProfile::resolve("tablet");
        assert_eq!((tablet.width, tablet.height), (768, 1024));
        assert!(tablet.user_agent.contains("iPad"));
    }
}
