//! Device classification, computed once at collector construction.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

const MOBILE_UA_MARKERS: [&str; 7] = [
    "android",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "windows phone",
    "mobile",
];

/// Narrow-screen cutoff separating phones from tablets, px.
const MOBILE_WIDTH_CUTOFF: u32 = 768;

impl DeviceClass {
    /// Simple user-agent/screen-width heuristic: a mobile-pattern UA on a
    /// narrow screen is a phone, a mobile-pattern UA otherwise a tablet,
    /// everything else a desktop.
    pub fn classify(user_agent: &str, screen_width: u32) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        let mobile_ua = MOBILE_UA_MARKERS.iter().any(|m| ua.contains(m));
        if mobile_ua && screen_width < MOBILE_WIDTH_CUTOFF {
            DeviceClass::Mobile
        } else if mobile_ua {
            DeviceClass::Tablet
        } else {
            DeviceClass::Desktop
        }
    }
}
