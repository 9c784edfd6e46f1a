//! Critical-asset fallback notice.
//!
//! The only user-visible failure in the system. The loader builds the
//! notice; the host renders it (fixed-position, high z-index panel in a
//! browser shell) with a manual reload action. No alternate-URL
//! substitution is ever attempted.

use serde::{Deserialize, Serialize};

/// Render model for the fallback panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackNotice {
    /// URL whose retries were exhausted.
    pub url: String,
    pub title: String,
    pub message: String,
    /// Label for the manual reload action.
    pub action_label: String,
}

impl FallbackNotice {
    pub fn for_asset(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: "Something went wrong".to_string(),
            message: "A required part of this page failed to load. \
                      Check your connection and reload the page."
                .to_string(),
            action_label: "Reload page".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_carries_the_failed_url() {
        let notice = FallbackNotice::for_asset("/assets/react-core.js");
        assert_eq!(notice.url, "/assets/react-core.js");
        assert!(!notice.message.is_empty());
        assert_eq!(notice.action_label, "Reload page");
    }
}
