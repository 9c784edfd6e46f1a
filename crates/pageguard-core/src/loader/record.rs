//! Per-URL load tracking.

use serde::{Deserialize, Serialize};

/// Resource kind, decides how the host materializes the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Script,
    Stylesheet,
}

/// Load state of a tracked URL.
///
/// Transitions are `Pending -> Loaded` or `Pending -> Failed` only; both
/// outcomes are terminal for the page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetState {
    Pending,
    Loaded,
    Failed,
}

/// One tracked load, keyed by URL in the loader's record map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub url: String,
    pub kind: AssetKind,
    /// Failures observed so far. Never exceeds the configured max_retries.
    pub attempt_count: u32,
    pub state: AssetState,
}

impl AssetRecord {
    pub fn new(url: &str, kind: AssetKind) -> Self {
        Self {
            url: url.to_string(),
            kind,
            attempt_count: 0,
            state: AssetState::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state != AssetState::Pending
    }

    /// Record one observed failure, capped at `max_retries`. Returns the
    /// new failure count.
    pub fn record_failure(&mut self, max_retries: u32) -> u32 {
        if self.attempt_count < max_retries {
            self.attempt_count += 1;
        }
        self.attempt_count
    }

    pub fn mark_loaded(&mut self) {
        debug_assert_eq!(self.state, AssetState::Pending);
        self.state = AssetState::Loaded;
    }

    pub fn mark_failed(&mut self) {
        debug_assert_eq!(self.state, AssetState::Pending);
        self.state = AssetState::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_pending_with_zero_failures() {
        let record = AssetRecord::new("/assets/app.js", AssetKind::Script);
        assert_eq!(record.state, AssetState::Pending);
        assert_eq!(record.attempt_count, 0);
        assert!(!record.is_terminal());
    }

    #[test]
    fn failure_count_caps_at_max_retries() {
        let mut record = AssetRecord::new("/assets/app.js", AssetKind::Script);
        for _ in 0..10 {
            record.record_failure(3);
        }
        assert_eq!(record.attempt_count, 3);
    }

    #[test]
    fn terminal_states() {
        let mut loaded = AssetRecord::new("/a.css", AssetKind::Stylesheet);
        loaded.mark_loaded();
        assert_eq!(loaded.state, AssetState::Loaded);
        assert!(loaded.is_terminal());

        let mut failed = AssetRecord::new("/b.js", AssetKind::Script);
        failed.mark_failed();
        assert_eq!(failed.state, AssetState::Failed);
        assert!(failed.is_terminal());
    }
}
