//! Global failure interceptor.
//!
//! The shell wires two global signals here: resource-load errors on
//! script/link elements, and unhandled promise rejections. Resource errors
//! route into the loader's retry path; rejections that look like a
//! chunk/module fetch failure trigger a session-capped full page reload as
//! a last resort.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::events::Event;
use crate::host::{PageHost, SessionStore};
use crate::loader::{AssetKind, Loader};

/// Session storage key for the reload counter (decimal integer as text).
pub const RELOAD_ATTEMPTS_KEY: &str = "pageguard.reload_attempts";

/// Hard cap on last-resort page reloads per session.
pub const MAX_RELOAD_ATTEMPTS: u32 = 2;

/// What [`Interceptor::on_unhandled_rejection`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionOutcome {
    /// Not a chunk-load failure; nothing to do.
    Ignored,
    /// A reload was requested from the host.
    Reloaded {
        /// 1-based reload attempt within this session.
        attempt: u32,
        module: Option<String>,
    },
    /// Reload budget spent; only logged.
    Exhausted,
}

pub struct Interceptor {
    loader: Loader,
    host: Arc<dyn PageHost>,
    store: Arc<dyn SessionStore>,
    events: UnboundedSender<Event>,
}

impl Interceptor {
    pub fn new(
        loader: Loader,
        host: Arc<dyn PageHost>,
        store: Arc<dyn SessionStore>,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            loader,
            host,
            store,
            events,
        }
    }

    /// Route a global resource-load error into the loader's retry path.
    /// Runs on the runtime so independent URLs recover concurrently.
    pub fn on_resource_error(&self, url: &str, kind: AssetKind) -> tokio::task::JoinHandle<()> {
        let loader = self.loader.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            loader.handle_load_error(&url, kind).await;
        })
    }

    /// Handle an unhandled promise rejection. Reloads the page for
    /// chunk-load failures, at most [`MAX_RELOAD_ATTEMPTS`] times per
    /// session; the counter lives in session storage and resets only when
    /// that storage is cleared.
    pub fn on_unhandled_rejection(&self, message: &str, stack: &str) -> RejectionOutcome {
        if !is_chunk_load_failure(message) {
            return RejectionOutcome::Ignored;
        }
        let module = extract_module_path(stack);

        let attempts = self
            .store
            .get(RELOAD_ATTEMPTS_KEY)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        if attempts >= MAX_RELOAD_ATTEMPTS {
            warn!(
                message,
                module = module.as_deref(),
                "chunk load failure after reload budget spent"
            );
            return RejectionOutcome::Exhausted;
        }

        let attempt = attempts + 1;
        self.store.set(RELOAD_ATTEMPTS_KEY, &attempt.to_string());
        debug!(attempt, module = module.as_deref(), "reloading page to recover module");
        let _ = self.events.send(Event::PageReloadRequested {
            attempt,
            module: module.clone(),
            at: Utc::now(),
        });
        self.host.reload_page();
        RejectionOutcome::Reloaded { attempt, module }
    }
}

/// Whether a rejection message indicates a fetch/module-loading failure.
fn is_chunk_load_failure(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    const MARKERS: [&str; 5] = [
        "failed to fetch",
        "loading chunk",
        "dynamically imported module",
        "importing a module script failed",
        "networkerror",
    ];
    MARKERS.iter().any(|m| message.contains(m))
}

/// Best-effort module path extraction from a rejection stack trace.
/// Looks for the first path-like token ending in a script/style extension,
/// with any trailing `:line:col` stripped.
fn extract_module_path(stack: &str) -> Option<String> {
    for token in stack.split(|c: char| c.is_whitespace() || "()@".contains(c)) {
        let token = strip_position_suffix(token);
        if token.is_empty() {
            continue;
        }
        let path_like = token.starts_with('/') || token.starts_with("http");
        let script_like = token.ends_with(".js") || token.ends_with(".mjs") || token.ends_with(".css");
        if path_like && script_like {
            return Some(token.to_string());
        }
    }
    None
}

/// Strip a trailing `:line:col` (or single `:line`) position from a stack
/// frame token, leaving scheme colons intact.
fn strip_position_suffix(token: &str) -> &str {
    let mut rest = token;
    for _ in 0..2 {
        if let Some(idx) = rest.rfind(':') {
            if rest[idx + 1..].chars().all(|c| c.is_ascii_digit())
                && !rest[idx + 1..].is_empty()
            {
                rest = &rest[..idx];
                continue;
            }
        }
        break;
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_chunk_load_failures() {
        assert!(is_chunk_load_failure("TypeError: Failed to fetch"));
        assert!(is_chunk_load_failure("Loading chunk 42 failed"));
        assert!(is_chunk_load_failure(
            "TypeError: Failed to fetch dynamically imported module"
        ));
        assert!(is_chunk_load_failure("NetworkError when attempting to fetch"));
        assert!(!is_chunk_load_failure("TypeError: x is not a function"));
    }

    #[test]
    fn extracts_module_path_from_stack() {
        let stack = "TypeError: Failed to fetch\n    at https://example.com/assets/chunk-a1b2.js:1:2345\n    at async load";
        assert_eq!(
            extract_module_path(stack),
            Some("https://example.com/assets/chunk-a1b2.js".to_string())
        );
    }

    #[test]
    fn extracts_relative_paths_and_firefox_frames() {
        let stack = "load@/assets/vendor.mjs:10:3";
        assert_eq!(extract_module_path(stack), Some("/assets/vendor.mjs".to_string()));
    }

    #[test]
    fn no_path_means_none() {
        assert_eq!(extract_module_path("at anonymous"), None);
    }

    #[test]
    fn position_suffix_stripping_keeps_scheme() {
        assert_eq!(strip_position_suffix("https://x/y.js:1:2"), "https://x/y.js");
        assert_eq!(strip_position_suffix("/a/b.js:7"), "/a/b.js");
        assert_eq!(strip_position_suffix("/a/b.js"), "/a/b.js");
    }
}
