//! Loader Core: bounded-retry asset loading with a terminal fallback.

pub mod engine;
pub mod fallback;
pub mod record;

pub use engine::{Loader, LoaderStats};
pub use fallback::FallbackNotice;
pub use record::{AssetKind, AssetRecord, AssetState};
