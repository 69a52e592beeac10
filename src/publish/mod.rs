//! Staging, atomic swap and manifest of the served catalog.

/// Staging directory, per-screen outcomes and the symlink swap.
pub mod catalog;
/// `info.json` describing the configured apps.
pub mod manifest;

pub use catalog::{PublishResult, Publisher, ScreenOutcome, ScreenReport, StagedCatalog};
pub use manifest::{MANIFEST_FILE, Manifest, ManifestApp};
