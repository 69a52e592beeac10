use std::path::Path;

use anyhow::Context;
use chrono::SecondsFormat;

use crate::{
    apps::{App, Now},
    foundation::error::{InkError, InkResult},
};

/// File name of the manifest at the catalog root.
pub const MANIFEST_FILE: &str = "info.json";

/// One app as announced to display clients.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ManifestApp {
    /// Position in the configuration; rasters live under `app/<id>/`.
    pub id: usize,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub nb_screens: usize,
}

/// `info.json`: the shape of the catalog, independent of which screens refreshed.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    /// RFC 3339 time of the publish cycle.
    pub last_updated: String,
    pub apps: Vec<ManifestApp>,
}

impl Manifest {
    pub fn describe(apps: &[App], now: &Now) -> Self {
        Self {
            last_updated: now.to_rfc3339_opts(SecondsFormat::Secs, false),
            apps: apps
                .iter()
                .enumerate()
                .map(|(id, app)| ManifestApp {
                    id,
                    name: app.name().to_string(),
                    title: Some(app.title().to_string()),
                    nb_screens: app.nb_screens(),
                })
                .collect(),
        }
    }

    pub fn app(&self, id: usize) -> Option<&ManifestApp> {
        self.apps.iter().find(|a| a.id == id)
    }

    /// Read a published manifest; `Ok(None)` when there is none yet.
    pub fn read(path: &Path) -> InkResult<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
        let manifest = serde_json::from_slice(&bytes)
            .map_err(|e| InkError::validation(format!("parse '{}': {e}", path.display())))?;
        Ok(Some(manifest))
    }

    pub fn to_json(&self) -> InkResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| InkError::publish(format!("serialize manifest: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/publish/manifest.rs"]
mod tests;
