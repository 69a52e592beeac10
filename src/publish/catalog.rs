use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{
    apps::{App, Now, RenderResources},
    foundation::{
        core::Raster,
        error::{InkError, InkResult},
        math::Fnv1a64,
    },
    publish::manifest::{MANIFEST_FILE, Manifest},
};

/// Per-app record of the render key the current rasters were produced for.
pub const RENDER_INFO_FILE: &str = "render-info.json";
const STAGING_PREFIX: &str = "staging-";

/// How a screen ended up in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenOutcome {
    /// Freshly rendered this cycle.
    Rendered,
    /// Render key unchanged; previous raster carried over without rendering.
    Reused,
    /// Rendering failed; previous raster carried over.
    Retained,
    /// Rendering failed and there was no valid previous raster.
    Placeholder,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenReport {
    pub app_id: usize,
    pub app: &'static str,
    pub screen: usize,
    pub outcome: ScreenOutcome,
    /// Render failure message for `Retained` and `Placeholder`.
    pub error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PublishResult {
    pub catalog: PathBuf,
    /// Version directory the catalog link now points to.
    pub version: PathBuf,
    pub manifest: Manifest,
    pub screens: Vec<ScreenReport>,
}

impl PublishResult {
    pub fn count(&self, outcome: ScreenOutcome) -> usize {
        self.screens.iter().filter(|s| s.outcome == outcome).count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct RenderInfo {
    fingerprint: String,
    key: String,
}

/// Fingerprint of an app's render key, tied to the app kind and screen count.
pub fn render_fingerprint(app_name: &str, nb_screens: usize, key: &str) -> String {
    let mut h = Fnv1a64::new_default();
    h.write_str(app_name);
    h.write_bytes(&(nb_screens as u64).to_le_bytes());
    h.write_str(key);
    format!("{:016x}", h.finish())
}

/// `app/<id>/<screen>.png` below a catalog root.
pub fn screen_path(root: &Path, app_id: usize, screen: usize) -> PathBuf {
    app_dir(root, app_id).join(format!("{screen}.png"))
}

fn app_dir(root: &Path, app_id: usize) -> PathBuf {
    root.join("app").join(app_id.to_string())
}

fn write_file(path: &Path, bytes: &[u8]) -> InkResult<()> {
    std::fs::write(path, bytes)
        .map_err(|e| InkError::publish_io(format!("write '{}'", path.display()), e))
}

/// Read access to the catalog currently being served.
struct PreviousCatalog {
    root: PathBuf,
    manifest: Option<Manifest>,
}

impl PreviousCatalog {
    fn open(root: &Path) -> Self {
        let manifest = match Manifest::read(&root.join(MANIFEST_FILE)) {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(error = %err, "previous manifest unreadable, not reusing rasters");
                None
            }
        };
        Self {
            root: root.to_path_buf(),
            manifest,
        }
    }

    /// Whether `id` held the same kind of app in the previous cycle.
    fn same_app(&self, app_id: usize, name: &str) -> bool {
        self.manifest
            .as_ref()
            .and_then(|m| m.app(app_id))
            .is_some_and(|a| a.name == name)
    }

    fn fingerprint(&self, app_id: usize) -> Option<String> {
        let bytes = std::fs::read(app_dir(&self.root, app_id).join(RENDER_INFO_FILE)).ok()?;
        let info: RenderInfo = serde_json::from_slice(&bytes).ok()?;
        Some(info.fingerprint)
    }

    /// PNG bytes of a previous raster, only if they still decode to a display-sized image.
    fn raster_bytes(&self, app_id: usize, screen: usize) -> Option<Vec<u8>> {
        let bytes = std::fs::read(screen_path(&self.root, app_id, screen)).ok()?;
        match Raster::from_png(&bytes) {
            Ok(_) => Some(bytes),
            Err(err) => {
                tracing::warn!(app_id, screen, error = %err, "previous raster is invalid");
                None
            }
        }
    }
}

/// Renders apps into a staging area and swaps it in as the served catalog.
///
/// The catalog path is a symlink to a version directory kept in a hidden sibling
/// `.<name>.versions/`. Staging happens inside that directory so the final rename never
/// crosses a filesystem boundary.
#[derive(Clone, Debug)]
pub struct Publisher {
    catalog: PathBuf,
}

impl Publisher {
    pub fn new(catalog: impl Into<PathBuf>) -> Self {
        Self {
            catalog: catalog.into(),
        }
    }

    pub fn catalog(&self) -> &Path {
        &self.catalog
    }

    fn versions_dir(&self) -> InkResult<PathBuf> {
        let name = self.catalog.file_name().ok_or_else(|| {
            InkError::validation(format!(
                "catalog path '{}' has no final component",
                self.catalog.display()
            ))
        })?;
        let parent = match self.catalog.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(parent.join(format!(".{}.versions", name.to_string_lossy())))
    }

    /// Render every screen of every app into a fresh staging directory.
    #[tracing::instrument(skip_all, fields(catalog = %self.catalog.display()))]
    pub fn stage(
        &self,
        apps: &[App],
        now: &Now,
        res: &mut RenderResources,
    ) -> InkResult<StagedCatalog> {
        let versions = self.versions_dir()?;
        std::fs::create_dir_all(&versions)
            .map_err(|e| InkError::publish_io(format!("create '{}'", versions.display()), e))?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&versions)
            .map_err(|e| InkError::publish_io("create staging directory", e))?;
        tracing::debug!(staging = %staging.path().display(), "staging catalog");

        let previous = PreviousCatalog::open(&self.catalog);
        let mut screens = Vec::new();
        for (id, app) in apps.iter().enumerate() {
            screens.extend(stage_app(staging.path(), id, app, &previous, now, res)?);
        }

        let manifest = Manifest::describe(apps, now);
        write_file(&staging.path().join(MANIFEST_FILE), &manifest.to_json()?)?;

        Ok(StagedCatalog {
            catalog: self.catalog.clone(),
            versions,
            staging,
            manifest,
            screens,
        })
    }

    /// One full publish cycle: stage, swap, then let apps whose fresh content went live
    /// record it.
    pub fn publish_all(
        &self,
        apps: &[App],
        now: &Now,
        res: &mut RenderResources,
    ) -> InkResult<PublishResult> {
        let result = self.stage(apps, now, res)?.commit()?;
        for (id, app) in apps.iter().enumerate() {
            let live = result.screens.iter().filter(|s| s.app_id == id).all(|s| {
                matches!(s.outcome, ScreenOutcome::Rendered | ScreenOutcome::Reused)
            });
            if !live {
                continue;
            }
            if let Err(err) = app.record_published(now) {
                tracing::warn!(
                    app = app.name(),
                    app_id = id,
                    error = %err,
                    "could not record published content"
                );
            }
        }
        Ok(result)
    }
}

fn stage_app(
    staging: &Path,
    app_id: usize,
    app: &App,
    previous: &PreviousCatalog,
    now: &Now,
    res: &mut RenderResources,
) -> InkResult<Vec<ScreenReport>> {
    let name = app.name();
    let nb_screens = app.nb_screens();
    let dir = app_dir(staging, app_id);
    std::fs::create_dir_all(&dir)
        .map_err(|e| InkError::publish_io(format!("create '{}'", dir.display()), e))?;
    let same_app = previous.same_app(app_id, name);
    let report = |screen, outcome, error| ScreenReport {
        app_id,
        app: name,
        screen,
        outcome,
        error,
    };

    let render_info = match app.render_key(now) {
        Ok(key) => key.map(|key| RenderInfo {
            fingerprint: render_fingerprint(name, nb_screens, &key),
            key,
        }),
        Err(err) => {
            tracing::warn!(app = name, error = %err, "no render key");
            None
        }
    };
    let info_json = match &render_info {
        Some(info) => Some(
            serde_json::to_vec_pretty(info)
                .map_err(|e| InkError::publish(format!("serialize render info: {e}")))?,
        ),
        None => None,
    };

    if let Some(info) = &render_info {
        if same_app && previous.fingerprint(app_id).as_deref() == Some(info.fingerprint.as_str()) {
            let carried: Option<Vec<Vec<u8>>> = (0..nb_screens)
                .map(|screen| previous.raster_bytes(app_id, screen))
                .collect();
            if let Some(carried) = carried {
                let mut reports = Vec::with_capacity(nb_screens);
                for (screen, bytes) in carried.iter().enumerate() {
                    write_file(&screen_path(staging, app_id, screen), bytes)?;
                    reports.push(report(screen, ScreenOutcome::Reused, None));
                }
                if let Some(json) = &info_json {
                    write_file(&dir.join(RENDER_INFO_FILE), json)?;
                }
                tracing::info!(app = name, app_id, "render key unchanged, reusing rasters");
                return Ok(reports);
            }
        }
    }

    let (mut rendered, missing): (Vec<Result<Raster, String>>, String) =
        match app.render_all(now, res) {
            Ok(screens) => (
                screens
                    .into_iter()
                    .map(|r| r.map_err(|e| e.to_string()))
                    .collect(),
                "app produced no raster for this screen".to_string(),
            ),
            Err(err) => {
                tracing::error!(app = name, app_id, error = %err, "app failed to render");
                (Vec::new(), err.to_string())
            }
        };
    rendered.resize_with(nb_screens, || Err(missing.clone()));

    let mut reports = Vec::with_capacity(nb_screens);
    for (screen, result) in rendered.into_iter().enumerate() {
        let path = screen_path(staging, app_id, screen);
        let failure = match result.and_then(|raster| raster.to_png().map_err(|e| e.to_string())) {
            Ok(png) => {
                write_file(&path, &png)?;
                reports.push(report(screen, ScreenOutcome::Rendered, None));
                continue;
            }
            Err(msg) => msg,
        };

        let previous_bytes = if same_app {
            previous.raster_bytes(app_id, screen)
        } else {
            None
        };
        let outcome = match previous_bytes {
            Some(bytes) => {
                write_file(&path, &bytes)?;
                ScreenOutcome::Retained
            }
            None => {
                write_file(&path, &Raster::placeholder().to_png()?)?;
                ScreenOutcome::Placeholder
            }
        };
        tracing::warn!(app = name, app_id, screen, ?outcome, error = %failure, "screen not rendered");
        reports.push(report(screen, outcome, Some(failure)));
    }

    let all_rendered = reports
        .iter()
        .all(|r| r.outcome == ScreenOutcome::Rendered);
    if let (true, Some(json)) = (all_rendered, &info_json) {
        write_file(&dir.join(RENDER_INFO_FILE), json)?;
    }
    Ok(reports)
}

/// A fully written catalog that is not served yet.
///
/// Dropping it without [`StagedCatalog::commit`] removes the staging directory.
#[derive(Debug)]
pub struct StagedCatalog {
    catalog: PathBuf,
    versions: PathBuf,
    staging: TempDir,
    manifest: Manifest,
    screens: Vec<ScreenReport>,
}

impl StagedCatalog {
    pub fn path(&self) -> &Path {
        self.staging.path()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn screens(&self) -> &[ScreenReport] {
        &self.screens
    }

    /// Make the staged catalog the served one.
    #[tracing::instrument(skip(self), fields(catalog = %self.catalog.display()))]
    pub fn commit(self) -> InkResult<PublishResult> {
        let suffix = self
            .staging
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().trim_start_matches(STAGING_PREFIX).to_string())
            .unwrap_or_default();
        let version_name = format!(
            "v{}-{suffix}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S")
        );
        let version = self.versions.join(&version_name);
        std::fs::rename(self.staging.path(), &version).map_err(|e| {
            InkError::publish_io(format!("move staging to '{}'", version.display()), e)
        })?;

        let versions_name = self
            .versions
            .file_name()
            .ok_or_else(|| InkError::publish("versions directory has no name"))?;
        let target = Path::new(versions_name).join(&version_name);
        if let Err(err) = swap_link(&self.catalog, &target, &self.versions) {
            let _ = std::fs::remove_dir_all(&version);
            return Err(err);
        }

        prune_versions(&self.versions, &version);

        let result = PublishResult {
            catalog: self.catalog.clone(),
            version,
            manifest: self.manifest.clone(),
            screens: self.screens.clone(),
        };
        tracing::info!(
            version = %version_name,
            rendered = result.count(ScreenOutcome::Rendered),
            reused = result.count(ScreenOutcome::Reused),
            retained = result.count(ScreenOutcome::Retained),
            placeholders = result.count(ScreenOutcome::Placeholder),
            "catalog published"
        );
        Ok(result)
    }
}

/// Point `catalog` at `target` (relative to the catalog's parent) with a single rename.
///
/// A plain directory at `catalog` is moved into `versions` first and moved back if the
/// link cannot be put in place.
#[cfg(unix)]
fn swap_link(catalog: &Path, target: &Path, versions: &Path) -> InkResult<()> {
    let legacy = match std::fs::symlink_metadata(catalog) {
        Ok(meta) if meta.file_type().is_dir() => {
            let legacy = versions.join(format!(
                "legacy-{}",
                chrono::Utc::now().format("%Y%m%dT%H%M%S")
            ));
            tracing::warn!(
                from = %catalog.display(),
                to = %legacy.display(),
                "migrating plain catalog directory"
            );
            std::fs::rename(catalog, &legacy)
                .map_err(|e| InkError::publish_io("move legacy catalog aside", e))?;
            Some(legacy)
        }
        Ok(meta) if meta.file_type().is_file() => {
            return Err(InkError::publish(format!(
                "catalog path '{}' is a regular file",
                catalog.display()
            )));
        }
        _ => None,
    };

    let linked = replace_with_link(catalog, target);
    if let (Err(err), Some(legacy)) = (&linked, &legacy) {
        match std::fs::rename(legacy, catalog) {
            Ok(()) => tracing::warn!(error = %err, "swap failed, restored plain catalog directory"),
            Err(e) => tracing::error!(
                legacy = %legacy.display(),
                error = %e,
                "swap failed and the plain catalog directory could not be restored"
            ),
        }
    }
    linked
}

#[cfg(unix)]
fn replace_with_link(catalog: &Path, target: &Path) -> InkResult<()> {
    let link = temp_link_path(catalog);
    let _ = std::fs::remove_file(&link);
    std::os::unix::fs::symlink(target, &link)
        .map_err(|e| InkError::publish_io(format!("create link '{}'", link.display()), e))?;
    if let Err(e) = std::fs::rename(&link, catalog) {
        let _ = std::fs::remove_file(&link);
        return Err(InkError::publish_io(
            format!("swap '{}'", catalog.display()),
            e,
        ));
    }
    Ok(())
}

/// Sibling of `catalog` where the new link is created before it is renamed into place.
#[cfg(unix)]
fn temp_link_path(catalog: &Path) -> PathBuf {
    let name = catalog
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    catalog.with_file_name(format!(".{name}.link-{}", std::process::id()))
}

#[cfg(not(unix))]
fn swap_link(catalog: &Path, _target: &Path, _versions: &Path) -> InkResult<()> {
    Err(InkError::publish(format!(
        "atomic swap of '{}' needs symlinks, only supported on unix",
        catalog.display()
    )))
}

/// Remove every version (and stale staging directory) except the live one.
fn prune_versions(versions: &Path, live: &Path) {
    let entries = match std::fs::read_dir(versions) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, "cannot list old catalog versions");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path == live {
            continue;
        }
        let removed = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match removed {
            Ok(()) => tracing::debug!(path = %path.display(), "removed old version"),
            Err(err) => tracing::warn!(path = %path.display(), error = %err, "cannot remove old version"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/publish/catalog.rs"]
mod tests;
