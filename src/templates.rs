use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::errors::{ViewfinderError, ViewfinderResult};
use crate::session::state::Viewport;

/// Sidecar metadata stored next to each template PNG.
///
/// `screen_x`/`screen_y` are the global screen coordinates of the viewport
/// center at save time. They make a template clickable even when matching
/// fails later, e.g. after a theme change. The full viewport record is kept
/// for diagnostics and to re-capture the same target on click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub name: String,
    pub base_name: String,
    pub screen_x: i32,
    pub screen_y: i32,
    pub created: chrono::DateTime<chrono::Utc>,
    pub viewport: Viewport,
}

/// One row of `list` output.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateEntry {
    pub name: String,
    pub base_name: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_y: Option<i32>,
}

/// Durable library of named reference images under a single directory.
///
/// Layout is flat: `<name>.png` plus `<name>.json`, where `name` is the
/// user's base name suffixed with the save-time Unix timestamp so repeated
/// saves of the same element never collide.
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn png_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.png"))
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Reject names that would escape the store directory or hide files.
    pub fn validate_name(name: &str) -> ViewfinderResult<String> {
        let name = name.trim();
        if name.is_empty()
            || name.starts_with('.')
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return Err(ViewfinderError::Input(format!(
                "invalid template name: {name:?}"
            )));
        }
        Ok(name.to_string())
    }

    /// Unique storage name for a base name: `<base>_<unix seconds>`.
    pub fn unique_name(base: &str, created: chrono::DateTime<chrono::Utc>) -> String {
        format!("{base}_{}", created.timestamp())
    }

    pub fn save(&self, image: &RgbaImage, meta: &TemplateMeta) -> ViewfinderResult<PathBuf> {
        let name = Self::validate_name(&meta.name)?;
        fs::create_dir_all(&self.dir)?;
        let png = self.png_path(&name);
        image.save(&png)?;
        fs::write(self.meta_path(&name), serde_json::to_string_pretty(meta)?)?;
        tracing::info!(name = %name, path = %png.display(), "template saved");
        Ok(png)
    }

    /// True when either the image or its sidecar exists.
    pub fn exists(&self, name: &str) -> bool {
        self.png_path(name).exists() || self.meta_path(name).exists()
    }

    /// Load the reference image, or `None` when it is missing or does not
    /// decode. Callers fall back to the sidecar coordinates in that case.
    pub fn load_image(&self, name: &str) -> Option<RgbaImage> {
        let png = self.png_path(name);
        if !png.exists() {
            return None;
        }
        match image::open(&png) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "template image does not decode");
                None
            }
        }
    }

    pub fn load_meta(&self, name: &str) -> Option<TemplateMeta> {
        let raw = fs::read_to_string(self.meta_path(name)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "template sidecar does not parse");
                None
            }
        }
    }

    /// All templates, newest first.
    pub fn list(&self) -> ViewfinderResult<Vec<TemplateEntry>> {
        let mut entries = Vec::new();
        let read = match fs::read_dir(&self.dir) {
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };
        for item in read {
            let item = item?;
            let path = item.path();
            if path.extension().map_or(true, |ext| ext != "png") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let meta = self.load_meta(name);
            entries.push(TemplateEntry {
                name: name.to_string(),
                base_name: meta
                    .as_ref()
                    .map(|m| m.base_name.clone())
                    .unwrap_or_else(|| name.to_string()),
                path: path.clone(),
                created: meta.as_ref().map(|m| m.created),
                screen_x: meta.as_ref().map(|m| m.screen_x),
                screen_y: meta.as_ref().map(|m| m.screen_y),
            });
        }
        entries.sort_by(|a, b| b.created.cmp(&a.created).then(a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Remove a template and its sidecar. Returns the paths that existed
    /// and were removed, empty when there was no such template.
    pub fn delete(&self, name: &str) -> ViewfinderResult<Vec<PathBuf>> {
        let name = Self::validate_name(name)?;
        let mut removed = Vec::new();
        for path in [self.png_path(&name), self.meta_path(&name)] {
            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if !removed.is_empty() {
            tracing::info!(name = %name, "template deleted");
        }
        Ok(removed)
    }
}
