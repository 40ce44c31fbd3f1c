//! The nine session operations.
//!
//! Every operation is a single process invocation: load whatever state
//! applies, capture fresh pixels where needed, act, persist, and hand back
//! a [`Report`]. Collaborators sit behind traits so the whole flow runs
//! against fakes in tests.

use std::path::PathBuf;

use image::{imageops, RgbaImage};

use crate::capture::{Frame, ScreenSource, TargetSelector};
use crate::config::AppConfig;
use crate::errors::{ViewfinderError, ViewfinderResult};
use crate::geometry::{Direction, Rect};
use crate::input::{ClickKind, Pointer};
use crate::matcher::{self, MatchPolicy};
use crate::overlay;
use crate::session::report::{
    navigation_instructions, save_instructions, MatchMethod, Report, ScreenPoint,
};
use crate::session::state::{CaptureTarget, Viewport};
use crate::session::store::StateStore;
use crate::templates::{TemplateMeta, TemplateStore};

/// Outcome of the two-stage template lookup.
enum Located {
    ByImage { x: i32, y: i32, confidence: f32 },
    BySavedCoords { x: i32, y: i32 },
    NotFound,
}

pub struct Session {
    source: Box<dyn ScreenSource>,
    pointer: Box<dyn Pointer>,
    state: StateStore,
    templates: TemplateStore,
    config: AppConfig,
}

impl Session {
    pub fn new(config: AppConfig, source: Box<dyn ScreenSource>, pointer: Box<dyn Pointer>) -> Self {
        let state = StateStore::new(&config.storage.work_dir);
        let templates = TemplateStore::new(config.storage.template_dir.clone());
        Self { source, pointer, state, templates, config }
    }

    /// Begin a session on the selected target, replacing any previous one.
    pub async fn start(&self, selector: &TargetSelector) -> ViewfinderResult<Report> {
        let target = self.source.resolve(selector).await?;
        let frame = self.source.capture(&target).await?;
        let viewport = Viewport::root(target.clone(), frame.width(), frame.height(), frame.offset());

        let screenshot = self.write_view_artifact(&frame.image, &viewport.region, 0)?;
        self.state.save(&viewport)?;
        tracing::info!(capture = %target.describe(), width = frame.width(), height = frame.height(), "session started");

        let instructions = navigation_instructions(&screenshot, &viewport);
        Ok(Report::Start { target: target.describe(), screenshot, viewport, instructions })
    }

    /// Narrow the active viewport toward a direction.
    pub async fn zoom(&self, direction: Direction) -> ViewfinderResult<Report> {
        let stored = self.require_session()?;
        let frame = self.source.capture(&stored.target).await?;

        let next = stored.zoomed(direction);
        if next.region.width == 0 || next.region.height == 0 {
            return Err(ViewfinderError::CaptureFailed(
                "viewport is too small to zoom further".to_string(),
            ));
        }

        // The persisted rectangle may outlive a resolution change; the
        // artifact shows whatever part of it the fresh capture still has.
        let visible = self.clip_to_frame(&next.region, &frame)?;
        let screenshot = self.write_view_artifact(&frame.image, &visible, next.zoom_depth)?;
        self.state.save(&next)?;
        tracing::info!(
            direction = direction.canonical_name(),
            depth = next.zoom_depth,
            width = next.region.width,
            height = next.region.height,
            "zoomed"
        );

        let (cx, cy) = next.center_on_screen();
        let instructions = navigation_instructions(&screenshot, &next);
        Ok(Report::Zoom {
            direction: direction.canonical_name(),
            screenshot,
            viewport: next,
            screen_coords: ScreenPoint { x: cx, y: cy },
            instructions,
        })
    }

    /// Cut the current viewport out of a clean capture and store it under a
    /// timestamped name. Guides are never baked into templates.
    pub async fn save(&self, base_name: &str) -> ViewfinderResult<Report> {
        let base = TemplateStore::validate_name(base_name)?;
        let viewport = self.require_session()?;
        let frame = self.source.capture(&viewport.target).await?;
        let region = self.clip_to_frame(&viewport.region, &frame)?;

        let image = crop(&frame.image, &region);
        let (screen_x, screen_y) = viewport.center_on_screen();
        let created = chrono::Utc::now();
        let name = TemplateStore::unique_name(&base, created);

        let meta = TemplateMeta {
            name: name.clone(),
            base_name: base.clone(),
            screen_x,
            screen_y,
            created,
            viewport: viewport.clone(),
        };
        let path = self.templates.save(&image, &meta)?;

        let screen_coords = ScreenPoint { x: screen_x, y: screen_y };
        let instructions = save_instructions(&name, &screen_coords);
        Ok(Report::Save {
            template: name,
            base_name: base,
            path,
            width: image.width(),
            height: image.height(),
            screen_coords,
            instructions,
        })
    }

    /// Find a saved template on screen and click it, falling back to the
    /// coordinates recorded at save time when matching comes up empty.
    pub async fn click(
        &self,
        name: &str,
        kind: ClickKind,
        no_click: bool,
        min_confidence: Option<f32>,
    ) -> ViewfinderResult<Report> {
        let name = TemplateStore::validate_name(name)?;
        if !self.templates.exists(&name) {
            return Err(ViewfinderError::TemplateNotFound(name));
        }
        let meta = self.templates.load_meta(&name);
        let image = self.templates.load_image(&name);

        let target = meta
            .as_ref()
            .map(|m| m.viewport.target.clone())
            .unwrap_or(CaptureTarget::FullScreen);

        let located = self.locate(&name, image, &meta, &target, min_confidence).await?;
        let (x, y, method, confidence) = match located {
            Located::ByImage { x, y, confidence } => {
                (x, y, MatchMethod::TemplateMatch, Some(confidence))
            }
            Located::BySavedCoords { x, y } => (x, y, MatchMethod::SavedCoords, None),
            Located::NotFound => return Err(ViewfinderError::LocateFailed(name)),
        };

        if !no_click {
            self.pointer.click(x, y, kind).await?;
        }
        let verification_screenshot = if no_click {
            None
        } else {
            self.verification_shot(&target).await
        };

        Ok(Report::Click {
            template: name,
            clicked: !no_click,
            click_type: kind.as_str(),
            screen_coords: ScreenPoint { x, y },
            method,
            confidence,
            verification_screenshot,
        })
    }

    /// Click the center of the active viewport, no template involved.
    pub async fn click_center(&self, kind: ClickKind, no_click: bool) -> ViewfinderResult<Report> {
        let viewport = self.require_session()?;
        let (x, y) = viewport.center_on_screen();

        if !no_click {
            self.pointer.click(x, y, kind).await?;
        }
        let verification_screenshot = if no_click {
            None
        } else {
            self.verification_shot(&viewport.target).await
        };

        Ok(Report::ClickCenter {
            clicked: !no_click,
            click_type: kind.as_str(),
            screen_coords: ScreenPoint { x, y },
            viewport,
            verification_screenshot,
        })
    }

    pub async fn list(&self) -> ViewfinderResult<Report> {
        let templates = self.templates.list()?;
        let count = templates.len();
        Ok(Report::List { templates, count })
    }

    pub async fn delete(&self, name: &str) -> ViewfinderResult<Report> {
        let name = TemplateStore::validate_name(name)?;
        let removed = self.templates.delete(&name)?;
        if removed.is_empty() {
            return Err(ViewfinderError::TemplateNotFound(name));
        }
        Ok(Report::Delete { deleted: name, removed })
    }

    /// Drop the session slot. Succeeds whether or not one existed.
    pub async fn reset(&self) -> ViewfinderResult<Report> {
        let cleared = self.state.clear()?;
        Ok(Report::Reset { cleared })
    }

    pub async fn list_windows(&self) -> ViewfinderResult<Report> {
        let windows = self.source.list_windows().await?;
        let count = windows.len();
        Ok(Report::ListWindows { windows, count })
    }

    fn require_session(&self) -> ViewfinderResult<Viewport> {
        self.state.load()?.ok_or(ViewfinderError::NoActiveSession)
    }

    fn clip_to_frame(&self, region: &Rect, frame: &Frame) -> ViewfinderResult<Rect> {
        region.clipped_to(frame.width(), frame.height()).ok_or_else(|| {
            ViewfinderError::CaptureFailed(
                "stored viewport lies outside the current capture".to_string(),
            )
        })
    }

    async fn locate(
        &self,
        name: &str,
        image: Option<RgbaImage>,
        meta: &Option<TemplateMeta>,
        target: &CaptureTarget,
        min_confidence: Option<f32>,
    ) -> ViewfinderResult<Located> {
        let saved = meta.as_ref().map(|m| (m.screen_x, m.screen_y));

        let Some(template) = image else {
            // Image missing or undecodable; the sidecar coordinates are all
            // that is left to go on.
            let Some((x, y)) = saved else { return Ok(Located::NotFound) };
            tracing::info!(template = name, "template image unavailable, using saved coordinates");
            return Ok(Located::BySavedCoords { x, y });
        };

        // Saved coordinates stand in for a failed match, never for a failed
        // capture; a target that cannot be captured fails the invocation.
        let frame = self.source.capture(target).await?;

        let policy = MatchPolicy {
            min_confidence: min_confidence.unwrap_or(self.config.matching.min_confidence),
            max_search_dim: self.config.matching.max_search_dim,
        };
        match matcher::find_best_match(&frame.image, &template, &policy) {
            Some(m) => Ok(Located::ByImage {
                x: frame.offset_x + m.center_x as i32,
                y: frame.offset_y + m.center_y as i32,
                confidence: m.confidence,
            }),
            None => match saved {
                Some((x, y)) => {
                    tracing::info!(template = name, "no visual match, using saved coordinates");
                    Ok(Located::BySavedCoords { x, y })
                }
                None => Ok(Located::NotFound),
            },
        }
    }

    /// Crop, annotate and write the zoom artifact for one step.
    fn write_view_artifact(
        &self,
        image: &RgbaImage,
        region: &Rect,
        depth: u32,
    ) -> ViewfinderResult<PathBuf> {
        let view = overlay::with_navigation_guides(&crop(image, region));
        std::fs::create_dir_all(&self.config.storage.work_dir)?;
        let path = self
            .config
            .storage
            .work_dir
            .join(format!("view_{depth}_{}.png", chrono::Utc::now().timestamp()));
        view.save(&path)?;
        Ok(path)
    }

    /// Best-effort screenshot of the target after a click. Failures are
    /// logged and swallowed; the click already happened.
    async fn verification_shot(&self, target: &CaptureTarget) -> Option<PathBuf> {
        if !self.config.pointer.verify_screenshot {
            return None;
        }
        tokio::time::sleep(std::time::Duration::from_millis(self.config.pointer.verify_delay_ms))
            .await;
        let frame = match self.source.capture(target).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "verification capture failed");
                return None;
            }
        };
        let path = self
            .config
            .storage
            .work_dir
            .join(format!("after_click_{}.png", chrono::Utc::now().timestamp()));
        if let Err(e) = std::fs::create_dir_all(&self.config.storage.work_dir)
            .map_err(ViewfinderError::from)
            .and_then(|()| frame.image.save(&path).map_err(ViewfinderError::from))
        {
            tracing::warn!(error = %e, "verification screenshot not written");
            return None;
        }
        Some(path)
    }
}

fn crop(image: &RgbaImage, region: &Rect) -> RgbaImage {
    imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image()
}
