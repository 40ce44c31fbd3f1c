use async_trait::async_trait;

use crate::capture::types::{Frame, TargetSelector, WindowInfo};
use crate::capture::window;
use crate::errors::{ViewfinderError, ViewfinderResult};
use crate::session::state::CaptureTarget;

/// Strategy trait for pixels-in. The real implementation talks to the
/// display server through xcap; tests substitute canned frames.
#[async_trait]
pub trait ScreenSource: Send + Sync {
    /// Turn a user-facing selector into a durable capture target.
    async fn resolve(&self, selector: &TargetSelector) -> ViewfinderResult<CaptureTarget>;

    /// Grab a fresh frame of the target.
    async fn capture(&self, target: &CaptureTarget) -> ViewfinderResult<Frame>;

    async fn list_windows(&self) -> ViewfinderResult<Vec<WindowInfo>>;
}

/// Captures through xcap, which speaks X11/Wayland/Quartz/GDI underneath.
pub struct XcapScreenSource;

#[async_trait]
impl ScreenSource for XcapScreenSource {
    async fn resolve(&self, selector: &TargetSelector) -> ViewfinderResult<CaptureTarget> {
        match selector {
            TargetSelector::Primary => Ok(CaptureTarget::FullScreen),
            TargetSelector::Screen(index) => {
                let count = monitors()?.len();
                if *index >= count {
                    return Err(ViewfinderError::TargetNotFound(format!(
                        "screen {index} ({count} screens present)"
                    )));
                }
                Ok(CaptureTarget::Screen { index: *index })
            }
            TargetSelector::Window(query) => {
                let windows = window::visible_windows()?;
                match window::pick_window(&windows, query)? {
                    Some(info) => {
                        tracing::info!(id = info.id, title = %info.title, "window selected");
                        Ok(CaptureTarget::Window { id: info.id, title: info.title.clone() })
                    }
                    None => Err(ViewfinderError::TargetNotFound(query.describe())),
                }
            }
        }
    }

    async fn capture(&self, target: &CaptureTarget) -> ViewfinderResult<Frame> {
        match target {
            CaptureTarget::FullScreen => {
                let monitors = monitors()?;
                let primary = monitors
                    .iter()
                    .find(|m| m.is_primary().unwrap_or(false))
                    .or_else(|| monitors.first())
                    .ok_or_else(|| {
                        ViewfinderError::CaptureFailed("no monitors present".to_string())
                    })?;
                capture_monitor(primary)
            }
            CaptureTarget::Screen { index } => {
                let monitors = monitors()?;
                let monitor = monitors.get(*index).ok_or_else(|| {
                    ViewfinderError::TargetNotFound(format!(
                        "screen {index} ({} screens present)",
                        monitors.len()
                    ))
                })?;
                capture_monitor(monitor)
            }
            CaptureTarget::Window { id, title } => capture_window(*id, title),
        }
    }

    async fn list_windows(&self) -> ViewfinderResult<Vec<WindowInfo>> {
        window::visible_windows()
    }
}

fn monitors() -> ViewfinderResult<Vec<xcap::Monitor>> {
    xcap::Monitor::all()
        .map_err(|e| ViewfinderError::CaptureFailed(format!("monitor enumeration: {e}")))
}

fn capture_monitor(monitor: &xcap::Monitor) -> ViewfinderResult<Frame> {
    let x = monitor
        .x()
        .map_err(|e| ViewfinderError::CaptureFailed(format!("monitor position: {e}")))?;
    let y = monitor
        .y()
        .map_err(|e| ViewfinderError::CaptureFailed(format!("monitor position: {e}")))?;
    let image = monitor
        .capture_image()
        .map_err(|e| ViewfinderError::CaptureFailed(format!("monitor capture: {e}")))?;
    tracing::debug!(width = image.width(), height = image.height(), x, y, "monitor captured");
    Ok(Frame { image, offset_x: x, offset_y: y })
}

fn capture_window(id: u32, title: &str) -> ViewfinderResult<Frame> {
    let windows = xcap::Window::all()
        .map_err(|e| ViewfinderError::CaptureFailed(format!("window enumeration: {e}")))?;
    let win = windows
        .into_iter()
        .find(|w| w.id().map(|wid| wid == id).unwrap_or(false))
        .ok_or_else(|| {
            ViewfinderError::TargetNotFound(format!("window \"{title}\" (id {id}) is gone"))
        })?;
    if win.is_minimized().unwrap_or(false) {
        return Err(ViewfinderError::TargetNotFound(format!(
            "window \"{title}\" (id {id}) is minimized"
        )));
    }
    let x = win
        .x()
        .map_err(|e| ViewfinderError::CaptureFailed(format!("window position: {e}")))?;
    let y = win
        .y()
        .map_err(|e| ViewfinderError::CaptureFailed(format!("window position: {e}")))?;
    let image = win
        .capture_image()
        .map_err(|e| ViewfinderError::CaptureFailed(format!("window capture: {e}")))?;
    tracing::debug!(id, width = image.width(), height = image.height(), "window captured");
    Ok(Frame { image, offset_x: x, offset_y: y })
}
