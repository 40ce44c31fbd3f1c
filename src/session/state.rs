use serde::{Deserialize, Serialize};

use crate::geometry::{resolve_region, Direction, Rect};

/// What a session is capturing from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptureTarget {
    /// The primary monitor.
    FullScreen,
    /// A specific monitor by enumeration index.
    Screen { index: usize },
    /// A single window. The id is the native window handle; the title is
    /// kept for result documents and may go stale without harm.
    Window { id: u32, title: String },
}

impl CaptureTarget {
    pub fn describe(&self) -> String {
        match self {
            CaptureTarget::FullScreen => "full screen".to_string(),
            CaptureTarget::Screen { index } => format!("screen {index}"),
            CaptureTarget::Window { id, title } => format!("window \"{title}\" (id {id})"),
        }
    }
}

/// The persisted zoom state. One slot per machine: starting a new session
/// replaces whatever was here before.
///
/// `region` is expressed in capture-local pixels. `capture_width` and
/// `capture_height` record the capture extent at session start and stay
/// fixed for the session's lifetime; `offset_x`/`offset_y` translate
/// capture-local points into global screen coordinates for pointer moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub region: Rect,
    pub capture_width: u32,
    pub capture_height: u32,
    pub zoom_depth: u32,
    pub target: CaptureTarget,
    pub offset_x: i32,
    pub offset_y: i32,
    pub updated: chrono::DateTime<chrono::Utc>,
}

impl Viewport {
    /// Root viewport spanning an entire fresh capture.
    pub fn root(target: CaptureTarget, width: u32, height: u32, offset: (i32, i32)) -> Self {
        Self {
            region: Rect::new(0, 0, width, height),
            capture_width: width,
            capture_height: height,
            zoom_depth: 0,
            target,
            offset_x: offset.0,
            offset_y: offset.1,
            updated: chrono::Utc::now(),
        }
    }

    /// Narrow toward `direction`, bumping the zoom depth.
    ///
    /// Only the region and depth change. Capture extent and offset are
    /// recorded once at session start and stay fixed for its lifetime.
    pub fn zoomed(&self, direction: Direction) -> Self {
        Self {
            region: resolve_region(&self.region, direction),
            capture_width: self.capture_width,
            capture_height: self.capture_height,
            zoom_depth: self.zoom_depth + 1,
            target: self.target.clone(),
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            updated: chrono::Utc::now(),
        }
    }

    /// Map a capture-local point into global screen coordinates.
    pub fn to_screen(&self, local_x: u32, local_y: u32) -> (i32, i32) {
        (self.offset_x + local_x as i32, self.offset_y + local_y as i32)
    }

    /// Global screen coordinates of the viewport center.
    pub fn center_on_screen(&self) -> (i32, i32) {
        let (cx, cy) = self.region.center();
        self.to_screen(cx, cy)
    }
}
