use image::RgbaImage;
use serde::Serialize;

/// One captured image plus where its origin sits in global screen
/// coordinates. Window captures carry the window position; monitor captures
/// carry the monitor position.
pub struct Frame {
    pub image: RgbaImage,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn offset(&self) -> (i32, i32) {
        (self.offset_x, self.offset_y)
    }
}

/// A visible top-level window, as reported by `list-windows`.
#[derive(Debug, Clone, Serialize)]
pub struct WindowInfo {
    pub id: u32,
    pub title: String,
    pub app_name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// How a window is picked out of the enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowQuery {
    /// Regex over window titles, case-insensitive.
    Title(String),
    /// Regex over application names, case-insensitive.
    Class(String),
    /// Exact native window id.
    Id(u32),
}

impl WindowQuery {
    pub fn describe(&self) -> String {
        match self {
            WindowQuery::Title(p) => format!("window with title matching {p:?}"),
            WindowQuery::Class(p) => format!("window with class matching {p:?}"),
            WindowQuery::Id(id) => format!("window id {id}"),
        }
    }
}

/// What `start` should aim the session at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    Primary,
    Screen(usize),
    Window(WindowQuery),
}
