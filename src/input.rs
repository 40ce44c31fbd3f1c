use async_trait::async_trait;
use enigo::{Button, Coordinate, Enigo, Mouse, Settings};
use serde::{Deserialize, Serialize};

use crate::errors::{ViewfinderError, ViewfinderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    Single,
    Double,
    Right,
}

impl ClickKind {
    pub fn parse(input: &str) -> ViewfinderResult<ClickKind> {
        match input.trim().to_lowercase().as_str() {
            "single" | "left" | "click" => Ok(ClickKind::Single),
            "double" => Ok(ClickKind::Double),
            "right" | "context" => Ok(ClickKind::Right),
            other => Err(ViewfinderError::Input(format!(
                "unknown click type {other:?}, expected single, double or right"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClickKind::Single => "single",
            ClickKind::Double => "double",
            ClickKind::Right => "right",
        }
    }
}

/// Strategy trait for pixels-out. Tests substitute a recorder.
#[async_trait]
pub trait Pointer: Send + Sync {
    /// Move to global screen coordinates and click.
    async fn click(&self, x: i32, y: i32, kind: ClickKind) -> ViewfinderResult<()>;
}

/// Drives the real pointer through enigo. A fresh connection is opened per
/// click; the process is one-shot so there is nothing to pool.
pub struct EnigoPointer {
    settle_ms: u64,
}

impl EnigoPointer {
    pub fn new(settle_ms: u64) -> Self {
        Self { settle_ms }
    }
}

#[async_trait]
impl Pointer for EnigoPointer {
    async fn click(&self, x: i32, y: i32, kind: ClickKind) -> ViewfinderResult<()> {
        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| ViewfinderError::Input(format!("input connection: {e}")))?;
        enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| ViewfinderError::Input(format!("mouse move: {e}")))?;
        // Give the window manager a beat to deliver hover state.
        tokio::time::sleep(std::time::Duration::from_millis(self.settle_ms)).await;

        let button = match kind {
            ClickKind::Right => Button::Right,
            _ => Button::Left,
        };
        enigo
            .button(button, enigo::Direction::Click)
            .map_err(|e| ViewfinderError::Input(format!("mouse click: {e}")))?;
        if kind == ClickKind::Double {
            tokio::time::sleep(std::time::Duration::from_millis(80)).await;
            enigo
                .button(button, enigo::Direction::Click)
                .map_err(|e| ViewfinderError::Input(format!("mouse click: {e}")))?;
        }
        tracing::info!(x, y, kind = kind.as_str(), "pointer clicked");
        Ok(())
    }
}
