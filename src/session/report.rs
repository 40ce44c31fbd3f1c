//! Result documents printed to stdout, one JSON object per invocation.
//!
//! Everything an agent needs to act on is in here; log lines go to stderr
//! and never pollute the document.

use std::path::PathBuf;

use serde::Serialize;

use crate::capture::WindowInfo;
use crate::errors::ViewfinderError;
use crate::session::state::Viewport;
use crate::templates::TemplateEntry;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

/// How a click target was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    TemplateMatch,
    SavedCoords,
}

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Report {
    Start {
        target: String,
        screenshot: PathBuf,
        viewport: Viewport,
        instructions: String,
    },
    Zoom {
        direction: &'static str,
        screenshot: PathBuf,
        viewport: Viewport,
        /// Where a click would land right now; preview only.
        screen_coords: ScreenPoint,
        instructions: String,
    },
    Save {
        template: String,
        base_name: String,
        path: PathBuf,
        width: u32,
        height: u32,
        screen_coords: ScreenPoint,
        instructions: String,
    },
    Click {
        template: String,
        clicked: bool,
        click_type: &'static str,
        screen_coords: ScreenPoint,
        method: MatchMethod,
        #[serde(skip_serializing_if = "Option::is_none")]
        confidence: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        verification_screenshot: Option<PathBuf>,
    },
    ClickCenter {
        clicked: bool,
        click_type: &'static str,
        screen_coords: ScreenPoint,
        viewport: Viewport,
        #[serde(skip_serializing_if = "Option::is_none")]
        verification_screenshot: Option<PathBuf>,
    },
    List {
        templates: Vec<TemplateEntry>,
        count: usize,
    },
    Delete {
        deleted: String,
        removed: Vec<PathBuf>,
    },
    Reset {
        cleared: bool,
    },
    ListWindows {
        windows: Vec<WindowInfo>,
        count: usize,
    },
}

impl Report {
    /// Pretty JSON with `success: true` stamped in.
    pub fn render(&self) -> String {
        let mut value = match serde_json::to_value(self) {
            Ok(v) => v,
            Err(e) => return failure_json("json_error", &e.to_string()),
        };
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("success".to_string(), serde_json::Value::Bool(true));
        }
        serde_json::to_string_pretty(&value)
            .unwrap_or_else(|e| failure_json("json_error", &e.to_string()))
    }
}

/// Failure document for any error, with a stable machine-readable kind.
pub fn render_failure(err: &ViewfinderError) -> String {
    failure_json(err.kind(), &err.to_string())
}

fn failure_json(kind: &str, message: &str) -> String {
    let value = serde_json::json!({
        "success": false,
        "error": kind,
        "message": message,
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| {
        format!("{{\"success\": false, \"error\": \"{kind}\"}}")
    })
}

/// Attached to save results so the agent knows the generated name to click.
pub fn save_instructions(name: &str, screen: &ScreenPoint) -> String {
    format!(
        "Template \"{name}\" saved; its center sits at ({}, {}) on screen. Relocate and \
         click it anytime with `viewfinder click {name}`.",
        screen.x, screen.y,
    )
}

/// Guidance attached to start and zoom results so a vision agent knows how
/// to continue the loop without external documentation.
pub fn navigation_instructions(screenshot: &std::path::Path, viewport: &Viewport) -> String {
    format!(
        "Inspect {} ({}x{}, zoom depth {}). Red lines mark the thirds, the green box is the \
         center 50%. Narrow with `viewfinder zoom <direction>` (corners: top-left/top-right/\
         bottom-left/bottom-right, edges: top/bottom/left/right, center, or exclusions like \
         exclude-nw and exclude-bottom). When the target fills the view, run \
         `viewfinder save <name>` to capture it or `viewfinder click-center` to click it.",
        screenshot.display(),
        viewport.region.width,
        viewport.region.height,
        viewport.zoom_depth,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::CaptureTarget;

    #[test]
    fn success_reports_carry_the_action_tag() {
        let report = Report::Delete {
            deleted: "old-button_1700000000".to_string(),
            removed: vec![PathBuf::from("/t/old-button_1700000000.png")],
        };
        let json: serde_json::Value = serde_json::from_str(&report.render()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["action"], "delete");
        assert_eq!(json["deleted"], "old-button_1700000000");
        assert_eq!(json["removed"][0], "/t/old-button_1700000000.png");
    }

    #[test]
    fn click_report_uses_snake_case_method_tags() {
        let report = Report::Click {
            template: "ok".to_string(),
            clicked: true,
            click_type: "single",
            screen_coords: ScreenPoint { x: 10, y: 20 },
            method: MatchMethod::SavedCoords,
            confidence: None,
            verification_screenshot: None,
        };
        let json: serde_json::Value = serde_json::from_str(&report.render()).unwrap();
        assert_eq!(json["method"], "saved_coords");
        assert_eq!(json["screen_coords"]["x"], 10);
        assert!(json.get("confidence").is_none());
    }

    #[test]
    fn failures_carry_kind_and_message() {
        let err = ViewfinderError::NoActiveSession;
        let json: serde_json::Value = serde_json::from_str(&render_failure(&err)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "no_active_session");
        assert!(json["message"].as_str().unwrap().contains("viewfinder start"));
    }

    #[test]
    fn instructions_mention_the_artifact_and_next_commands() {
        let v = Viewport::root(CaptureTarget::FullScreen, 1200, 800, (0, 0));
        let text = navigation_instructions(std::path::Path::new("/tmp/vf/view.png"), &v);
        assert!(text.contains("/tmp/vf/view.png"));
        assert!(text.contains("viewfinder zoom"));
        assert!(text.contains("click-center"));
    }
}
