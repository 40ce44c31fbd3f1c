//! Window enumeration and lookup.
//!
//! Enumeration is filtered the way a window list is useful to an automation
//! agent: minimized windows and untitled helper surfaces are skipped.
//! Selection over the filtered list is pure so it can be tested without a
//! display server.

use regex::RegexBuilder;

use crate::capture::types::{WindowInfo, WindowQuery};
use crate::errors::{ViewfinderError, ViewfinderResult};

/// Snapshot the currently visible top-level windows.
pub fn visible_windows() -> ViewfinderResult<Vec<WindowInfo>> {
    let windows = xcap::Window::all()
        .map_err(|e| ViewfinderError::CaptureFailed(format!("window enumeration: {e}")))?;

    let mut out = Vec::new();
    for win in windows {
        // Accessors are fallible per window; one broken window should not
        // take down the whole listing.
        let minimized = win.is_minimized().unwrap_or(true);
        if minimized {
            continue;
        }
        let title = win.title().unwrap_or_default();
        if title.is_empty() {
            continue;
        }
        let (Ok(id), Ok(x), Ok(y), Ok(width), Ok(height)) =
            (win.id(), win.x(), win.y(), win.width(), win.height())
        else {
            tracing::debug!(title = %title, "skipping window with unreadable geometry");
            continue;
        };
        out.push(WindowInfo {
            id,
            title,
            app_name: win.app_name().unwrap_or_default(),
            x,
            y,
            width,
            height,
        });
    }
    Ok(out)
}

/// Pick the first window satisfying `query`, in enumeration order.
pub fn pick_window<'a>(
    windows: &'a [WindowInfo],
    query: &WindowQuery,
) -> ViewfinderResult<Option<&'a WindowInfo>> {
    match query {
        WindowQuery::Id(id) => Ok(windows.iter().find(|w| w.id == *id)),
        WindowQuery::Title(pattern) => {
            let re = compile(pattern)?;
            Ok(windows.iter().find(|w| re.is_match(&w.title)))
        }
        WindowQuery::Class(pattern) => {
            let re = compile(pattern)?;
            Ok(windows.iter().find(|w| re.is_match(&w.app_name)))
        }
    }
}

fn compile(pattern: &str) -> ViewfinderResult<regex::Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ViewfinderError::Input(format!("bad window pattern {pattern:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> Vec<WindowInfo> {
        let mk = |id: u32, title: &str, app: &str| WindowInfo {
            id,
            title: title.to_string(),
            app_name: app.to_string(),
            x: 0,
            y: 0,
            width: 800,
            height: 600,
        };
        vec![
            mk(10, "Mozilla Firefox", "firefox"),
            mk(11, "Settings - GNOME", "gnome-control-center"),
            mk(12, "project - Visual Studio Code", "code"),
        ]
    }

    #[test]
    fn title_query_is_case_insensitive_regex() {
        let windows = fixtures();
        let hit = pick_window(&windows, &WindowQuery::Title("firefox".into()))
            .unwrap()
            .unwrap();
        assert_eq!(hit.id, 10);

        let hit = pick_window(&windows, &WindowQuery::Title("visual.*code".into()))
            .unwrap()
            .unwrap();
        assert_eq!(hit.id, 12);
    }

    #[test]
    fn class_query_matches_app_name() {
        let windows = fixtures();
        let hit = pick_window(&windows, &WindowQuery::Class("gnome-control".into()))
            .unwrap()
            .unwrap();
        assert_eq!(hit.id, 11);
    }

    #[test]
    fn id_query_is_exact() {
        let windows = fixtures();
        assert_eq!(pick_window(&windows, &WindowQuery::Id(12)).unwrap().unwrap().id, 12);
        assert!(pick_window(&windows, &WindowQuery::Id(99)).unwrap().is_none());
    }

    #[test]
    fn first_match_wins_on_ambiguity() {
        let windows = fixtures();
        let hit = pick_window(&windows, &WindowQuery::Title(".*o.*".into()))
            .unwrap()
            .unwrap();
        assert_eq!(hit.id, 10);
    }

    #[test]
    fn invalid_pattern_is_an_input_error() {
        let windows = fixtures();
        let err = pick_window(&windows, &WindowQuery::Title("([".into())).unwrap_err();
        assert!(matches!(err, ViewfinderError::Input(_)));
    }
}
