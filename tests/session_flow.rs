//! End-to-end session flows against fake capture and input collaborators.
//!
//! The fakes stand in for the display server: the screen is an in-memory
//! image the tests control, and every click is recorded instead of moving
//! a pointer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{Rgba, RgbaImage};

use viewfinder::capture::{window, Frame, ScreenSource, TargetSelector, WindowInfo, WindowQuery};
use viewfinder::config::AppConfig;
use viewfinder::errors::{ViewfinderError, ViewfinderResult};
use viewfinder::geometry::{Direction, Rect};
use viewfinder::input::{ClickKind, Pointer};
use viewfinder::session::{CaptureTarget, Report, Session};

#[derive(Clone)]
struct FakeScreen {
    inner: Arc<FakeScreenInner>,
}

struct FakeScreenInner {
    image: Mutex<RgbaImage>,
    offset: Mutex<(i32, i32)>,
    windows: Vec<WindowInfo>,
    fail_capture: AtomicBool,
}

impl FakeScreen {
    fn new(image: RgbaImage) -> Self {
        Self {
            inner: Arc::new(FakeScreenInner {
                image: Mutex::new(image),
                offset: Mutex::new((0, 0)),
                windows: Vec::new(),
                fail_capture: AtomicBool::new(false),
            }),
        }
    }

    fn with_windows(image: RgbaImage, windows: Vec<WindowInfo>) -> Self {
        Self {
            inner: Arc::new(FakeScreenInner {
                image: Mutex::new(image),
                offset: Mutex::new((0, 0)),
                windows,
                fail_capture: AtomicBool::new(false),
            }),
        }
    }

    fn show(&self, image: RgbaImage) {
        *self.inner.image.lock().unwrap() = image;
    }

    fn set_offset(&self, x: i32, y: i32) {
        *self.inner.offset.lock().unwrap() = (x, y);
    }

    fn break_captures(&self) {
        self.inner.fail_capture.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScreenSource for FakeScreen {
    async fn resolve(&self, selector: &TargetSelector) -> ViewfinderResult<CaptureTarget> {
        match selector {
            TargetSelector::Primary => Ok(CaptureTarget::FullScreen),
            TargetSelector::Screen(index) => Ok(CaptureTarget::Screen { index: *index }),
            TargetSelector::Window(query) => {
                match window::pick_window(&self.inner.windows, query)? {
                    Some(info) => {
                        Ok(CaptureTarget::Window { id: info.id, title: info.title.clone() })
                    }
                    None => Err(ViewfinderError::TargetNotFound(query.describe())),
                }
            }
        }
    }

    async fn capture(&self, target: &CaptureTarget) -> ViewfinderResult<Frame> {
        if self.inner.fail_capture.load(Ordering::SeqCst) {
            return Err(ViewfinderError::CaptureFailed("the screen went away".to_string()));
        }
        let image = self.inner.image.lock().unwrap().clone();
        let (offset_x, offset_y) = match target {
            CaptureTarget::Window { id, .. } => self
                .inner
                .windows
                .iter()
                .find(|w| w.id == *id)
                .map(|w| (w.x, w.y))
                .unwrap_or((0, 0)),
            _ => *self.inner.offset.lock().unwrap(),
        };
        Ok(Frame { image, offset_x, offset_y })
    }

    async fn list_windows(&self) -> ViewfinderResult<Vec<WindowInfo>> {
        Ok(self.inner.windows.clone())
    }
}

#[derive(Clone, Default)]
struct FakePointer {
    clicks: Arc<Mutex<Vec<(i32, i32, ClickKind)>>>,
}

impl FakePointer {
    fn recorded(&self) -> Vec<(i32, i32, ClickKind)> {
        self.clicks.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pointer for FakePointer {
    async fn click(&self, x: i32, y: i32, kind: ClickKind) -> ViewfinderResult<()> {
        self.clicks.lock().unwrap().push((x, y, kind));
        Ok(())
    }
}

/// Weakly textured background with a strongly textured block at (bx, by).
/// The background texture is position dependent, so exact crops match at
/// exactly one place.
fn screen_image(w: u32, h: u32, bx: u32, by: u32, bw: u32, bh: u32) -> RgbaImage {
    let mut img = RgbaImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = ((x * 3 + y * 5) % 16 + 20) as u8;
            img.put_pixel(x, y, Rgba([v, v, v, 255]));
        }
    }
    for dy in 0..bh {
        for dx in 0..bw {
            let v = if (dx + dy) % 4 < 2 { 250 } else { 30 };
            img.put_pixel(bx + dx, by + dy, Rgba([v, v, v, 255]));
        }
    }
    img
}

fn test_config(dir: &tempfile::TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.work_dir = dir.path().join("work");
    config.storage.template_dir = dir.path().join("templates");
    config.pointer.verify_screenshot = false;
    config
}

fn make_session(config: AppConfig, screen: &FakeScreen, pointer: &FakePointer) -> Session {
    Session::new(config, Box::new(screen.clone()), Box::new(pointer.clone()))
}

/// Save the current viewport and return the timestamped name it got.
async fn save_template(session: &Session, base: &str) -> String {
    let Report::Save { template, .. } = session.save(base).await.unwrap() else {
        panic!("expected save report")
    };
    template
}

#[tokio::test]
async fn start_then_zoom_narrows_the_persisted_viewport() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(1200, 800, 10, 10, 8, 8));
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    let report = session.start(&TargetSelector::Primary).await.unwrap();
    let Report::Start { viewport, screenshot, instructions, .. } = report else {
        panic!("expected start report");
    };
    assert_eq!(viewport.region, Rect::new(0, 0, 1200, 800));
    assert_eq!(viewport.zoom_depth, 0);
    assert!(screenshot.exists());
    assert!(instructions.contains("viewfinder zoom"));

    let report = session.zoom(Direction::Center).await.unwrap();
    let Report::Zoom { viewport, screen_coords, .. } = report else {
        panic!("expected zoom report")
    };
    assert_eq!(viewport.region, Rect::new(300, 200, 600, 400));
    assert_eq!(viewport.zoom_depth, 1);
    // Preview of where click-center would land.
    assert_eq!((screen_coords.x, screen_coords.y), (600, 400));

    let report = session.zoom(Direction::BottomRight).await.unwrap();
    let Report::Zoom { viewport, screenshot, screen_coords, .. } = report else {
        panic!("expected zoom report")
    };
    assert_eq!(viewport.region, Rect::new(600, 400, 300, 200));
    assert_eq!(viewport.zoom_depth, 2);
    assert_eq!((screen_coords.x, screen_coords.y), (750, 500));

    // The artifact is the cropped viewport with guides drawn on.
    let artifact = image::open(&screenshot).unwrap();
    assert_eq!(artifact.width(), 300);
    assert_eq!(artifact.height(), 200);
}

#[tokio::test]
async fn operations_without_a_session_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(64, 64, 4, 4, 8, 8));
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    let err = session.zoom(Direction::Top).await.unwrap_err();
    assert!(matches!(err, ViewfinderError::NoActiveSession));
    let err = session.save("anything").await.unwrap_err();
    assert!(matches!(err, ViewfinderError::NoActiveSession));
    let err = session.click_center(ClickKind::Single, false).await.unwrap_err();
    assert!(matches!(err, ViewfinderError::NoActiveSession));
    assert!(pointer.recorded().is_empty());
}

#[tokio::test]
async fn save_then_click_matches_by_image() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(240, 160, 95, 65, 40, 25));
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    session.start(&TargetSelector::Primary).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();
    let report = session.zoom(Direction::Center).await.unwrap();
    let Report::Zoom { viewport, .. } = report else { panic!("expected zoom report") };
    assert_eq!(viewport.region, Rect::new(90, 60, 60, 40));

    let report = session.save("target-button").await.unwrap();
    let Report::Save { template, base_name, path, width, height, screen_coords, instructions } =
        report
    else {
        panic!("expected save report")
    };
    assert_eq!(base_name, "target-button");
    // Stored names carry a timestamp suffix so repeated saves never collide.
    assert!(template.starts_with("target-button_"), "unexpected name: {template}");
    assert!(path.exists());
    assert!(instructions.contains(&template));
    assert_eq!((width, height), (60, 40));
    assert_eq!((screen_coords.x, screen_coords.y), (120, 80));

    let report = session.click(&template, ClickKind::Single, false, None).await.unwrap();
    let Report::Click { clicked, method, confidence, screen_coords, .. } = report else {
        panic!("expected click report")
    };
    assert!(clicked);
    assert_eq!(method, viewfinder::session::report::MatchMethod::TemplateMatch);
    assert!(confidence.unwrap() > 0.85);
    assert_eq!((screen_coords.x, screen_coords.y), (120, 80));
    assert_eq!(pointer.recorded(), vec![(120, 80, ClickKind::Single)]);
}

#[tokio::test]
async fn click_falls_back_to_saved_coordinates_when_the_screen_changed() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(240, 160, 95, 65, 40, 25));
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    session.start(&TargetSelector::Primary).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();
    let name = save_template(&session, "settings-icon").await;

    // A flat screen has nothing for the matcher to correlate against.
    screen.show(RgbaImage::from_pixel(240, 160, Rgba([128, 128, 128, 255])));

    let report = session.click(&name, ClickKind::Double, false, None).await.unwrap();
    let Report::Click { method, confidence, screen_coords, .. } = report else {
        panic!("expected click report")
    };
    assert_eq!(method, viewfinder::session::report::MatchMethod::SavedCoords);
    assert_eq!(confidence, None);
    assert_eq!((screen_coords.x, screen_coords.y), (120, 80));
    assert_eq!(pointer.recorded(), vec![(120, 80, ClickKind::Double)]);
}

#[tokio::test]
async fn click_fails_when_the_target_cannot_be_captured() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(240, 160, 95, 65, 40, 25));
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    session.start(&TargetSelector::Primary).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();
    let name = save_template(&session, "gone-soon").await;

    screen.break_captures();

    // Saved coordinates cover a failed match, not a failed capture; the
    // invocation fails and the pointer never moves.
    let err = session.click(&name, ClickKind::Single, false, None).await.unwrap_err();
    assert!(matches!(err, ViewfinderError::CaptureFailed(_)));
    assert!(pointer.recorded().is_empty());
}

#[tokio::test]
async fn no_click_reports_coordinates_without_touching_the_pointer() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(240, 160, 95, 65, 40, 25));
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    session.start(&TargetSelector::Primary).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();
    let name = save_template(&session, "look-only").await;

    let report = session.click(&name, ClickKind::Single, true, None).await.unwrap();
    let Report::Click { clicked, verification_screenshot, .. } = report else {
        panic!("expected click report")
    };
    assert!(!clicked);
    assert_eq!(verification_screenshot, None);
    assert!(pointer.recorded().is_empty());
}

#[tokio::test]
async fn click_center_applies_the_capture_offset() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(240, 160, 10, 10, 8, 8));
    screen.set_offset(1920, 0);
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    session.start(&TargetSelector::Primary).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();

    let report = session.click_center(ClickKind::Single, false).await.unwrap();
    let Report::ClickCenter { clicked, screen_coords, viewport, .. } = report else {
        panic!("expected click-center report")
    };
    assert!(clicked);
    assert_eq!(viewport.region, Rect::new(60, 40, 120, 80));
    // Center (120, 80) in capture space, shifted by the monitor offset.
    assert_eq!((screen_coords.x, screen_coords.y), (1920 + 120, 80));
    assert_eq!(pointer.recorded(), vec![(2040, 80, ClickKind::Single)]);
}

#[tokio::test]
async fn reset_clears_the_slot_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(64, 64, 4, 4, 8, 8));
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    session.start(&TargetSelector::Primary).await.unwrap();
    let Report::Reset { cleared } = session.reset().await.unwrap() else {
        panic!("expected reset report")
    };
    assert!(cleared);
    let Report::Reset { cleared } = session.reset().await.unwrap() else {
        panic!("expected reset report")
    };
    assert!(!cleared);

    let err = session.zoom(Direction::Center).await.unwrap_err();
    assert!(matches!(err, ViewfinderError::NoActiveSession));
}

#[tokio::test]
async fn template_lifecycle_list_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(240, 160, 95, 65, 40, 25));
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    let Report::List { count, .. } = session.list().await.unwrap() else {
        panic!("expected list report")
    };
    assert_eq!(count, 0);

    session.start(&TargetSelector::Primary).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();
    let first = save_template(&session, "first").await;
    let second = save_template(&session, "second").await;

    let Report::List { templates, count } = session.list().await.unwrap() else {
        panic!("expected list report")
    };
    assert_eq!(count, 2);
    let bases: Vec<&str> = templates.iter().map(|t| t.base_name.as_str()).collect();
    assert!(bases.contains(&"first") && bases.contains(&"second"));
    let names: Vec<&str> = templates.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&first.as_str()) && names.contains(&second.as_str()));

    let Report::Delete { deleted, removed } = session.delete(&first).await.unwrap() else {
        panic!("expected delete report")
    };
    assert_eq!(deleted, first);
    // The image and its sidecar both go.
    assert_eq!(removed.len(), 2);
    assert!(removed.iter().all(|p| !p.exists()));

    let err = session.delete(&first).await.unwrap_err();
    assert!(matches!(err, ViewfinderError::TemplateNotFound(_)));
    let err = session.click(&first, ClickKind::Single, false, None).await.unwrap_err();
    assert!(matches!(err, ViewfinderError::TemplateNotFound(_)));
}

#[tokio::test]
async fn stale_viewport_is_clipped_to_a_shrunken_capture() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(240, 160, 10, 10, 8, 8));
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    session.start(&TargetSelector::Primary).await.unwrap();

    // The display shrank between invocations.
    screen.show(screen_image(100, 70, 5, 5, 8, 8));

    let Report::Zoom { viewport, screenshot, .. } =
        session.zoom(Direction::Center).await.unwrap()
    else {
        panic!("expected zoom report")
    };
    // The stored geometry keeps the dimensions recorded at start; only the
    // written artifact is cut down to what the fresh capture still covers.
    assert_eq!(viewport.region, Rect::new(60, 40, 120, 80));
    assert_eq!((viewport.capture_width, viewport.capture_height), (240, 160));
    let artifact = image::open(&screenshot).unwrap();
    assert_eq!((artifact.width(), artifact.height()), (40, 30));

    // Zooming past the shrunken frame entirely has nothing left to show.
    let err = session.zoom(Direction::BottomRight).await.unwrap_err();
    assert!(matches!(err, ViewfinderError::CaptureFailed(_)));
}

#[tokio::test]
async fn window_session_tracks_the_window_position() {
    let dir = tempfile::tempdir().unwrap();
    let windows = vec![
        WindowInfo {
            id: 7,
            title: "Text Editor".to_string(),
            app_name: "gedit".to_string(),
            x: 300,
            y: 150,
            width: 240,
            height: 160,
        },
        WindowInfo {
            id: 8,
            title: "Browser".to_string(),
            app_name: "firefox".to_string(),
            x: 0,
            y: 0,
            width: 240,
            height: 160,
        },
    ];
    let screen = FakeScreen::with_windows(screen_image(240, 160, 10, 10, 8, 8), windows);
    let pointer = FakePointer::default();
    let session = make_session(test_config(&dir), &screen, &pointer);

    let selector = TargetSelector::Window(WindowQuery::Title("text edit".to_string()));
    let Report::Start { viewport, target, .. } = session.start(&selector).await.unwrap() else {
        panic!("expected start report")
    };
    assert_eq!(viewport.target, CaptureTarget::Window { id: 7, title: "Text Editor".to_string() });
    assert!(target.contains("Text Editor"));
    assert_eq!((viewport.offset_x, viewport.offset_y), (300, 150));

    session.zoom(Direction::Center).await.unwrap();
    let Report::ClickCenter { screen_coords, .. } =
        session.click_center(ClickKind::Single, false).await.unwrap()
    else {
        panic!("expected click-center report")
    };
    // Viewport center (120, 80) plus the window position.
    assert_eq!((screen_coords.x, screen_coords.y), (420, 230));

    let Report::ListWindows { count, .. } = session.list_windows().await.unwrap() else {
        panic!("expected list-windows report")
    };
    assert_eq!(count, 2);
}

#[tokio::test]
async fn clicking_writes_a_verification_screenshot_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(240, 160, 95, 65, 40, 25));
    let pointer = FakePointer::default();
    let mut config = test_config(&dir);
    config.pointer.verify_screenshot = true;
    config.pointer.verify_delay_ms = 1;
    let session = make_session(config, &screen, &pointer);

    session.start(&TargetSelector::Primary).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();

    let Report::ClickCenter { verification_screenshot, .. } =
        session.click_center(ClickKind::Single, false).await.unwrap()
    else {
        panic!("expected click-center report")
    };
    let path = verification_screenshot.expect("verification screenshot");
    assert!(path.exists());
}

#[tokio::test]
async fn click_center_still_reports_success_when_the_verification_capture_fails() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(screen_image(240, 160, 10, 10, 8, 8));
    let pointer = FakePointer::default();
    let mut config = test_config(&dir);
    config.pointer.verify_screenshot = true;
    config.pointer.verify_delay_ms = 1;
    let session = make_session(config, &screen, &pointer);

    session.start(&TargetSelector::Primary).await.unwrap();
    session.zoom(Direction::Center).await.unwrap();
    screen.break_captures();

    let Report::ClickCenter { clicked, verification_screenshot, screen_coords, .. } =
        session.click_center(ClickKind::Single, false).await.unwrap()
    else {
        panic!("expected click-center report")
    };
    // The click already landed; the missing confirmation shot is reported
    // as absent rather than failing the invocation.
    assert!(clicked);
    assert_eq!(verification_screenshot, None);
    assert_eq!((screen_coords.x, screen_coords.y), (120, 80));
    assert_eq!(pointer.recorded(), vec![(120, 80, ClickKind::Single)]);
}
