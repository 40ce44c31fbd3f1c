use clap::{ArgAction, Args, Parser, Subcommand};

use crate::capture::{TargetSelector, WindowQuery};
use crate::errors::{ViewfinderError, ViewfinderResult};

#[derive(Parser, Debug)]
#[command(
    name = "viewfinder",
    version,
    about = "Iterative zoom-and-click screen navigation for vision-driven automation"
)]
pub struct Cli {
    /// X display to use for capture and input (sets DISPLAY)
    #[arg(long, global = true)]
    pub display: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture the target and begin a zoom session
    Start(StartArgs),
    /// Narrow the viewport toward a direction
    Zoom(ZoomArgs),
    /// Save the current viewport as a named template
    Save(SaveArgs),
    /// Find a saved template on screen and click it
    Click(ClickArgs),
    /// Click the center of the current viewport
    #[command(name = "click-center")]
    ClickCenter(ClickCenterArgs),
    /// List saved templates, newest first
    List,
    /// Delete a saved template
    Delete(DeleteArgs),
    /// Forget the active session
    Reset,
    /// List visible top-level windows
    #[command(name = "list-windows")]
    ListWindows,
}

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Target the window whose title matches this regex
    #[arg(long, short = 'w')]
    pub window: Option<String>,
    /// Target the window whose application class matches this regex
    #[arg(long)]
    pub window_class: Option<String>,
    /// Target a window by native id
    #[arg(long)]
    pub window_id: Option<u32>,
    /// Target a monitor by index
    #[arg(long)]
    pub screen: Option<usize>,
}

impl StartArgs {
    /// Exactly one way of naming a target is allowed; none means the
    /// primary monitor.
    pub fn selector(&self) -> ViewfinderResult<TargetSelector> {
        let mut selectors = Vec::new();
        if let Some(pattern) = &self.window {
            selectors.push(TargetSelector::Window(WindowQuery::Title(pattern.clone())));
        }
        if let Some(pattern) = &self.window_class {
            selectors.push(TargetSelector::Window(WindowQuery::Class(pattern.clone())));
        }
        if let Some(id) = self.window_id {
            selectors.push(TargetSelector::Window(WindowQuery::Id(id)));
        }
        if let Some(index) = self.screen {
            selectors.push(TargetSelector::Screen(index));
        }
        match selectors.len() {
            0 => Ok(TargetSelector::Primary),
            1 => Ok(selectors.remove(0)),
            _ => Err(ViewfinderError::Input(
                "pick at most one of --window, --window-class, --window-id, --screen".to_string(),
            )),
        }
    }
}

#[derive(Args, Debug)]
pub struct ZoomArgs {
    /// Direction name or alias (top-left, nw, center, exclude-bottom, ...)
    pub direction: String,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Template name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct ClickArgs {
    /// Template name
    pub name: String,
    /// single, double or right
    #[arg(long, default_value = "single")]
    pub click_type: String,
    /// Locate and report without moving the pointer
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_click: bool,
    /// Override the match confidence floor for this invocation
    #[arg(long)]
    pub confidence: Option<f32>,
}

impl ClickArgs {
    pub fn confidence(&self) -> ViewfinderResult<Option<f32>> {
        match self.confidence {
            Some(c) if !(0.0..=1.0).contains(&c) => Err(ViewfinderError::Input(format!(
                "confidence must be between 0.0 and 1.0, got {c}"
            ))),
            other => Ok(other),
        }
    }
}

#[derive(Args, Debug)]
pub struct ClickCenterArgs {
    /// single, double or right
    #[arg(long, default_value = "single")]
    pub click_type: String,
    /// Report the coordinates without moving the pointer
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_click: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Template name
    pub name: String,
}
