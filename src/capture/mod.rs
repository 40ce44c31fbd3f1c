pub mod source;
pub mod types;
pub mod window;

pub use source::{ScreenSource, XcapScreenSource};
pub use types::{Frame, TargetSelector, WindowInfo, WindowQuery};
