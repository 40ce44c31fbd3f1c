pub mod ops;
pub mod report;
pub mod state;
pub mod store;

pub use ops::Session;
pub use report::{render_failure, Report};
pub use state::{CaptureTarget, Viewport};
pub use store::StateStore;
