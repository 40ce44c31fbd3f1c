//! Viewfinder: iterative zoom-and-click navigation for vision-driven UI
//! automation.
//!
//! A session starts with a capture of a screen or window, then narrows it
//! step by step using a small direction vocabulary until the target element
//! fills the view. The final viewport can be clicked directly or saved as a
//! named template and clicked later by visual match, with the coordinates
//! recorded at save time as a fallback.
//!
//! Each CLI invocation is one state transition; the active viewport is
//! persisted between processes in a single scratch-directory slot.

pub mod capture;
pub mod cli;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod input;
pub mod matcher;
pub mod overlay;
pub mod session;
pub mod templates;
