// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Result-driven overlay rendering.
//!
//! Draws detected skeletons color-coded by verdict, letterboxes the composited
//! bitmap into the display viewport, and stamps the running rep count on top.

// Modules
/// Overlay colors.
pub mod color;

/// Skeleton drawing and viewport compositing.
pub mod renderer;

/// Joint adjacency table.
pub mod skeleton;

pub use color::Color;
pub use renderer::{fit_rect, OverlayRenderer, PersonOverlay};
pub use skeleton::SKELETON;
