// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Real-time preview: window display and the worker-side render sink.

// Modules
/// Worker-to-window frame bridge.
pub mod sink;

/// Preview window.
pub mod viewer;

pub use sink::WindowSink;
pub use viewer::Viewer;
