//! Engine module: CLI surface, progress tracking, overlay geometry

pub mod arg_parser;
pub mod cli;
pub mod overlay;
pub mod progress;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{Settings, handle_run};
pub use overlay::{FaceMarker, Overlay, ScaledRect, face_label, fit_canvas, layout_overlay, render_overlay};
pub use progress::{ProgressState, ProgressTracker, ScopeGuard};
