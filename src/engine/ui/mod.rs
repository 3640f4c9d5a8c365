//! Debug overlay: an egui window that layers fill from `on_ui_render`.

pub mod debug;

pub use debug::{DebugUi, FpsCounter, UiOutput, UiPainter};
