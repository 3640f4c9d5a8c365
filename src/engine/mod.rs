//! Engine core: application shell, events, input, windowing and rendering.

pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod graphics;
pub mod input;
pub mod ui;
pub mod window;

pub use self::core::{Application, Context, Layer, LayerStack, Timestep};
pub use config::AppConfig;
pub use error::{EngineError, Result};
pub use graphics::Renderer;
pub use window::{Window, WindowProps};
