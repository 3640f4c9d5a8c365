//! Application shell: the layered main loop and its building blocks.

pub mod application;
pub mod layer;
pub mod layer_stack;
pub mod timestep;

pub use application::Application;
pub use layer::{Context, Layer};
pub use layer_stack::LayerStack;
pub use timestep::Timestep;
