//! Window management: properties, the native window and its graphics context.

pub mod native;
pub mod props;

pub use native::Window;
pub use props::WindowProps;
