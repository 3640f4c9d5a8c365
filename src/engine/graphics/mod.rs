//! Rendering: GPU context, buffers, shaders, textures, cameras and the
//! scene renderer.

pub mod buffer;
pub mod builtin;
pub mod camera;
pub mod camera_controller;
pub mod context;
pub mod render_command;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod vertex_array;

pub use buffer::{BufferElement, BufferLayout, IndexBuffer, ShaderDataType, VertexBuffer};
pub use camera::{Camera, OrthographicCamera, PerspectiveCamera};
pub use camera_controller::OrthographicCameraController;
pub use context::GraphicsContext;
pub use render_command::RenderCommand;
pub use renderer::{Material, RenderStats, Renderer};
pub use shader::{Shader, ShaderLibrary};
pub use texture::Texture2D;
pub use vertex_array::VertexArray;
