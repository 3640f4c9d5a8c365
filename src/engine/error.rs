//! Engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable graphics adapter found")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to acquire frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),

    #[error("shader `{name}` failed to compile: {message}")]
    ShaderCompile { name: String, message: String },

    #[error("failed to create pipeline for shader `{name}`: {message}")]
    Pipeline { name: String, message: String },

    #[error("shader `{0}` already exists")]
    ShaderExists(String),

    #[error("shader `{0}` not found")]
    ShaderNotFound(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("texture data must cover the entire texture: expected {expected} bytes, got {actual}")]
    TextureDataSize { expected: usize, actual: usize },

    #[error("vertex buffer has no layout")]
    EmptyLayout,

    #[error("vertex data of {actual} bytes exceeds buffer capacity of {capacity} bytes")]
    BufferOverflow { capacity: u64, actual: u64 },

    #[error("render queue: {0}")]
    RenderQueue(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
