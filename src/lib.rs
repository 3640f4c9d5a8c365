//! Library entry point for the engine and its demo layers.

pub mod engine;
pub mod sandbox;

// Re-export main types for convenience
pub use engine::{AppConfig, Application, EngineError, Layer, Result};
