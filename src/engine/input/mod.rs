//! Input handling module
//! Polled keyboard and mouse state derived from engine events.

pub mod handler;

pub use handler::InputHandler;
