//! Event system: event types, typed dispatch and native event translation.

pub mod dispatcher;
pub mod event;
pub mod translate;

pub use dispatcher::EventDispatcher;
pub use event::*;
pub use translate::translate;
