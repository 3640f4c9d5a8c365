use super::event::{Event, EventData};

/// Routes an event to a handler by payload type.
///
/// ```ignore
/// let mut dispatcher = EventDispatcher::new(&mut event);
/// dispatcher.dispatch::<WindowCloseEvent>(|_| { running = false; true });
/// ```
pub struct EventDispatcher<'a> {
    event: &'a mut Event,
}

impl<'a> EventDispatcher<'a> {
    pub fn new(event: &'a mut Event) -> Self {
        Self { event }
    }

    /// Runs `handler` if the event is a `T`; its return value is OR-ed into
    /// `handled`. Returns whether the handler ran.
    pub fn dispatch<T: EventData>(&mut self, handler: impl FnOnce(&T) -> bool) -> bool {
        match T::from_kind(&self.event.kind) {
            Some(payload) => {
                let handled = handler(payload);
                self.event.handled |= handled;
                true
            }
            None => false,
        }
    }

    pub fn event(&self) -> &Event {
        self.event
    }
}
