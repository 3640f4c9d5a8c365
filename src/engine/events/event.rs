//! Engine events: a tagged union of window, keyboard and mouse events
//! carrying a `handled` flag.

use std::fmt;
use std::ops::BitOr;

use winit::event::MouseButton;
use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    WindowResize,
    WindowClose,
    KeyPressed,
    KeyReleased,
    KeyTyped,
    MouseMoved,
    MouseScrolled,
    MouseButtonPressed,
    MouseButtonReleased,
}

/// Bit set of event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventCategory(u8);

impl EventCategory {
    pub const NONE: Self = Self(0);
    pub const APPLICATION: Self = Self(1 << 0);
    pub const INPUT: Self = Self(1 << 1);
    pub const KEYBOARD: Self = Self(1 << 2);
    pub const MOUSE: Self = Self(1 << 3);
    pub const MOUSE_BUTTON: Self = Self(1 << 4);

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for EventCategory {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowResizeEvent {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowCloseEvent;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPressedEvent {
    pub key: KeyCode,
    /// 0 for the initial press, 1 for auto-repeats.
    pub repeat_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyReleasedEvent {
    pub key: KeyCode,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyTypedEvent {
    pub ch: char,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMovedEvent {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseScrolledEvent {
    pub x_offset: f32,
    pub y_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseButtonPressedEvent {
    pub button: MouseButton,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseButtonReleasedEvent {
    pub button: MouseButton,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    WindowResize(WindowResizeEvent),
    WindowClose(WindowCloseEvent),
    KeyPressed(KeyPressedEvent),
    KeyReleased(KeyReleasedEvent),
    KeyTyped(KeyTypedEvent),
    MouseMoved(MouseMovedEvent),
    MouseScrolled(MouseScrolledEvent),
    MouseButtonPressed(MouseButtonPressedEvent),
    MouseButtonReleased(MouseButtonReleasedEvent),
}

/// Implemented by every event payload so the dispatcher can route by type.
pub trait EventData: Sized + fmt::Display {
    const EVENT_TYPE: EventType;
    const CATEGORY: EventCategory;

    fn from_kind(kind: &EventKind) -> Option<&Self>;
}

macro_rules! event_data {
    ($payload:ty, $variant:ident, $category:expr) => {
        impl EventData for $payload {
            const EVENT_TYPE: EventType = EventType::$variant;
            const CATEGORY: EventCategory = $category;

            fn from_kind(kind: &EventKind) -> Option<&Self> {
                match kind {
                    EventKind::$variant(e) => Some(e),
                    _ => None,
                }
            }
        }

        impl From<$payload> for Event {
            fn from(payload: $payload) -> Self {
                Event::new(EventKind::$variant(payload))
            }
        }
    };
}

const KEY: EventCategory = EventCategory(EventCategory::INPUT.0 | EventCategory::KEYBOARD.0);
const MOUSE: EventCategory = EventCategory(EventCategory::INPUT.0 | EventCategory::MOUSE.0);
const BUTTON: EventCategory =
    EventCategory(EventCategory::INPUT.0 | EventCategory::MOUSE.0 | EventCategory::MOUSE_BUTTON.0);

event_data!(WindowResizeEvent, WindowResize, EventCategory::APPLICATION);
event_data!(WindowCloseEvent, WindowClose, EventCategory::APPLICATION);
event_data!(KeyPressedEvent, KeyPressed, KEY);
event_data!(KeyReleasedEvent, KeyReleased, KEY);
event_data!(KeyTypedEvent, KeyTyped, KEY);
event_data!(MouseMovedEvent, MouseMoved, MOUSE);
event_data!(MouseScrolledEvent, MouseScrolled, MOUSE);
event_data!(MouseButtonPressedEvent, MouseButtonPressed, BUTTON);
event_data!(MouseButtonReleasedEvent, MouseButtonReleased, BUTTON);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub handled: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, handled: false }
    }

    pub fn event_type(&self) -> EventType {
        match self.kind {
            EventKind::WindowResize(_) => EventType::WindowResize,
            EventKind::WindowClose(_) => EventType::WindowClose,
            EventKind::KeyPressed(_) => EventType::KeyPressed,
            EventKind::KeyReleased(_) => EventType::KeyReleased,
            EventKind::KeyTyped(_) => EventType::KeyTyped,
            EventKind::MouseMoved(_) => EventType::MouseMoved,
            EventKind::MouseScrolled(_) => EventType::MouseScrolled,
            EventKind::MouseButtonPressed(_) => EventType::MouseButtonPressed,
            EventKind::MouseButtonReleased(_) => EventType::MouseButtonReleased,
        }
    }

    pub fn category(&self) -> EventCategory {
        match self.kind {
            EventKind::WindowResize(_) => WindowResizeEvent::CATEGORY,
            EventKind::WindowClose(_) => WindowCloseEvent::CATEGORY,
            EventKind::KeyPressed(_) => KeyPressedEvent::CATEGORY,
            EventKind::KeyReleased(_) => KeyReleasedEvent::CATEGORY,
            EventKind::KeyTyped(_) => KeyTypedEvent::CATEGORY,
            EventKind::MouseMoved(_) => MouseMovedEvent::CATEGORY,
            EventKind::MouseScrolled(_) => MouseScrolledEvent::CATEGORY,
            EventKind::MouseButtonPressed(_) => MouseButtonPressedEvent::CATEGORY,
            EventKind::MouseButtonReleased(_) => MouseButtonReleasedEvent::CATEGORY,
        }
    }

    pub fn is_in_category(&self, category: EventCategory) -> bool {
        self.category().intersects(category)
    }

    /// Borrow the payload if this event is a `T`.
    pub fn get<T: EventData>(&self) -> Option<&T> {
        T::from_kind(&self.kind)
    }
}

impl fmt::Display for WindowResizeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowResizeEvent: {}, {}", self.width, self.height)
    }
}

impl fmt::Display for WindowCloseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WindowCloseEvent")
    }
}

impl fmt::Display for KeyPressedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPressedEvent: {:?} ({} repeats)", self.key, self.repeat_count)
    }
}

impl fmt::Display for KeyReleasedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyReleasedEvent: {:?}", self.key)
    }
}

impl fmt::Display for KeyTypedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyTypedEvent: {:?}", self.ch)
    }
}

impl fmt::Display for MouseMovedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseMovedEvent: {}, {}", self.x, self.y)
    }
}

impl fmt::Display for MouseScrolledEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseScrolledEvent: {}, {}", self.x_offset, self.y_offset)
    }
}

impl fmt::Display for MouseButtonPressedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseButtonPressedEvent: {:?}", self.button)
    }
}

impl fmt::Display for MouseButtonReleasedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MouseButtonReleasedEvent: {:?}", self.button)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EventKind::WindowResize(e) => e.fmt(f),
            EventKind::WindowClose(e) => e.fmt(f),
            EventKind::KeyPressed(e) => e.fmt(f),
            EventKind::KeyReleased(e) => e.fmt(f),
            EventKind::KeyTyped(e) => e.fmt(f),
            EventKind::MouseMoved(e) => e.fmt(f),
            EventKind::MouseScrolled(e) => e.fmt(f),
            EventKind::MouseButtonPressed(e) => e.fmt(f),
            EventKind::MouseButtonReleased(e) => e.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_match_kind() {
        let key = Event::from(KeyPressedEvent { key: KeyCode::KeyA, repeat_count: 0 });
        assert!(key.is_in_category(EventCategory::KEYBOARD));
        assert!(key.is_in_category(EventCategory::INPUT));
        assert!(!key.is_in_category(EventCategory::MOUSE));

        let button = Event::from(MouseButtonPressedEvent { button: MouseButton::Left });
        assert!(button.category().contains(EventCategory::MOUSE | EventCategory::MOUSE_BUTTON));

        let close = Event::from(WindowCloseEvent);
        assert!(close.is_in_category(EventCategory::APPLICATION));
        assert!(!close.is_in_category(EventCategory::INPUT));
        assert!(!close.is_in_category(EventCategory::NONE));
    }

    #[test]
    fn display_names_the_event() {
        let resize = Event::from(WindowResizeEvent { width: 1280, height: 720 });
        assert_eq!(resize.to_string(), "WindowResizeEvent: 1280, 720");
        let scroll = Event::from(MouseScrolledEvent { x_offset: 0.0, y_offset: -1.5 });
        assert_eq!(scroll.to_string(), "MouseScrolledEvent: 0, -1.5");
    }

    #[test]
    fn typed_access() {
        let moved = Event::from(MouseMovedEvent { x: 3.0, y: 4.0 });
        assert_eq!(moved.event_type(), EventType::MouseMoved);
        assert_eq!(moved.get::<MouseMovedEvent>().map(|e| e.x), Some(3.0));
        assert!(moved.get::<WindowCloseEvent>().is_none());
        assert!(!moved.handled);
    }
}
