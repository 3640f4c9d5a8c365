//! Translation of native window events into engine events.

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

use super::event::*;

/// Pixel scroll deltas are converted to lines with this height.
pub const SCROLL_LINE_HEIGHT: f32 = 20.0;

/// Returns the engine events for one native event, in emission order.
/// A key press carrying text yields `KeyPressed` followed by `KeyTyped`.
pub fn translate(event: &WindowEvent) -> Vec<Event> {
    let mut out = Vec::new();
    match event {
        WindowEvent::Resized(size) => {
            out.push(WindowResizeEvent { width: size.width, height: size.height }.into());
        }
        WindowEvent::CloseRequested => {
            out.push(WindowCloseEvent.into());
        }
        WindowEvent::KeyboardInput { event, .. } => {
            let code = match event.physical_key {
                PhysicalKey::Code(code) => Some(code),
                PhysicalKey::Unidentified(_) => None,
            };
            match event.state {
                ElementState::Pressed => {
                    if let Some(key) = code {
                        let repeat_count = u32::from(event.repeat);
                        out.push(KeyPressedEvent { key, repeat_count }.into());
                    }
                    if let Some(text) = &event.text {
                        out.extend(
                            text.chars()
                                .filter(|ch| !ch.is_control())
                                .map(|ch| Event::from(KeyTypedEvent { ch })),
                        );
                    }
                }
                ElementState::Released => {
                    if let Some(key) = code {
                        out.push(KeyReleasedEvent { key }.into());
                    }
                }
            }
        }
        WindowEvent::CursorMoved { position, .. } => {
            out.push(MouseMovedEvent { x: position.x as f32, y: position.y as f32 }.into());
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let (x_offset, y_offset) = scroll_offsets(*delta);
            out.push(MouseScrolledEvent { x_offset, y_offset }.into());
        }
        WindowEvent::MouseInput { state, button, .. } => {
            let button = *button;
            out.push(match state {
                ElementState::Pressed => MouseButtonPressedEvent { button }.into(),
                ElementState::Released => MouseButtonReleasedEvent { button }.into(),
            });
        }
        _ => (),
    }
    out
}

pub fn scroll_offsets(delta: MouseScrollDelta) -> (f32, f32) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (x, y),
        MouseScrollDelta::PixelDelta(pos) => (
            pos.x as f32 / SCROLL_LINE_HEIGHT,
            pos.y as f32 / SCROLL_LINE_HEIGHT,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::{PhysicalPosition, PhysicalSize};
    use winit::event::{DeviceId, MouseButton, TouchPhase};

    fn device() -> DeviceId {
        DeviceId::dummy()
    }

    #[test]
    fn resize_and_close() {
        let events = translate(&WindowEvent::Resized(PhysicalSize::new(640, 480)));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].get::<WindowResizeEvent>(), Some(&WindowResizeEvent { width: 640, height: 480 }));

        let events = translate(&WindowEvent::CloseRequested);
        assert_eq!(events[0].event_type(), EventType::WindowClose);
    }

    #[test]
    fn cursor_and_buttons() {
        let moved = translate(&WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(12.0, 34.5),
        });
        assert_eq!(moved[0].get::<MouseMovedEvent>(), Some(&MouseMovedEvent { x: 12.0, y: 34.5 }));

        let pressed = translate(&WindowEvent::MouseInput {
            device_id: device(),
            state: ElementState::Pressed,
            button: MouseButton::Right,
        });
        assert_eq!(pressed[0].get::<MouseButtonPressedEvent>().map(|e| e.button), Some(MouseButton::Right));

        let released = translate(&WindowEvent::MouseInput {
            device_id: device(),
            state: ElementState::Released,
            button: MouseButton::Left,
        });
        assert_eq!(released[0].event_type(), EventType::MouseButtonReleased);
    }

    #[test]
    fn wheel_deltas() {
        let lines = translate(&WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::LineDelta(0.0, 2.0),
            phase: TouchPhase::Moved,
        });
        assert_eq!(lines[0].get::<MouseScrolledEvent>(), Some(&MouseScrolledEvent { x_offset: 0.0, y_offset: 2.0 }));

        let (x, y) = scroll_offsets(MouseScrollDelta::PixelDelta(PhysicalPosition::new(40.0, -10.0)));
        assert_eq!((x, y), (2.0, -0.5));
    }

    #[test]
    fn unmapped_events_are_dropped() {
        assert!(translate(&WindowEvent::Focused(true)).is_empty());
        assert!(translate(&WindowEvent::RedrawRequested).is_empty());
    }
}
