use std::time::{Duration, Instant};

use egui::{Pos2, Rect};
use log::warn;
use winit::event::MouseButton;

use crate::engine::events::{Event, EventCategory, MouseButtonPressedEvent, MouseButtonReleasedEvent, MouseMovedEvent};

const PUBLISH_INTERVAL: Duration = Duration::from_secs(1);

/// Frames per second, measured over one-second windows.
#[derive(Debug)]
pub struct FpsCounter {
    frame_count: u32,
    last_fps: u32,
    last_publish: Instant,
}

impl FpsCounter {
    pub fn starting_at(start: Instant) -> Self {
        Self {
            frame_count: 0,
            last_fps: 0,
            last_publish: start,
        }
    }

    /// Counts one frame. Returns the new rate once a second has passed since
    /// the last one.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frame_count += 1;

        let elapsed = now.duration_since(self.last_publish);
        if elapsed < PUBLISH_INTERVAL {
            return None;
        }
        self.last_fps = (self.frame_count as f32 / elapsed.as_secs_f32()).round() as u32;
        self.frame_count = 0;
        self.last_publish = now;
        Some(self.last_fps)
    }

    pub fn fps(&self) -> u32 {
        self.last_fps
    }
}

/// Tessellated overlay of one UI frame.
pub struct UiOutput {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// egui overlay hosting every layer's `on_ui_render`. Pointer input reaches
/// egui through engine events, and mouse events over a debug window are
/// claimed before the layers see them.
pub struct DebugUi {
    context: egui::Context,
    title: String,
    fps: FpsCounter,
    start: Instant,
    events: Vec<egui::Event>,
    pointer: Pos2,
}

impl DebugUi {
    pub fn new(title: impl Into<String>) -> Self {
        Self::starting_at(title, Instant::now())
    }

    pub fn starting_at(title: impl Into<String>, start: Instant) -> Self {
        Self {
            context: egui::Context::default(),
            title: title.into(),
            fps: FpsCounter::starting_at(start),
            start,
            events: Vec::new(),
            pointer: Pos2::ZERO,
        }
    }

    pub fn context(&self) -> &egui::Context {
        &self.context
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    /// Queues pointer input for the next frame. Returns true when the event
    /// is a mouse event and the pointer was over the overlay last frame.
    pub fn on_event(&mut self, event: &Event) -> bool {
        let claimed =
            event.is_in_category(EventCategory::MOUSE) && (self.context.is_pointer_over_area() || self.context.is_using_pointer());

        if let Some(e) = event.get::<MouseMovedEvent>() {
            self.pointer = Pos2::new(e.x, e.y);
            self.events.push(egui::Event::PointerMoved(self.pointer));
        } else if let Some(e) = event.get::<MouseButtonPressedEvent>() {
            self.push_button(e.button, true);
        } else if let Some(e) = event.get::<MouseButtonReleasedEvent>() {
            self.push_button(e.button, false);
        }
        claimed
    }

    fn push_button(&mut self, button: MouseButton, pressed: bool) {
        let button = match button {
            MouseButton::Left => egui::PointerButton::Primary,
            MouseButton::Right => egui::PointerButton::Secondary,
            MouseButton::Middle => egui::PointerButton::Middle,
            _ => return,
        };
        self.events.push(egui::Event::PointerButton {
            pos: self.pointer,
            button,
            pressed,
            modifiers: egui::Modifiers::default(),
        });
    }

    /// Runs one UI frame: a stats window with the FPS readout followed by
    /// `add_contents`. Also returns the window title to publish when the FPS
    /// readout changed.
    pub fn run(
        &mut self,
        now: Instant,
        screen_size: (u32, u32),
        mut add_contents: impl FnMut(&mut egui::Ui),
    ) -> (UiOutput, Option<String>) {
        let published = self.fps.tick(now);
        let fps = self.fps.fps();

        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(
                Pos2::ZERO,
                egui::vec2(screen_size.0 as f32, screen_size.1 as f32),
            )),
            time: Some(now.duration_since(self.start).as_secs_f64()),
            events: std::mem::take(&mut self.events),
            ..Default::default()
        };

        let title = self.title.as_str();
        let output = self.context.run(input, |ctx| {
            egui::Window::new(title)
                .default_pos([10.0, 10.0])
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(format!("{fps} FPS"));
                    ui.separator();
                    add_contents(ui);
                });
        });

        let primitives = self.context.tessellate(output.shapes, output.pixels_per_point);
        let ui_output = UiOutput {
            primitives,
            textures: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        };
        (ui_output, published.map(|fps| format!("{} | {} FPS", self.title, fps)))
    }
}

/// Paints `UiOutput` over a finished frame with egui's wgpu renderer.
pub struct UiPainter {
    renderer: egui_wgpu::Renderer,
}

impl UiPainter {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self {
            renderer: egui_wgpu::Renderer::new(device, format, None, 1),
        }
    }

    /// Uploads texture changes and, when a target is given, draws the
    /// overlay on top of its contents. Texture changes are applied even for
    /// skipped frames so the font atlas is never lost.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: Option<(&wgpu::TextureView, (u32, u32))>,
        output: UiOutput,
    ) {
        for (id, delta) in &output.textures.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        if let Some((view, (width, height))) = target {
            if width == 0 || height == 0 {
                warn!("Skipping debug UI for an empty target");
            } else {
                let screen = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [width, height],
                    pixels_per_point: output.pixels_per_point,
                };
                let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Debug UI Encoder"),
                });
                let mut commands = self
                    .renderer
                    .update_buffers(device, queue, &mut encoder, &output.primitives, &screen);
                {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Debug UI Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    self.renderer.render(&mut render_pass, &output.primitives, &screen);
                }
                commands.push(encoder.finish());
                queue.submit(commands);
            }
        }

        for id in &output.textures.free {
            self.renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_is_published_once_per_second() {
        let start = Instant::now();
        let mut counter = FpsCounter::starting_at(start);

        for i in 1..60 {
            assert!(counter.tick(start + Duration::from_millis(i * 16)).is_none());
        }
        assert_eq!(counter.tick(start + Duration::from_secs(1)), Some(60));
        assert_eq!(counter.fps(), 60);
        assert!(counter.tick(start + Duration::from_millis(1016)).is_none());
    }

    #[test]
    fn frame_runs_layer_contents_and_uploads_fonts() {
        let start = Instant::now();
        let mut ui = DebugUi::starting_at("Sandbox", start);

        let mut calls = 0;
        let (first, title) = ui.run(start, (800, 600), |ui| {
            calls += 1;
            ui.label("mode: linear");
        });
        assert!(calls >= 1);
        assert!(title.is_none());
        assert!(!first.textures.set.is_empty());

        let (second, _) = ui.run(start + Duration::from_millis(16), (800, 600), |ui| {
            ui.label("mode: linear");
        });
        assert!(!second.primitives.is_empty());
    }

    #[test]
    fn title_carries_fps_after_a_second() {
        let start = Instant::now();
        let mut ui = DebugUi::starting_at("Fog", start);
        for i in 1..30 {
            let (_, title) = ui.run(start + Duration::from_millis(i * 33), (640, 480), |_| ());
            assert!(title.is_none());
        }
        let (_, title) = ui.run(start + Duration::from_secs(1), (640, 480), |_| ());
        assert_eq!(title.as_deref(), Some("Fog | 30 FPS"));
        assert_eq!(ui.fps(), 30);
    }

    #[test]
    fn mouse_events_over_the_overlay_are_claimed() {
        let start = Instant::now();
        let mut ui = DebugUi::starting_at("Brush", start);
        let pressed = Event::from(MouseButtonPressedEvent { button: MouseButton::Left });

        ui.on_event(&Event::from(MouseMovedEvent { x: 20.0, y: 20.0 }));
        for i in 0..3 {
            ui.run(start + Duration::from_millis(i * 16), (800, 600), |ui| {
                ui.label("stamps: 0");
            });
        }
        assert!(ui.on_event(&pressed));
        ui.on_event(&Event::from(MouseButtonReleasedEvent { button: MouseButton::Left }));

        ui.on_event(&Event::from(MouseMovedEvent { x: 700.0, y: 500.0 }));
        for i in 3..6 {
            ui.run(start + Duration::from_millis(i * 16), (800, 600), |_| ());
        }
        assert!(!ui.on_event(&pressed));
    }

    #[test]
    fn keyboard_events_are_never_claimed() {
        let mut ui = DebugUi::new("Sandbox");
        let key = Event::from(crate::engine::events::KeyPressedEvent {
            key: winit::keyboard::KeyCode::KeyF,
            repeat_count: 0,
        });
        assert!(!ui.on_event(&key));
    }
}
