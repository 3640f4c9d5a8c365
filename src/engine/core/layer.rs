use crate::engine::core::Timestep;
use crate::engine::error::Result;
use crate::engine::events::Event;
use crate::engine::graphics::context::GraphicsContext;
use crate::engine::graphics::Renderer;
use crate::engine::input::InputHandler;
use crate::engine::window::Window;

/// Engine services handed to layer hooks.
pub struct Context<'a> {
    pub window: &'a mut Window,
    pub renderer: &'a mut Renderer,
    pub input: &'a InputHandler,
    running: &'a mut bool,
}

impl<'a> Context<'a> {
    pub fn new(window: &'a mut Window, renderer: &'a mut Renderer, input: &'a InputHandler, running: &'a mut bool) -> Self {
        Self {
            window,
            renderer,
            input,
            running,
        }
    }

    pub fn graphics(&self) -> &GraphicsContext {
        self.window.context()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.window.context().device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.window.context().queue
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window.size()
    }

    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.window.size();
        width as f32 / height.max(1) as f32
    }

    /// Stops the application after the current frame.
    pub fn close(&mut self) {
        *self.running = false;
    }
}

/// A slice of application behaviour living in the layer stack.
pub trait Layer {
    fn name(&self) -> &str;

    fn on_attach(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn on_detach(&mut self) {}

    fn on_update(&mut self, _ts: Timestep, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn on_event(&mut self, _event: &mut Event, _ctx: &mut Context) {}

    /// Adds widgets to the debug overlay window.
    fn on_ui_render(&mut self, _ui: &mut egui::Ui) {}
}
