use std::time::Instant;

use log::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::engine::config::AppConfig;
use crate::engine::core::{Context, Layer, LayerStack, Timestep};
use crate::engine::error::{EngineError, Result};
use crate::engine::events::{self, Event, EventDispatcher, WindowCloseEvent, WindowResizeEvent};
use crate::engine::graphics::Renderer;
use crate::engine::input::InputHandler;
use crate::engine::ui::{DebugUi, UiPainter};
use crate::engine::window::Window;

/// Owns the window, renderer and layer stack and drives them from the
/// winit event loop.
pub struct Application {
    layer_stack: LayerStack,
    renderer: Option<Renderer>,
    window: Option<Window>,
    config: AppConfig,
    input: InputHandler,
    debug_ui: Option<DebugUi>,
    ui_painter: Option<UiPainter>,
    running: bool,
    minimized: bool,
    last_frame_time: Option<Instant>,
    error: Option<EngineError>,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        let debug_ui = config.debug_ui.then(|| DebugUi::new(config.window.title.clone()));
        Self {
            layer_stack: LayerStack::new(),
            renderer: None,
            window: None,
            config,
            input: InputHandler::new(),
            debug_ui,
            ui_painter: None,
            running: true,
            minimized: false,
            last_frame_time: None,
            error: None,
        }
    }

    /// Runs the event loop until a layer or the window closes the app.
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Pushes a layer below the overlays. Attached immediately when the
    /// window exists, otherwise once it is created.
    pub fn push_layer(&mut self, layer: Box<dyn Layer>) -> Result<()> {
        self.layer_stack.push_layer(layer);
        self.attach_pending()
    }

    pub fn push_overlay(&mut self, overlay: Box<dyn Layer>) -> Result<()> {
        self.layer_stack.push_overlay(overlay);
        self.attach_pending()
    }

    /// Removes a layer, detaching it if it had been attached.
    pub fn pop_layer(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        self.layer_stack.pop_layer(name)
    }

    pub fn pop_overlay(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        self.layer_stack.pop_overlay(name)
    }

    fn attach_pending(&mut self) -> Result<()> {
        let (Some(window), Some(renderer)) = (self.window.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let mut ctx = Context::new(window, renderer, &self.input, &mut self.running);
        self.layer_stack.attach_pending(|layer| layer.on_attach(&mut ctx))
    }

    pub fn layer_stack(&self) -> &LayerStack {
        &self.layer_stack
    }

    pub fn close(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Feeds an event through the application: polled input first, then the
    /// window close/resize handlers and the debug overlay, then the layers
    /// from the top down.
    pub fn on_event(&mut self, mut event: Event) {
        debug!("{event}");
        self.input.on_event(&event);

        let mut dispatcher = EventDispatcher::new(&mut event);
        dispatcher.dispatch::<WindowCloseEvent>(|_| {
            self.running = false;
            true
        });
        dispatcher.dispatch::<WindowResizeEvent>(|e| self.on_window_resize(e));
        if let Some(debug_ui) = self.debug_ui.as_mut() {
            let claimed = debug_ui.on_event(&event);
            event.handled |= claimed;
        }

        let (Some(window), Some(renderer)) = (self.window.as_mut(), self.renderer.as_mut()) else {
            return;
        };
        let mut ctx = Context::new(window, renderer, &self.input, &mut self.running);
        self.layer_stack
            .dispatch_event(&mut event, |layer, event| layer.on_event(event, &mut ctx));
    }

    fn on_window_resize(&mut self, e: &WindowResizeEvent) -> bool {
        if e.width == 0 || e.height == 0 {
            self.minimized = true;
            return false;
        }
        self.minimized = false;
        if let Some(window) = self.window.as_mut() {
            window.resize(e.width, e.height);
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.on_window_resize(e.width, e.height);
        }
        false
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Window::new(event_loop, &self.config.window)?;
        let context = window.context();
        let mut renderer = Renderer::new(&context.device, &context.queue);
        let (width, height) = window.size();
        renderer.on_window_resize(width, height);

        if self.debug_ui.is_some() {
            self.ui_painter = Some(UiPainter::new(&context.device, context.format()));
        }

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.attach_pending()
    }

    fn run_frame(&mut self) -> Result<()> {
        let now = Instant::now();
        let ts = Timestep::from(now.duration_since(self.last_frame_time.unwrap_or(now)));
        self.last_frame_time = Some(now);

        let (Some(window), Some(renderer)) = (self.window.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        if !self.minimized {
            let mut ctx = Context::new(window, renderer, &self.input, &mut self.running);
            let updated = self
                .layer_stack
                .iter_mut()
                .try_for_each(|layer| layer.on_update(ts, &mut ctx));
            if let Err(e) = updated {
                ctx.renderer.discard();
                return Err(e);
            }
        }

        let mut ui_output = None;
        if let Some(debug_ui) = self.debug_ui.as_mut() {
            let layer_stack = &mut self.layer_stack;
            let (output, title) = debug_ui.run(now, window.size(), |ui| {
                for layer in layer_stack.iter_mut() {
                    layer.on_ui_render(ui);
                }
            });
            if let Some(title) = title {
                info!("{title}");
                window.set_title(&title);
            }
            ui_output = Some(output);
        }

        let frame = if self.minimized { None } else { window.context().acquire_frame()? };
        let context = window.context();
        let Some(frame) = frame else {
            renderer.discard();
            if let (Some(painter), Some(output)) = (self.ui_painter.as_mut(), ui_output) {
                painter.paint(&context.device, &context.queue, None, output);
            }
            return Ok(());
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        renderer.flush(&context.device, &context.queue, &view, context.format(), context.size())?;
        if let (Some(painter), Some(output)) = (self.ui_painter.as_mut(), ui_output) {
            painter.paint(&context.device, &context.queue, Some((&view, context.size())), output);
        }
        window.on_update(frame);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: EngineError) {
        error!("Fatal error: {err}");
        self.error = Some(err);
        self.running = false;
        event_loop.exit();
    }
}

impl ApplicationHandler for Application {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_graphics(event_loop) {
            self.fail(event_loop, e);
            return;
        }
        self.last_frame_time = Some(Instant::now());
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(id) {
            return;
        }

        match &event {
            WindowEvent::RedrawRequested => match self.run_frame() {
                Ok(()) => (),
                Err(e @ EngineError::Frame(_)) => self.fail(event_loop, e),
                Err(e) => warn!("Frame skipped: {e}"),
            },
            WindowEvent::Focused(false) => self.input.reset(),
            _ => {
                for engine_event in events::translate(&event) {
                    self.on_event(engine_event);
                }
            }
        }

        if !self.running {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
