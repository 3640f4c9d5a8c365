use std::sync::Arc;

use log::info;
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as NativeWindow, WindowId};

use crate::engine::error::Result;
use crate::engine::graphics::context::GraphicsContext;
use crate::engine::window::WindowProps;

/// A native window together with the graphics context presenting to it.
pub struct Window {
    context: GraphicsContext,
    native: Arc<NativeWindow>,
    title: String,
}

impl Window {
    pub fn new(event_loop: &ActiveEventLoop, props: &WindowProps) -> Result<Self> {
        info!("Creating window {} ({}, {})", props.title, props.width, props.height);

        let attributes = NativeWindow::default_attributes()
            .with_title(props.title.as_str())
            .with_inner_size(LogicalSize::new(props.width, props.height));
        let native = Arc::new(event_loop.create_window(attributes)?);
        let context = GraphicsContext::new(Arc::clone(&native), props.vsync)?;

        Ok(Self {
            context,
            native,
            title: props.title.clone(),
        })
    }

    pub fn id(&self) -> WindowId {
        self.native.id()
    }

    pub fn width(&self) -> u32 {
        self.context.size().0
    }

    pub fn height(&self) -> u32 {
        self.context.size().1
    }

    pub fn size(&self) -> (u32, u32) {
        self.context.size()
    }

    pub fn context(&self) -> &GraphicsContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut GraphicsContext {
        &mut self.context
    }

    pub fn native(&self) -> &NativeWindow {
        &self.native
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.context.set_vsync(enabled);
    }

    pub fn is_vsync(&self) -> bool {
        self.context.is_vsync()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        if self.title != title {
            self.native.set_title(title);
            self.title = title.to_owned();
        }
    }

    pub fn request_redraw(&self) {
        self.native.request_redraw();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    /// Presents a rendered frame.
    pub fn on_update(&self, frame: wgpu::SurfaceTexture) {
        self.native.pre_present_notify();
        frame.present();
    }
}
