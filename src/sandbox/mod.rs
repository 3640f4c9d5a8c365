//! Demo layers built on the engine.

pub mod brush;
pub mod cross_section;
pub mod example;
pub mod fog;
pub mod textured_quad;

use clap::ValueEnum;
use winit::keyboard::KeyCode;

use crate::engine::core::{Context, Layer};
use crate::engine::events::{Event, EventDispatcher, KeyPressedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    Sandbox,
    TexturedQuad,
    Fog,
    Brush,
    CrossSection,
}

impl Demo {
    pub const ALL: [Demo; 5] = [Demo::Sandbox, Demo::TexturedQuad, Demo::Fog, Demo::Brush, Demo::CrossSection];

    pub fn name(self) -> &'static str {
        match self {
            Demo::Sandbox => "sandbox",
            Demo::TexturedQuad => "textured-quad",
            Demo::Fog => "fog",
            Demo::Brush => "brush",
            Demo::CrossSection => "cross-section",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Demo::Sandbox => "Sandbox",
            Demo::TexturedQuad => "Textured Quad",
            Demo::Fog => "Fog",
            Demo::Brush => "Brush",
            Demo::CrossSection => "Cross Section",
        }
    }

    pub fn layer(self) -> Box<dyn Layer> {
        match self {
            Demo::Sandbox => Box::new(example::ExampleLayer::new()),
            Demo::TexturedQuad => Box::new(textured_quad::TexturedQuadLayer::new()),
            Demo::Fog => Box::new(fog::FogLayer::new()),
            Demo::Brush => Box::new(brush::BrushLayer::new()),
            Demo::CrossSection => Box::new(cross_section::CrossSectionLayer::new()),
        }
    }
}

/// Closes the application when Escape is pressed.
pub(crate) fn close_on_escape(event: &mut Event, ctx: &mut Context) {
    EventDispatcher::new(event).dispatch::<KeyPressedEvent>(|e| {
        if e.key == KeyCode::Escape {
            ctx.close();
            return true;
        }
        false
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_names_match_command_line_values() {
        for demo in Demo::ALL {
            let value = demo.to_possible_value().unwrap();
            assert_eq!(value.get_name(), demo.name());
            assert_eq!(Demo::from_str(demo.name(), false), Ok(demo));
            assert_eq!(demo.layer().name(), demo.title());
        }
        assert!(Demo::from_str("missing", false).is_err());
    }
}
