//! Shaders and geometry shipped with the engine.

use std::sync::Arc;

use crate::engine::error::Result;
use crate::engine::graphics::buffer::{BufferLayout, IndexBuffer, ShaderDataType, VertexBuffer};
use crate::engine::graphics::shader::{Shader, ShaderLibrary};
use crate::engine::graphics::vertex_array::VertexArray;

pub const FLAT_COLOR: &str = "FlatColor";
pub const TEXTURE: &str = "Texture";

const FLAT_COLOR_SOURCE: &str = include_str!("../shaders/flat_color.wgsl");
const TEXTURE_SOURCE: &str = include_str!("../shaders/texture.wgsl");

/// A library holding the `FlatColor` and `Texture` shaders.
pub fn shader_library(device: &wgpu::Device) -> Result<ShaderLibrary> {
    let mut library = ShaderLibrary::new();
    library.add(Shader::from_source(device, FLAT_COLOR, FLAT_COLOR_SOURCE)?)?;
    library.add(Shader::from_source(device, TEXTURE, TEXTURE_SOURCE)?)?;
    Ok(library)
}

/// Unit quad centred on the origin in the XY plane.
#[rustfmt::skip]
pub const QUAD_VERTICES: [f32; 20] = [
    // position        tex coord
    -0.5, -0.5, 0.0,   0.0, 0.0,
     0.5, -0.5, 0.0,   1.0, 0.0,
     0.5,  0.5, 0.0,   1.0, 1.0,
    -0.5,  0.5, 0.0,   0.0, 1.0,
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

pub fn quad_layout() -> BufferLayout {
    BufferLayout::from([(ShaderDataType::Float3, "a_Position"), (ShaderDataType::Float2, "a_TexCoord")])
}

/// Quad with positions at location 0 and texture coordinates at location 1,
/// usable with both built-in shaders.
pub fn quad(device: &wgpu::Device) -> Result<VertexArray> {
    let mut vertex_array = VertexArray::new();
    vertex_array.add_vertex_buffer(Arc::new(VertexBuffer::from_data(device, &QUAD_VERTICES, quad_layout())))?;
    vertex_array.set_index_buffer(Arc::new(IndexBuffer::new(device, &QUAD_INDICES)));
    Ok(vertex_array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_layout_matches_vertex_data() {
        let layout = quad_layout();
        assert_eq!(layout.stride(), 20);
        assert_eq!(QUAD_VERTICES.len() * 4 % layout.stride() as usize, 0);
        assert_eq!(QUAD_VERTICES.len() * 4 / layout.stride() as usize, 4);
        assert!(QUAD_INDICES.iter().all(|&i| i < 4));
    }
}
