use std::sync::Arc;

use crate::engine::error::{EngineError, Result};
use crate::engine::graphics::buffer::{IndexBuffer, VertexBuffer};

/// Hashable description of everything a pipeline needs to know about the
/// vertex input of a draw.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayoutKey {
    pub buffers: Vec<(wgpu::BufferAddress, Vec<wgpu::VertexAttribute>)>,
    pub topology: wgpu::PrimitiveTopology,
}

/// A set of vertex buffers plus the index buffer drawn with them.
pub struct VertexArray {
    vertex_buffers: Vec<Arc<VertexBuffer>>,
    attributes: Vec<Vec<wgpu::VertexAttribute>>,
    index_buffer: Option<Arc<IndexBuffer>>,
    next_location: u32,
    topology: wgpu::PrimitiveTopology,
}

impl Default for VertexArray {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexArray {
    pub fn new() -> Self {
        Self {
            vertex_buffers: Vec::new(),
            attributes: Vec::new(),
            index_buffer: None,
            next_location: 0,
            topology: wgpu::PrimitiveTopology::TriangleList,
        }
    }

    /// Attributes continue numbering from the buffers already attached.
    pub fn add_vertex_buffer(&mut self, vertex_buffer: Arc<VertexBuffer>) -> Result<()> {
        let layout = vertex_buffer.layout();
        if layout.is_empty() {
            return Err(EngineError::EmptyLayout);
        }
        self.attributes.push(layout.attributes(self.next_location));
        self.next_location += layout.location_count();
        self.vertex_buffers.push(vertex_buffer);
        Ok(())
    }

    pub fn set_index_buffer(&mut self, index_buffer: Arc<IndexBuffer>) {
        self.index_buffer = Some(index_buffer);
    }

    pub fn set_topology(&mut self, topology: wgpu::PrimitiveTopology) {
        self.topology = topology;
    }

    pub fn vertex_buffers(&self) -> &[Arc<VertexBuffer>] {
        &self.vertex_buffers
    }

    pub fn index_buffer(&self) -> Option<&Arc<IndexBuffer>> {
        self.index_buffer.as_ref()
    }

    pub fn topology(&self) -> wgpu::PrimitiveTopology {
        self.topology
    }

    pub fn vertex_buffer_layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.vertex_buffers
            .iter()
            .zip(&self.attributes)
            .map(|(vb, attributes)| wgpu::VertexBufferLayout {
                array_stride: vb.layout().stride() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect()
    }

    pub fn layout_key(&self) -> VertexLayoutKey {
        VertexLayoutKey {
            buffers: self
                .vertex_buffers
                .iter()
                .zip(&self.attributes)
                .map(|(vb, attributes)| (vb.layout().stride() as wgpu::BufferAddress, attributes.clone()))
                .collect(),
            topology: self.topology,
        }
    }
}
