//! Vertex/index buffers and the layout describing vertex attributes.

use wgpu::util::DeviceExt;

use crate::engine::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderDataType {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
    Uint,
    /// Occupies four consecutive shader locations, one per column.
    Mat4,
}

impl ShaderDataType {
    pub fn size(self) -> u32 {
        match self {
            ShaderDataType::Float | ShaderDataType::Int | ShaderDataType::Uint => 4,
            ShaderDataType::Float2 | ShaderDataType::Int2 => 4 * 2,
            ShaderDataType::Float3 | ShaderDataType::Int3 => 4 * 3,
            ShaderDataType::Float4 | ShaderDataType::Int4 => 4 * 4,
            ShaderDataType::Mat4 => 4 * 4 * 4,
        }
    }

    pub fn component_count(self) -> u32 {
        match self {
            ShaderDataType::Float | ShaderDataType::Int | ShaderDataType::Uint => 1,
            ShaderDataType::Float2 | ShaderDataType::Int2 => 2,
            ShaderDataType::Float3 | ShaderDataType::Int3 => 3,
            ShaderDataType::Float4 | ShaderDataType::Int4 => 4,
            ShaderDataType::Mat4 => 4 * 4,
        }
    }

    /// Number of shader locations the type occupies.
    pub fn location_count(self) -> u32 {
        match self {
            ShaderDataType::Mat4 => 4,
            _ => 1,
        }
    }

    fn vertex_format(self) -> wgpu::VertexFormat {
        match self {
            ShaderDataType::Float => wgpu::VertexFormat::Float32,
            ShaderDataType::Float2 => wgpu::VertexFormat::Float32x2,
            ShaderDataType::Float3 => wgpu::VertexFormat::Float32x3,
            ShaderDataType::Float4 | ShaderDataType::Mat4 => wgpu::VertexFormat::Float32x4,
            ShaderDataType::Int => wgpu::VertexFormat::Sint32,
            ShaderDataType::Int2 => wgpu::VertexFormat::Sint32x2,
            ShaderDataType::Int3 => wgpu::VertexFormat::Sint32x3,
            ShaderDataType::Int4 => wgpu::VertexFormat::Sint32x4,
            ShaderDataType::Uint => wgpu::VertexFormat::Uint32,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferElement {
    pub name: String,
    pub data_type: ShaderDataType,
    pub normalized: bool,
    pub offset: u32,
}

impl BufferElement {
    pub fn new(data_type: ShaderDataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            normalized: false,
            offset: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.data_type.size()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    pub fn new(elements: Vec<BufferElement>) -> Self {
        let mut layout = Self { elements, stride: 0 };
        layout.calculate_offsets_and_stride();
        layout
    }

    fn calculate_offsets_and_stride(&mut self) {
        let mut offset = 0;
        for element in &mut self.elements {
            element.offset = offset;
            offset += element.size();
        }
        self.stride = offset;
    }

    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn location_count(&self) -> u32 {
        self.elements.iter().map(|e| e.data_type.location_count()).sum()
    }

    /// Vertex attributes with shader locations assigned from `first_location`.
    pub fn attributes(&self, first_location: u32) -> Vec<wgpu::VertexAttribute> {
        let mut location = first_location;
        let mut attributes = Vec::new();
        for element in &self.elements {
            let format = element.data_type.vertex_format();
            for column in 0..element.data_type.location_count() {
                attributes.push(wgpu::VertexAttribute {
                    format,
                    offset: (element.offset + column * format.size() as u32) as wgpu::BufferAddress,
                    shader_location: location,
                });
                location += 1;
            }
        }
        attributes
    }
}

impl<const N: usize> From<[(ShaderDataType, &str); N]> for BufferLayout {
    fn from(elements: [(ShaderDataType, &str); N]) -> Self {
        Self::new(
            elements
                .into_iter()
                .map(|(data_type, name)| BufferElement::new(data_type, name))
                .collect(),
        )
    }
}

pub struct VertexBuffer {
    buffer: wgpu::Buffer,
    layout: BufferLayout,
    size: u64,
}

impl VertexBuffer {
    pub fn from_data<T: bytemuck::Pod>(device: &wgpu::Device, vertices: &[T], layout: BufferLayout) -> Self {
        let contents: &[u8] = bytemuck::cast_slice(vertices);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            buffer,
            layout,
            size: contents.len() as u64,
        }
    }

    /// An empty buffer to be filled each frame with `set_data`.
    pub fn with_capacity(device: &wgpu::Device, size: u64, layout: BufferLayout) -> Self {
        let size = wgpu::util::align_to(size.max(4), wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dynamic Vertex Buffer"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer, layout, size }
    }

    pub fn set_data<T: bytemuck::Pod>(&self, queue: &wgpu::Queue, vertices: &[T]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let actual = bytes.len() as u64;
        if actual > self.size {
            return Err(EngineError::BufferOverflow { capacity: self.size, actual });
        }
        if actual > 0 {
            let padded = wgpu::util::align_to(actual, wgpu::COPY_BUFFER_ALIGNMENT);
            if padded == actual {
                queue.write_buffer(&self.buffer, 0, bytes);
            } else {
                let mut data = bytes.to_vec();
                data.resize(padded as usize, 0);
                queue.write_buffer(&self.buffer, 0, &data);
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn capacity(&self) -> u64 {
        self.size
    }
}

pub struct IndexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl IndexBuffer {
    pub fn new(device: &wgpu::Device, indices: &[u32]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            buffer,
            count: indices.len() as u32,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_and_stride() {
        let layout = BufferLayout::from([
            (ShaderDataType::Float3, "a_Position"),
            (ShaderDataType::Float4, "a_Color"),
            (ShaderDataType::Float2, "a_TexCoord"),
        ]);
        let offsets: Vec<u32> = layout.elements().iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0, 12, 28]);
        assert_eq!(layout.stride(), 36);
        assert_eq!(layout.location_count(), 3);
    }

    #[test]
    fn mat4_spans_four_locations() {
        let layout = BufferLayout::from([(ShaderDataType::Float, "a_Id"), (ShaderDataType::Mat4, "a_Transform")]);
        let attributes = layout.attributes(2);
        assert_eq!(attributes.len(), 5);
        let locations: Vec<u32> = attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![2, 3, 4, 5, 6]);
        let offsets: Vec<u64> = attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 4, 20, 36, 52]);
        assert_eq!(layout.stride(), 68);
    }

    #[test]
    fn empty_layout() {
        let layout = BufferLayout::default();
        assert!(layout.is_empty());
        assert_eq!(layout.stride(), 0);
        assert!(layout.attributes(0).is_empty());
    }

    #[test]
    fn sizes_match_components() {
        for ty in [ShaderDataType::Float2, ShaderDataType::Int3, ShaderDataType::Float4] {
            assert_eq!(ty.size(), ty.component_count() * 4);
        }
        assert_eq!(ShaderDataType::Mat4.size(), 64);
    }
}
