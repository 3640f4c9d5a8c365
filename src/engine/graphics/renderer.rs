//! Scene renderer: records submissions between `begin_scene`/`end_scene`
//! and encodes them into render passes on `flush`.
//!
//! Bind groups shared by every shader:
//! - group 0: `Scene { view_projection }`, one slot per scene
//! - group 1: `Object { transform, color, params }`, one slot per draw
//! - group 2: material texture + sampler (white when none is set)

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use glam::{Mat4, Vec4};
use log::{debug, warn};

use crate::engine::error::{EngineError, Result};
use crate::engine::graphics::camera::Camera;
use crate::engine::graphics::context::DEPTH_FORMAT;
use crate::engine::graphics::render_command::{CommandQueue, RenderCommand, ScenePass};
use crate::engine::graphics::shader::{Shader, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::engine::graphics::texture::{self, Texture2D};
use crate::engine::graphics::vertex_array::{VertexArray, VertexLayoutKey};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    view_projection: [f32; 16],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ObjectUniform {
    transform: [f32; 16],
    color: [f32; 4],
    params: [f32; 4],
}

/// Per-draw shading inputs.
#[derive(Clone)]
pub struct Material {
    pub color: Vec4,
    pub texture: Option<Arc<Texture2D>>,
    /// Free-form values for shader-specific parameters.
    pub params: Vec4,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            texture: None,
            params: Vec4::ZERO,
        }
    }
}

impl Material {
    pub fn color(color: Vec4) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn textured(texture: Arc<Texture2D>) -> Self {
        Self {
            texture: Some(texture),
            ..Default::default()
        }
    }

    pub fn with_params(mut self, params: Vec4) -> Self {
        self.params = params;
        self
    }
}

pub struct DrawCall {
    shader: Arc<Shader>,
    vertex_array: Arc<VertexArray>,
    transform: Mat4,
    material: Material,
    index_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub scenes: u32,
    pub draw_calls: u32,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    shader: u64,
    layout: VertexLayoutKey,
    format: wgpu::TextureFormat,
}

/// Uniform buffer addressed with dynamic offsets, one aligned slot per use.
struct UniformRing {
    label: &'static str,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    element_size: u64,
    stride: u64,
    capacity: u64,
}

impl UniformRing {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &'static str, element_size: u64, capacity: u64) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = aligned_stride(element_size, alignment);
        let capacity = capacity.max(1);
        let (buffer, bind_group) = Self::allocate(device, layout, label, element_size, stride, capacity);
        Self {
            label,
            buffer,
            bind_group,
            element_size,
            stride,
            capacity,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &'static str,
        element_size: u64,
        stride: u64,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(element_size),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn reserve(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout, slots: u64) {
        if slots <= self.capacity {
            return;
        }
        let capacity = slots.next_power_of_two();
        debug!("Growing {} to {} slots", self.label, capacity);
        let (buffer, bind_group) = Self::allocate(device, layout, self.label, self.element_size, self.stride, capacity);
        self.buffer = buffer;
        self.bind_group = bind_group;
        self.capacity = capacity;
    }

    fn write<T: bytemuck::Pod>(&self, queue: &wgpu::Queue, items: &[T]) {
        if items.is_empty() {
            return;
        }
        let mut data = vec![0u8; (self.stride * items.len() as u64) as usize];
        for (slot, item) in items.iter().enumerate() {
            let start = slot * self.stride as usize;
            let bytes = bytemuck::bytes_of(item);
            data[start..start + bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(&self.buffer, 0, &data);
    }

    fn offset(&self, slot: usize) -> wgpu::DynamicOffset {
        (slot as u64 * self.stride) as wgpu::DynamicOffset
    }
}

/// Rounds `size` up to a multiple of `alignment`.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// Pipelines live as long as the shader they were built from.
struct CachedPipeline {
    shader: Weak<Shader>,
    pipeline: wgpu::RenderPipeline,
}

/// Size of the viewport applied to a target of `target` pixels. An unset
/// (zero) viewport covers the whole target, and the viewport never exceeds
/// it.
pub fn clamp_viewport(viewport: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    if viewport.0 == 0 || viewport.1 == 0 {
        return target;
    }
    (viewport.0.min(target.0), viewport.1.min(target.1))
}

struct DepthTarget {
    view: wgpu::TextureView,
    size: (u32, u32),
}

pub struct Renderer {
    commands: CommandQueue<DrawCall>,
    scene_layout: wgpu::BindGroupLayout,
    object_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    scene_uniforms: UniformRing,
    object_uniforms: UniformRing,
    white_texture: Texture2D,
    pipelines: HashMap<PipelineKey, CachedPipeline>,
    depth: Option<DepthTarget>,
    viewport: (u32, u32),
    stats: RenderStats,
}

fn uniform_layout(device: &wgpu::Device, label: &str, size: u64, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(size),
            },
            count: None,
        }],
    })
}

impl Renderer {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let scene_size = std::mem::size_of::<SceneUniform>() as u64;
        let object_size = std::mem::size_of::<ObjectUniform>() as u64;
        let stages = wgpu::ShaderStages::VERTEX_FRAGMENT;

        let scene_layout = uniform_layout(device, "Scene Bind Group Layout", scene_size, stages);
        let object_layout = uniform_layout(device, "Object Bind Group Layout", object_size, stages);
        let texture_layout = texture::bind_group_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Renderer Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let scene_uniforms = UniformRing::new(device, &scene_layout, "Scene Uniforms", scene_size, 4);
        let object_uniforms = UniformRing::new(device, &object_layout, "Object Uniforms", object_size, 256);

        Self {
            commands: CommandQueue::new(),
            scene_layout,
            object_layout,
            pipeline_layout,
            scene_uniforms,
            object_uniforms,
            white_texture: Texture2D::white(device, queue),
            pipelines: HashMap::new(),
            depth: None,
            viewport: (0, 0),
            stats: RenderStats::default(),
        }
    }

    pub fn set_clear_color(&mut self, color: Vec4) -> Result<()> {
        self.commands.push(RenderCommand::SetClearColor(color))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.commands.push(RenderCommand::Clear)
    }

    pub fn begin_scene(&mut self, camera: &impl Camera) -> Result<()> {
        self.begin_scene_with(camera.view_projection())
    }

    pub fn begin_scene_with(&mut self, view_projection: Mat4) -> Result<()> {
        self.commands.push(RenderCommand::BeginScene { view_projection })
    }

    pub fn end_scene(&mut self) -> Result<()> {
        self.commands.push(RenderCommand::EndScene)
    }

    pub fn submit(&mut self, shader: &Arc<Shader>, vertex_array: &Arc<VertexArray>, transform: Mat4) -> Result<()> {
        self.submit_with(shader, vertex_array, transform, &Material::default())
    }

    pub fn submit_with(
        &mut self,
        shader: &Arc<Shader>,
        vertex_array: &Arc<VertexArray>,
        transform: Mat4,
        material: &Material,
    ) -> Result<()> {
        let count = vertex_array
            .index_buffer()
            .map(|ib| ib.count())
            .ok_or_else(|| EngineError::RenderQueue("vertex array has no index buffer".into()))?;
        self.submit_indexed(shader, vertex_array, transform, material, count)
    }

    /// Draws only the first `index_count` indices, for partially filled
    /// dynamic geometry.
    pub fn submit_indexed(
        &mut self,
        shader: &Arc<Shader>,
        vertex_array: &Arc<VertexArray>,
        transform: Mat4,
        material: &Material,
        index_count: u32,
    ) -> Result<()> {
        let available = vertex_array
            .index_buffer()
            .map(|ib| ib.count())
            .ok_or_else(|| EngineError::RenderQueue("vertex array has no index buffer".into()))?;
        self.commands.push(RenderCommand::DrawIndexed(DrawCall {
            shader: Arc::clone(shader),
            vertex_array: Arc::clone(vertex_array),
            transform,
            material: material.clone(),
            index_count: index_count.min(available),
        }))
    }

    /// Sets the viewport used by the following flushes. Draws land in the
    /// top-left `width` x `height` pixels of the target.
    pub fn on_window_resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Drops everything recorded since the last flush, e.g. when no frame
    /// could be acquired.
    pub fn discard(&mut self) {
        if let Err(e) = self.commands.compile() {
            warn!("Discarding frame: {e}");
        }
    }

    /// Statistics of the last flushed frame.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Encodes and submits every scene recorded since the last flush into
    /// `target`, whose extent is `size`. The first pass always clears so the
    /// frame never shows stale swapchain contents.
    pub fn flush(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Result<RenderStats> {
        let clear_color = self.commands.clear_color();
        let mut passes = self.commands.compile()?;
        if passes.is_empty() {
            passes.push(ScenePass {
                clear: Some(clear_color),
                view_projection: Mat4::IDENTITY,
                draws: Vec::new(),
            });
        }
        if passes[0].clear.is_none() {
            passes[0].clear = Some(clear_color);
        }

        let cached = self.pipelines.len();
        self.pipelines.retain(|_, entry| entry.shader.strong_count() > 0);
        if self.pipelines.len() < cached {
            debug!("Evicted {} pipelines of dropped shaders", cached - self.pipelines.len());
        }

        let mut keys = Vec::new();
        for draw in passes.iter().flat_map(|p| &p.draws) {
            let key = PipelineKey {
                shader: draw.shader.id(),
                layout: draw.vertex_array.layout_key(),
                format,
            };
            if !self.pipelines.contains_key(&key) {
                let pipeline = self.create_pipeline(device, &draw.shader, &draw.vertex_array, format)?;
                self.pipelines.insert(
                    key.clone(),
                    CachedPipeline {
                        shader: Arc::downgrade(&draw.shader),
                        pipeline,
                    },
                );
            }
            keys.push(key);
        }

        let scenes: Vec<SceneUniform> = passes
            .iter()
            .map(|p| SceneUniform {
                view_projection: p.view_projection.to_cols_array(),
            })
            .collect();
        let objects: Vec<ObjectUniform> = passes
            .iter()
            .flat_map(|p| &p.draws)
            .map(|d| ObjectUniform {
                transform: d.transform.to_cols_array(),
                color: d.material.color.to_array(),
                params: d.material.params.to_array(),
            })
            .collect();
        self.scene_uniforms.reserve(device, &self.scene_layout, scenes.len() as u64);
        self.object_uniforms.reserve(device, &self.object_layout, objects.len() as u64);
        self.scene_uniforms.write(queue, &scenes);
        self.object_uniforms.write(queue, &objects);

        self.ensure_depth(device, size);
        let target_size = (size.0.max(1), size.1.max(1));
        let (viewport_width, viewport_height) = clamp_viewport(self.viewport, target_size);
        let Some(depth) = &self.depth else {
            return Err(EngineError::RenderQueue("depth target missing".into()));
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        let mut draw_index = 0usize;
        for (scene_index, pass) in passes.iter().enumerate() {
            let (color_load, depth_load) = match pass.clear {
                Some(c) => (
                    wgpu::LoadOp::Clear(wgpu::Color {
                        r: c.x as f64,
                        g: c.y as f64,
                        b: c.z as f64,
                        a: c.w as f64,
                    }),
                    wgpu::LoadOp::Clear(1.0),
                ),
                None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_viewport(0.0, 0.0, viewport_width as f32, viewport_height as f32, 0.0, 1.0);
            render_pass.set_bind_group(0, &self.scene_uniforms.bind_group, &[self.scene_uniforms.offset(scene_index)]);
            for draw in &pass.draws {
                let Some(pipeline) = self.pipelines.get(&keys[draw_index]).map(|entry| &entry.pipeline) else {
                    warn!("Missing pipeline for shader `{}`", draw.shader.name());
                    draw_index += 1;
                    continue;
                };
                let Some(index_buffer) = draw.vertex_array.index_buffer() else {
                    draw_index += 1;
                    continue;
                };
                let texture = draw.material.texture.as_deref().unwrap_or(&self.white_texture);

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &self.object_uniforms.bind_group, &[self.object_uniforms.offset(draw_index)]);
                render_pass.set_bind_group(2, texture.bind_group(), &[]);
                for (slot, vertex_buffer) in draw.vertex_array.vertex_buffers().iter().enumerate() {
                    render_pass.set_vertex_buffer(slot as u32, vertex_buffer.buffer().slice(..));
                }
                render_pass.set_index_buffer(index_buffer.buffer().slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
                draw_index += 1;
            }
        }

        queue.submit(std::iter::once(encoder.finish()));

        self.stats = RenderStats {
            scenes: passes.len() as u32,
            draw_calls: draw_index as u32,
        };
        Ok(self.stats)
    }

    fn create_pipeline(
        &self,
        device: &wgpu::Device,
        shader: &Shader,
        vertex_array: &VertexArray,
        format: wgpu::TextureFormat,
    ) -> Result<wgpu::RenderPipeline> {
        debug!("Creating pipeline for shader `{}`", shader.name());
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let buffers = vertex_array.vertex_buffer_layouts();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(shader.name()),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader.module(),
                entry_point: VERTEX_ENTRY,
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader.module(),
                entry_point: FRAGMENT_ENTRY,
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: vertex_array.topology(),
                strip_index_format: vertex_array.topology().is_strip().then_some(wgpu::IndexFormat::Uint32),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });
        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(EngineError::Pipeline {
                name: shader.name().to_owned(),
                message: err.to_string(),
            }),
            None => Ok(pipeline),
        }
    }

    fn ensure_depth(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        let size = (size.0.max(1), size.1.max(1));
        if self.depth.as_ref().is_some_and(|d| d.size == size) {
            return;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            label: Some("Depth Texture"),
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some(DepthTarget { view, size });
    }
}
