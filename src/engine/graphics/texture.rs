use std::path::{Path, PathBuf};

use image::{imageops, RgbaImage};
use log::info;

use crate::engine::error::{EngineError, Result};

const BYTES_PER_PIXEL: u32 = 4;

/// Layout of the material bind group (group 2): texture + sampler.
pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Texture Bind Group Layout"),
        entries: &[
            // Texture
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            // Sampler
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// RGBA8 2D texture sampled with linear minification and repeat wrapping.
/// Magnification is nearest unless chosen with `with_filter`.
pub struct Texture2D {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
    mag_filter: wgpu::FilterMode,
    path: Option<PathBuf>,
}

impl Texture2D {
    /// Uninitialised texture, to be filled with `set_data`.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self::with_filter(device, width, height, wgpu::FilterMode::Nearest)
    }

    pub fn with_filter(device: &wgpu::Device, width: u32, height: u32, mag_filter: wgpu::FilterMode) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            label: Some("Texture2D"),
            view_formats: &[],
        });

        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let texture_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Bind Group"),
            layout: &bind_group_layout(device),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture_sampler),
                },
            ],
        });

        Self {
            texture,
            bind_group,
            width,
            height,
            mag_filter,
            path: None,
        }
    }

    pub fn from_rgba(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32, data: &[u8]) -> Result<Self> {
        let texture = Self::new(device, width, height);
        texture.set_data(queue, data)?;
        Ok(texture)
    }

    /// Decodes an image file. Rows are flipped so that UV (0, 0) addresses
    /// the bottom-left pixel.
    pub fn from_path(device: &wgpu::Device, queue: &wgpu::Queue, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rgba = load_rgba(path)?;
        let (width, height) = rgba.dimensions();
        info!("[texture] Loaded texture: {}x{} from {}", width, height, path.display());

        let mut texture = Self::from_rgba(device, queue, width, height, &rgba)?;
        texture.path = Some(path.to_path_buf());
        Ok(texture)
    }

    /// 1x1 opaque white, bound when a draw has no texture.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture = Self::new(device, 1, 1);
        texture.upload(queue, &[255, 255, 255, 255]);
        texture
    }

    /// Replaces the whole texture. `data` must hold exactly
    /// `width * height * 4` bytes.
    pub fn set_data(&self, queue: &wgpu::Queue, data: &[u8]) -> Result<()> {
        let expected = expected_size(self.width, self.height);
        if data.len() != expected {
            return Err(EngineError::TextureDataSize {
                expected,
                actual: data.len(),
            });
        }
        self.upload(queue, data);
        Ok(())
    }

    fn upload(&self, queue: &wgpu::Queue, data: &[u8]) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(BYTES_PER_PIXEL * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mag_filter(&self) -> wgpu::FilterMode {
        self.mag_filter
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Decodes an image file into RGBA8 with the bottom row first, so row 0
/// lines up with UV v = 0.
pub fn load_rgba(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let mut rgba = image::open(path)?.to_rgba8();
    imageops::flip_vertical_in_place(&mut rgba);
    Ok(rgba)
}

pub fn expected_size(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL as usize
}

/// RGBA checkerboard with squares of `check_size` pixels. Light squares are
/// white, dark squares are near-black; blue stays at full intensity so the
/// pattern reads as blue-tinted.
pub fn checkerboard(width: u32, height: u32, check_size: u32) -> Vec<u8> {
    let check_size = check_size.max(1);
    let mut pixels = Vec::with_capacity(expected_size(width, height));
    for y in 0..height {
        for x in 0..width {
            let cx = (x / check_size) & 1;
            let cy = (y / check_size) & 1;
            let c = if cx ^ cy == 1 { 255 } else { 30 };
            pixels.extend_from_slice(&[c, c, 255, 255]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates_per_square() {
        let pixels = checkerboard(4, 4, 2);
        assert_eq!(pixels.len(), expected_size(4, 4));
        let at = |x: usize, y: usize| &pixels[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(at(0, 0), &[30, 30, 255, 255]);
        assert_eq!(at(1, 1), &[30, 30, 255, 255]);
        assert_eq!(at(2, 0), &[255, 255, 255, 255]);
        assert_eq!(at(0, 2), &[255, 255, 255, 255]);
        assert_eq!(at(2, 2), &[30, 30, 255, 255]);
    }

    #[test]
    fn zero_check_size_does_not_divide_by_zero() {
        assert_eq!(checkerboard(2, 1, 0).len(), 8);
    }

    #[test]
    fn loaded_images_start_at_the_bottom_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("column.png");
        let mut source = RgbaImage::new(1, 2);
        source.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        source.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        source.save(&path).unwrap();

        let rgba = load_rgba(&path).unwrap();
        assert_eq!(rgba.dimensions(), (1, 2));
        assert_eq!(rgba.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(rgba.get_pixel(0, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn corrupt_image_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not a png").unwrap();

        assert!(matches!(load_rgba(&path), Err(EngineError::Image(_))));
    }
}
