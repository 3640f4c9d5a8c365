//! WGSL shaders and a name-keyed shader library.
//!
//! Every shader exposes `vs_main` and `fs_main` and may use the renderer's
//! bind groups: scene uniforms at group 0, per-draw uniforms at group 1 and
//! the material texture at group 2.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error};

use crate::engine::error::{EngineError, Result};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

static NEXT_SHADER_ID: AtomicU64 = AtomicU64::new(1);

pub struct Shader {
    id: u64,
    name: String,
    module: wgpu::ShaderModule,
}

impl Shader {
    pub fn from_source(device: &wgpu::Device, name: &str, source: &str) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_owned())),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            error!("Shader `{}` failed to compile", name);
            return Err(EngineError::ShaderCompile {
                name: name.to_owned(),
                message: err.to_string(),
            });
        }
        debug!("Compiled shader `{}`", name);
        Ok(Self {
            id: NEXT_SHADER_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_owned(),
            module,
        })
    }

    /// Loads a WGSL file; the shader is named after the file stem.
    pub fn from_file(device: &wgpu::Device, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_source(device, &name_from_path(path), &source)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }
}

/// `assets/shaders/Texture.wgsl` -> `Texture`
pub fn name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Default)]
pub struct ShaderLibrary {
    shaders: HashMap<String, Arc<Shader>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, shader: Shader) -> Result<Arc<Shader>> {
        let name = shader.name().to_owned();
        self.add_named(name, shader)
    }

    pub fn add_named(&mut self, name: impl Into<String>, shader: Shader) -> Result<Arc<Shader>> {
        let name = name.into();
        if self.exists(&name) {
            return Err(EngineError::ShaderExists(name));
        }
        let shader = Arc::new(shader);
        self.shaders.insert(name, Arc::clone(&shader));
        Ok(shader)
    }

    pub fn load(&mut self, device: &wgpu::Device, path: impl AsRef<Path>) -> Result<Arc<Shader>> {
        let shader = Shader::from_file(device, path)?;
        self.add(shader)
    }

    pub fn load_named(&mut self, device: &wgpu::Device, name: &str, path: impl AsRef<Path>) -> Result<Arc<Shader>> {
        let shader = Shader::from_file(device, path)?;
        self.add_named(name, shader)
    }

    pub fn get(&self, name: &str) -> Result<Arc<Shader>> {
        self.shaders
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::ShaderNotFound(name.to_owned()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_come_from_file_stem() {
        assert_eq!(name_from_path(Path::new("assets/shaders/Texture.wgsl")), "Texture");
        assert_eq!(name_from_path(Path::new("flat.color.wgsl")), "flat.color");
        assert_eq!(name_from_path(Path::new("")), "");
    }

    #[test]
    fn missing_shader_is_an_error() {
        let library = ShaderLibrary::new();
        assert!(!library.exists("Texture"));
        assert!(matches!(library.get("Texture"), Err(EngineError::ShaderNotFound(name)) if name == "Texture"));
    }
}
