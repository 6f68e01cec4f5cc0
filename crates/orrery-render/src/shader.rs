//! Shader module creation with compile diagnostics.

use std::{collections::HashMap, sync::Arc};

use log::{debug, info, warn};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

/// Error types for shader loading operations.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' failed to compile: {message}")]
    CompilationFailed { name: String, message: String },

    #[error("shader '{name}' not found in library")]
    NotLoaded { name: String },
}

/// Named registry of compiled shader modules.
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Compile WGSL and register it under `name`.
    ///
    /// Compile errors reported by the backend are returned as
    /// [`ShaderError::CompilationFailed`] so setup can abort cleanly.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        debug!("Compiling shader '{}'", name);

        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });

        let info = pollster::block_on(module.get_compilation_info());
        let mut errors = Vec::new();
        for message in &info.messages {
            match message.message_type {
                wgpu::CompilationMessageType::Error => errors.push(message.message.clone()),
                wgpu::CompilationMessageType::Warning => {
                    warn!("shader '{}': {}", name, message.message)
                }
                wgpu::CompilationMessageType::Info => {
                    debug!("shader '{}': {}", name, message.message)
                }
            }
        }
        if !errors.is_empty() {
            return Err(ShaderError::CompilationFailed {
                name: name.to_string(),
                message: errors.join("; "),
            });
        }

        let module = Arc::new(module);
        if self
            .modules
            .insert(name.to_string(), module.clone())
            .is_some()
        {
            info!("Replaced shader '{}'", name);
        } else {
            info!("Loaded shader '{}'", name);
        }
        Ok(module)
    }

    pub fn get(&self, name: &str) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderError::NotLoaded {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;

    #[test]
    fn test_missing_shader_is_not_loaded() {
        let library = ShaderLibrary::new();
        assert!(library.is_empty());
        assert!(matches!(
            library.get("scene"),
            Err(ShaderError::NotLoaded { .. })
        ));
    }

    #[test]
    fn test_builtin_shaders_compile() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        for (name, source) in [
            ("shadow", crate::SHADOW_SHADER_SOURCE),
            ("scene", crate::SCENE_SHADER_SOURCE),
            ("skybox", crate::SKYBOX_SHADER_SOURCE),
        ] {
            library.load_from_source(&device, name, source).unwrap();
        }
        assert_eq!(library.len(), 3);
        assert!(library.get("scene").is_ok());
    }

    #[test]
    fn test_reload_replaces_entry() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        library
            .load_from_source(&device, "sky", crate::SKYBOX_SHADER_SOURCE)
            .unwrap();
        library
            .load_from_source(&device, "sky", crate::SKYBOX_SHADER_SOURCE)
            .unwrap();
        assert_eq!(library.len(), 1);
    }
}
