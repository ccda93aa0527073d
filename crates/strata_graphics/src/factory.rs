//! # Validating Factories
//!
//! A resource comes into existence only by a factory succeeding. Factories
//! validate the request before touching the device context, so the owning
//! tables never see a half-constructed resource.

use strata_core::post_process::ResourceId;

use crate::error::GraphicsError;
use crate::gpu_memory::DeviceContext;
use crate::owner::ResourceHandle;
use crate::resource::{
    Buffer, BufferUsage, FilterMode, Framebuffer, Sampler, Shader, ShaderStage, Texture,
    TextureFormat, TextureSet,
};

/// Builds one resource of type `T` against the device.
///
/// `id` is minted by the controller per creation; the factory threads it
/// into the resource so post-process traffic can name it later.
pub trait ResourceFactory<T> {
    /// Validates the request and constructs the resource.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphicsError`] describing the invalid request or the
    /// exhausted budget. A failed creation leaves no trace in the device.
    fn create(&self, device: &DeviceContext, id: ResourceId) -> Result<T, GraphicsError>;
}

/// Factory for [`Buffer`]s. Rejects zero-size requests.
pub struct BufferFactory {
    /// Size in bytes.
    pub size: usize,
    /// Expected write pattern.
    pub usage: BufferUsage,
}

impl ResourceFactory<Buffer> for BufferFactory {
    fn create(&self, device: &DeviceContext, id: ResourceId) -> Result<Buffer, GraphicsError> {
        if self.size == 0 {
            return Err(GraphicsError::InvalidBufferSize);
        }
        let block = device.memory().default_allocator().allocate(self.size)?;
        Ok(Buffer::new(id, self.usage, block))
    }
}

/// Factory for [`Texture`]s. Rejects zero extents.
pub struct TextureFactory {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel format.
    pub format: TextureFormat,
}

impl ResourceFactory<Texture> for TextureFactory {
    fn create(&self, _device: &DeviceContext, id: ResourceId) -> Result<Texture, GraphicsError> {
        if self.width == 0 || self.height == 0 {
            return Err(GraphicsError::InvalidExtent {
                width: self.width,
                height: self.height,
            });
        }
        Ok(Texture::new(id, self.width, self.height, self.format))
    }
}

/// Factory for [`Shader`]s. Rejects empty source.
pub struct ShaderFactory {
    /// Target stage.
    pub stage: ShaderStage,
    /// Source text.
    pub source: String,
}

impl ResourceFactory<Shader> for ShaderFactory {
    fn create(&self, _device: &DeviceContext, id: ResourceId) -> Result<Shader, GraphicsError> {
        if self.source.trim().is_empty() {
            return Err(GraphicsError::EmptyShaderSource);
        }
        Ok(Shader::new(id, self.stage, self.source.clone()))
    }
}

/// Factory for [`Sampler`]s.
pub struct SamplerFactory {
    /// Filter mode.
    pub filter: FilterMode,
}

impl ResourceFactory<Sampler> for SamplerFactory {
    fn create(&self, _device: &DeviceContext, id: ResourceId) -> Result<Sampler, GraphicsError> {
        Ok(Sampler::new(id, self.filter))
    }
}

/// Factory for [`Framebuffer`]s. Rejects zero extents.
pub struct FramebufferFactory {
    /// Render area width.
    pub width: u32,
    /// Render area height.
    pub height: u32,
    /// Optional color attachment.
    pub color: Option<ResourceHandle<Texture>>,
}

impl ResourceFactory<Framebuffer> for FramebufferFactory {
    fn create(
        &self,
        _device: &DeviceContext,
        id: ResourceId,
    ) -> Result<Framebuffer, GraphicsError> {
        if self.width == 0 || self.height == 0 {
            return Err(GraphicsError::InvalidExtent {
                width: self.width,
                height: self.height,
            });
        }
        Ok(Framebuffer::new(id, self.width, self.height, self.color))
    }
}

/// Factory for [`TextureSet`]s. Rejects empty sets.
pub struct TextureSetFactory {
    /// Bound textures in binding order.
    pub textures: Vec<ResourceHandle<Texture>>,
    /// Samplers paired with textures by position.
    pub samplers: Vec<ResourceHandle<Sampler>>,
}

impl ResourceFactory<TextureSet> for TextureSetFactory {
    fn create(
        &self,
        _device: &DeviceContext,
        id: ResourceId,
    ) -> Result<TextureSet, GraphicsError> {
        if self.textures.is_empty() {
            return Err(GraphicsError::EmptyTextureSet);
        }
        Ok(TextureSet::new(
            id,
            self.textures.clone(),
            self.samplers.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_buffer_rejected() {
        let device = DeviceContext::new(1024);
        let factory = BufferFactory {
            size: 0,
            usage: BufferUsage::Static,
        };
        assert!(matches!(
            factory.create(&device, ResourceId(1)),
            Err(GraphicsError::InvalidBufferSize)
        ));
        // Nothing was carved from the budget.
        assert_eq!(device.memory().default_allocator().used(), 0);
    }

    #[test]
    fn test_zero_extent_texture_rejected() {
        let device = DeviceContext::new(1024);
        let factory = TextureFactory {
            width: 16,
            height: 0,
            format: TextureFormat::Rgba8,
        };
        assert!(matches!(
            factory.create(&device, ResourceId(1)),
            Err(GraphicsError::InvalidExtent {
                width: 16,
                height: 0
            })
        ));
    }

    #[test]
    fn test_empty_shader_source_rejected() {
        let device = DeviceContext::new(1024);
        let factory = ShaderFactory {
            stage: ShaderStage::Vertex,
            source: "   ".to_string(),
        };
        assert!(matches!(
            factory.create(&device, ResourceId(1)),
            Err(GraphicsError::EmptyShaderSource)
        ));
    }

    #[test]
    fn test_buffer_creation_consumes_budget() {
        let device = DeviceContext::new(1024);
        let factory = BufferFactory {
            size: 256,
            usage: BufferUsage::Dynamic,
        };
        let buffer = factory.create(&device, ResourceId(2)).unwrap();
        assert_eq!(buffer.size(), 256);
        assert_eq!(buffer.usage(), BufferUsage::Dynamic);
        assert_eq!(device.memory().default_allocator().used(), 256);
    }
}
