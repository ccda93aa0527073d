//! # Resource Types
//!
//! Move-only values constructible only through the factory path; user code
//! reaches them via `Accessor<T>`. Each carries the [`ResourceId`] the
//! controller minted for it, which is what crosses back to the update
//! thread in post-process requests.

use strata_core::post_process::ResourceId;

use crate::gpu_memory::GpuMemoryBlock;
use crate::owner::ResourceHandle;
use crate::pipeline_cache::PipelineDesc;

/// How buffer contents are expected to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once, read many frames.
    Static,
    /// Rewritten frequently, potentially every frame.
    Dynamic,
}

/// Texel layout of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA.
    Rgba8,
    /// 8-bit BGRA.
    Bgra8,
    /// Single 8-bit channel.
    R8,
}

/// Programmable stage a shader targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

/// Texture sampling filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    /// Nearest-texel sampling.
    Nearest,
    /// Linear interpolation between texels.
    Linear,
}

/// A device buffer backed by one memory block.
pub struct Buffer {
    id: ResourceId,
    usage: BufferUsage,
    block: GpuMemoryBlock,
}

impl Buffer {
    pub(crate) fn new(id: ResourceId, usage: BufferUsage, block: GpuMemoryBlock) -> Self {
        Self { id, usage, block }
    }

    /// The controller-minted resource id.
    #[inline]
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.id
    }

    /// Declared usage pattern.
    #[inline]
    #[must_use]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.block.size()
    }

    /// The backing memory block.
    #[must_use]
    pub fn block(&self) -> &GpuMemoryBlock {
        &self.block
    }
}

/// A 2D device texture.
pub struct Texture {
    id: ResourceId,
    width: u32,
    height: u32,
    format: TextureFormat,
}

impl Texture {
    pub(crate) fn new(id: ResourceId, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            id,
            width,
            height,
            format,
        }
    }

    /// The controller-minted resource id.
    #[inline]
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.id
    }

    /// Width in texels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel format.
    #[inline]
    #[must_use]
    pub fn format(&self) -> TextureFormat {
        self.format
    }
}

/// Textures and samplers bound together for one draw.
pub struct TextureSet {
    id: ResourceId,
    textures: Vec<ResourceHandle<Texture>>,
    samplers: Vec<ResourceHandle<Sampler>>,
}

impl TextureSet {
    pub(crate) fn new(
        id: ResourceId,
        textures: Vec<ResourceHandle<Texture>>,
        samplers: Vec<ResourceHandle<Sampler>>,
    ) -> Self {
        Self {
            id,
            textures,
            samplers,
        }
    }

    /// The controller-minted resource id.
    #[inline]
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.id
    }

    /// Bound textures in binding order.
    #[must_use]
    pub fn textures(&self) -> &[ResourceHandle<Texture>] {
        &self.textures
    }

    /// Bound samplers, paired with textures by position.
    #[must_use]
    pub fn samplers(&self) -> &[ResourceHandle<Sampler>] {
        &self.samplers
    }
}

/// Compiled shader source for one stage.
pub struct Shader {
    id: ResourceId,
    stage: ShaderStage,
    source: String,
}

impl Shader {
    pub(crate) fn new(id: ResourceId, stage: ShaderStage, source: String) -> Self {
        Self { id, stage, source }
    }

    /// The controller-minted resource id.
    #[inline]
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.id
    }

    /// Target stage.
    #[inline]
    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Texture sampling state.
pub struct Sampler {
    id: ResourceId,
    filter: FilterMode,
}

impl Sampler {
    pub(crate) fn new(id: ResourceId, filter: FilterMode) -> Self {
        Self { id, filter }
    }

    /// The controller-minted resource id.
    #[inline]
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.id
    }

    /// Filter mode.
    #[inline]
    #[must_use]
    pub fn filter(&self) -> FilterMode {
        self.filter
    }
}

/// An offscreen render target.
pub struct Framebuffer {
    id: ResourceId,
    width: u32,
    height: u32,
    color: Option<ResourceHandle<Texture>>,
}

impl Framebuffer {
    pub(crate) fn new(
        id: ResourceId,
        width: u32,
        height: u32,
        color: Option<ResourceHandle<Texture>>,
    ) -> Self {
        Self {
            id,
            width,
            height,
            color,
        }
    }

    /// The controller-minted resource id.
    #[inline]
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.id
    }

    /// Render area width.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Render area height.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color attachment, if rendering to a texture.
    #[must_use]
    pub fn color_attachment(&self) -> Option<ResourceHandle<Texture>> {
        self.color
    }
}

/// A deduplicated shader-pair pipeline.
pub struct Pipeline {
    id: ResourceId,
    desc: PipelineDesc,
}

impl Pipeline {
    pub(crate) fn new(id: ResourceId, desc: PipelineDesc) -> Self {
        Self { id, desc }
    }

    /// The controller-minted resource id.
    #[inline]
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.id
    }

    /// The shader pair this pipeline was built from.
    #[inline]
    #[must_use]
    pub fn desc(&self) -> PipelineDesc {
        self.desc
    }
}
