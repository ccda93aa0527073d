//! # Strata Graphics
//!
//! The render-thread resource layer: who owns GPU resources, how long they
//! live, and how their state is reported back to the update thread.
//!
//! ## Ownership Model
//!
//! ```text
//! Controller ──owns──> ObjectOwner<Buffer>, ObjectOwner<Texture>, ...
//!      │                        │
//!      │ create_*(factory)      │ slot table (sole owner)
//!      ▼                        ▼
//! ResourceFactory ──ok──> register ──> Accessor<T> (weak, re-checked)
//! ```
//!
//! Exactly one [`ObjectOwner`] per resource type holds the values; all
//! other references are [`Accessor`]s that re-check existence on every
//! use. The [`Controller`] is the sole factory caller and registrar, so a
//! failed creation never leaks into a table. Resource state changes that
//! the update thread cares about (uploads, deletions, save requests) cross
//! back through the shared `ResourcePostProcessQueue`.
//!
//! No real device backend lives here; this layer models the lifetime and
//! budgeting rules a backend is driven through.

pub mod controller;
pub mod error;
pub mod factory;
pub mod fence;
pub mod gpu_memory;
pub mod owner;
pub mod pipeline_cache;
pub mod resource;

pub use controller::{Controller, RenderCommand};
pub use error::GraphicsError;
pub use factory::{
    BufferFactory, FramebufferFactory, ResourceFactory, SamplerFactory, ShaderFactory,
    TextureFactory, TextureSetFactory,
};
pub use fence::Fence;
pub use gpu_memory::{
    AllocatorUid, DeviceContext, GpuMemoryAllocator, GpuMemoryBlock, GpuMemoryManager,
};
pub use owner::{Accessor, ObjectOwner, ResourceHandle};
pub use pipeline_cache::PipelineDesc;
pub use resource::{
    Buffer, BufferUsage, FilterMode, Framebuffer, Pipeline, Sampler, Shader, ShaderStage, Texture,
    TextureFormat, TextureSet,
};
