//! # Graphics Controller
//!
//! The render thread's single entry point to the resource layer. The
//! controller is the only caller of factories and the only registrar into
//! the owner tables, so a failed creation can never leak a half-built
//! resource into them.
//!
//! Frames are explicit: `begin_frame` opens a submission list, `submit`
//! appends to it, `end_frame` retires it. Opening a second frame without
//! closing the first is a programming error and panics.
//!
//! State that the update thread must learn about (uploads completing,
//! resources dying) leaves through the shared post-process queue rather
//! than any direct call across threads.

use std::sync::Arc;

use strata_core::post_process::{
    PostProcessAction, ResourceId, ResourcePostProcess, ResourcePostProcessQueue,
};

use crate::error::GraphicsError;
use crate::factory::{
    BufferFactory, FramebufferFactory, ResourceFactory, SamplerFactory, ShaderFactory,
    TextureFactory, TextureSetFactory,
};
use crate::gpu_memory::DeviceContext;
use crate::owner::{Accessor, ObjectOwner, ResourceHandle};
use crate::pipeline_cache::{PipelineCache, PipelineDesc};
use crate::resource::{
    Buffer, BufferUsage, Framebuffer, Pipeline, Sampler, Shader, Texture, TextureSet,
};

/// One recorded draw-list entry for the current frame.
#[derive(Clone, Copy, Debug)]
pub enum RenderCommand {
    /// Clear the current target.
    Clear {
        /// RGBA clear color.
        color: [f32; 4],
    },
    /// Draw `vertex_count` vertices from `vertices` through `pipeline`.
    Draw {
        /// Pipeline to bind.
        pipeline: ResourceHandle<Pipeline>,
        /// Vertex buffer to source.
        vertices: ResourceHandle<Buffer>,
        /// Textures bound for the draw, if any.
        textures: Option<ResourceHandle<TextureSet>>,
        /// Number of vertices.
        vertex_count: u32,
    },
}

/// Sole factory caller, sole registrar, frame-scoped command collector.
pub struct Controller {
    device: DeviceContext,
    buffers: ObjectOwner<Buffer>,
    textures: ObjectOwner<Texture>,
    texture_sets: ObjectOwner<TextureSet>,
    shaders: ObjectOwner<Shader>,
    samplers: ObjectOwner<Sampler>,
    framebuffers: ObjectOwner<Framebuffer>,
    pipelines: ObjectOwner<Pipeline>,
    pipeline_cache: PipelineCache,
    post_process: Arc<ResourcePostProcessQueue>,
    next_resource_id: u64,
    frame_open: bool,
    commands: Vec<RenderCommand>,
    frames_submitted: u64,
}

impl Controller {
    /// Creates a controller with `memory_budget` bytes of device memory,
    /// reporting resource state through `post_process`.
    #[must_use]
    pub fn new(memory_budget: usize, post_process: Arc<ResourcePostProcessQueue>) -> Self {
        Self {
            device: DeviceContext::new(memory_budget),
            buffers: ObjectOwner::new(),
            textures: ObjectOwner::new(),
            texture_sets: ObjectOwner::new(),
            shaders: ObjectOwner::new(),
            samplers: ObjectOwner::new(),
            framebuffers: ObjectOwner::new(),
            pipelines: ObjectOwner::new(),
            pipeline_cache: PipelineCache::new(),
            post_process,
            next_resource_id: 1,
            frame_open: false,
            commands: Vec::new(),
            frames_submitted: 0,
        }
    }

    /// The device context factories run against.
    #[must_use]
    pub fn device(&self) -> &DeviceContext {
        &self.device
    }

    /// Frames retired so far.
    #[must_use]
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    fn mint_id(&mut self) -> ResourceId {
        let id = ResourceId(self.next_resource_id);
        self.next_resource_id += 1;
        id
    }

    // -------------------------------------------------------------------
    // Creation: validate through the factory, register only on success.
    // -------------------------------------------------------------------

    /// Creates a buffer through `factory`.
    ///
    /// # Errors
    ///
    /// Propagates the factory's validation or budget error; nothing is
    /// registered on failure.
    pub fn create_buffer(
        &mut self,
        factory: &BufferFactory,
    ) -> Result<Accessor<Buffer>, GraphicsError> {
        let id = self.mint_id();
        let buffer = factory.create(&self.device, id)?;
        tracing::debug!(id = id.0, size = buffer.size(), "buffer created");
        Ok(self.buffers.register(buffer))
    }

    /// Creates a write-once buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// See [`create_buffer`](Self::create_buffer).
    pub fn create_static_buffer(&mut self, size: usize) -> Result<Accessor<Buffer>, GraphicsError> {
        self.create_buffer(&BufferFactory {
            size,
            usage: BufferUsage::Static,
        })
    }

    /// Creates a frequently-rewritten buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// See [`create_buffer`](Self::create_buffer).
    pub fn create_dynamic_buffer(
        &mut self,
        size: usize,
    ) -> Result<Accessor<Buffer>, GraphicsError> {
        self.create_buffer(&BufferFactory {
            size,
            usage: BufferUsage::Dynamic,
        })
    }

    /// Creates a texture through `factory`.
    ///
    /// # Errors
    ///
    /// Propagates the factory's validation error.
    pub fn create_texture(
        &mut self,
        factory: &TextureFactory,
    ) -> Result<Accessor<Texture>, GraphicsError> {
        let id = self.mint_id();
        let texture = factory.create(&self.device, id)?;
        Ok(self.textures.register(texture))
    }

    /// Creates a texture set through `factory`, over already-created
    /// textures and samplers.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::EmptyTextureSet`] for an empty request or
    /// [`GraphicsError::DeadResource`] when a named texture has died.
    pub fn create_texture_set(
        &mut self,
        factory: &TextureSetFactory,
    ) -> Result<Accessor<TextureSet>, GraphicsError> {
        if factory.textures.iter().any(|t| !self.textures.contains(*t)) {
            return Err(GraphicsError::DeadResource);
        }
        let id = self.mint_id();
        let set = factory.create(&self.device, id)?;
        Ok(self.texture_sets.register(set))
    }

    /// Creates a shader through `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::EmptyShaderSource`] for blank source.
    pub fn create_shader(
        &mut self,
        factory: &ShaderFactory,
    ) -> Result<Accessor<Shader>, GraphicsError> {
        let id = self.mint_id();
        let shader = factory.create(&self.device, id)?;
        Ok(self.shaders.register(shader))
    }

    /// Creates a sampler through `factory`.
    ///
    /// # Errors
    ///
    /// Propagates the factory's error (currently infallible validation).
    pub fn create_sampler(
        &mut self,
        factory: &SamplerFactory,
    ) -> Result<Accessor<Sampler>, GraphicsError> {
        let id = self.mint_id();
        let sampler = factory.create(&self.device, id)?;
        Ok(self.samplers.register(sampler))
    }

    /// Creates a framebuffer through `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidExtent`] for zero extents.
    pub fn create_framebuffer(
        &mut self,
        factory: &FramebufferFactory,
    ) -> Result<Accessor<Framebuffer>, GraphicsError> {
        let id = self.mint_id();
        let framebuffer = factory.create(&self.device, id)?;
        Ok(self.framebuffers.register(framebuffer))
    }

    /// Returns the pipeline for a shader pair, creating it at most once.
    ///
    /// Value-equal pairs share one pipeline: the returned accessor for a
    /// repeated pair refers to the same resource as the first call's.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DeadShader`] when either shader has died.
    pub fn create_pipeline(
        &mut self,
        vertex: &Accessor<Shader>,
        fragment: &Accessor<Shader>,
    ) -> Result<Accessor<Pipeline>, GraphicsError> {
        if !vertex.exists() || !fragment.exists() {
            return Err(GraphicsError::DeadShader);
        }
        let desc = PipelineDesc {
            vertex: vertex.handle(),
            fragment: fragment.handle(),
        };
        if let Some(cached) = self.pipeline_cache.get(desc) {
            return Ok(cached);
        }
        let id = self.mint_id();
        let accessor = self.pipelines.register(Pipeline::new(id, desc));
        self.pipeline_cache.insert(desc, accessor.clone());
        tracing::debug!(id = id.0, "pipeline created");
        Ok(accessor)
    }

    // -------------------------------------------------------------------
    // Data movement and release, reported to the update thread.
    // -------------------------------------------------------------------

    /// Uploads `data` into a buffer and reports the upload.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DeadResource`] for a dead buffer, or the
    /// block's map/write error.
    pub fn upload_buffer(
        &self,
        buffer: &Accessor<Buffer>,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let id = buffer
            .with(|b| {
                let block = b.block();
                block.map()?;
                let write = block.write(data).and_then(|()| block.flush());
                block.unmap()?;
                write.map(|()| b.resource_id())
            })
            .ok_or(GraphicsError::DeadResource)??;
        self.post_process.post(ResourcePostProcess {
            id,
            action: PostProcessAction::Uploaded,
        });
        Ok(())
    }

    /// Uploads a typed slice; bytes are the POD view of `data`.
    ///
    /// # Errors
    ///
    /// See [`upload_buffer`](Self::upload_buffer).
    pub fn upload_pod<P: bytemuck::Pod>(
        &self,
        buffer: &Accessor<Buffer>,
        data: &[P],
    ) -> Result<(), GraphicsError> {
        self.upload_buffer(buffer, bytemuck::cast_slice(data))
    }

    /// Requests that a resource's device contents be saved back.
    ///
    /// The update thread validates the request against its bookkeeping; a
    /// save racing a delete in the same frame is applied first there.
    pub fn request_save(&self, id: ResourceId) {
        self.post_process.post(ResourcePostProcess {
            id,
            action: PostProcessAction::Save,
        });
    }

    /// Releases a buffer, returning its memory and reporting the deletion.
    pub fn release_buffer(&mut self, handle: ResourceHandle<Buffer>) {
        if let Some(buffer) = self.buffers.release(handle) {
            buffer.block().release();
            self.post_process.post(ResourcePostProcess {
                id: buffer.resource_id(),
                action: PostProcessAction::Deleted,
            });
        }
    }

    /// Releases a texture and reports the deletion.
    pub fn release_texture(&mut self, handle: ResourceHandle<Texture>) {
        if let Some(texture) = self.textures.release(handle) {
            self.post_process.post(ResourcePostProcess {
                id: texture.resource_id(),
                action: PostProcessAction::Deleted,
            });
        }
    }

    // -------------------------------------------------------------------
    // Frame protocol.
    // -------------------------------------------------------------------

    /// Opens a frame's submission list.
    ///
    /// # Panics
    ///
    /// Panics if a frame is already open.
    pub fn begin_frame(&mut self) {
        assert!(
            !self.frame_open,
            "begin_frame while the previous frame is still open"
        );
        self.frame_open = true;
        self.commands.clear();
    }

    /// Appends a command to the open frame.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn submit(&mut self, command: RenderCommand) {
        assert!(self.frame_open, "submit outside begin_frame/end_frame");
        self.commands.push(command);
    }

    /// Closes the frame and retires its submission list.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn end_frame(&mut self) -> Vec<RenderCommand> {
        assert!(self.frame_open, "end_frame without begin_frame");
        self.frame_open = false;
        self.frames_submitted += 1;
        tracing::trace!(
            frame = self.frames_submitted,
            commands = self.commands.len(),
            "frame retired"
        );
        std::mem::take(&mut self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{FilterMode, ShaderStage, TextureFormat};

    fn controller() -> Controller {
        Controller::new(1 << 20, Arc::new(ResourcePostProcessQueue::new()))
    }

    fn shader_factory(stage: ShaderStage, source: &str) -> ShaderFactory {
        ShaderFactory {
            stage,
            source: source.to_string(),
        }
    }

    #[test]
    fn test_failed_creation_registers_nothing() {
        let mut controller = controller();
        assert!(controller.create_static_buffer(0).is_err());
        assert!(controller.buffers.is_empty());
        assert_eq!(controller.device().memory().default_allocator().used(), 0);
    }

    #[test]
    fn test_pipeline_pairs_deduplicate_by_value() {
        let mut controller = controller();
        let vs_a = controller
            .create_shader(&shader_factory(ShaderStage::Vertex, "void main() {}"))
            .unwrap();
        let fs_b = controller
            .create_shader(&shader_factory(ShaderStage::Fragment, "void main() {}"))
            .unwrap();
        let vs_c = controller
            .create_shader(&shader_factory(ShaderStage::Vertex, "void other() {}"))
            .unwrap();

        let first = controller.create_pipeline(&vs_a, &fs_b).unwrap();
        let repeat = controller.create_pipeline(&vs_a, &fs_b).unwrap();
        let distinct = controller.create_pipeline(&vs_c, &fs_b).unwrap();

        assert_eq!(first.handle(), repeat.handle());
        assert_ne!(first.handle(), distinct.handle());
        assert_eq!(controller.pipelines.len(), 2);
    }

    #[test]
    fn test_pipeline_with_dead_shader_fails() {
        let mut controller = controller();
        let vs = controller
            .create_shader(&shader_factory(ShaderStage::Vertex, "void main() {}"))
            .unwrap();
        let fs = controller
            .create_shader(&shader_factory(ShaderStage::Fragment, "void main() {}"))
            .unwrap();
        controller.shaders.release(fs.handle());

        assert!(matches!(
            controller.create_pipeline(&vs, &fs),
            Err(GraphicsError::DeadShader)
        ));
    }

    #[test]
    fn test_upload_and_release_report_post_process() {
        let queue = Arc::new(ResourcePostProcessQueue::new());
        let mut controller = Controller::new(1 << 20, Arc::clone(&queue));
        let buffer = controller.create_static_buffer(64).unwrap();

        let vertices: [f32; 3] = [0.0, 0.5, 1.0];
        controller.upload_pod(&buffer, &vertices).unwrap();
        controller.release_buffer(buffer.handle());
        assert!(!buffer.exists());

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].action, PostProcessAction::Uploaded);
        assert_eq!(drained[1].action, PostProcessAction::Deleted);
        assert_eq!(drained[0].id, drained[1].id);

        // Budget returned with the buffer's block.
        assert_eq!(controller.device().memory().default_allocator().used(), 0);
    }

    #[test]
    #[should_panic(expected = "begin_frame while the previous frame is still open")]
    fn test_double_begin_frame_panics() {
        let mut controller = controller();
        controller.begin_frame();
        controller.begin_frame();
    }

    #[test]
    fn test_frame_commands_retire_on_end() {
        let mut controller = controller();
        controller.begin_frame();
        controller.submit(RenderCommand::Clear {
            color: [0.0, 0.0, 0.0, 1.0],
        });
        let commands = controller.end_frame();
        assert_eq!(commands.len(), 1);
        assert_eq!(controller.frames_submitted(), 1);

        controller.begin_frame();
        assert!(controller.end_frame().is_empty());
    }

    #[test]
    fn test_texture_set_requires_live_textures() {
        let mut controller = controller();
        let texture = controller
            .create_texture(&TextureFactory {
                width: 4,
                height: 4,
                format: TextureFormat::Rgba8,
            })
            .unwrap();
        let sampler = controller
            .create_sampler(&SamplerFactory {
                filter: FilterMode::Linear,
            })
            .unwrap();

        let set = controller
            .create_texture_set(&TextureSetFactory {
                textures: vec![texture.handle()],
                samplers: vec![sampler.handle()],
            })
            .unwrap();
        assert!(set.exists());

        controller.release_texture(texture.handle());
        assert!(matches!(
            controller.create_texture_set(&TextureSetFactory {
                textures: vec![texture.handle()],
                samplers: vec![],
            }),
            Err(GraphicsError::DeadResource)
        ));
    }
}
