//! Resource-layer error type.

use thiserror::Error;

/// Failures the graphics layer reports instead of panicking.
///
/// Bad inputs and exhausted budgets are runtime conditions the caller can
/// react to; misuse of the frame protocol (double `begin_frame`, submit
/// outside a frame) stays a panic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphicsError {
    /// A buffer was requested with zero size.
    #[error("buffer size must be greater than zero")]
    InvalidBufferSize,
    /// A texture or framebuffer was requested with a zero extent.
    #[error("invalid extent {width}x{height}")]
    InvalidExtent {
        /// Requested width in texels.
        width: u32,
        /// Requested height in texels.
        height: u32,
    },
    /// A shader was requested with empty source.
    #[error("shader source must not be empty")]
    EmptyShaderSource,
    /// A texture set was requested with no textures.
    #[error("texture set must contain at least one texture")]
    EmptyTextureSet,
    /// The allocator's budget cannot cover the request.
    #[error("out of device memory: requested {requested} with {available} available")]
    OutOfDeviceMemory {
        /// Bytes requested.
        requested: usize,
        /// Bytes still available in the allocator.
        available: usize,
    },
    /// A map/flush/write was attempted on an unmapped block.
    #[error("memory block is not mapped")]
    NotMapped,
    /// A map was attempted on an already-mapped block.
    #[error("memory block is already mapped")]
    AlreadyMapped,
    /// A write exceeded the block's allocation.
    #[error("write of {len} bytes exceeds block size {size}")]
    WriteOutOfBounds {
        /// Bytes in the attempted write.
        len: usize,
        /// Block size in bytes.
        size: usize,
    },
    /// A pipeline referenced a shader that no longer exists.
    #[error("pipeline references a released shader")]
    DeadShader,
    /// An operation targeted a resource that no longer exists.
    #[error("resource no longer exists")]
    DeadResource,
}
