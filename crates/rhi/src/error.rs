//! RHI-specific error types.

use thiserror::Error;

/// Errors raised by the Vulkan layer.
///
/// Apart from an out-of-date swapchain, which callers inspect through the raw
/// `vk::Result` returned by acquire/present, every variant is fatal.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    /// Failed to load Vulkan
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// A thread panicked while holding the allocator lock
    #[error("GPU allocator lock poisoned")]
    AllocatorPoisoned,

    /// No GPU meets the requirements
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader loading error
    #[error("Shader error: {0}")]
    ShaderError(String),

    /// Surface creation or query error
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Swapchain creation error
    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Argument rejected before reaching Vulkan
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
