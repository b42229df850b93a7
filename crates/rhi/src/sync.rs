//! Semaphores and fences for the per-image frame protocol.
//!
//! A swapchain image owns one [`Fence`] that the CPU waits on before reusing
//! the image's command buffer and uniform buffer, and one [`Semaphore`] that
//! present waits on. Acquire semaphores live in a small ring on the frame
//! manager.

use std::sync::Arc;

use ash::vk;
use tracing::trace;

use crate::device::Device;
use crate::error::RhiResult;

/// Binary semaphore, GPU to GPU ordering only.
pub struct Semaphore {
    device: Arc<Device>,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let semaphore = unsafe {
            device
                .handle()
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)?
        };
        Ok(Self { device, semaphore })
    }

    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
    }
}

/// State a [`Fence`] is created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceState {
    /// First wait returns at once. Used for per-image fences, which are
    /// waited on before anything has been submitted.
    Signaled,
    Unsignaled,
}

impl FenceState {
    fn flags(self) -> vk::FenceCreateFlags {
        match self {
            FenceState::Signaled => vk::FenceCreateFlags::SIGNALED,
            FenceState::Unsignaled => vk::FenceCreateFlags::empty(),
        }
    }
}

/// CPU-visible completion signal for one queue submission.
pub struct Fence {
    device: Arc<Device>,
    fence: vk::Fence,
}

impl Fence {
    pub fn new(device: Arc<Device>, state: FenceState) -> RhiResult<Self> {
        let create_info = vk::FenceCreateInfo::default().flags(state.flags());
        let fence = unsafe { device.handle().create_fence(&create_info, None)? };
        trace!("Created fence ({:?})", state);
        Ok(Self { device, fence })
    }

    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Blocks until the fence signals.
    pub fn wait(&self) -> RhiResult<()> {
        wait_all(&self.device, &[self])
    }

    /// Puts the fence back to unsignaled. Must not be called while a
    /// submission using it is still pending.
    pub fn reset(&self) -> RhiResult<()> {
        unsafe { self.device.handle().reset_fences(&[self.fence])? };
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
    }
}

/// Blocks until every fence in `fences` has signaled.
pub fn wait_all(device: &Device, fences: &[&Fence]) -> RhiResult<()> {
    if fences.is_empty() {
        return Ok(());
    }
    let handles: Vec<vk::Fence> = fences.iter().map(|f| f.fence).collect();
    unsafe { device.handle().wait_for_fences(&handles, true, u64::MAX)? };
    Ok(())
}
