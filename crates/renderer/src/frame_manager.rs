//! Per-swapchain-image frame resources.
//!
//! Every swapchain image owns its own command buffer, fence, render-finished
//! semaphore, uniform buffer and descriptor set, so frames that land on
//! different images never share mutable state. Acquire semaphores cannot be
//! keyed by image (the index is only known after acquiring), so they cycle
//! through a separate ring of the same length.
//!
//! # Synchronization Flow
//!
//! ```text
//! 1. Acquire with the next ring semaphore -> image i
//! 2. Wait on frames[i].in_flight_fence
//! 3. Re-record frames[i].command_buffer, write frames[i].uniform_buffer
//! 4. Reset the fence and submit:
//!    - wait on the acquire semaphore
//!    - signal frames[i].render_finished and frames[i].in_flight_fence
//! 5. Present image i, waiting on frames[i].render_finished
//! ```
//!
//! The whole set is tied to one swapchain and is rebuilt, not patched, when
//! the swapchain is recreated.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use ripples_rhi::buffer::{Buffer, BufferUsage};
use ripples_rhi::command::{CommandBuffer, CommandPool};
use ripples_rhi::descriptor::{
    DescriptorPool, DescriptorSetLayout, write_combined_image_sampler, write_uniform_buffer,
};
use ripples_rhi::device::Device;
use ripples_rhi::sampler::Sampler;
use ripples_rhi::sync::{self, Fence, FenceState, Semaphore};
use ripples_rhi::texture::Texture;
use ripples_rhi::{RhiError, RhiResult};

use crate::ubo::Ubo;

/// Descriptor binding of the [`Ubo`].
pub const UBO_BINDING: u32 = 0;
/// Descriptor binding of the checkerboard texture and its sampler.
pub const TEXTURE_BINDING: u32 = 1;

/// Resources bound to one swapchain image.
pub struct ImageFrame {
    command_buffer: CommandBuffer,
    /// Signaled while the slot is idle; created signaled.
    in_flight_fence: Fence,
    render_finished: Semaphore,
    uniform_buffer: Buffer,
    descriptor_set: vk::DescriptorSet,
}

impl ImageFrame {
    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    #[inline]
    pub fn in_flight_fence(&self) -> &Fence {
        &self.in_flight_fence
    }

    #[inline]
    pub fn render_finished(&self) -> &Semaphore {
        &self.render_finished
    }

    #[inline]
    pub fn uniform_buffer(&self) -> &Buffer {
        &self.uniform_buffer
    }

    #[inline]
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }
}

/// Owns the per-image frames for one swapchain.
///
/// Not thread-safe; it lives on the render thread with the swapchain.
pub struct FrameManager {
    device: Arc<Device>,
    frames: Vec<ImageFrame>,
    acquire_semaphores: Vec<Semaphore>,
    /// Ring position of the next acquire semaphore.
    next_acquire: usize,
    /// Ring position used by the most recent acquire.
    pending_acquire: Option<usize>,
    // Pools go last so they outlive the handles allocated from them.
    descriptor_pool: DescriptorPool,
    command_pool: CommandPool,
}

impl FrameManager {
    /// Creates `image_count` frames whose descriptor sets point at their own
    /// uniform buffer and at the shared `texture` and `sampler`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] if `image_count` is 0, or the
    /// Vulkan/allocator error if any resource creation fails.
    pub fn new(
        device: Arc<Device>,
        set_layout: &DescriptorSetLayout,
        bindings: &[vk::DescriptorSetLayoutBinding],
        image_count: usize,
        texture: &Texture,
        sampler: &Sampler,
    ) -> RhiResult<Self> {
        if image_count == 0 {
            return Err(RhiError::InvalidArgument(
                "frame manager needs at least one swapchain image".to_string(),
            ));
        }

        let command_pool = CommandPool::new(device.clone(), device.graphics_family())?;
        let descriptor_pool =
            DescriptorPool::for_bindings(device.clone(), bindings, image_count as u32)?;

        let command_buffers = command_pool.allocate_command_buffers(image_count as u32)?;
        let layouts = vec![set_layout.handle(); image_count];
        let descriptor_sets = descriptor_pool.allocate(&layouts)?;

        let mut frames = Vec::with_capacity(image_count);
        let mut acquire_semaphores = Vec::with_capacity(image_count);
        for (i, (command_buffer, descriptor_set)) in command_buffers
            .into_iter()
            .zip(descriptor_sets)
            .enumerate()
        {
            let uniform_buffer =
                Buffer::new(device.clone(), BufferUsage::Uniform, Ubo::SIZE as vk::DeviceSize)?;

            write_uniform_buffer(
                &device,
                descriptor_set,
                UBO_BINDING,
                uniform_buffer.handle(),
                Ubo::SIZE as vk::DeviceSize,
            );
            write_combined_image_sampler(
                &device,
                descriptor_set,
                TEXTURE_BINDING,
                sampler.handle(),
                texture.image_view(),
            );

            frames.push(ImageFrame {
                command_buffer,
                in_flight_fence: Fence::new(device.clone(), FenceState::Signaled)?,
                render_finished: Semaphore::new(device.clone())?,
                uniform_buffer,
                descriptor_set,
            });
            acquire_semaphores.push(Semaphore::new(device.clone())?);

            debug!("Created frame resources for swapchain image {}", i);
        }

        info!("Frame manager created for {} swapchain images", image_count);

        Ok(Self {
            device,
            frames,
            acquire_semaphores,
            next_acquire: 0,
            pending_acquire: None,
            descriptor_pool,
            command_pool,
        })
    }

    /// Number of per-image frames; equals the swapchain image count.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }

    #[inline]
    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.descriptor_pool
    }

    /// Frame for swapchain image `image_index`.
    pub fn frame(&self, image_index: u32) -> RhiResult<&ImageFrame> {
        self.frames.get(image_index as usize).ok_or_else(|| {
            RhiError::InvalidArgument(format!(
                "swapchain image {} out of range (have {})",
                image_index,
                self.frames.len()
            ))
        })
    }

    /// Takes the next acquire semaphore off the ring.
    ///
    /// The following [`submit`](Self::submit) waits on it.
    pub fn next_acquire_semaphore(&mut self) -> vk::Semaphore {
        let slot = self.next_acquire;
        self.next_acquire = (slot + 1) % self.acquire_semaphores.len();
        self.pending_acquire = Some(slot);
        self.acquire_semaphores[slot].handle()
    }

    /// Blocks until image `image_index` is idle.
    pub fn wait_for_image(&self, image_index: u32) -> RhiResult<()> {
        self.frame(image_index)?.in_flight_fence.wait()
    }

    /// Submits the image's command buffer to `queue`.
    ///
    /// The fence is reset here rather than at record time, so a failure
    /// while recording never leaves an unsignaled fence with nothing
    /// pending on it.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] if no image has been acquired
    /// since the last submit.
    pub fn submit(&mut self, image_index: u32, queue: vk::Queue) -> RhiResult<()> {
        let acquire = self.pending_acquire.take().ok_or_else(|| {
            RhiError::InvalidArgument("submit without a preceding acquire".to_string())
        })?;
        let frame = self.frame(image_index)?;

        let wait_semaphores = [self.acquire_semaphores[acquire].handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [frame.render_finished.handle()];
        let command_buffers = [frame.command_buffer.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        frame.in_flight_fence.reset()?;
        unsafe {
            self.device.handle().queue_submit(
                queue,
                &[submit_info],
                frame.in_flight_fence.handle(),
            )?;
        }

        Ok(())
    }

    /// Waits for every image's last submission to complete.
    pub fn wait_for_all_frames(&self) -> RhiResult<()> {
        let fences: Vec<&Fence> = self.frames.iter().map(|f| &f.in_flight_fence).collect();
        sync::wait_all(&self.device, &fences)
    }
}
