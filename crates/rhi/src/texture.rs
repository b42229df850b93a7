//! Sampled 2D textures.
//!
//! A [`Texture`] lives in device-local memory with optimal tiling. Its
//! contents arrive through a staging buffer and a one-off transfer submission,
//! after which it stays in `SHADER_READ_ONLY_OPTIMAL` for the rest of its life.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, error, info};

use crate::buffer::{Buffer, BufferUsage};
use crate::command::CommandPool;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Checks that `texel_count` values fill a `width` x `height` image exactly.
fn check_texel_count(width: u32, height: u32, texel_count: usize) -> RhiResult<()> {
    if width == 0 || height == 0 {
        return Err(RhiError::InvalidArgument(
            "texture dimensions must be greater than 0".to_string(),
        ));
    }
    let expected = width as usize * height as usize;
    if texel_count != expected {
        return Err(RhiError::InvalidArgument(format!(
            "{}x{} texture needs {} texels, got {}",
            width, height, expected, texel_count
        )));
    }
    Ok(())
}

/// Device-local 2D image with a color view.
pub struct Texture {
    device: Arc<Device>,
    image: vk::Image,
    image_view: vk::ImageView,
    allocation: Option<Allocation>,
    format: vk::Format,
    extent: vk::Extent2D,
}

impl Texture {
    /// Creates a single-channel `R32_SFLOAT` texture and uploads `texels`
    /// (row-major) through `pool`'s queue family on the graphics queue.
    ///
    /// Blocks until the upload has completed.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidArgument`] if `texels` does not match the
    /// dimensions, or the Vulkan/allocator error if creation fails.
    pub fn from_r32_float(
        device: Arc<Device>,
        pool: &CommandPool,
        width: u32,
        height: u32,
        texels: &[f32],
    ) -> RhiResult<Self> {
        check_texel_count(width, height, texels.len())?;

        let texture = Self::new(device.clone(), vk::Format::R32_SFLOAT, width, height)?;
        let staging =
            Buffer::new_with_data(device.clone(), BufferUsage::Staging, bytemuck::cast_slice(texels))?;

        let image = texture.image;
        let extent = texture.extent;
        pool.submit_and_wait(device.graphics_queue(), |cmd| {
            cmd.transition_image_layout(
                image,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageAspectFlags::COLOR,
            );

            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .image_subresource(
                    vk::ImageSubresourceLayers::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .mip_level(0)
                        .base_array_layer(0)
                        .layer_count(1),
                )
                .image_extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                });
            cmd.copy_buffer_to_image(
                staging.handle(),
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            cmd.transition_image_layout(
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::ImageAspectFlags::COLOR,
            );
        })?;

        info!("Uploaded {}x{} R32_SFLOAT texture", width, height);
        Ok(texture)
    }

    fn new(device: Arc<Device>, format: vk::Format, width: u32, height: u32) -> RhiResult<Self> {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };
        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        // From here on, a partially built texture cleans up after itself.
        let mut texture = Self {
            device,
            image,
            image_view: vk::ImageView::null(),
            allocation: None,
            format,
            extent: vk::Extent2D { width, height },
        };

        let allocation = texture.device.allocator()?.allocate(&AllocationCreateDesc {
            name: "texture",
            requirements,
            location: MemoryLocation::GpuOnly,
            linear: false,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;
        unsafe {
            texture.device.handle().bind_image_memory(
                image,
                allocation.memory(),
                allocation.offset(),
            )?;
        }
        texture.allocation = Some(allocation);

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );
        texture.image_view = unsafe { texture.device.handle().create_image_view(&view_info, None)? };

        debug!("Created {}x{} texture ({:?})", width, height, format);
        Ok(texture)
    }

    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            if self.image_view != vk::ImageView::null() {
                self.device
                    .handle()
                    .destroy_image_view(self.image_view, None);
            }
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        error!("Failed to free texture allocation: {:?}", e);
                    }
                }
                Err(e) => error!("Leaking texture allocation: {}", e),
            }
        }

        debug!(
            "Destroyed texture: {}x{}",
            self.extent.width, self.extent.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texel_count_matches() {
        assert!(check_texel_count(10, 10, 100).is_ok());
        assert!(check_texel_count(4, 2, 8).is_ok());
    }

    #[test]
    fn test_texel_count_mismatch() {
        assert!(matches!(
            check_texel_count(10, 10, 99),
            Err(RhiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_sized_texture_rejected() {
        assert!(check_texel_count(0, 10, 0).is_err());
        assert!(check_texel_count(10, 0, 0).is_err());
    }
}
