//! Main renderer orchestration.
//!
//! This module provides the [`Renderer`] struct that owns every Vulkan
//! resource of the demo and implements [`FrameBackend`] on top of them.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info};

use ripples_core::Config;
use ripples_platform::{Surface, Window};
use ripples_rhi::buffer::{Buffer, BufferUsage};
use ripples_rhi::command::CommandPool;
use ripples_rhi::descriptor::{DescriptorBindingBuilder, DescriptorSetLayout};
use ripples_rhi::device::Device;
use ripples_rhi::instance::Instance;
use ripples_rhi::physical_device::select_physical_device;
use ripples_rhi::pipeline::{CullMode, GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use ripples_rhi::rendering::{ColorAttachment, full_scissor, full_viewport};
use ripples_rhi::sampler::{Sampler, SamplerDesc};
use ripples_rhi::shader::{Shader, ShaderStage};
use ripples_rhi::swapchain::Swapchain;
use ripples_rhi::texture::Texture;
use ripples_rhi::vertex::QuadVertex;
use ripples_rhi::{RhiError, RhiResult};

use crate::frame::{self, Acquire, FrameBackend, FrameStatus, Present};
use crate::frame_manager::{FrameManager, TEXTURE_BINDING, UBO_BINDING};
use crate::quad::{CHECKERBOARD_SIZE, QUAD_VERTICES, checkerboard};
use crate::ubo::Ubo;

/// File names of the compiled shaders inside the configured shader directory.
pub const VERTEX_SHADER_FILE: &str = "ripple.vert.spv";
pub const FRAGMENT_SHADER_FILE: &str = "ripple.frag.spv";

/// Renders the rippling checkerboard quad into a window.
///
/// # Resource Destruction Order
///
/// 1. Wait for all GPU work to complete
/// 2. Frame resources (fences, semaphores, command buffers, UBOs)
/// 3. Pipeline, shaders and layouts
/// 4. Sampler, texture and vertex buffer
/// 5. Swapchain
/// 6. Device
/// 7. Surface
/// 8. Instance
///
/// ManuallyDrop is used to enforce this order.
pub struct Renderer {
    // Core Vulkan resources
    instance: ManuallyDrop<Instance>,
    surface: ManuallyDrop<Surface>,
    device: ManuallyDrop<Arc<Device>>,
    swapchain: ManuallyDrop<Swapchain>,

    // Pipeline resources
    bindings: [vk::DescriptorSetLayoutBinding<'static>; 2],
    descriptor_set_layout: ManuallyDrop<DescriptorSetLayout>,
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    vertex_shader: ManuallyDrop<Shader>,
    fragment_shader: ManuallyDrop<Shader>,
    /// Rebuilt whenever the swapchain is.
    pipeline: ManuallyDrop<Pipeline>,

    // Static scene resources
    vertex_buffer: ManuallyDrop<Buffer>,
    texture: ManuallyDrop<Texture>,
    sampler: ManuallyDrop<Sampler>,

    /// Per-swapchain-image resources, rebuilt whenever the swapchain is.
    frames: ManuallyDrop<FrameManager>,

    // State
    /// A resize arrived since the last frame.
    resize_pending: bool,
    width: u32,
    height: u32,
}

impl Renderer {
    /// Creates a renderer for `window`.
    ///
    /// Loads `ripple.vert.spv` and `ripple.frag.spv` from
    /// `config.shader_dir` and uploads the checkerboard texture.
    ///
    /// # Errors
    ///
    /// Returns an error if surface creation, device selection, shader
    /// loading or any other resource creation fails.
    pub fn new(window: &Window, config: &Config) -> RhiResult<Self> {
        let width = window.width();
        let height = window.height();

        info!("Initializing Vulkan renderer ({}x{})", width, height);

        let surface_extensions = window
            .required_extensions()
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;
        let instance = Instance::new(config.validation, &surface_extensions)?;
        debug!(
            "Vulkan instance ready (validation {})",
            if instance.has_validation() { "active" } else { "inactive" }
        );

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device_info)?;

        let swapchain = Swapchain::new(&instance, device.clone(), surface.handle(), width, height)?;

        // binding 0: Ubo, binding 1: checkerboard
        let bindings = [
            DescriptorBindingBuilder::uniform_buffer(
                UBO_BINDING,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            ),
            DescriptorBindingBuilder::combined_image_sampler(
                TEXTURE_BINDING,
                vk::ShaderStageFlags::FRAGMENT,
            ),
        ];
        let descriptor_set_layout = DescriptorSetLayout::new(device.clone(), &bindings)?;
        let pipeline_layout =
            PipelineLayout::new(device.clone(), &[descriptor_set_layout.handle()])?;

        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &config.shader_dir.join(VERTEX_SHADER_FILE),
            ShaderStage::Vertex,
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &config.shader_dir.join(FRAGMENT_SHADER_FILE),
            ShaderStage::Fragment,
        )?;
        let pipeline = Self::create_pipeline(
            device.clone(),
            &vertex_shader,
            &fragment_shader,
            &pipeline_layout,
            swapchain.format(),
        )?;

        let vertex_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Vertex,
            bytemuck::cast_slice(&QUAD_VERTICES),
        )?;

        let texture = {
            let upload_pool = CommandPool::new(device.clone(), device.graphics_family())?;
            Texture::from_r32_float(
                device.clone(),
                &upload_pool,
                CHECKERBOARD_SIZE,
                CHECKERBOARD_SIZE,
                &checkerboard(),
            )?
        };
        let sampler = Sampler::new(device.clone(), SamplerDesc::NEAREST_REPEAT)?;

        let frames = FrameManager::new(
            device.clone(),
            &descriptor_set_layout,
            &bindings,
            swapchain.image_count(),
            &texture,
            &sampler,
        )?;

        info!(
            "Renderer initialized on {}: {} swapchain images, format {:?}",
            physical_device_info.device_name(),
            swapchain.image_count(),
            swapchain.format()
        );

        Ok(Self {
            instance: ManuallyDrop::new(instance),
            surface: ManuallyDrop::new(surface),
            device: ManuallyDrop::new(device),
            swapchain: ManuallyDrop::new(swapchain),
            bindings,
            descriptor_set_layout: ManuallyDrop::new(descriptor_set_layout),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            vertex_shader: ManuallyDrop::new(vertex_shader),
            fragment_shader: ManuallyDrop::new(fragment_shader),
            pipeline: ManuallyDrop::new(pipeline),
            vertex_buffer: ManuallyDrop::new(vertex_buffer),
            texture: ManuallyDrop::new(texture),
            sampler: ManuallyDrop::new(sampler),
            frames: ManuallyDrop::new(frames),
            resize_pending: false,
            width,
            height,
        })
    }

    /// Builds the quad pipeline for swapchain images of `color_format`.
    fn create_pipeline(
        device: Arc<Device>,
        vertex_shader: &Shader,
        fragment_shader: &Shader,
        layout: &PipelineLayout,
        color_format: vk::Format,
    ) -> RhiResult<Pipeline> {
        GraphicsPipelineBuilder::new()
            .vertex_shader(vertex_shader)
            .fragment_shader(fragment_shader)
            .vertex_binding(QuadVertex::binding_description())
            .vertex_attributes(&QuadVertex::attribute_descriptions())
            // The camera can fly behind the quad.
            .cull_mode(CullMode::None)
            .color_attachment_format(color_format)
            .build(device, layout)
    }

    /// Draws one frame with `ubo` as its uniform data.
    ///
    /// A pending resize is applied before acquiring. A stale acquire rebuilds
    /// the swapchain and submits the frame once more; [`FrameStatus::Retry`]
    /// means that second attempt was stale too and the frame was dropped.
    /// A stale present yields [`FrameStatus::Recreated`]. Any other failure
    /// is fatal.
    pub fn submit_frame(&mut self, ubo: &Ubo) -> RhiResult<FrameStatus> {
        if self.resize_pending {
            debug!("Resize requested, recreating swapchain before acquire");
            self.recreate_swapchain()?;
        }

        frame::submit_frame_retrying(self, ubo)
    }

    /// Records a new window size for the next frame.
    ///
    /// Zero sizes (a minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!("Ignoring resize to zero dimensions");
            return;
        }

        if width != self.width || height != self.height {
            debug!(
                "Resize triggered: {}x{} -> {}x{}",
                self.width, self.height, width, height
            );
            self.width = width;
            self.height = height;
            self.resize_pending = true;
        }
    }

    /// Rebuilds the state that depends on the swapchain: the pipeline (its
    /// color format follows the surface format) and the per-image frames.
    ///
    /// The device must be idle.
    pub fn on_swapchain_reinitialized(&mut self) -> RhiResult<()> {
        let pipeline = Self::create_pipeline(
            Arc::clone(&*self.device),
            &self.vertex_shader,
            &self.fragment_shader,
            &self.pipeline_layout,
            self.swapchain.format(),
        )?;
        // SAFETY: the device is idle, so nothing references the old pipeline.
        unsafe {
            ManuallyDrop::drop(&mut self.pipeline);
        }
        self.pipeline = ManuallyDrop::new(pipeline);

        let frames = FrameManager::new(
            Arc::clone(&*self.device),
            &self.descriptor_set_layout,
            &self.bindings,
            self.swapchain.image_count(),
            &self.texture,
            &self.sampler,
        )?;
        // SAFETY: as above.
        unsafe {
            ManuallyDrop::drop(&mut self.frames);
        }
        self.frames = ManuallyDrop::new(frames);

        info!(
            "Swapchain reinitialized: {}x{}, {} images",
            self.swapchain.extent().width,
            self.swapchain.extent().height,
            self.swapchain.image_count()
        );
        Ok(())
    }

    /// Returns the current swapchain extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the swapchain format.
    pub fn format(&self) -> vk::Format {
        self.swapchain.format()
    }
}

impl FrameBackend for Renderer {
    fn acquire(&mut self) -> RhiResult<Acquire> {
        let semaphore = self.frames.next_acquire_semaphore();
        match self.swapchain.acquire_next_image(semaphore) {
            Ok((index, suboptimal)) => {
                if suboptimal {
                    debug!("Acquire returned suboptimal=true");
                }
                Ok(Acquire::Image(index))
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Acquire::OutOfDate),
            Err(e) => Err(RhiError::VulkanError(e)),
        }
    }

    fn wait_for_slot(&mut self, image_index: u32) -> RhiResult<()> {
        self.frames.wait_for_image(image_index)
    }

    fn record(&mut self, image_index: u32) -> RhiResult<()> {
        let frame = self.frames.frame(image_index)?;
        let (image, image_view) = self.swapchain.image(image_index as usize)?;
        let extent = self.swapchain.extent();
        let cmd = frame.command_buffer();

        cmd.reset()?;
        cmd.begin()?;

        cmd.transition_image_layout(
            image,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageAspectFlags::COLOR,
        );

        let color_attachment = ColorAttachment::new(image_view).to_rendering_attachment_info();
        let rendering_info = vk::RenderingInfo::default()
            .render_area(full_scissor(extent))
            .layer_count(1)
            .color_attachments(std::slice::from_ref(&color_attachment));

        cmd.begin_rendering(&rendering_info);
        cmd.set_viewport(&full_viewport(extent));
        cmd.set_scissor(&full_scissor(extent));
        cmd.bind_graphics_pipeline(self.pipeline.handle());
        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()]);
        cmd.bind_graphics_descriptor_sets(
            self.pipeline_layout.handle(),
            0,
            &[frame.descriptor_set()],
        );
        cmd.draw(QUAD_VERTICES.len() as u32, 1, 0, 0);
        cmd.end_rendering();

        cmd.transition_image_layout(
            image,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::ImageAspectFlags::COLOR,
        );

        cmd.end()
    }

    fn upload(&mut self, image_index: u32, ubo: &Ubo) -> RhiResult<()> {
        self.frames
            .frame(image_index)?
            .uniform_buffer()
            .write_data(0, ubo.as_bytes())
    }

    fn submit(&mut self, image_index: u32) -> RhiResult<()> {
        let queue = self.device.graphics_queue();
        self.frames.submit(image_index, queue)
    }

    fn present(&mut self, image_index: u32) -> RhiResult<Present> {
        let render_finished = self.frames.frame(image_index)?.render_finished().handle();
        match self
            .swapchain
            .present(self.device.present_queue(), image_index, render_finished)
        {
            Ok(false) => Ok(Present::Presented),
            Ok(true) => {
                debug!("Present returned suboptimal=true");
                Ok(Present::NeedsRecreate)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) | Err(vk::Result::SUBOPTIMAL_KHR) => {
                Ok(Present::NeedsRecreate)
            }
            Err(e) => Err(RhiError::VulkanError(e)),
        }
    }

    fn recreate_swapchain(&mut self) -> RhiResult<()> {
        // Covers presentation work, which fences do not track.
        self.device.wait_idle()?;

        self.swapchain.recreate(
            &self.instance,
            self.surface.handle(),
            self.width,
            self.height,
        )?;
        self.resize_pending = false;

        self.on_swapchain_reinitialized()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Wait for all GPU work to complete before destroying resources
        if let Err(e) = self.frames.wait_for_all_frames() {
            error!("Failed to wait for in-flight frames during renderer drop: {}", e);
        }
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during renderer drop: {}", e);
        }

        // SAFETY: the device is idle and each field is dropped exactly once,
        // dependents before what they depend on.
        unsafe {
            ManuallyDrop::drop(&mut self.frames);
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.fragment_shader);
            ManuallyDrop::drop(&mut self.vertex_shader);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.descriptor_set_layout);
            ManuallyDrop::drop(&mut self.sampler);
            ManuallyDrop::drop(&mut self.texture);
            ManuallyDrop::drop(&mut self.vertex_buffer);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
