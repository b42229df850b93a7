//! Dynamic rendering helpers.
//!
//! With `VK_KHR_dynamic_rendering` (core in 1.3) there are no render pass or
//! framebuffer objects; attachments are described per frame and images are
//! moved between layouts with explicit barriers. This module holds the pieces
//! of that which do not need a live device.

use ash::vk;

/// Default clear color: a dark blue-gray.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.15, 1.0];

/// A color attachment for `vkCmdBeginRendering`.
#[derive(Clone, Copy)]
pub struct ColorAttachment {
    pub image_view: vk::ImageView,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub clear_color: [f32; 4],
}

impl ColorAttachment {
    /// Clear on load, store on end, in `COLOR_ATTACHMENT_OPTIMAL`.
    #[inline]
    pub fn new(image_view: vk::ImageView) -> Self {
        Self {
            image_view,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            clear_color: DEFAULT_CLEAR_COLOR,
        }
    }

    pub fn to_rendering_attachment_info(&self) -> vk::RenderingAttachmentInfo<'static> {
        vk::RenderingAttachmentInfo::default()
            .image_view(self.image_view)
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .load_op(self.load_op)
            .store_op(self.store_op)
            .clear_value(vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: self.clear_color,
                },
            })
    }
}

impl std::fmt::Debug for ColorAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorAttachment")
            .field("image_view", &self.image_view)
            .field("load_op", &self.load_op)
            .field("store_op", &self.store_op)
            .field("clear_color", &self.clear_color)
            .finish()
    }
}

/// Stage and access masks for one side of an image barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierScope {
    pub stage: vk::PipelineStageFlags,
    pub access: vk::AccessFlags,
}

/// Source and destination scopes for a layout transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutTransition {
    pub src: BarrierScope,
    pub dst: BarrierScope,
}

impl LayoutTransition {
    /// Masks for the transitions this renderer performs, or `None` for any
    /// other pair.
    pub fn for_layouts(old: vk::ImageLayout, new: vk::ImageLayout) -> Option<Self> {
        use vk::{AccessFlags as A, ImageLayout as L, PipelineStageFlags as S};

        let (src_stage, src_access, dst_stage, dst_access) = match (old, new) {
            // Swapchain image, start of frame. Contents are discarded.
            (L::UNDEFINED, L::COLOR_ATTACHMENT_OPTIMAL) => (
                S::COLOR_ATTACHMENT_OUTPUT,
                A::empty(),
                S::COLOR_ATTACHMENT_OUTPUT,
                A::COLOR_ATTACHMENT_WRITE,
            ),
            (L::COLOR_ATTACHMENT_OPTIMAL, L::PRESENT_SRC_KHR) => (
                S::COLOR_ATTACHMENT_OUTPUT,
                A::COLOR_ATTACHMENT_WRITE,
                S::BOTTOM_OF_PIPE,
                A::empty(),
            ),
            // Texture upload.
            (L::UNDEFINED, L::TRANSFER_DST_OPTIMAL) => (
                S::TOP_OF_PIPE,
                A::empty(),
                S::TRANSFER,
                A::TRANSFER_WRITE,
            ),
            (L::TRANSFER_DST_OPTIMAL, L::SHADER_READ_ONLY_OPTIMAL) => (
                S::TRANSFER,
                A::TRANSFER_WRITE,
                S::FRAGMENT_SHADER,
                A::SHADER_READ,
            ),
            _ => return None,
        };

        Some(Self {
            src: BarrierScope {
                stage: src_stage,
                access: src_access,
            },
            dst: BarrierScope {
                stage: dst_stage,
                access: dst_access,
            },
        })
    }

    /// A conservative full barrier, used for unexpected layout pairs.
    pub fn full() -> Self {
        let scope = BarrierScope {
            stage: vk::PipelineStageFlags::ALL_COMMANDS,
            access: vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
        };
        Self {
            src: scope,
            dst: scope,
        }
    }
}

/// Full-extent viewport with a 0..1 depth range.
pub fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

/// Scissor covering the whole extent.
pub fn full_scissor(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_attachment_defaults() {
        let attachment = ColorAttachment::new(vk::ImageView::null());
        assert_eq!(attachment.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(attachment.store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(attachment.clear_color, DEFAULT_CLEAR_COLOR);

        let info = attachment.to_rendering_attachment_info();
        assert_eq!(info.image_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        assert_eq!(unsafe { info.clear_value.color.float32 }, DEFAULT_CLEAR_COLOR);
    }

    #[test]
    fn test_frame_transitions_are_known() {
        use vk::ImageLayout as L;
        let begin = LayoutTransition::for_layouts(L::UNDEFINED, L::COLOR_ATTACHMENT_OPTIMAL)
            .expect("begin-of-frame transition");
        assert_eq!(begin.dst.access, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

        let present = LayoutTransition::for_layouts(L::COLOR_ATTACHMENT_OPTIMAL, L::PRESENT_SRC_KHR)
            .expect("present transition");
        assert_eq!(present.src.access, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
        assert_eq!(present.dst.stage, vk::PipelineStageFlags::BOTTOM_OF_PIPE);
    }

    #[test]
    fn test_upload_transitions_are_known() {
        use vk::ImageLayout as L;
        let to_dst = LayoutTransition::for_layouts(L::UNDEFINED, L::TRANSFER_DST_OPTIMAL)
            .expect("upload transition");
        assert_eq!(to_dst.dst.stage, vk::PipelineStageFlags::TRANSFER);

        let to_read =
            LayoutTransition::for_layouts(L::TRANSFER_DST_OPTIMAL, L::SHADER_READ_ONLY_OPTIMAL)
                .expect("sample transition");
        assert_eq!(to_read.dst.stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
        assert_eq!(to_read.dst.access, vk::AccessFlags::SHADER_READ);
    }

    #[test]
    fn test_unknown_transition() {
        use vk::ImageLayout as L;
        assert!(LayoutTransition::for_layouts(L::PRESENT_SRC_KHR, L::GENERAL).is_none());
        assert_eq!(
            LayoutTransition::full().src.stage,
            vk::PipelineStageFlags::ALL_COMMANDS
        );
    }

    #[test]
    fn test_full_viewport_and_scissor() {
        let extent = vk::Extent2D {
            width: 1280,
            height: 920,
        };
        let viewport = full_viewport(extent);
        assert_eq!((viewport.width, viewport.height), (1280.0, 920.0));
        assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));
        assert_eq!(full_scissor(extent).extent, extent);
    }
}
