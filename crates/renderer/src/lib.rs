//! Rendering for the ripples demo.
//!
//! This crate turns a per-frame [`Ubo`] into a presented image:
//! - [`frame`]: the submission protocol and its [`FrameBackend`] seam
//! - [`FrameManager`]: per-swapchain-image resources
//! - [`Renderer`]: the Vulkan backend drawing the checkerboard quad

pub mod frame;
pub mod frame_manager;
pub mod quad;
mod renderer;
pub mod ubo;

pub use frame::{
    Acquire, FrameBackend, FrameStatus, Present, submit_frame, submit_frame_retrying,
};
pub use frame_manager::FrameManager;
pub use renderer::{FRAGMENT_SHADER_FILE, Renderer, VERTEX_SHADER_FILE};
pub use ubo::Ubo;
