//! Platform layer for the ripples demo.
//!
//! - Window management via winit
//! - Vulkan surface creation
//! - Input handling (keyboard, mouse)

mod input;
mod window;

pub use input::{InputState, KeyCode, MouseButton};
pub use window::{Surface, Window};

// Re-export winit types the application loop needs
pub use winit::application::ApplicationHandler;
pub use winit::event::{ElementState, WindowEvent};
pub use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
pub use winit::keyboard::PhysicalKey;
pub use winit::window::WindowId;
