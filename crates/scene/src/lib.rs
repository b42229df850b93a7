//! Scene-side state for the ripples demo.
//!
//! - [`Camera`] and its [`FpsController`]
//! - The ripple simulation ([`RippleBuffer`])

pub mod camera;
pub mod ripple;

pub use camera::{Camera, FpsController, Perspective};
pub use ripple::{
    InvalidRippleConfig, RIPPLE_CAPACITY, Ripple, RippleBuffer, RippleConfig, RippleRing,
    SpawnEvent,
};
