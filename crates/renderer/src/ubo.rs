//! Uniform buffer payload shared with the ripple shaders.
//!
//! The layout must match the `Frame` uniform block in `shaders/ripple.vert`
//! and `shaders/ripple.frag` byte for byte. The struct uses `#[repr(C)]` for
//! predictable memory layout and implements `Pod` and `Zeroable` for safe
//! byte casting.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use ripples_scene::{RIPPLE_CAPACITY, Ripple};

/// Per-frame uniform data.
///
/// # Memory Layout (std140)
///
/// - Offset 0: view-projection matrix (64 bytes, column-major)
/// - Offset 64: `RIPPLE_CAPACITY` ripples, 32-byte stride
/// - Total size: 384 bytes
///
/// Each [`Ripple`] begins with a `vec3` followed by a `float`, which std140
/// packs into one 16-byte slot, so the Rust and GLSL layouts coincide without
/// explicit padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Ubo {
    /// Combined view-projection matrix (world to clip space).
    pub view_projection: Mat4,
    /// Ripple slots in ring order. Unused slots have zero amplitude.
    pub ripples: [Ripple; RIPPLE_CAPACITY],
}

impl Ubo {
    /// Size in bytes of the uniform block.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(view_projection: Mat4, ripples: [Ripple; RIPPLE_CAPACITY]) -> Self {
        Self {
            view_projection,
            ripples,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn test_ubo_size() {
        assert_eq!(Ubo::SIZE, 384);
        assert_eq!(Ubo::SIZE % 16, 0);
    }

    #[test]
    fn test_ubo_offsets() {
        assert_eq!(offset_of!(Ubo, view_projection), 0);
        assert_eq!(offset_of!(Ubo, ripples), 64);
    }

    #[test]
    fn test_default_has_identity_matrix_and_inert_ripples() {
        let ubo = Ubo::default();
        assert_eq!(ubo.view_projection, Mat4::IDENTITY);

        let ripple_bytes = &ubo.as_bytes()[offset_of!(Ubo, ripples)..];
        assert_eq!(ripple_bytes.len(), RIPPLE_CAPACITY * Ripple::SIZE);
        assert!(ripple_bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zeroed_is_all_zero_bytes() {
        let ubo: Ubo = Zeroable::zeroed();
        assert!(ubo.as_bytes().iter().all(|&b| b == 0));
    }
}
