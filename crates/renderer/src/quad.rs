//! Geometry and texture data for the single ripple quad.

use ripples_rhi::vertex::QuadVertex;

/// Two counter-clockwise triangles covering [-1, 1]² in the z = 0 plane.
///
/// UV (0, 0) sits at the (-1, -1) corner.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex::new([-1.0, -1.0, 0.0], [0.0, 0.0]),
    QuadVertex::new([1.0, -1.0, 0.0], [1.0, 0.0]),
    QuadVertex::new([1.0, 1.0, 0.0], [1.0, 1.0]),
    QuadVertex::new([-1.0, -1.0, 0.0], [0.0, 0.0]),
    QuadVertex::new([1.0, 1.0, 0.0], [1.0, 1.0]),
    QuadVertex::new([-1.0, 1.0, 0.0], [0.0, 1.0]),
];

/// Checkerboard texture width and height in texels.
pub const CHECKERBOARD_SIZE: u32 = 10;

/// Row-major `CHECKERBOARD_SIZE`² checkerboard: `texel(x, y) = (x + y) % 2`.
pub fn checkerboard() -> Vec<f32> {
    let size = CHECKERBOARD_SIZE;
    (0..size)
        .flat_map(|y| (0..size).map(move |x| ((x + y) % 2) as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkerboard_texels() {
        let texels = checkerboard();
        assert_eq!(texels.len(), 100);

        let size = CHECKERBOARD_SIZE as usize;
        for y in 0..size {
            for x in 0..size {
                assert_eq!(texels[y * size + x], ((x + y) % 2) as f32);
            }
        }
        assert_eq!(texels[0], 0.0);
        assert_eq!(texels[1], 1.0);
        assert_eq!(texels[size], 1.0);
    }

    #[test]
    fn test_quad_covers_unit_square() {
        for vertex in &QUAD_VERTICES {
            let [x, y, z] = vertex.position;
            assert!(x == -1.0 || x == 1.0);
            assert!(y == -1.0 || y == 1.0);
            assert_eq!(z, 0.0);

            // uv follows position linearly
            assert_eq!(vertex.uv, [(x + 1.0) / 2.0, (y + 1.0) / 2.0]);
        }
    }

    #[test]
    fn test_quad_triangles_are_counter_clockwise() {
        for triangle in QUAD_VERTICES.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|v| v.position);
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            // Each triangle covers half the 2x2 quad.
            assert_eq!(cross, 4.0);
        }
    }
}
