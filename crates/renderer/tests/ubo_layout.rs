//! Checks the uploaded `Ubo` bytes against the std140 layout the shaders
//! declare, computed independently of the Rust struct layout.

use glam::Mat4;
use ripples_renderer::Ubo;
use ripples_scene::{RIPPLE_CAPACITY, Ripple, RippleBuffer};

/// The GLSL types used by the `Frame` uniform block.
enum Glsl {
    Float,
    Vec3,
    Mat4,
    Struct(&'static [Glsl]),
    Array(&'static Glsl, usize),
}

fn round_up(value: usize, multiple: usize) -> usize {
    value.div_ceil(multiple) * multiple
}

impl Glsl {
    fn base_alignment(&self) -> usize {
        match self {
            Glsl::Float => 4,
            Glsl::Vec3 | Glsl::Mat4 => 16,
            Glsl::Struct(members) => {
                let max = members.iter().map(Glsl::base_alignment).max().unwrap_or(4);
                round_up(max, 16)
            }
            Glsl::Array(element, _) => round_up(element.base_alignment(), 16),
        }
    }

    fn size(&self) -> usize {
        match self {
            Glsl::Float => 4,
            Glsl::Vec3 => 12,
            Glsl::Mat4 => 64,
            Glsl::Struct(members) => {
                let end = member_offsets(members)
                    .last()
                    .map(|&offset| offset + members[members.len() - 1].size())
                    .unwrap_or(0);
                round_up(end, self.base_alignment())
            }
            Glsl::Array(element, count) => array_stride(element) * count,
        }
    }
}

fn array_stride(element: &Glsl) -> usize {
    round_up(element.size(), round_up(element.base_alignment(), 16))
}

fn member_offsets(members: &[Glsl]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(members.len());
    let mut cursor = 0;
    for member in members {
        cursor = round_up(cursor, member.base_alignment());
        offsets.push(cursor);
        cursor += member.size();
    }
    offsets
}

// struct Ripple { vec3 origin; float age; float speed; float amplitude;
//                 float temporal_decay; float spatial_decay; };
const RIPPLE: Glsl = Glsl::Struct(&[
    Glsl::Vec3,
    Glsl::Float,
    Glsl::Float,
    Glsl::Float,
    Glsl::Float,
    Glsl::Float,
]);

// layout(std140) uniform Frame { mat4 view_projection; Ripple ripples[10]; };
const FRAME_MEMBERS: &[Glsl] = &[Glsl::Mat4, Glsl::Array(&RIPPLE, RIPPLE_CAPACITY)];

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    let word: [u8; 4] = bytes[offset..offset + 4].try_into().unwrap();
    f32::from_ne_bytes(word)
}

/// Reads one ripple the way the shader would see it.
fn read_ripple(bytes: &[u8], base: usize) -> Ripple {
    let Glsl::Struct(members) = RIPPLE else {
        unreachable!()
    };
    let offsets = member_offsets(members);
    let field = |i: usize| read_f32(bytes, base + offsets[i]);

    Ripple {
        origin: glam::Vec3::new(
            read_f32(bytes, base + offsets[0]),
            read_f32(bytes, base + offsets[0] + 4),
            read_f32(bytes, base + offsets[0] + 8),
        ),
        age: field(1),
        speed: field(2),
        amplitude: field(3),
        temporal_decay: field(4),
        spatial_decay: field(5),
    }
}

fn ripple_bits(ripple: &Ripple) -> [u32; 8] {
    [
        ripple.origin.x.to_bits(),
        ripple.origin.y.to_bits(),
        ripple.origin.z.to_bits(),
        ripple.age.to_bits(),
        ripple.speed.to_bits(),
        ripple.amplitude.to_bits(),
        ripple.temporal_decay.to_bits(),
        ripple.spatial_decay.to_bits(),
    ]
}

/// A buffer that has spawned enough ripples to fill several slots.
fn busy_buffer() -> RippleBuffer {
    let mut buffer = RippleBuffer::new(0xC0FFEE);
    for _ in 0..400 {
        buffer.update(0.05);
    }
    buffer
}

#[test]
fn std140_block_size_matches_ubo() {
    let block = Glsl::Struct(FRAME_MEMBERS);
    assert_eq!(block.size(), Ubo::SIZE);
    assert_eq!(array_stride(&RIPPLE), Ripple::SIZE);
}

#[test]
fn ripples_read_back_bit_for_bit() {
    let buffer = busy_buffer();
    let snapshot = buffer.snapshot();
    assert!(
        snapshot.iter().filter(|r| r.amplitude != 0.0).count() > 1,
        "expected several live ripples"
    );

    let ubo = Ubo::new(Mat4::IDENTITY, snapshot);
    let bytes = ubo.as_bytes();

    let offsets = member_offsets(FRAME_MEMBERS);
    let stride = array_stride(&RIPPLE);
    for (i, expected) in snapshot.iter().enumerate() {
        let actual = read_ripple(bytes, offsets[1] + i * stride);
        assert_eq!(ripple_bits(&actual), ripple_bits(expected), "slot {}", i);
    }
}

#[test]
fn view_projection_is_column_major() {
    let values: [f32; 16] = std::array::from_fn(|i| i as f32 + 1.0);
    let matrix = Mat4::from_cols_array(&values);
    let ubo = Ubo::new(matrix, [Ripple::default(); RIPPLE_CAPACITY]);
    let bytes = ubo.as_bytes();

    let base = member_offsets(FRAME_MEMBERS)[0];
    for column in 0..4 {
        for row in 0..4 {
            let offset = base + column * 16 + row * 4;
            assert_eq!(
                read_f32(bytes, offset).to_bits(),
                matrix.col(column)[row].to_bits()
            );
        }
    }
}

#[test]
fn empty_slots_read_back_as_zero() {
    let ubo = Ubo::new(Mat4::IDENTITY, RippleBuffer::new(1).snapshot());
    let bytes = ubo.as_bytes();

    let offsets = member_offsets(FRAME_MEMBERS);
    for i in 0..RIPPLE_CAPACITY {
        let ripple = read_ripple(bytes, offsets[1] + i * array_stride(&RIPPLE));
        assert_eq!(ripple.amplitude, 0.0);
    }
}
