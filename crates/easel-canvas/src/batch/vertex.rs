use bytemuck::{Pod, Zeroable};

use crate::config::{INDICES_PER_QUAD, VERTICES_PER_QUAD};
use crate::paint::Color;

/// Vertex written for every quad corner.
///
/// Positions are in canvas pixels after the current transform has been
/// applied. `tex_coord` is normalized against the bound texture (the source
/// image or the atlas). `texture_index` is only meaningful in bindless mode.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
    pub color: u32,
    pub texture_index: u32,
}

impl Vertex {
    #[inline]
    pub const fn new(x: f32, y: f32, u: f32, v: f32, color: Color) -> Self {
        Self {
            position: [x, y],
            tex_coord: [u, v],
            color: color.0,
            texture_index: 0,
        }
    }
}

/// Two triangles sharing the 0–2 diagonal, relative to the quad's first vertex.
pub const QUAD_INDEX_PATTERN: [u32; INDICES_PER_QUAD] = [0, 1, 2, 0, 2, 3];

/// Index data for `quads` consecutive quads.
pub fn quad_indices(quads: usize) -> Vec<u32> {
    let mut out = Vec::with_capacity(quads * INDICES_PER_QUAD);
    for q in 0..quads {
        let base = (q * VERTICES_PER_QUAD) as u32;
        out.extend(QUAD_INDEX_PATTERN.iter().map(|i| base + i));
    }
    out
}
