//! Texture atlas packing.
//!
//! A guillotine packer places image rectangles into one large texture so
//! that quads from different images can share a single texture binding.

mod packer;
mod rect;

pub use packer::{AtlasError, Placement, TexturePacker};
pub use rect::AtlasRect;
