mod canvas;

pub use canvas::{Surface, BACKGROUND};

/// Owned snapshot of a rectangular pixel region, RGBA8 in row-major order.
///
/// Always a copy, never a view into the live surface, so the inference side
/// can read it without holding the canvas lock.
#[derive(Debug, Clone)]
pub struct RawTile {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}
