//! Packed pixel formats, `Pod`/`Zeroable` via `bytemuck`'s derive macros so no
//! `unsafe impl` is needed anywhere in this crate.

use bytemuck::{Pod, Zeroable};

/// BGRA, 8-bit per channel -- the packed raster format [`crate::image_buffer::ImageBuffer`]
/// stores pixels in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct BGRA8 {
  pub b: u8,
  pub g: u8,
  pub r: u8,
  pub a: u8,
}

impl BGRA8 {
  #[inline]
  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { b, g, r, a }
  }
}
