//! Parses and serializes the 13-byte IHDR payload.

use crate::error::{PngError, PngResult};

/// PNG color type tag, carrying its channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColorMode {
  Grayscale = 0,
  RGB = 2,
  Palette = 3,
  GrayscaleAlpha = 4,
  RGBA = 6,
}

impl ColorMode {
  /// Samples per pixel: 1 for Grayscale/Palette, 2 for GrayscaleAlpha, 3 for
  /// RGB, 4 for RGBA.
  #[inline]
  pub const fn samples_per_pixel(self) -> usize {
    match self {
      ColorMode::Grayscale | ColorMode::Palette => 1,
      ColorMode::GrayscaleAlpha => 2,
      ColorMode::RGB => 3,
      ColorMode::RGBA => 4,
    }
  }

  /// Valid bit depths for this color mode.
  #[inline]
  pub const fn valid_bit_depths(self) -> &'static [u8] {
    match self {
      ColorMode::Grayscale => &[1, 2, 4, 8, 16],
      ColorMode::RGB => &[8, 16],
      ColorMode::Palette => &[1, 2, 4, 8],
      ColorMode::GrayscaleAlpha => &[8, 16],
      ColorMode::RGBA => &[8, 16],
    }
  }

  #[inline]
  pub const fn color_type_code(self) -> u8 {
    self as u8
  }
}

impl TryFrom<u8> for ColorMode {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> PngResult<Self> {
    Ok(match value {
      0 => ColorMode::Grayscale,
      2 => ColorMode::RGB,
      3 => ColorMode::Palette,
      4 => ColorMode::GrayscaleAlpha,
      6 => ColorMode::RGBA,
      _ => return Err(PngError::InvalidIhdrCombination),
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InterlaceMethod {
  None = 0,
  Adam7 = 1,
}

impl TryFrom<u8> for InterlaceMethod {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> PngResult<Self> {
    match value {
      0 => Ok(InterlaceMethod::None),
      1 => Ok(InterlaceMethod::Adam7),
      _ => Err(PngError::InvalidIhdrCombination),
    }
  }
}

/// The parsed/validated IHDR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IhdrData {
  pub width: u32,
  pub height: u32,
  pub bit_depth: u8,
  pub color_mode: ColorMode,
  pub interlace_method: InterlaceMethod,
}

impl IhdrData {
  /// Bytes-per-pixel, for filter stride purposes.
  #[inline]
  pub const fn bpp(&self) -> usize {
    let bits = self.color_mode.samples_per_pixel() * self.bit_depth as usize;
    let bytes = (bits + 7) / 8;
    if bytes < 1 {
      1
    } else {
      bytes
    }
  }

  /// `stride`: bytes-per-scanline of the raw (unfiltered) data, for the given
  /// pass width (non-interlaced images just pass `self.width`).
  #[inline]
  pub const fn stride_for_width(&self, width: u32) -> usize {
    let bits_per_pixel = self.color_mode.samples_per_pixel() * self.bit_depth as usize;
    let bits = bits_per_pixel * width as usize;
    (bits + 7) / 8
  }

  #[inline]
  pub const fn stride(&self) -> usize {
    self.stride_for_width(self.width)
  }

  /// Bytes-per-filterline: stride plus the one-byte filter tag.
  #[inline]
  pub const fn bytes_per_filterline(&self, width: u32) -> usize {
    1 + self.stride_for_width(width)
  }

  /// Clones this header with `interlace_method` forced to `None`, used when
  /// recompression must emit a non-interlaced output.
  #[inline]
  pub const fn as_non_interlaced(&self) -> Self {
    Self { interlace_method: InterlaceMethod::None, ..*self }
  }

  pub fn validate(&self) -> PngResult<()> {
    if self.width == 0 || self.height == 0 {
      return Err(PngError::InvalidIhdrCombination);
    }
    if !self.color_mode.valid_bit_depths().contains(&self.bit_depth) {
      return Err(PngError::InvalidIhdrCombination);
    }
    Ok(())
  }

  /// Parses the 13-byte IHDR chunk payload.
  pub fn parse(data: &[u8]) -> PngResult<Self> {
    let [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =
      *data
    else {
      return Err(PngError::InvalidIhdrCombination);
    };
    if compression_method != 0 || filter_method != 0 {
      return Err(PngError::InvalidIhdrCombination);
    }
    let color_mode = ColorMode::try_from(color_type)?;
    let header = Self {
      width: u32::from_be_bytes([w0, w1, w2, w3]),
      height: u32::from_be_bytes([h0, h1, h2, h3]),
      bit_depth,
      color_mode,
      interlace_method: InterlaceMethod::try_from(interlace_method)?,
    };
    header.validate()?;
    Ok(header)
  }

  /// Serializes to the 13-byte IHDR chunk payload.
  pub fn serialize(&self) -> [u8; 13] {
    let w = self.width.to_be_bytes();
    let h = self.height.to_be_bytes();
    [
      w[0],
      w[1],
      w[2],
      w[3],
      h[0],
      h[1],
      h[2],
      h[3],
      self.bit_depth,
      self.color_mode.color_type_code(),
      0,
      0,
      self.interlace_method as u8,
    ]
  }
}
