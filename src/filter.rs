//! Applies/reverses the five PNG scanline filters, plus the Paeth predictor
//! and wrapping byte arithmetic helpers.
//!
//! All arithmetic is performed on unsigned bytes with wraparound:
//! `add8`/`sub8`/`avg8` keep that intent explicit rather than relying on ad
//! hoc `as i32` casts scattered through the call sites.

/// One of the five PNG scanline filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}

impl FilterType {
  pub const ALL: [FilterType; 5] =
    [FilterType::None, FilterType::Sub, FilterType::Up, FilterType::Average, FilterType::Paeth];

  #[inline]
  pub const fn tag(self) -> u8 {
    self as u8
  }

  #[inline]
  pub fn from_tag(tag: u8) -> Option<Self> {
    Some(match tag {
      0 => FilterType::None,
      1 => FilterType::Sub,
      2 => FilterType::Up,
      3 => FilterType::Average,
      4 => FilterType::Paeth,
      _ => return None,
    })
  }
}

#[inline]
pub const fn add8(x: u8, y: u8) -> u8 {
  x.wrapping_add(y)
}

#[inline]
pub const fn sub8(x: u8, y: u8) -> u8 {
  x.wrapping_sub(y)
}

#[inline]
pub const fn avg8(x: u8, y: u8) -> u8 {
  ((x as u16 + y as u16) >> 1) as u8
}

/// Paeth predictor: ties favor `a`, then `b`, then `c`.
#[inline]
pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // The PNG spec is explicit that this tie-break order must not change.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Applies `filter` to `current` (a raw scanline), writing the filtered bytes
/// into `out`. `previous` is the previous scanline's raw bytes, or an empty
/// slice for the first row of an image/pass. `out`/`current`/`previous` (when
/// non-empty) must all have the same length; `out` is a caller-provided
/// scratch buffer so hot loops don't allocate a fresh one per call.
pub fn apply(filter: FilterType, current: &[u8], previous: &[u8], bpp: usize, out: &mut [u8]) {
  debug_assert_eq!(current.len(), out.len());
  debug_assert!(previous.is_empty() || previous.len() == current.len());
  match filter {
    FilterType::None => out.copy_from_slice(current),
    FilterType::Sub => {
      for i in 0..current.len() {
        let a = if i >= bpp { current[i - bpp] } else { 0 };
        out[i] = sub8(current[i], a);
      }
    }
    FilterType::Up => {
      for i in 0..current.len() {
        let b = previous.get(i).copied().unwrap_or(0);
        out[i] = sub8(current[i], b);
      }
    }
    FilterType::Average => {
      for i in 0..current.len() {
        let a = if i >= bpp { current[i - bpp] } else { 0 };
        let b = previous.get(i).copied().unwrap_or(0);
        out[i] = sub8(current[i], avg8(a, b));
      }
    }
    FilterType::Paeth => {
      for i in 0..current.len() {
        let a = if i >= bpp { current[i - bpp] } else { 0 };
        let b = previous.get(i).copied().unwrap_or(0);
        let c = if i >= bpp { previous.get(i - bpp).copied().unwrap_or(0) } else { 0 };
        out[i] = sub8(current[i], paeth_predictor(a, b, c));
      }
    }
  }
}

/// Reverses `filter` on `filtered` (a filtered scanline already read off the
/// wire, sans its leading filter-tag byte), writing the reconstructed raw
/// bytes into `out`. `previous` is the previously *reconstructed* scanline.
pub fn reverse(filter: FilterType, filtered: &[u8], previous: &[u8], bpp: usize, out: &mut [u8]) {
  debug_assert_eq!(filtered.len(), out.len());
  debug_assert!(previous.is_empty() || previous.len() == filtered.len());
  match filter {
    FilterType::None => {
      if out.as_ptr() != filtered.as_ptr() {
        out.copy_from_slice(filtered);
      }
    }
    FilterType::Sub => {
      for i in 0..filtered.len() {
        let a = if i >= bpp { out[i - bpp] } else { 0 };
        out[i] = add8(filtered[i], a);
      }
    }
    FilterType::Up => {
      for i in 0..filtered.len() {
        let b = previous.get(i).copied().unwrap_or(0);
        out[i] = add8(filtered[i], b);
      }
    }
    FilterType::Average => {
      for i in 0..filtered.len() {
        let a = if i >= bpp { out[i - bpp] } else { 0 };
        let b = previous.get(i).copied().unwrap_or(0);
        out[i] = add8(filtered[i], avg8(a, b));
      }
    }
    FilterType::Paeth => {
      for i in 0..filtered.len() {
        let a = if i >= bpp { out[i - bpp] } else { 0 };
        let b = previous.get(i).copied().unwrap_or(0);
        let c = if i >= bpp { previous.get(i - bpp).copied().unwrap_or(0) } else { 0 };
        out[i] = add8(filtered[i], paeth_predictor(a, b, c));
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn roundtrip(filter: FilterType, current: &[u8], previous: &[u8], bpp: usize) {
    let mut filtered = vec![0u8; current.len()];
    apply(filter, current, previous, bpp, &mut filtered);
    let mut reconstructed = vec![0u8; current.len()];
    reverse(filter, &filtered, previous, bpp, &mut reconstructed);
    assert_eq!(reconstructed, current, "filter {filter:?} did not roundtrip");
  }

  #[test]
  fn roundtrip_all_filters_all_bpp() {
    let current = [10u8, 20, 30, 200, 250, 5, 128, 1, 99, 60];
    let previous = [12u8, 8, 44, 100, 90, 254, 1, 200, 10, 33];
    for bpp in 1..=4 {
      for &f in FilterType::ALL.iter() {
        roundtrip(f, &current, &previous, bpp);
        roundtrip(f, &current, &[], bpp);
      }
    }
  }

  #[test]
  fn paeth_boundary_cases() {
    // a=10,b=20,c=15 -> p=15, pa=5, pb=5, pc=0 -> c
    assert_eq!(paeth_predictor(10, 20, 15), 15);
    // a=10,b=20,c=5 -> p=25, pa=15, pb=5, pc=20 -> b
    assert_eq!(paeth_predictor(10, 20, 5), 20);
    // a=10,b=5,c=0 -> p=15, pa=5, pb=10, pc=15 -> a
    assert_eq!(paeth_predictor(10, 5, 0), 10);
  }

  #[test]
  fn paeth_result_is_always_one_of_the_inputs() {
    for a in (0u8..=255).step_by(17) {
      for b in (0u8..=255).step_by(23) {
        for c in (0u8..=255).step_by(31) {
          let p = paeth_predictor(a, b, c);
          assert!(p == a || p == b || p == c);
        }
      }
    }
  }
}
