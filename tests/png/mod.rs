//! End-to-end scenarios exercised only through the crate's public surface
//! (`optimize`/`optimize_from_memory`/`RasterSource`/`Options`).

use pngpress::{optimize, optimize_from_memory, ColorMode, IhdrData, InterlaceMethod, Options, RasterSource};

/// The 13-byte IHDR payload always sits right after the 8-byte signature and
/// the first chunk's 8-byte length+type prefix.
fn ihdr_of(bytes: &[u8]) -> IhdrData {
  assert_eq!(&bytes[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
  assert_eq!(&bytes[12..16], b"IHDR");
  IhdrData::parse(&bytes[16..29]).unwrap()
}

fn has_chunk(bytes: &[u8], chunk_type: &[u8; 4]) -> bool {
  bytes.windows(4).any(|w| w == chunk_type)
}

#[test]
fn opaque_red_pixel_round_trips_as_rgb_none() {
  // 1x1 opaque red, BGRA bytes.
  let bgra = [0u8, 0, 255, 255];
  let source = RasterSource::new(1, 1, &bgra, 4);
  let result = optimize_from_memory(source, &Options::default()).unwrap();

  let ihdr = ihdr_of(&result.file_bytes);
  assert_eq!((ihdr.width, ihdr.height), (1, 1));
  assert_eq!(ihdr.color_mode, ColorMode::RGB);
  assert_eq!(ihdr.bit_depth, 8);
  assert_eq!(ihdr.interlace_method, InterlaceMethod::None);
  assert_eq!(result.filters.len(), 1);
  assert_eq!(format!("{:?}", result.filters[0]), "None");
}

#[test]
fn two_color_checkerboard_is_never_worse_than_naive_rgb() {
  // 2x2, [(0,0,0),(255,255,255),(255,255,255),(0,0,0)].
  let black = [0u8, 0, 0, 255];
  let white = [255u8, 255, 255, 255];
  let bgra = [black, white, white, black].concat();
  let source = RasterSource::new(2, 2, &bgra, 8);

  let auto = optimize_from_memory(source, &Options::default()).unwrap();

  let mut naive_options = Options::default();
  naive_options.auto_color_mode = false;
  let naive_source = RasterSource::new(2, 2, &bgra, 8);
  let naive = optimize_from_memory(naive_source, &naive_options).unwrap();

  assert!(auto.compressed_size <= naive.compressed_size);
}

#[test]
fn determinism_same_input_same_options_is_byte_identical() {
  let bgra: Vec<u8> = (0..(4 * 4 * 4)).map(|i| (i * 7) as u8).collect();
  let source_a = RasterSource::new(4, 4, &bgra, 16);
  let source_b = RasterSource::new(4, 4, &bgra, 16);
  let options = Options::default();

  let a = optimize_from_memory(source_a, &options).unwrap();
  let b = optimize_from_memory(source_b, &options).unwrap();
  assert_eq!(a.file_bytes, b.file_bytes);
  assert_eq!(a.compressed_size, b.compressed_size);
}

#[test]
fn monotone_search_result_is_not_worse_than_a_fixed_single_candidate() {
  let bgra: Vec<u8> = (0..(6 * 6 * 4)).map(|i| ((i * 13) % 251) as u8).collect();
  let source = RasterSource::new(6, 6, &bgra, 24);
  let winner = optimize_from_memory(source, &Options::default()).unwrap();

  let mut fixed = Options::default();
  fixed.auto_color_mode = false;
  fixed.filters = Some(pngpress::FilterStrategy::SingleFilter).into_iter().collect();
  fixed.deflate_levels = Some(pngpress::DeflateLevel::Fastest).into_iter().collect();
  let fixed_source = RasterSource::new(6, 6, &bgra, 24);
  let single_candidate = optimize_from_memory(fixed_source, &fixed).unwrap();

  assert!(winner.compressed_size <= single_candidate.compressed_size);
}

#[test]
fn size_fallback_produces_a_valid_decodable_png_for_noisy_input() {
  // A pseudo-random raster is close to incompressible; the output must
  // still be a structurally valid PNG even if no candidate shrinks it much.
  let mut state = 0x2545F4914F6CDD1Du64;
  let mut next = || {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
  };
  let bgra: Vec<u8> = (0..(8 * 8 * 4)).map(|_| (next() & 0xFF) as u8).collect();
  let source = RasterSource::new(8, 8, &bgra, 32);
  let result = optimize_from_memory(source, &Options::default()).unwrap();

  let ihdr = ihdr_of(&result.file_bytes);
  assert_eq!((ihdr.width, ihdr.height), (8, 8));
  assert!(has_chunk(&result.file_bytes, b"IEND"));
}

#[test]
fn optimize_recompresses_an_existing_png_preserving_dimensions() {
  let bgra = [0u8, 255, 0, 255, 0, 0, 255, 255]; // 2x1: green, red (BGRA)
  let source = RasterSource::new(2, 1, &bgra, 8);
  let first = optimize_from_memory(source, &Options::default()).unwrap();

  let second = optimize(&first.file_bytes, &Options::default()).unwrap();
  let ihdr = ihdr_of(&second.file_bytes);
  assert_eq!((ihdr.width, ihdr.height), (2, 1));
  assert_eq!(ihdr.interlace_method, InterlaceMethod::None);
}

#[test]
fn raster_source_rejects_undersized_buffers() {
  let bgra = [0u8; 4];
  let source = RasterSource::new(2, 1, &bgra, 8);
  assert!(optimize_from_memory(source, &Options::default()).is_err());
}
