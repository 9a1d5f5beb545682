//! PNG encoding for shaded RGBA tiles.
//!
//! Shaded tiles usually hold a few hundred colours at most, so the encoder
//! first tries an indexed (colour type 3) image and falls back to RGBA
//! (colour type 6) when the palette would exceed 256 entries.

use std::collections::HashMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use map_common::{MapError, MapResult};
use rayon::prelude::*;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colours in an indexed PNG.
const MAX_PALETTE_SIZE: usize = 256;

/// Pixel count above which the palette is collected in parallel.
const PARALLEL_THRESHOLD: usize = 4096;

/// An RGBA palette entry.
pub type PaletteEntry = [u8; 4];

/// Encode RGBA pixels, choosing indexed output when the colours fit.
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> MapResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;

    let palette = if width * height >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match palette {
        Some((palette, indices)) => encode_png_indexed(width, height, &palette, &indices),
        None => encode_png_rgba(pixels, width, height),
    }
}

#[inline(always)]
fn pack(p: &[u8]) -> u32 {
    u32::from_le_bytes([p[0], p[1], p[2], p[3]])
}

fn extract_palette_sequential(pixels: &[u8]) -> Option<(Vec<PaletteEntry>, Vec<u8>)> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<PaletteEntry> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for p in pixels.chunks_exact(4) {
        let key = pack(p);
        let index = match lookup.get(&key) {
            Some(&i) => i,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push([p[0], p[1], p[2], p[3]]);
                lookup.insert(key, i);
                i
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Collect unique colours per chunk in parallel, merge them, then map every
/// pixel to its palette slot in a second parallel pass.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Vec<PaletteEntry>, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    let chunk_colors: Vec<Vec<u32>> = pixels
        .par_chunks(chunk_pixels * 4)
        .map(|chunk| {
            let mut seen: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for p in chunk.chunks_exact(4) {
                seen.insert(pack(p), ());
                if seen.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            seen.into_keys().collect()
        })
        .collect();

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<PaletteEntry> = Vec::with_capacity(MAX_PALETTE_SIZE);
    for key in chunk_colors.into_iter().flatten() {
        if lookup.contains_key(&key) {
            continue;
        }
        if palette.len() >= MAX_PALETTE_SIZE {
            return None;
        }
        lookup.insert(key, palette.len() as u8);
        palette.push(key.to_le_bytes());
    }

    let indices: Vec<u8> = pixels
        .par_chunks_exact(4)
        .map(|p| lookup.get(&pack(p)).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}

/// Encode an indexed PNG from a palette and one index byte per pixel.
pub fn encode_png_indexed(
    width: usize,
    height: usize,
    palette: &[PaletteEntry],
    indices: &[u8],
) -> MapResult<Vec<u8>> {
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(MapError::Encode(format!(
            "palette must hold 1-{} colours, got {}",
            MAX_PALETTE_SIZE,
            palette.len()
        )));
    }
    if indices.len() != width * height {
        return Err(MapError::Encode(format!(
            "index buffer of {} bytes does not match {}x{}",
            indices.len(),
            width,
            height
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_scanlines(indices, width, height)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode a full-colour RGBA PNG.
pub fn encode_png_rgba(pixels: &[u8], width: usize, height: usize) -> MapResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    write_chunk(&mut png, b"IDAT", &deflate_scanlines(pixels, width * 4, height)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_buffer(pixels: &[u8], width: usize, height: usize) -> MapResult<()> {
    if width == 0 || height == 0 {
        return Err(MapError::Encode(format!(
            "cannot encode an empty {}x{} image",
            width, height
        )));
    }
    if pixels.len() != width * height * 4 {
        return Err(MapError::Encode(format!(
            "pixel buffer of {} bytes does not match {}x{} RGBA",
            pixels.len(),
            width,
            height
        )));
    }
    Ok(())
}

fn ihdr(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

/// Prefix every scanline with filter type 0 and zlib-compress the result.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> MapResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (row_bytes + 1));
    for row in data.chunks_exact(row_bytes).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let compress = || -> std::io::Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(&raw)?;
        encoder.finish()
    };
    compress().map_err(|e| MapError::Encode(format!("IDAT compression failed: {}", e)))
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
