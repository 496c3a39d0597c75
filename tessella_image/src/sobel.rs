//! Sobel gradient encoding of square tiles.
//!
//! A tile is reduced to its luma channel, convolved with the 3×3 Sobel
//! kernels (zero padding), and re-encoded as three 8-bit channels
//! `(magnitude, hue, magnitude)`:
//!
//! - magnitude is normalized by the per-tile maximum into 0..=255 (a flat
//!   tile encodes as zero magnitude),
//! - hue maps the gradient angle `atan2(gy, gx)` from (−π, π] onto 0..=255.
//!
//! The duplicated magnitude channel lets the downstream pixel-difference
//! similarity weight magnitude and hue without leaving the uniform
//! three-channel tile layout.

use std::f32::consts::PI;

const KERNEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const KERNEL_Y: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Luma of one RGB8 pixel, truncated to u8.
fn luma8(px: &[u8]) -> u8 {
	(0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32) as u8
}

/// Replaces every pixel of a row-major RGB8 buffer by its luma, broadcast
/// to all three channels.
pub fn grayscale_inplace(data: &mut [u8]) {
	for px in data.chunks_exact_mut(3) {
		let y = luma8(px);
		px.copy_from_slice(&[y, y, y]);
	}
}

/// Zero-padded 3×3 convolution over a square single-channel plane.
fn convolve3(plane: &[f32], size: usize, kernel: &[[f32; 3]; 3]) -> Vec<f32> {
	let mut out = vec![0.0f32; size * size];
	for y in 0..size {
		for x in 0..size {
			let mut acc = 0.0;
			for (ky, row) in kernel.iter().enumerate() {
				for (kx, k) in row.iter().enumerate() {
					let sy = y as isize + ky as isize - 1;
					let sx = x as isize + kx as isize - 1;
					if sy >= 0 && sx >= 0 && (sy as usize) < size && (sx as usize) < size {
						acc += plane[sy as usize * size + sx as usize] * k;
					}
				}
			}
			out[y * size + x] = acc;
		}
	}
	out
}

/// Encodes a square RGB8 tile as `(magnitude, hue, magnitude)` bytes.
///
/// `tile` holds `size * size * 3` bytes; the result has the same layout.
pub fn sobel_encode(tile: &[u8], size: usize) -> Vec<u8> {
	debug_assert_eq!(tile.len(), size * size * 3);

	let mut gray = tile.to_vec();
	grayscale_inplace(&mut gray);
	let plane: Vec<f32> = gray.chunks_exact(3).map(|px| px[0] as f32).collect();

	let gx = convolve3(&plane, size, &KERNEL_X);
	let gy = convolve3(&plane, size, &KERNEL_Y);

	let magnitude: Vec<f32> = gx
		.iter()
		.zip(&gy)
		.map(|(x, y)| (x * x + y * y).sqrt())
		.collect();
	let max = magnitude.iter().fold(0.0f32, |a, &m| a.max(m));

	let mut out = vec![0u8; size * size * 3];
	for i in 0..size * size {
		let mag = if max > 0.0 {
			(magnitude[i] / max * 255.0) as u8
		} else {
			0
		};
		let angle = gy[i].atan2(gx[i]);
		let hue = ((angle + PI) / (2.0 * PI) * 255.0) as u8;

		out[i * 3] = mag;
		out[i * 3 + 1] = hue;
		out[i * 3 + 2] = mag;
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn solid(size: usize, rgb: [u8; 3]) -> Vec<u8> {
		rgb.repeat(size * size)
	}

	#[test]
	fn grayscale_broadcasts_luma() {
		let mut data = vec![255, 0, 0, 0, 255, 0];
		grayscale_inplace(&mut data);
		assert_eq!(data, vec![76, 76, 76, 149, 149, 149]);
	}

	#[test]
	fn flat_tile_has_zero_magnitude() {
		let encoded = sobel_encode(&solid(4, [90, 90, 90]), 4);
		for px in encoded.chunks_exact(3) {
			assert_eq!(px[0], 0);
			assert_eq!(px[2], 0);
			// atan2(0, 0) = 0 maps to the middle of the hue range.
			assert_eq!(px[1], 127);
		}
	}

	#[test]
	fn vertical_edge_peaks_at_the_boundary() {
		let size = 8;
		let mut tile = vec![0u8; size * size * 3];
		for y in 0..size {
			for x in size / 2..size {
				let i = (y * size + x) * 3;
				tile[i..i + 3].copy_from_slice(&[255, 255, 255]);
			}
		}

		let encoded = sobel_encode(&tile, size);

		// The per-tile maximum is encoded as 255 somewhere in the tile.
		assert!(encoded.iter().step_by(3).any(|&m| m == 255));

		// A strong response sits on the black/white boundary columns; the
		// zero-padded corners respond even harder, so mid-row boundary
		// cells land just below the maximum.
		let mag_at = |x: usize, y: usize| encoded[(y * size + x) * 3];
		assert!(mag_at(size / 2, size / 2) >= 200);
		assert!(mag_at(size / 2 - 1, size / 2) >= 200);

		// Away from the boundary and the padded border rows the gradient
		// vanishes.
		assert_eq!(mag_at(1, size / 2), 0);
		assert_eq!(mag_at(size - 2, size / 2), 0);
	}

	#[test]
	fn encoding_shape_matches_tile() {
		let encoded = sobel_encode(&solid(16, [1, 2, 3]), 16);
		assert_eq!(encoded.len(), 16 * 16 * 3);
	}
}
