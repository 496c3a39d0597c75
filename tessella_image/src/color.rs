//! YUV color conversion and channel statistics.
//!
//! The conversions use BT.601-like analog coefficients. Chroma is stored
//! with a +128 bias and every channel is clamped to [0, 255] before
//! rounding to u8; saturated colors therefore clip instead of wrapping
//! around.

/// Converts one RGB8 pixel to biased YUV8.
///
/// U spans ±111.2 and V ±156.8 over the 8-bit RGB cube; with the +128 bias,
/// |V| > 127 clips at the range ends.
pub fn rgb_to_yuv(rgb: [u8; 3]) -> [u8; 3] {
	let r = rgb[0] as f32;
	let g = rgb[1] as f32;
	let b = rgb[2] as f32;

	let y = 0.299 * r + 0.587 * g + 0.114 * b;
	let u = -0.14713 * r - 0.28886 * g + 0.436 * b + 128.0;
	let v = 0.615 * r - 0.51499 * g - 0.10001 * b + 128.0;

	[quantize(y), quantize(u), quantize(v)]
}

/// Converts one biased YUV8 pixel back to RGB8.
pub fn yuv_to_rgb(yuv: [u8; 3]) -> [u8; 3] {
	let y = yuv[0] as f32;
	let u = yuv[1] as f32 - 128.0;
	let v = yuv[2] as f32 - 128.0;

	let r = y + 1.13983 * v;
	let g = y - 0.39465 * u - 0.58060 * v;
	let b = y + 2.03211 * u;

	[quantize(r), quantize(g), quantize(b)]
}

/// Converts a row-major RGB8 buffer to YUV in place.
pub fn rgb_to_yuv_inplace(data: &mut [u8]) {
	for px in data.chunks_exact_mut(3) {
		px.copy_from_slice(&rgb_to_yuv([px[0], px[1], px[2]]));
	}
}

fn quantize(value: f32) -> u8 {
	value.clamp(0.0, 255.0).round() as u8
}

/// Channel-wise means of a row-major RGB8 buffer.
pub fn channel_means(data: &[u8]) -> [f32; 3] {
	let mut sums = [0.0f64; 3];
	for px in data.chunks_exact(3) {
		sums[0] += px[0] as f64;
		sums[1] += px[1] as f64;
		sums[2] += px[2] as f64;
	}

	let count = (data.len() / 3).max(1) as f64;
	[
		(sums[0] / count) as f32,
		(sums[1] / count) as f32,
		(sums[2] / count) as f32,
	]
}
