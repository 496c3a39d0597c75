//! Per-tile feature tensors and their similarity functions.
//!
//! The feature set is closed: raw pixels (RGB or YUV), mean color, Sobel
//! edge structure, and deep embeddings. Each tensor holds one row per tile
//! of a grid; similarities compare one row of a receiver tensor against one
//! row of a donor tensor and land in [0, 1], where 1 means identical.

use tessella_core::{MosaicResult, TileEmbedder};
use tessella_image::{TileGrid, color, sobel};

/// The four supported tile features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
	/// Raw pixel difference.
	Pixels,
	/// Mean-color difference.
	MeanColor,
	/// Sobel magnitude/direction difference.
	Sobel,
	/// Deep-embedding cosine similarity.
	Embedding,
}

impl FeatureKind {
	/// Whether the GPU cost backend implements this feature's similarity.
	///
	/// Embeddings are matched on the CPU only (their vectors are large and
	/// the inner product is cheap relative to the transfer).
	pub fn has_gpu_support(&self) -> bool {
		!matches!(self, FeatureKind::Embedding)
	}
}

/// One feature extracted for every tile of a grid.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureTensor {
	/// N × (tile_size² · 3) bytes, identity or YUV color space.
	Pixels { data: Vec<u8>, tile_len: usize },
	/// N × 3 channel means.
	MeanColor { data: Vec<f32> },
	/// N × (tile_size² · 3) bytes encoded as (magnitude, hue, magnitude).
	Sobel { data: Vec<u8>, tile_len: usize },
	/// N × dim embedding rows, ℓ²-normalized (zero rows stay zero).
	Embedding { data: Vec<f32>, dim: usize },
}

impl FeatureTensor {
	/// Raw-pixel tensor; converts tiles to YUV when `use_yuv` is set.
	pub fn pixels(grid: &TileGrid, use_yuv: bool) -> Self {
		let mut data = grid.data().to_vec();
		if use_yuv {
			color::rgb_to_yuv_inplace(&mut data);
		}
		Self::Pixels {
			data,
			tile_len: grid.tile_len(),
		}
	}

	/// Channel-mean tensor.
	pub fn mean_color(grid: &TileGrid) -> Self {
		let mut data = Vec::with_capacity(grid.len() * 3);
		for tile in grid.tiles() {
			data.extend_from_slice(&color::channel_means(tile));
		}
		Self::MeanColor { data }
	}

	/// Sobel magnitude/direction tensor.
	pub fn sobel(grid: &TileGrid) -> Self {
		let ts = grid.tile_size();
		let mut data = Vec::with_capacity(grid.len() * grid.tile_len());
		for tile in grid.tiles() {
			data.extend_from_slice(&sobel::sobel_encode(tile, ts));
		}
		Self::Sobel {
			data,
			tile_len: grid.tile_len(),
		}
	}

	/// Deep-embedding tensor: embeds every tile, then ℓ²-normalizes each
	/// row so cosine similarity reduces to an inner product.
	pub fn embedding(grid: &TileGrid, embedder: &dyn TileEmbedder) -> MosaicResult<Self> {
		let dim = embedder.dim();
		if dim == 0 {
			return Err(anyhow::anyhow!("embedder reports a zero-length feature vector").into());
		}

		let mut data = Vec::with_capacity(grid.len() * dim);
		for (index, tile) in grid.tiles().enumerate() {
			let row = embedder.embed(tile, grid.tile_size())?;
			if row.len() != dim {
				return Err(
					anyhow::anyhow!("embedder returned {} values for tile {index}, expected {dim}", row.len()).into(),
				);
			}
			data.extend_from_slice(&row);
		}

		l2_normalize_rows(&mut data, dim);
		Ok(Self::Embedding { data, dim })
	}

	pub fn kind(&self) -> FeatureKind {
		match self {
			FeatureTensor::Pixels { .. } => FeatureKind::Pixels,
			FeatureTensor::MeanColor { .. } => FeatureKind::MeanColor,
			FeatureTensor::Sobel { .. } => FeatureKind::Sobel,
			FeatureTensor::Embedding { .. } => FeatureKind::Embedding,
		}
	}

	/// Number of tiles (rows) in the tensor.
	pub fn len(&self) -> usize {
		match self {
			FeatureTensor::Pixels { data, tile_len } | FeatureTensor::Sobel { data, tile_len } => data.len() / tile_len,
			FeatureTensor::MeanColor { data } => data.len() / 3,
			FeatureTensor::Embedding { data, dim } => data.len() / dim,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Similarity between row `i` of this tensor and row `j` of `other`.
	///
	/// Both tensors must hold the same feature kind.
	pub fn similarity(&self, i: usize, other: &Self, j: usize) -> f32 {
		match (self, other) {
			(
				FeatureTensor::Pixels { data: a, tile_len },
				FeatureTensor::Pixels { data: b, tile_len: tile_len_b },
			) => {
				debug_assert_eq!(tile_len, tile_len_b);
				pixel_similarity(
					&a[i * tile_len..(i + 1) * tile_len],
					&b[j * tile_len..(j + 1) * tile_len],
				)
			}
			(FeatureTensor::MeanColor { data: a }, FeatureTensor::MeanColor { data: b }) => {
				mean_similarity(&a[i * 3..i * 3 + 3], &b[j * 3..j * 3 + 3])
			}
			(
				FeatureTensor::Sobel { data: a, tile_len },
				FeatureTensor::Sobel { data: b, tile_len: tile_len_b },
			) => {
				debug_assert_eq!(tile_len, tile_len_b);
				sobel_similarity(
					&a[i * tile_len..(i + 1) * tile_len],
					&b[j * tile_len..(j + 1) * tile_len],
				)
			}
			(FeatureTensor::Embedding { data: a, dim }, FeatureTensor::Embedding { data: b, dim: dim_b }) => {
				debug_assert_eq!(dim, dim_b);
				cosine_similarity(&a[i * dim..(i + 1) * dim], &b[j * dim..(j + 1) * dim])
			}
			_ => unreachable!("similarity between different feature kinds"),
		}
	}
}

/// 1 − Σ|a−b| / (len·255) over two equally long byte rows.
pub fn pixel_similarity(a: &[u8], b: &[u8]) -> f32 {
	debug_assert_eq!(a.len(), b.len());
	let sum: u32 = a.iter().zip(b).map(|(x, y)| x.abs_diff(*y) as u32).sum();
	1.0 - sum as f32 / (a.len() as f32 * 255.0)
}

/// 1 − Σ_c |a_c − b_c| / (3·255) over two channel-mean triples.
pub fn mean_similarity(a: &[f32], b: &[f32]) -> f32 {
	debug_assert_eq!(a.len(), 3);
	debug_assert_eq!(b.len(), 3);
	let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
	1.0 - sum / 765.0
}

/// Channel weights of the Sobel encoding: half on hue, the other half
/// split between the two magnitude channels.
pub const SOBEL_CHANNEL_WEIGHTS: [f32; 3] = [0.25, 0.5, 0.25];

/// 1 − Σ(w_c·|a−b|) / (pixels·255·Σw) over two Sobel-encoded rows.
pub fn sobel_similarity(a: &[u8], b: &[u8]) -> f32 {
	debug_assert_eq!(a.len(), b.len());
	let mut sum = 0.0f64;
	for (idx, (x, y)) in a.iter().zip(b).enumerate() {
		sum += f64::from(SOBEL_CHANNEL_WEIGHTS[idx % 3]) * x.abs_diff(*y) as f64;
	}

	let weight_total: f32 = SOBEL_CHANNEL_WEIGHTS.iter().sum();
	let max = (a.len() / 3) as f64 * 255.0 * f64::from(weight_total);
	(1.0 - sum / max) as f32
}

/// Inner product of two ℓ²-normalized rows, clamped into [0, 1].
///
/// The clamp keeps the cost-matrix range invariant for embedders whose
/// features are not nonnegative.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	debug_assert_eq!(a.len(), b.len());
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	dot.clamp(0.0, 1.0)
}

/// ℓ²-normalizes each `dim`-long row in place; rows with zero norm stay
/// zero.
pub fn l2_normalize_rows(data: &mut [f32], dim: usize) {
	for row in data.chunks_exact_mut(dim) {
		let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
		if norm > 0.0 {
			for v in row {
				*v /= norm;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;
	use rstest::rstest;
	use tessella_image::Image;

	fn grid_of(image: &Image, ts: u32) -> TileGrid {
		TileGrid::partition(image, ts).unwrap()
	}

	fn two_tone() -> TileGrid {
		// 2x1 grid: one red tile, one blue tile.
		let img = Image::from_fn(8, 4, |x, _| if x < 4 { [255, 0, 0] } else { [0, 0, 255] });
		grid_of(&img, 4)
	}

	#[test]
	fn pixel_similarity_bounds_and_symmetry() {
		let a = vec![0u8; 12];
		let b = vec![255u8; 12];
		assert_eq!(pixel_similarity(&a, &a), 1.0);
		assert_eq!(pixel_similarity(&a, &b), 0.0);

		let c = vec![10, 200, 35, 0, 90, 255, 17, 4, 128, 66, 66, 66];
		let s = pixel_similarity(&b, &c);
		assert_eq!(s, pixel_similarity(&c, &b));
		assert!((0.0..=1.0).contains(&s));
	}

	#[rstest]
	#[case::identical([100.0, 100.0, 100.0], [100.0, 100.0, 100.0], 1.0)]
	#[case::opposite([0.0, 0.0, 0.0], [255.0, 255.0, 255.0], 0.0)]
	#[case::halfway([0.0, 0.0, 0.0], [127.5, 127.5, 127.5], 0.5)]
	fn mean_similarity_values(#[case] a: [f32; 3], #[case] b: [f32; 3], #[case] expected: f32) {
		assert_abs_diff_eq!(mean_similarity(&a, &b), expected, epsilon = 1e-6);
		assert_abs_diff_eq!(mean_similarity(&b, &a), expected, epsilon = 1e-6);
	}

	#[test]
	fn sobel_similarity_weights_hue_twice() {
		// One byte of difference in the hue channel counts double a byte in
		// a magnitude channel.
		let a = vec![0u8, 0, 0];
		let mag = vec![10u8, 0, 0];
		let hue = vec![0u8, 10, 0];

		let d_mag = 1.0 - sobel_similarity(&a, &mag);
		let d_hue = 1.0 - sobel_similarity(&a, &hue);
		assert_abs_diff_eq!(d_hue, 2.0 * d_mag, epsilon = 1e-6);

		assert_eq!(sobel_similarity(&a, &hue), sobel_similarity(&hue, &a));
	}

	#[test]
	fn cosine_similarity_on_normalized_rows() {
		let mut data = vec![3.0, 4.0, 0.0, 0.0, 0.0, 5.0];
		l2_normalize_rows(&mut data, 3);
		assert_abs_diff_eq!(data[0], 0.6, epsilon = 1e-6);
		assert_abs_diff_eq!(data[5], 1.0, epsilon = 1e-6);

		let a = &data[0..3];
		let b = &data[3..6];
		assert_eq!(cosine_similarity(a, a), 1.0);
		assert_eq!(cosine_similarity(a, b), 0.0);
	}

	#[test]
	fn zero_rows_stay_zero() {
		let mut data = vec![0.0; 4];
		l2_normalize_rows(&mut data, 4);
		assert_eq!(data, vec![0.0; 4]);
	}

	#[test]
	fn pixels_tensor_matches_grid_layout() {
		let grid = two_tone();
		let tensor = FeatureTensor::pixels(&grid, false);
		assert_eq!(tensor.kind(), FeatureKind::Pixels);
		assert_eq!(tensor.len(), 2);

		// A tile is identical to itself and maximally far from the other.
		assert_eq!(tensor.similarity(0, &tensor, 0), 1.0);
		assert!(tensor.similarity(0, &tensor, 1) < 0.5);
	}

	#[test]
	fn yuv_tensor_differs_from_rgb() {
		let grid = two_tone();
		let rgb = FeatureTensor::pixels(&grid, false);
		let yuv = FeatureTensor::pixels(&grid, true);
		assert_ne!(rgb, yuv);

		// Similarities stay within bounds in either space.
		let s = yuv.similarity(0, &yuv, 1);
		assert!((0.0..=1.0).contains(&s));
	}

	#[test]
	fn mean_tensor_of_solid_tiles() {
		let grid = two_tone();
		let tensor = FeatureTensor::mean_color(&grid);
		assert_eq!(tensor.len(), 2);
		assert_eq!(tensor.similarity(0, &tensor, 0), 1.0);

		// Solid red vs solid blue: |255-0| + |0-0| + |0-255| over 765.
		assert_abs_diff_eq!(tensor.similarity(0, &tensor, 1), 1.0 / 3.0, epsilon = 1e-6);
	}

	#[test]
	fn sobel_tensor_separates_flat_from_edged() {
		let flat = Image::from_fn(8, 8, |_, _| [80, 80, 80]);
		let edged = Image::from_fn(8, 8, |x, _| if x < 4 { [0, 0, 0] } else { [255, 255, 255] });

		let flat_t = FeatureTensor::sobel(&grid_of(&flat, 8));
		let edged_t = FeatureTensor::sobel(&grid_of(&edged, 8));

		assert_eq!(flat_t.similarity(0, &flat_t, 0), 1.0);
		assert!(flat_t.similarity(0, &edged_t, 0) < 1.0);
	}

	struct ConstEmbedder(Vec<f32>);

	impl TileEmbedder for ConstEmbedder {
		fn dim(&self) -> usize {
			self.0.len()
		}
		fn embed(&self, _tile: &[u8], _tile_size: usize) -> anyhow::Result<Vec<f32>> {
			Ok(self.0.clone())
		}
	}

	#[test]
	fn embedding_tensor_is_normalized() {
		let grid = two_tone();
		let tensor = FeatureTensor::embedding(&grid, &ConstEmbedder(vec![2.0, 0.0, 0.0, 0.0])).unwrap();
		assert_eq!(tensor.len(), 2);
		assert_eq!(tensor.similarity(0, &tensor, 1), 1.0);

		match &tensor {
			FeatureTensor::Embedding { data, .. } => assert_eq!(data[0], 1.0),
			_ => unreachable!(),
		}
	}

	struct BrokenEmbedder;

	impl TileEmbedder for BrokenEmbedder {
		fn dim(&self) -> usize {
			4
		}
		fn embed(&self, _tile: &[u8], _tile_size: usize) -> anyhow::Result<Vec<f32>> {
			Ok(vec![1.0; 3])
		}
	}

	#[test]
	fn embedding_dimension_mismatch_is_an_error() {
		let grid = two_tone();
		assert!(FeatureTensor::embedding(&grid, &BrokenEmbedder).is_err());
	}
}
