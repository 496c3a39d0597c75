//! Dense cost-matrix construction.
//!
//! `M[i, j] = 1 − Σ_k w_k · s_k(receiver_k[i], donor_k[j])` over the
//! enabled features. Two backends share this contract: a CPU backend
//! parallel over matrix rows, and (with the `gpu` feature) a wgpu compute
//! backend with one shader invocation per cell. Both agree within 1e-4 per
//! entry.

mod cpu;
#[cfg(feature = "gpu")]
mod gpu;

pub use cpu::CpuCostBackend;
#[cfg(feature = "gpu")]
pub use gpu::GpuCostBackend;

use crate::features::FeatureTensor;
use tessella_core::{MosaicError, MosaicResult};

/// A square matrix of per-pair dissimilarities in row-major order; rows are
/// receiver tiles, columns donor tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
	data: Vec<f32>,
	n: usize,
}

impl CostMatrix {
	/// Wraps a row-major buffer as an n×n matrix.
	///
	/// Fails with [`MosaicError::NotSquare`] if the buffer length is not
	/// `n * n`.
	pub fn new(n: usize, data: Vec<f32>) -> MosaicResult<Self> {
		if data.len() != n * n {
			return Err(MosaicError::NotSquare { len: data.len() });
		}
		Ok(Self { data, n })
	}

	/// Number of rows (and columns).
	pub fn n(&self) -> usize {
		self.n
	}

	pub fn get(&self, row: usize, col: usize) -> f32 {
		self.data[row * self.n + col]
	}

	pub fn row(&self, row: usize) -> &[f32] {
		&self.data[row * self.n..(row + 1) * self.n]
	}

	pub fn data(&self) -> &[f32] {
		&self.data
	}

	/// Fails with [`MosaicError::NonFinite`] naming the first NaN/∞ entry.
	pub fn validate_finite(&self) -> MosaicResult<()> {
		for (index, value) in self.data.iter().enumerate() {
			if !value.is_finite() {
				return Err(MosaicError::NonFinite {
					row: index / self.n,
					col: index % self.n,
				});
			}
		}
		Ok(())
	}
}

/// One enabled feature: its normalized weight and the tensors of both
/// grids.
#[derive(Debug, Clone)]
pub struct FeaturePair {
	pub weight: f32,
	pub receiver: FeatureTensor,
	pub donor: FeatureTensor,
}

impl FeaturePair {
	pub fn new(weight: f32, receiver: FeatureTensor, donor: FeatureTensor) -> Self {
		debug_assert_eq!(receiver.kind(), donor.kind());
		debug_assert_eq!(receiver.len(), donor.len());
		Self { weight, receiver, donor }
	}
}

/// A cost-matrix construction strategy.
pub trait CostBackend {
	/// Backend name for log lines.
	fn name(&self) -> &'static str;

	/// Builds the full matrix from the enabled feature pairs.
	fn build(&self, pairs: &[FeaturePair]) -> MosaicResult<CostMatrix>;
}

fn tile_count(pairs: &[FeaturePair]) -> MosaicResult<usize> {
	let first = pairs
		.first()
		.ok_or_else(|| MosaicError::Image(anyhow::anyhow!("cost matrix needs at least one enabled feature")))?;

	let n = first.receiver.len();
	for pair in pairs {
		if pair.receiver.len() != n || pair.donor.len() != n {
			return Err(MosaicError::Image(anyhow::anyhow!(
				"feature tensors disagree on the tile count"
			)));
		}
	}
	Ok(n)
}

/// Builds the cost matrix, preferring the GPU backend when it is allowed,
/// available and covers every enabled feature. GPU-side failures are
/// logged and recovered by the CPU backend.
pub fn build_cost_matrix(pairs: &[FeaturePair], allow_gpu: bool) -> MosaicResult<CostMatrix> {
	#[cfg(feature = "gpu")]
	if allow_gpu && pairs.iter().all(|p| p.receiver.kind().has_gpu_support()) {
		match GpuCostBackend::new() {
			Some(backend) => {
				log::info!("building cost matrix on the {} backend", backend.name());
				match backend.build(pairs) {
					Ok(matrix) => return Ok(matrix),
					Err(err) => log::warn!("gpu cost backend failed ({err}), falling back to cpu"),
				}
			}
			None => log::debug!("no usable gpu adapter, using the cpu cost backend"),
		}
	}
	#[cfg(not(feature = "gpu"))]
	let _ = allow_gpu;

	let backend = CpuCostBackend;
	log::info!("building cost matrix on the {} backend", backend.name());
	backend.build(pairs)
}
