//! CPU cost backend: parallel over matrix rows.

use super::{CostBackend, CostMatrix, FeaturePair, tile_count};
use rayon::prelude::*;
use tessella_core::MosaicResult;

/// Builds the matrix on the CPU, fanning out over rows. Every worker owns a
/// disjoint row stripe, so the inner loop runs without locks.
pub struct CpuCostBackend;

impl CostBackend for CpuCostBackend {
	fn name(&self) -> &'static str {
		"cpu"
	}

	fn build(&self, pairs: &[FeaturePair]) -> MosaicResult<CostMatrix> {
		let n = tile_count(pairs)?;
		log::debug!(
			"cost matrix: {n}x{n} cells, {} feature(s), {} cpus",
			pairs.len(),
			num_cpus::get()
		);

		let mut data = vec![0.0f32; n * n];
		data.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
			for (j, cell) in row.iter_mut().enumerate() {
				let mut similarity = 0.0f32;
				for pair in pairs {
					similarity += pair.weight * pair.receiver.similarity(i, &pair.donor, j);
				}
				*cell = 1.0 - similarity;
			}
		});

		CostMatrix::new(n, data)
	}
}
