//! The end-to-end mosaic job.
//!
//! Phases run strictly in order: partition → feature extraction → cost
//! matrix → assignment → reassembly. The caller's [`CancelToken`] is
//! checked between phases; a phase that has started runs to completion.
//! All per-job buffers live in this frame and are dropped together when
//! the job ends, on success and on error alike.

use tessella_core::{CancelToken, MosaicError, MosaicOptions, MosaicResult};
use tessella_image::{Image, TileGrid};
use tessella_match::{FeaturePair, FeatureTensor, build_cost_matrix, solve};

/// Renders the mosaic for one `(receiver, donor)` job, selecting the GPU
/// cost backend when it is available and covers the enabled features.
pub fn render_mosaic(
	receiver: &Image,
	donor: &Image,
	options: &MosaicOptions,
	cancel: &CancelToken,
) -> MosaicResult<Image> {
	render_mosaic_with(receiver, donor, options, cancel, true)
}

/// Like [`render_mosaic`], with explicit control over GPU use
/// (`allow_gpu = false` forces the CPU cost backend).
pub fn render_mosaic_with(
	receiver: &Image,
	donor: &Image,
	options: &MosaicOptions,
	cancel: &CancelToken,
	allow_gpu: bool,
) -> MosaicResult<Image> {
	cancel.check("partition")?;
	let receiver_grid = TileGrid::partition(receiver, options.tile_size)?;
	let donor_grid = TileGrid::partition(donor, options.tile_size)?;
	if receiver_grid.shape() != donor_grid.shape() {
		return Err(MosaicError::TileGeometry(format!(
			"receiver grid is {:?} but donor grid is {:?}",
			receiver_grid.shape(),
			donor_grid.shape()
		)));
	}
	log::info!(
		"partitioned into {}x{} tiles of {}px",
		receiver_grid.rows(),
		receiver_grid.cols(),
		receiver_grid.tile_size()
	);

	let weights = options.weights.normalized();

	// The embedder requirement is checked up front, before any expensive
	// extraction work.
	let embedder = if weights.deep > 0.0 {
		match tessella_core::embedder() {
			Some(embedder) => Some(embedder),
			None => return Err(MosaicError::EmbedderUnavailable { weight: weights.deep }),
		}
	} else {
		None
	};

	let mut pairs = Vec::new();
	if weights.pixel > 0.0 {
		cancel.check("pixel features")?;
		pairs.push(FeaturePair::new(
			weights.pixel,
			FeatureTensor::pixels(&receiver_grid, options.use_yuv),
			FeatureTensor::pixels(&donor_grid, options.use_yuv),
		));
	}
	if weights.mean > 0.0 {
		cancel.check("mean-color features")?;
		pairs.push(FeaturePair::new(
			weights.mean,
			FeatureTensor::mean_color(&receiver_grid),
			FeatureTensor::mean_color(&donor_grid),
		));
	}
	if weights.sobel > 0.0 {
		cancel.check("sobel features")?;
		pairs.push(FeaturePair::new(
			weights.sobel,
			FeatureTensor::sobel(&receiver_grid),
			FeatureTensor::sobel(&donor_grid),
		));
	}
	if let Some(embedder) = embedder {
		cancel.check("embedding features")?;
		pairs.push(FeaturePair::new(
			weights.deep,
			FeatureTensor::embedding(&receiver_grid, embedder.as_ref())?,
			FeatureTensor::embedding(&donor_grid, embedder.as_ref())?,
		));
	}

	cancel.check("cost matrix")?;
	let matrix = build_cost_matrix(&pairs, allow_gpu)?;

	cancel.check("solve")?;
	let assignment = solve(&matrix)?;
	log::info!("assignment found, total cost {:.4}", assignment.total_cost);

	cancel.check("reassemble")?;
	donor_grid.reassemble(&assignment.indices)
}
