//! The failure taxonomy of a mosaic job.
//!
//! Every fatal condition maps onto one [`MosaicError`] variant naming the
//! kind and carrying a one-line detail. GPU unavailability is deliberately
//! absent: falling back to the CPU backend is recovered locally and only
//! logged.

use thiserror::Error;

/// Fatal error kinds surfaced at the orchestrator boundary.
#[derive(Debug, Error)]
pub enum MosaicError {
	/// Invalid tile size, image dimensions not divisible by it, or the two
	/// grids disagree in shape.
	#[error("tile geometry: {0}")]
	TileGeometry(String),

	/// Reassembly received an assignment that is not a bijection of [0, N).
	#[error("bad permutation: {0}")]
	BadPermutation(String),

	/// The cost matrix buffer cannot form an n×n matrix.
	#[error("cost matrix is not square: {len} entries do not form an n×n matrix")]
	NotSquare { len: usize },

	/// The cost matrix contains NaN or an infinity.
	#[error("cost matrix entry ({row}, {col}) is not finite")]
	NonFinite { row: usize, col: usize },

	/// The deep-embedding weight is positive but no embedder is registered.
	#[error("deep-embedding weight is {weight} but no embedder is registered")]
	EmbedderUnavailable { weight: f32 },

	/// The caller's cancellation token was observed set at a phase boundary.
	#[error("job cancelled before phase '{phase}'")]
	Cancelled { phase: &'static str },

	/// Image decoding, encoding or filesystem failure.
	#[error("image error: {0}")]
	Image(#[from] anyhow::Error),
}

/// Result alias used throughout the workspace's library crates.
pub type MosaicResult<T> = Result<T, MosaicError>;
