//! Contract for the external deep-embedding model.
//!
//! The model itself (a mid-layer of a convolutional network, or anything
//! else producing fixed-length vectors) lives outside this workspace. It is
//! registered once per process and shared by all jobs; after initialization
//! the handle is immutable.

use std::sync::{Arc, OnceLock};

/// Produces a fixed-length feature vector for a square RGB8 tile.
///
/// Implementations must be safe to call from multiple threads once
/// initialized.
pub trait TileEmbedder: Send + Sync {
	/// The length of every vector returned by [`embed`](Self::embed).
	fn dim(&self) -> usize;

	/// Embeds one tile. `tile` holds `tile_size * tile_size * 3` bytes of
	/// row-major RGB data.
	///
	/// The returned vector must have exactly [`dim`](Self::dim) entries; it
	/// does not need to be normalized (the matcher ℓ²-normalizes rows).
	fn embed(&self, tile: &[u8], tile_size: usize) -> anyhow::Result<Vec<f32>>;
}

static EMBEDDER: OnceLock<Arc<dyn TileEmbedder>> = OnceLock::new();

/// Registers the process-wide embedder. Returns `false` if one was already
/// registered (the first registration wins and stays immutable).
pub fn set_embedder(embedder: Arc<dyn TileEmbedder>) -> bool {
	EMBEDDER.set(embedder).is_ok()
}

/// The registered embedder, if any.
pub fn embedder() -> Option<Arc<dyn TileEmbedder>> {
	EMBEDDER.get().cloned()
}

/// Whether an embedder has been registered.
pub fn embedder_available() -> bool {
	EMBEDDER.get().is_some()
}
