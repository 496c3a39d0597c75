//! The uniform grid of square tiles an image is partitioned into.
//!
//! Tiles are stored contiguously in row-major grid order; the linear tile
//! index is `r * cols + c`. Partitioning requires both image dimensions to
//! be positive multiples of the tile size — trailing pixels are rejected,
//! not silently discarded.

use crate::Image;
use anyhow::{Context, Result};
use std::path::Path;
use tessella_core::{MosaicError, MosaicResult};

/// A rows×cols grid of square RGB8 tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
	tiles: Vec<u8>,
	rows: usize,
	cols: usize,
	tile_size: usize,
}

impl TileGrid {
	/// Cuts `image` into square tiles of edge length `tile_size`.
	///
	/// Fails with [`MosaicError::TileGeometry`] if `tile_size` is zero or
	/// either image dimension is not a positive multiple of it.
	pub fn partition(image: &Image, tile_size: u32) -> MosaicResult<Self> {
		if tile_size == 0 {
			return Err(MosaicError::TileGeometry("tile size must be positive".to_string()));
		}

		let ts = tile_size as usize;
		let (width, height) = image.dimensions();
		if width == 0 || height == 0 || width % ts != 0 || height % ts != 0 {
			return Err(MosaicError::TileGeometry(format!(
				"image dimensions {width}x{height} are not positive multiples of tile size {ts}"
			)));
		}

		let rows = height / ts;
		let cols = width / ts;
		let mut tiles = Vec::with_capacity(rows * cols * ts * ts * 3);

		for r in 0..rows {
			for c in 0..cols {
				for dy in 0..ts {
					let row = image.row(r * ts + dy);
					tiles.extend_from_slice(&row[c * ts * 3..(c + 1) * ts * 3]);
				}
			}
		}

		Ok(Self { tiles, rows, cols, tile_size: ts })
	}

	pub fn rows(&self) -> usize {
		self.rows
	}

	pub fn cols(&self) -> usize {
		self.cols
	}

	/// `(rows, cols)` of the grid.
	pub fn shape(&self) -> (usize, usize) {
		(self.rows, self.cols)
	}

	/// Edge length of one tile in pixels.
	pub fn tile_size(&self) -> usize {
		self.tile_size
	}

	/// Number of tiles in the grid.
	pub fn len(&self) -> usize {
		self.rows * self.cols
	}

	pub fn is_empty(&self) -> bool {
		self.tiles.is_empty()
	}

	/// Bytes of one tile: `tile_size * tile_size * 3`.
	pub fn tile_len(&self) -> usize {
		self.tile_size * self.tile_size * 3
	}

	/// The tile at linear index `r * cols + c`, as contiguous RGB8 bytes.
	pub fn tile(&self, index: usize) -> &[u8] {
		let len = self.tile_len();
		&self.tiles[index * len..(index + 1) * len]
	}

	/// Iterates over all tiles in linear order.
	pub fn tiles(&self) -> impl Iterator<Item = &[u8]> {
		self.tiles.chunks_exact(self.tile_len())
	}

	/// All tiles as one contiguous byte buffer, in linear tile order.
	pub fn data(&self) -> &[u8] {
		&self.tiles
	}

	/// Rebuilds an image, placing this grid's tile `assignment[i]` at grid
	/// position `i`.
	///
	/// Fails with [`MosaicError::BadPermutation`] if `assignment` is not a
	/// bijection of `[0, len)`.
	pub fn reassemble(&self, assignment: &[usize]) -> MosaicResult<Image> {
		let n = self.len();
		if assignment.len() != n {
			return Err(MosaicError::BadPermutation(format!(
				"assignment has {} entries for {n} tiles",
				assignment.len()
			)));
		}

		let mut used = vec![false; n];
		for &donor in assignment {
			if donor >= n {
				return Err(MosaicError::BadPermutation(format!(
					"donor index {donor} is out of range for {n} tiles"
				)));
			}
			if used[donor] {
				return Err(MosaicError::BadPermutation(format!(
					"donor tile {donor} is used more than once"
				)));
			}
			used[donor] = true;
		}

		let ts = self.tile_size;
		let mut image = Image::new_empty(self.cols * ts, self.rows * ts);
		let width = self.cols * ts;

		for (i, &donor) in assignment.iter().enumerate() {
			let r = i / self.cols;
			let c = i % self.cols;
			let tile = self.tile(donor);
			for dy in 0..ts {
				let src = &tile[dy * ts * 3..(dy + 1) * ts * 3];
				let dst_start = ((r * ts + dy) * width + c * ts) * 3;
				image.data_mut()[dst_start..dst_start + ts * 3].copy_from_slice(src);
			}
		}

		Ok(image)
	}

	/// Writes every tile as `fragment_<r>_<c>.png` into `dir`, creating the
	/// directory if needed.
	pub fn export(&self, dir: &Path) -> Result<()> {
		std::fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;

		for r in 0..self.rows {
			for c in 0..self.cols {
				let tile = self.tile(r * self.cols + c).to_vec();
				let image = Image::from_raw(self.tile_size, self.tile_size, tile)?;
				crate::io::save(&image, &dir.join(format!("fragment_{r}_{c}.png")))?;
			}
		}
		Ok(())
	}
}

/// The identity assignment for a grid of `n` tiles.
pub fn identity_assignment(n: usize) -> Vec<usize> {
	(0..n).collect()
}
