//! # tessella_core
//!
//! Core types shared across the Tessella workspace:
//!
//! - [`MosaicError`] — the failure taxonomy of a mosaic job.
//! - [`Weights`] and [`MosaicOptions`] — job configuration.
//! - [`CancelToken`] — cooperative cancellation, checked between job phases.
//! - [`TileEmbedder`] — the contract for the external deep-embedding model,
//!   together with its process-wide holder.

mod cancel;
mod embed;
mod error;
mod options;

pub use cancel::CancelToken;
pub use embed::{TileEmbedder, embedder, embedder_available, set_embedder};
pub use error::{MosaicError, MosaicResult};
pub use options::{MosaicOptions, Weights};
