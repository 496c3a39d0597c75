//! # Tessella
//!
//! Tessella rebuilds a *receiver* image as a mosaic of a *donor* image's
//! tiles: both images are cut into a uniform grid of square fragments,
//! per-tile features are compared pairwise, and a minimum-cost perfect
//! matching places every donor fragment on exactly one receiver position.
//!
//! ## Usage example
//!
//! ```no_run
//! use tessella::core::{CancelToken, MosaicOptions, Weights};
//! use tessella::image::io;
//! use tessella::pipeline::render_mosaic;
//!
//! fn main() -> anyhow::Result<()> {
//!     let receiver = io::load("receiver.png".as_ref())?;
//!     let donor = io::load("donor.png".as_ref())?;
//!
//!     let mut options = MosaicOptions::new(16);
//!     options.weights = Weights::new(0.6, 0.0, 0.4, 0.0);
//!
//!     let mosaic = render_mosaic(&receiver, &donor, &options, &CancelToken::new())?;
//!     io::save(&mosaic, "mosaic.png".as_ref())?;
//!     Ok(())
//! }
//! ```

pub mod pipeline;

pub use tessella_core as core;
pub use tessella_image as image;
pub use tessella_match as matching;
