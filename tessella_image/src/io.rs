//! PNG/JPEG loading and saving.
//!
//! The codec layer is intentionally thin: whatever the `image` crate
//! decodes is converted to RGB8, and saving picks the format from the file
//! extension. Only PNG and JPEG are supported.

use crate::Image;
use anyhow::{Context, Result, bail};
use image::ImageFormat;
use std::path::Path;

/// Loads a PNG or JPEG file as an RGB8 [`Image`].
///
/// Alpha channels and gray images are converted to RGB by the decoder.
pub fn load(path: &Path) -> Result<Image> {
	let decoded = image::open(path).with_context(|| format!("failed to load image {path:?}"))?;
	let image = Image::from(decoded);
	log::debug!("loaded {}x{} image from {path:?}", image.width(), image.height());
	Ok(image)
}

/// Saves an [`Image`] as PNG or JPEG, chosen by the file extension.
pub fn save(image: &Image, path: &Path) -> Result<()> {
	let format = match ImageFormat::from_path(path) {
		Ok(ImageFormat::Png) => ImageFormat::Png,
		Ok(ImageFormat::Jpeg) => ImageFormat::Jpeg,
		Ok(other) => bail!("unsupported output format {other:?} for {path:?}, use .png or .jpg"),
		Err(_) => bail!("cannot derive an image format from {path:?}, use .png or .jpg"),
	};

	image
		.to_rgb_image()?
		.save_with_format(path, format)
		.with_context(|| format!("failed to save image {path:?}"))
}
