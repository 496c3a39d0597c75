use anyhow::{Result, ensure};
use image::{DynamicImage, RgbImage};

/// An owned RGB8 image: row-major pixel data, three bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
	data: Vec<u8>,
	width: usize,
	height: usize,
}

impl Image {
	/// Creates a black image of the given dimensions.
	pub fn new_empty(width: usize, height: usize) -> Self {
		Self {
			data: vec![0; width * height * 3],
			width,
			height,
		}
	}

	/// Wraps an existing row-major RGB8 buffer.
	pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
		ensure!(
			data.len() == width * height * 3,
			"buffer holds {} bytes, but a {width}x{height} RGB image needs {}",
			data.len(),
			width * height * 3
		);
		Ok(Self { data, width, height })
	}

	/// Builds an image by evaluating `f(x, y)` for every pixel.
	pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> [u8; 3]) -> Self {
		let mut image = Self::new_empty(width, height);
		for y in 0..height {
			for x in 0..width {
				image.set_pixel(x, y, f(x, y));
			}
		}
		image
	}

	pub fn width(&self) -> usize {
		self.width
	}

	pub fn height(&self) -> usize {
		self.height
	}

	/// `(width, height)` in pixels.
	pub fn dimensions(&self) -> (usize, usize) {
		(self.width, self.height)
	}

	pub fn data(&self) -> &[u8] {
		&self.data
	}

	pub fn data_mut(&mut self) -> &mut [u8] {
		&mut self.data
	}

	pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
		let i = (y * self.width + x) * 3;
		[self.data[i], self.data[i + 1], self.data[i + 2]]
	}

	pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
		let i = (y * self.width + x) * 3;
		self.data[i..i + 3].copy_from_slice(&rgb);
	}

	/// One row of pixels as a contiguous byte slice.
	pub fn row(&self, y: usize) -> &[u8] {
		&self.data[y * self.width * 3..(y + 1) * self.width * 3]
	}

	pub(crate) fn to_rgb_image(&self) -> Result<RgbImage> {
		RgbImage::from_vec(self.width as u32, self.height as u32, self.data.clone())
			.ok_or_else(|| anyhow::anyhow!("failed to build an RGB image buffer"))
	}
}

impl From<DynamicImage> for Image {
	fn from(image: DynamicImage) -> Self {
		let rgb = image.into_rgb8();
		Self {
			width: rgb.width() as usize,
			height: rgb.height() as usize,
			data: rgb.into_raw(),
		}
	}
}
