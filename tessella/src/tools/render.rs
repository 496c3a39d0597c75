use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tessella::pipeline::render_mosaic_with;
use tessella_core::{CancelToken, MosaicOptions, Weights};
use tessella_image::io;

#[derive(Args, Debug)]
#[command(arg_required_else_help = true)]
pub struct Subcommand {
	/// Receiver image: its tile positions are kept
	receiver: PathBuf,

	/// Donor image: its tile contents fill the mosaic
	donor: PathBuf,

	/// Output path (.png or .jpg)
	#[arg(short, long, default_value = "mosaic.png")]
	output: PathBuf,

	/// Edge length of the square tiles in pixels; must divide both images'
	/// dimensions
	#[arg(short, long, default_value_t = 16)]
	tile_size: u32,

	/// Compare raw pixels in YUV space instead of RGB
	#[arg(long)]
	yuv: bool,

	/// Raw-pixel-difference weight
	#[arg(long, default_value_t = 1.0)]
	w_pixel: f32,

	/// Mean-color weight
	#[arg(long, default_value_t = 0.0)]
	w_mean: f32,

	/// Sobel edge weight
	#[arg(long, default_value_t = 0.0)]
	w_sobel: f32,

	/// Deep-embedding weight (requires a registered embedder)
	#[arg(long, default_value_t = 0.0)]
	w_deep: f32,

	/// Force the CPU cost backend even when a GPU is available
	#[arg(long)]
	cpu: bool,
}

pub fn run(args: &Subcommand) -> Result<()> {
	let receiver = io::load(&args.receiver)?;
	let donor = io::load(&args.donor)?;

	let options = MosaicOptions {
		tile_size: args.tile_size,
		use_yuv: args.yuv,
		weights: Weights::new(args.w_pixel, args.w_mean, args.w_sobel, args.w_deep),
	};

	let mosaic = render_mosaic_with(&receiver, &donor, &options, &CancelToken::new(), !args.cpu)?;
	io::save(&mosaic, &args.output)?;
	log::info!("wrote mosaic to {:?}", args.output);
	Ok(())
}
