use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tessella_image::{TileGrid, io};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true)]
pub struct Subcommand {
	/// Image to split into fragments
	image: PathBuf,

	/// Directory receiving one `fragment_<row>_<col>.png` per tile
	dir: PathBuf,

	/// Edge length of the square tiles in pixels; must divide both image
	/// dimensions
	#[arg(short, long, default_value_t = 16)]
	tile_size: u32,
}

pub fn run(args: &Subcommand) -> Result<()> {
	let image = io::load(&args.image)?;
	let grid = TileGrid::partition(&image, args.tile_size)?;
	grid.export(&args.dir)?;

	log::info!(
		"wrote {} fragments ({}x{} grid) to {:?}",
		grid.len(),
		grid.rows(),
		grid.cols(),
		args.dir
	);
	Ok(())
}
