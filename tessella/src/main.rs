mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	#[clap(alias = "mosaic")]
	/// Rebuild a receiver image from a donor image's tiles
	Render(tools::render::Subcommand),

	/// Split an image into its tiles, one PNG per fragment
	Fragment(tools::fragment::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Render(arguments) => tools::render::run(arguments),
		Commands::Fragment(arguments) => tools::fragment::run(arguments),
	}
}

#[cfg(test)]
mod tests {
	use crate::{Cli, run};
	use anyhow::Result;
	use clap::Parser;

	fn run_command(arg_vec: Vec<&str>) -> Result<String> {
		let cli = Cli::try_parse_from(arg_vec)?;
		let msg = format!("{cli:?}");
		run(cli)?;
		Ok(msg)
	}

	#[test]
	fn help() {
		let err = run_command(vec!["tessella"]).unwrap_err().to_string();
		assert!(err.contains("Usage: tessella [OPTIONS] <COMMAND>"));
	}

	#[test]
	fn version() {
		let err = run_command(vec!["tessella", "-V"]).unwrap_err().to_string();
		assert!(err.starts_with("tessella "));
	}

	#[test]
	fn render_requires_both_images() {
		let err = run_command(vec!["tessella", "render"]).unwrap_err().to_string();
		assert!(err.contains("<RECEIVER>"));
		assert!(err.contains("<DONOR>"));
	}

	#[test]
	fn fragment_requires_image_and_directory() {
		let err = run_command(vec!["tessella", "fragment"]).unwrap_err().to_string();
		assert!(err.contains("<IMAGE>"));
		assert!(err.contains("<DIR>"));
	}
}
