extern crate scope_scpi;

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use scope_scpi::{ChannelId, Oscilloscope, Result, SessionConfig};

/// Download one channel from an oscilloscope and print it as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
	/// VISA resource string, e.g. TCPIP0::192.168.1.10::INSTR
	resource: String,
	/// Channel name: 1..8, POD1, BUS1, FUNC1, HIST
	channel: String,
	/// Number of points to request
	points: Option<usize>,
	/// JSON session configuration
	#[arg(short, long)]
	config: Option<PathBuf>,
}

pub fn main() -> Result<()> {
	let cli = Cli::parse();
	env_logger::init();

	let channel: ChannelId = cli.channel.parse()?;
	let config: SessionConfig = match &cli.config {
		Some(path) => SessionConfig::from_json(&fs::read_to_string(path)?)?,
		None => SessionConfig::default(),
	};

	let mut scope: Oscilloscope = Oscilloscope::connect(&cli.resource, config)?;
	eprintln!("{}", scope.identity()?);

	let waveform = scope.waveform(channel, cli.points)?;
	info!("Captured {} samples from channel {}", waveform.x.len(), channel);

	println!("{}", serde_json::to_string_pretty(&waveform)?);

	scope.close()
}
