use std::fmt;

use serde::Serialize;

use crate::channel::ChannelId;
use crate::dialect::{self, Dialect, LEGACY_THRESHOLD, LEGACY_THRESHOLD_3000T};
use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Series {
	Generic,
	Keysight,
	Dsox,
	Msox,
	Dsox3,
	Msox3,
	Dsox3T,
	Msox3T,
	Mxr,
	Exr,
	Uxr,
}

impl fmt::Display for Series {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Series::Generic  => "GENERIC",
			Series::Keysight => "KEYSIGHT",
			Series::Dsox     => "DSOX",
			Series::Msox     => "MSOX",
			Series::Dsox3    => "DSOX3",
			Series::Msox3    => "MSOX3",
			Series::Dsox3T   => "DSOX3T",
			Series::Msox3T   => "MSOX3T",
			Series::Mxr      => "MXR",
			Series::Exr      => "EXR",
			Series::Uxr      => "UXR",
		};
		write!(f, "{}", name)
	}
}

// How MEASure:RESults? has to be coaxed into returning the statistics table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatisticsStyle {
	// Open the measure menu and statistics display first (InfiniiVision)
	MenuDisplay,
	// Ask directly (Infiniium)
	Direct,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityProfile {
	pub series: Series,
	pub analog_channels: u8,
	pub pods: u8,
	// DIFF, COMM, FUNC, HIST, WMEM, BUS and PODALL sources
	pub infiniium_sources: bool,
	pub legacy_threshold: f64,
	pub dvm: bool,
	pub dvm_frequency: bool,
	pub statistics: Option<StatisticsStyle>,
	// MXR and EXR autoscale needs AUToscale:PLACement first
	pub autoscale_placement: bool,
}

pub const FUNCTION_COUNT: u8 = 16;
pub const MEMORY_COUNT: u8 = 8;
pub const BUS_COUNT: u8 = 4;

impl CapabilityProfile {

	// Minimal profile for an instrument nothing is known about
	pub fn generic() -> Self {
		Self {
			series: Series::Generic,
			analog_channels: 1,
			pods: 0,
			infiniium_sources: false,
			legacy_threshold: 0.0,
			dvm: false,
			dvm_frequency: false,
			statistics: None,
			autoscale_placement: false,
		}
	}

	fn keysight(series: Series, analog_channels: u8) -> Self {
		Self {
			series,
			analog_channels,
			pods: 0,
			infiniium_sources: false,
			legacy_threshold: LEGACY_THRESHOLD,
			dvm: false,
			dvm_frequency: false,
			statistics: Some(StatisticsStyle::Direct),
			autoscale_placement: false,
		}
	}

	fn infiniivision(series: Series, analog_channels: u8) -> Self {
		let mixed: bool = matches!(series, Series::Msox | Series::Msox3 | Series::Msox3T);
		let threshold: f64 = if matches!(series, Series::Dsox3T | Series::Msox3T) { LEGACY_THRESHOLD_3000T } else { LEGACY_THRESHOLD };
		Self {
			pods: if mixed { 2 } else { 0 },
			legacy_threshold: threshold,
			dvm: true,
			dvm_frequency: matches!(series, Series::Dsox3 | Series::Msox3),
			statistics: Some(StatisticsStyle::MenuDisplay),
			..Self::keysight(series, analog_channels)
		}
	}

	fn infiniium(series: Series, analog_channels: u8) -> Self {
		Self {
			pods: 2,
			infiniium_sources: true,
			dvm: true,
			autoscale_placement: true,
			..Self::keysight(series, analog_channels)
		}
	}

	pub fn dialect_for(&self, identity: &Identity) -> Dialect {
		dialect::resolve(&identity.firmware, self.legacy_threshold)
	}

	pub fn analog(&self) -> Vec<ChannelId> {
		(1..=self.analog_channels).map(ChannelId::Analog).collect()
	}

	// Every source this instrument accepts, analog channels first
	pub fn valid_channels(&self) -> Vec<ChannelId> {
		let mut ans: Vec<ChannelId> = self.analog();

		if self.infiniium_sources {
			ans.extend((1..=self.analog_channels).map(ChannelId::Differential));
			ans.extend((1..=self.analog_channels).map(ChannelId::CommonMode));
			ans.extend((1..=FUNCTION_COUNT).map(ChannelId::Function));
			ans.push(ChannelId::Histogram);
			ans.extend((1..=MEMORY_COUNT).map(ChannelId::Memory));
			ans.extend((1..=BUS_COUNT).map(ChannelId::Bus));
		}

		ans.extend((1..=self.pods).map(ChannelId::Pod));
		if self.infiniium_sources && self.pods > 0 { ans.push(ChannelId::PodAll); }

		ans
	}

	pub fn is_valid(&self, channel: &ChannelId) -> bool {
		match channel {
			ChannelId::Analog(n) => *n >= 1 && *n <= self.analog_channels,
			ChannelId::Pod(n) => *n >= 1 && *n <= self.pods,
			_ => self.valid_channels().contains(channel),
		}
	}

	pub fn is_valid_analog(&self, channel: &ChannelId) -> bool {
		channel.is_analog() && self.is_valid(channel)
	}

}

// Model numbers show up as "DSO-X 3034A", "MSOX3034T", "MXR058A"...
fn normalize_model(model: &str) -> String {
	model.to_uppercase().chars().filter(|c| *c != '-' && !c.is_whitespace()).collect()
}

fn channels_from_suffix(model: &str, suffixes: &[(&str, u8)], default: u8) -> u8 {
	suffixes.iter()
		.find(|(suffix, _)| model.ends_with(suffix))
		.map(|(_, n)| *n)
		.unwrap_or(default)
}

// Picks the most specific profile the identity matches
pub fn best_capability_for(identity: &Identity) -> CapabilityProfile {
	let manufacturer: String = identity.manufacturer.to_uppercase();
	if !(manufacturer.starts_with("KEYSIGHT") || manufacturer.starts_with("AGILENT")) {
		return CapabilityProfile::generic();
	}

	let model: String = normalize_model(&identity.model);

	if model.starts_with("MXR") || model.starts_with("EXR") {
		let series = if model.starts_with("MXR") { Series::Mxr } else { Series::Exr };
		let n: u8 = channels_from_suffix(&model, &[("8A", 8), ("4A", 4)], 4);
		return CapabilityProfile::infiniium(series, n);
	}

	if model.starts_with("UXR") {
		let n: u8 = channels_from_suffix(&model, &[("4AP", 4), ("4A", 4), ("2AP", 2), ("2A", 2)], 4);
		return CapabilityProfile::keysight(Series::Uxr, n);
	}

	let mixed: bool = model.starts_with("MSOX");
	if mixed || model.starts_with("DSOX") {
		if model.starts_with(if mixed { "MSOX3" } else { "DSOX3" }) {
			let (a_series, t_series) = if mixed { (Series::Msox3, Series::Msox3T) } else { (Series::Dsox3, Series::Dsox3T) };
			let suffixes: [(&str, Series, u8); 4] = [("4A", a_series, 4), ("2A", a_series, 2), ("4T", t_series, 4), ("2T", t_series, 2)];

			if let Some((_, series, n)) = suffixes.iter().find(|(suffix, _, _)| model.ends_with(suffix)) {
				return CapabilityProfile::infiniivision(*series, *n);
			}
		}
		return CapabilityProfile::infiniivision(if mixed { Series::Msox } else { Series::Dsox }, 2);
	}

	CapabilityProfile::keysight(Series::Keysight, 2)
}
