use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::Error;

lazy_static! {
	static ref CHANNEL_RE: Regex = Regex::new(r"(?i)^(CHAN(?:NEL)?|POD|DIFF|COMM|FUNC|WMEM|BUS)?(\d+)$").unwrap();
}

// Anything that can be a waveform or measurement source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
	Analog(u8),
	Pod(u8),
	PodAll,
	Differential(u8),
	CommonMode(u8),
	Function(u8),
	Histogram,
	Memory(u8),
	Bus(u8),
}

impl ChannelId {

	// Form used in commands like WAVeform:SOURce
	pub fn scpi_source(&self) -> String {
		match self {
			ChannelId::Analog(n) => format!("CHAN{}", n),
			other => other.to_string(),
		}
	}

	pub fn is_analog(&self) -> bool { matches!(self, ChannelId::Analog(_)) }

	pub fn is_pod(&self) -> bool { matches!(self, ChannelId::Pod(_) | ChannelId::PodAll) }

	pub fn is_bus(&self) -> bool { matches!(self, ChannelId::Bus(_)) }

	pub fn is_histogram(&self) -> bool { *self == ChannelId::Histogram }

	// First bit lane of a pod; PODALL starts at D0
	pub fn pod_number(&self) -> Option<u8> {
		match self {
			ChannelId::Pod(n) => Some(*n),
			ChannelId::PodAll => Some(1),
			_ => None,
		}
	}

}

impl fmt::Display for ChannelId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ChannelId::Analog(n)       => write!(f, "{}", n),
			ChannelId::Pod(n)          => write!(f, "POD{}", n),
			ChannelId::PodAll          => write!(f, "PODALL"),
			ChannelId::Differential(n) => write!(f, "DIFF{}", n),
			ChannelId::CommonMode(n)   => write!(f, "COMM{}", n),
			ChannelId::Function(n)     => write!(f, "FUNC{}", n),
			ChannelId::Histogram       => write!(f, "HIST"),
			ChannelId::Memory(n)       => write!(f, "WMEM{}", n),
			ChannelId::Bus(n)          => write!(f, "BUS{}", n),
		}
	}
}

impl FromStr for ChannelId {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		let upper: String = s.to_uppercase();
		if upper == "PODALL" { return Ok(ChannelId::PodAll); }
		if upper == "HIST" { return Ok(ChannelId::Histogram); }

		let invalid = || Error::Validation(format!("'{}' is not a channel", s));
		let caps = CHANNEL_RE.captures(s).ok_or_else(invalid)?;
		let n: u8 = caps[2].parse().map_err(|_| invalid())?;
		if n == 0 { return Err(invalid()); }

		let kind: String = caps.get(1).map(|m| m.as_str().to_uppercase()).unwrap_or_default();
		Ok(match kind.as_str() {
			"" | "CHAN" | "CHANNEL" => ChannelId::Analog(n),
			"POD"  => ChannelId::Pod(n),
			"DIFF" => ChannelId::Differential(n),
			"COMM" => ChannelId::CommonMode(n),
			"FUNC" => ChannelId::Function(n),
			"WMEM" => ChannelId::Memory(n),
			"BUS"  => ChannelId::Bus(n),
			_      => return Err(invalid()),
		})
	}
}

impl Serialize for ChannelId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

// Parse the reply to a "...:SOURce?" query.  Anything that isn't a channel comes back as None.
pub fn parse_source(s: &str) -> Option<ChannelId> {
	s.trim().trim_matches('"').parse().ok()
}
