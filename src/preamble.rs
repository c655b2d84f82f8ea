use serde::Serialize;

use crate::dialect::Dialect;
use crate::error::{Result, decode_err};

// Every code table here is closed: a code that isn't listed fails the decode

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Format {
	Ascii,
	Byte,
	Word,
	Long,
	LongLong,
	Float,
}

impl Format {

	pub fn from_code(code: i64, dialect: Dialect) -> Result<Self> {
		let ans = match (dialect, code) {
			(Dialect::Modern, 0) => Format::Ascii,
			(Dialect::Modern, 1) => Format::Byte,
			(Dialect::Modern, 2) => Format::Word,
			(Dialect::Modern, 3) => Format::Long,
			(Dialect::Modern, 4) => Format::LongLong,
			(Dialect::Modern, 5) => Format::Float,
			(Dialect::Legacy, 0) => Format::Byte,
			(Dialect::Legacy, 1) => Format::Word,
			(Dialect::Legacy, 4) => Format::Ascii,
			_ => return Err(decode_err(format!("Unknown {} waveform format code {}", dialect, code))),
		};
		Ok(ans)
	}

	pub fn name(self) -> &'static str {
		match self {
			Format::Ascii    => "ASCii",
			Format::Byte     => "BYTE",
			Format::Word     => "WORD",
			Format::Long     => "LONG",
			Format::LongLong => "LONGLONG",
			Format::Float    => "FLOat",
		}
	}

	// Bytes per sample in a binary transfer
	pub fn width(self) -> Option<usize> {
		match self {
			Format::Ascii    => None,
			Format::Byte     => Some(1),
			Format::Word     => Some(2),
			Format::Long     => Some(4),
			Format::LongLong => Some(8),
			Format::Float    => Some(4),
		}
	}

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AcquisitionType {
	Normal,
	Peak,
	Average,
	HighResolution,
	Raw,
	VerticalHistogram,
	HorizontalHistogram,
	Interpolate,
	Digital,
	PeakDetect,
}

impl AcquisitionType {

	pub fn from_code(code: i64, dialect: Dialect) -> Result<Self> {
		let ans = match (dialect, code) {
			(Dialect::Legacy, 0)  => AcquisitionType::Normal,
			(Dialect::Legacy, 1)  => AcquisitionType::Peak,
			(Dialect::Legacy, 2)  => AcquisitionType::Average,
			(Dialect::Legacy, 3)  => AcquisitionType::HighResolution,
			(Dialect::Modern, 1)  => AcquisitionType::Raw,
			(Dialect::Modern, 2)  => AcquisitionType::Average,
			(Dialect::Modern, 3)  => AcquisitionType::VerticalHistogram,
			(Dialect::Modern, 4)  => AcquisitionType::HorizontalHistogram,
			(Dialect::Modern, 6)  => AcquisitionType::Interpolate,
			(Dialect::Modern, 9)  => AcquisitionType::Digital,
			(Dialect::Modern, 10) => AcquisitionType::PeakDetect,
			_ => return Err(decode_err(format!("Unknown {} acquisition type code {}", dialect, code))),
		};
		Ok(ans)
	}

	pub fn name(self) -> &'static str {
		match self {
			AcquisitionType::Normal              => "NORMal",
			AcquisitionType::Peak                => "PEAK",
			AcquisitionType::Average             => "AVERage",
			AcquisitionType::HighResolution      => "HRESolution",
			AcquisitionType::Raw                 => "RAW",
			AcquisitionType::VerticalHistogram   => "VHIStogram",
			AcquisitionType::HorizontalHistogram => "HHIStogram",
			AcquisitionType::Interpolate         => "INTerpolate",
			AcquisitionType::Digital             => "DIGITAL",
			AcquisitionType::PeakDetect          => "PDETect",
		}
	}

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AcquireMode { RealTime, EquivalentTime, Segmented, PeakDetect }

impl AcquireMode {

	pub fn from_code(code: i64) -> Result<Self> {
		match code {
			0 => Ok(AcquireMode::RealTime),
			1 => Ok(AcquireMode::EquivalentTime),
			2 => Ok(AcquireMode::Segmented),
			3 => Ok(AcquireMode::PeakDetect),
			_ => Err(decode_err(format!("Unknown acquire mode code {}", code))),
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			AcquireMode::RealTime       => "RTIMe",
			AcquireMode::EquivalentTime => "ETIMe",
			AcquireMode::Segmented      => "SEGMented",
			AcquireMode::PeakDetect     => "PDETect",
		}
	}

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Coupling { Ac, Dc, DcFifty, LfReject }

impl Coupling {

	pub fn from_code(code: i64) -> Result<Self> {
		match code {
			0 => Ok(Coupling::Ac),
			1 => Ok(Coupling::Dc),
			2 => Ok(Coupling::DcFifty),
			3 => Ok(Coupling::LfReject),
			_ => Err(decode_err(format!("Unknown coupling code {}", code))),
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Coupling::Ac       => "AC",
			Coupling::Dc       => "DC",
			Coupling::DcFifty  => "DCFIFTY",
			Coupling::LfReject => "LFREJECT",
		}
	}

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Units { Unknown, Volt, Second, Constant, Amp, Decibel, Hertz, Watt }

impl Units {

	pub fn from_code(code: i64) -> Result<Self> {
		let ans = match code {
			0 => Units::Unknown,
			1 => Units::Volt,
			2 => Units::Second,
			3 => Units::Constant,
			4 => Units::Amp,
			5 => Units::Decibel,
			6 => Units::Hertz,
			7 => Units::Watt,
			_ => return Err(decode_err(format!("Unknown units code {}", code))),
		};
		Ok(ans)
	}

	pub fn name(self) -> &'static str {
		match self {
			Units::Unknown  => "UNKNOWN",
			Units::Volt     => "VOLT",
			Units::Second   => "SECOND",
			Units::Constant => "CONSTANT",
			Units::Amp      => "AMP",
			Units::Decibel  => "DECIBEL",
			Units::Hertz    => "HERTZ",
			Units::Watt     => "WATT",
		}
	}

	pub fn abbreviation(self) -> &'static str {
		match self {
			Units::Unknown  => "?",
			Units::Volt     => "V",
			Units::Second   => "s",
			Units::Constant => "CONST.",
			Units::Amp      => "A",
			Units::Decibel  => "dB",
			Units::Hertz    => "Hz",
			Units::Watt     => "W",
		}
	}

	pub fn axis(self) -> &'static str {
		match self {
			Units::Unknown  => "UNKNOWN",
			Units::Volt     => "Voltage",
			Units::Second   => "Time",
			Units::Constant => "CONSTANT",
			Units::Amp      => "Current",
			Units::Decibel  => "Decibels",
			Units::Hertz    => "Frequency",
			Units::Watt     => "Power",
		}
	}

	// Column header such as "Time (s)"
	pub fn label(self) -> String { format!("{} ({})", self.axis(), self.abbreviation()) }

}

// What it takes to turn sample indices and raw codes into physical values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Axes {
	pub x_increment: f64,
	pub x_origin: f64,
	pub x_reference: i64,
	pub y_increment: f64,
	pub y_origin: f64,
	pub y_reference: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyPreamble {
	pub format: Format,
	pub acquisition_type: AcquisitionType,
	pub points: i64,
	pub average_count: i64,
	pub axes: Axes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModernPreamble {
	pub format: Format,
	pub acquisition_type: AcquisitionType,
	pub points: i64,
	pub average_count: i64,
	pub axes: Axes,
	pub coupling: Coupling,
	pub x_display_range: f64,
	pub x_display_origin: f64,
	pub y_display_range: f64,
	pub y_display_origin: f64,
	pub date: String,
	pub time: String,
	pub frame_model: String,
	pub acquire_mode: AcquireMode,
	pub completion: String,
	pub x_units: Units,
	pub y_units: Units,
	pub max_bw_limit: String,
	pub min_bw_limit: String,
}

pub const LEGACY_FIELDS: usize = 10;
pub const MODERN_FIELDS: usize = 24;

fn number(fields: &[&str], i: usize, name: &str) -> Result<f64> {
	fields[i].trim().parse::<f64>()
		.map_err(|_| decode_err(format!("Preamble field {} ({}) is not a number: '{}'", i, name, fields[i])))
}

// Integer-valued fields sometimes arrive in float notation
fn integer(fields: &[&str], i: usize, name: &str) -> Result<i64> {
	let v: f64 = number(fields, i, name)?;
	if !v.is_finite() { return Err(decode_err(format!("Preamble field {} ({}) is not finite", i, name))); }
	Ok(v.trunc() as i64)
}

fn text(fields: &[&str], i: usize) -> String { fields[i].trim().trim_matches('"').to_owned() }

fn split(s: &str, expected: usize, dialect: Dialect) -> Result<Vec<&str>> {
	let fields: Vec<&str> = s.trim().split(',').collect();
	if fields.len() != expected {
		return Err(decode_err(format!("{} preamble has {} fields, expected {}", dialect, fields.len(), expected)));
	}
	Ok(fields)
}

fn axes(f: &[&str]) -> Result<Axes> {
	Ok(Axes {
		x_increment: number(f, 4, "x increment")?,
		x_origin:    number(f, 5, "x origin")?,
		x_reference: integer(f, 6, "x reference")?,
		y_increment: number(f, 7, "y increment")?,
		y_origin:    number(f, 8, "y origin")?,
		y_reference: integer(f, 9, "y reference")?,
	})
}

impl LegacyPreamble {

	pub fn parse(s: &str) -> Result<Self> {
		let f = split(s, LEGACY_FIELDS, Dialect::Legacy)?;
		Ok(Self {
			format: Format::from_code(integer(&f, 0, "format")?, Dialect::Legacy)?,
			acquisition_type: AcquisitionType::from_code(integer(&f, 1, "type")?, Dialect::Legacy)?,
			points: integer(&f, 2, "points")?,
			average_count: integer(&f, 3, "count")?,
			axes: axes(&f)?,
		})
	}

}

impl ModernPreamble {

	pub fn parse(s: &str) -> Result<Self> {
		let f = split(s, MODERN_FIELDS, Dialect::Modern)?;
		Ok(Self {
			format: Format::from_code(integer(&f, 0, "format")?, Dialect::Modern)?,
			acquisition_type: AcquisitionType::from_code(integer(&f, 1, "type")?, Dialect::Modern)?,
			points: integer(&f, 2, "points")?,
			average_count: integer(&f, 3, "count")?,
			axes: axes(&f)?,
			coupling: Coupling::from_code(integer(&f, 10, "coupling")?)?,
			x_display_range: number(&f, 11, "x display range")?,
			x_display_origin: number(&f, 12, "x display origin")?,
			y_display_range: number(&f, 13, "y display range")?,
			y_display_origin: number(&f, 14, "y display origin")?,
			date: text(&f, 15),
			time: text(&f, 16),
			frame_model: text(&f, 17),
			acquire_mode: AcquireMode::from_code(integer(&f, 18, "acquire mode")?)?,
			completion: text(&f, 19),
			x_units: Units::from_code(integer(&f, 20, "x units")?)?,
			y_units: Units::from_code(integer(&f, 21, "y units")?)?,
			max_bw_limit: text(&f, 22),
			min_bw_limit: text(&f, 23),
		})
	}

	// Start index and length of a window of `points` samples centred on the display
	pub fn centered_window(&self, points: usize) -> Result<(i64, usize)> {
		if !self.axes.x_increment.is_finite() || self.axes.x_increment == 0.0 {
			return Err(decode_err(format!("Unusable x increment {} in the preamble", self.axes.x_increment)));
		}

		let midpt: f64 = (((self.x_display_range / 2.0) + self.x_display_origin) - self.axes.x_origin) / self.axes.x_increment;
		if !midpt.is_finite() || midpt.abs() >= i64::MAX as f64 {
			return Err(decode_err(format!("Display centre {} is not a usable sample index", midpt)));
		}

		Ok((midpt as i64 - (points / 2) as i64, points))
	}

}
