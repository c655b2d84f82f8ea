use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result, decode_err};

lazy_static! {
	static ref IDN_RE: Regex = Regex::new(r"^\s*([^,]*),([^,]*),([^,]*),([^,]*?)\s*$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FirmwareVersion {
	// "{major}.{minor}" when both are plain digits
	Numeric(f64),
	// Anything else, split on '.'
	Opaque(Vec<String>),
}

impl FirmwareVersion {

	pub fn parse(s: &str) -> Self {
		let parts: Vec<String> = s.trim().split('.').map(|p| p.to_owned()).collect();

		let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
		if parts.len() >= 2 && all_digits(&parts[0]) && all_digits(&parts[1]) {
			if let Ok(v) = format!("{}.{}", parts[0], parts[1]).parse::<f64>() {
				return FirmwareVersion::Numeric(v);
			}
		}

		FirmwareVersion::Opaque(parts)
	}

}

impl fmt::Display for FirmwareVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FirmwareVersion::Numeric(v) => write!(f, "{:.2}", v),
			FirmwareVersion::Opaque(parts) => write!(f, "{}", parts.join(".")),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
	pub manufacturer: String,
	pub model: String,
	pub serial: String,
	pub firmware: FirmwareVersion,
}

impl Identity {

	pub fn new(manufacturer: &str, model: &str, serial: &str, firmware: &str) -> Self {
		Self {
			manufacturer: manufacturer.trim().to_owned(),
			model: model.trim().to_owned(),
			serial: serial.trim().to_owned(),
			firmware: FirmwareVersion::parse(firmware),
		}
	}

}

impl FromStr for Identity {
	type Err = Error;

	// "<manufacturer>,<model>,<serial>,<firmware>" as returned by *IDN?
	fn from_str(s: &str) -> Result<Self> {
		let caps = IDN_RE.captures(s).ok_or_else(|| decode_err(format!("Unrecognized *IDN? response '{}'", s.trim())))?;
		Ok(Identity::new(&caps[1], &caps[2], &caps[3], &caps[4]))
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} (serial {}, firmware {})", self.manufacturer, self.model, self.serial, self.firmware)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keysight_idn() {
		let idn: Identity = "KEYSIGHT TECHNOLOGIES,MSO-X 3034A,MY12345678,02.65.2021030741\n".parse().unwrap();
		assert_eq!(idn.manufacturer, "KEYSIGHT TECHNOLOGIES");
		assert_eq!(idn.model, "MSO-X 3034A");
		assert_eq!(idn.serial, "MY12345678");
		assert_eq!(idn.firmware, FirmwareVersion::Numeric(2.65));
	}

	#[test]
	fn non_numeric_firmware_is_opaque() {
		assert_eq!(FirmwareVersion::parse("A.01.23"), FirmwareVersion::Opaque(vec!["A".into(), "01".into(), "23".into()]));
		assert_eq!(FirmwareVersion::parse("11"), FirmwareVersion::Opaque(vec!["11".into()]));
		assert_eq!(FirmwareVersion::parse("11.10.00302"), FirmwareVersion::Numeric(11.10));
	}

	#[test]
	fn short_idn_is_rejected() {
		assert!("KEYSIGHT,MSOX3034A".parse::<Identity>().is_err());
	}
}
