use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Error;

lazy_static! {
	static ref TCPIP_INSTR_RE: Regex  = Regex::new(r"(?i)^TCPIP\d*::([^:]+)(?:::([A-Za-z]+\d*))?::INSTR$").unwrap();
	static ref TCPIP_SOCKET_RE: Regex = Regex::new(r"(?i)^TCPIP\d*::([^:]+)::(\d+)::SOCKET$").unwrap();
	static ref BARE_HOST_RE: Regex    = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.\-]*$").unwrap();
}

pub const DEFAULT_DEVICE: &str = "inst0";

#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
	Vxi11 { host: String, device: String },
	Socket { host: String, port: u16 },
}

impl FromStr for Resource {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();

		if let Some(caps) = TCPIP_INSTR_RE.captures(s) {
			let host: String = caps[1].to_owned();
			let device: String = caps.get(2).map(|m| m.as_str().to_owned()).unwrap_or_else(|| DEFAULT_DEVICE.to_owned());
			return Ok(Resource::Vxi11{ host, device });
		}

		if let Some(caps) = TCPIP_SOCKET_RE.captures(s) {
			let port: u16 = caps[2].parse().map_err(|_| Error::Connection(format!("Port out of range in '{}'", s)))?;
			return Ok(Resource::Socket{ host: caps[1].to_owned(), port });
		}

		let upper: String = s.to_uppercase();
		if upper.starts_with("USB") || upper.starts_with("GPIB") || upper.starts_with("ASRL") {
			return Err(Error::Connection(format!("Only TCPIP resources are supported, not '{}'", s)));
		}

		if BARE_HOST_RE.is_match(s) {
			return Ok(Resource::Vxi11{ host: s.to_owned(), device: DEFAULT_DEVICE.to_owned() });
		}

		Err(Error::Connection(format!("Unable to parse resource string '{}'", s)))
	}
}
