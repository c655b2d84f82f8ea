use std::fmt;

use serde::Serialize;

use crate::identity::FirmwareVersion;

// Highest firmware version still speaking the legacy command set, for most of the family
pub const LEGACY_THRESHOLD: f64 = 2.99;

// The 3000T scopes kept the legacy commands well past version 3
pub const LEGACY_THRESHOLD_3000T: f64 = 9.999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dialect {
	Legacy,
	Modern,
}

// Versions above the threshold are modern.  An opaque version has nothing to compare, so it's modern.
pub fn resolve(firmware: &FirmwareVersion, legacy_threshold: f64) -> Dialect {
	match firmware {
		FirmwareVersion::Numeric(v) if *v <= legacy_threshold => Dialect::Legacy,
		_ => Dialect::Modern,
	}
}

impl fmt::Display for Dialect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Dialect::Legacy => write!(f, "legacy"),
			Dialect::Modern => write!(f, "modern"),
		}
	}
}
