use std::time::Duration;

use serde::{Serialize, Deserialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
	// Injected ahead of every command that doesn't start with '*'
	pub command_prefix: String,
	// Characters trimmed off the end of every text response
	pub read_strip: String,
	pub write_termination: String,
	pub timeout_ms: u64,
	// Settle time after turning a channel on or off
	pub wait_secs: f64,
	// Error-queue protocol problems become hard errors instead of warnings
	pub strict: bool,
	// Drained error-queue entries are returned as Error::Instrument instead of only being logged
	pub raise_instrument_errors: bool,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			command_prefix: ":".to_owned(),
			read_strip: "\n".to_owned(),
			write_termination: "\n".to_owned(),
			timeout_ms: 5000,
			wait_secs: 0.0,
			strict: false,
			raise_instrument_errors: false,
		}
	}
}

impl SessionConfig {

	pub fn from_json(s: &str) -> Result<Self> { Ok(serde_json::from_str(s)?) }

	pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }

	pub fn wait(&self) -> Duration { Duration::from_secs_f64(self.wait_secs.max(0.0)) }

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_fields_take_defaults() {
		let cfg = SessionConfig::from_json(r#"{ "timeout_ms": 2000, "strict": true }"#).unwrap();
		assert_eq!(cfg.timeout(), Duration::from_millis(2000));
		assert!(cfg.strict);
		assert_eq!(cfg.command_prefix, ":");
		assert_eq!(cfg.read_strip, "\n");
	}

	#[test]
	fn bad_json_is_a_config_error() {
		assert!(matches!(SessionConfig::from_json("{ timeout_ms: }"), Err(crate::error::Error::Config(_))));
	}
}
