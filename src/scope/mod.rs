use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::capability::{self, CapabilityProfile, Series};
use crate::channel::ChannelId;
use crate::config::SessionConfig;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::session::Session;

pub mod display;
pub mod measure;
pub mod waveform;

pub use measure::{DvmMode, StatRecord, OVER_RANGE, UNDER_RANGE};
pub use waveform::{Samples, Waveform};

// Mode changes don't always take on some models without a short pause first
const MODE_SETTLE: Duration = Duration::from_millis(100);

pub const DEFAULT_ANNOTATION_COLOR: &str = "ch1";

// One oscilloscope.  What it can do is decided by its capability profile and command dialect, both settled
// by upgrade() once the instrument has identified itself.
pub struct Oscilloscope {
	session: Session,
	profile: CapabilityProfile,
	dialect: Dialect,
	annotation_text: String,
	annotation_color: String,
}

impl Oscilloscope {

	pub fn new(resource: &str, config: SessionConfig) -> Self {
		Self::with_session(Session::new(resource, config))
	}

	pub fn with_session(session: Session) -> Self {
		Self {
			session,
			profile: CapabilityProfile::generic(),
			dialect: Dialect::Modern,
			annotation_text: String::new(),
			annotation_color: DEFAULT_ANNOTATION_COLOR.to_owned(),
		}
	}

	// Open, then switch to the profile the identity calls for
	pub fn connect(resource: &str, config: SessionConfig) -> Result<Self> {
		let mut scope = Self::new(resource, config);
		scope.open()?;
		scope.upgrade()
	}

	pub fn open(&mut self) -> Result<&Identity> {
		self.session.open()?;
		self.apply_dialect()?;
		self.identity()
	}

	pub fn close(&mut self) -> Result<()> { self.session.close() }

	fn apply_dialect(&mut self) -> Result<()> {
		let identity: &Identity = self.session.identity().ok_or_else(|| Error::Connection("Instrument has not been opened".to_owned()))?;
		self.dialect = self.profile.dialect_for(identity);
		let modern: bool = self.dialect == Dialect::Modern;
		self.session.monitor_mut().set_modern_allowed(modern);
		Ok(())
	}

	// Replace the generic profile with the one that best matches the identity.  The session and its
	// configuration carry over untouched; call this once per connection.
	pub fn upgrade(self) -> Result<Self> {
		let mut session: Session = self.session;
		if session.identity().is_none() { session.open()?; }

		let profile: CapabilityProfile = match session.identity() {
			Some(identity) => capability::best_capability_for(identity),
			None => return Err(Error::Connection("Instrument did not identify itself".to_owned())),
		};

		let mut ans = Self{ profile, ..Self::with_session(session) };
		ans.apply_dialect()?;

		if let Some(identity) = ans.session.identity() {
			info!("{} is a {} series scope using the {} command dialect", identity, ans.profile.series, ans.dialect);
		}
		Ok(ans)
	}

	pub fn identity(&self) -> Result<&Identity> {
		self.session.identity().ok_or_else(|| Error::Connection("Instrument has not been opened".to_owned()))
	}

	pub fn profile(&self) -> &CapabilityProfile { &self.profile }

	pub fn series(&self) -> Series { self.profile.series }

	pub fn dialect(&self) -> Dialect { self.dialect }

	pub fn session(&self) -> &Session { &self.session }

	pub fn session_mut(&mut self) -> &mut Session { &mut self.session }

	pub fn valid_channels(&self) -> Vec<ChannelId> { self.profile.valid_channels() }

	pub(crate) fn require_channel(&self, channel: &ChannelId, what: &str) -> Result<()> {
		if self.profile.is_valid(channel) { Ok(()) }
		else { Err(Error::Validation(format!("Invalid channel {} for {} on a {} series scope", channel, what, self.profile.series))) }
	}

	pub(crate) fn require_analog(&self, channel: &ChannelId, what: &str) -> Result<()> {
		if self.profile.is_valid_analog(channel) { Ok(()) }
		else { Err(Error::Validation(format!("Invalid analog channel {} for {} on a {} series scope", channel, what, self.profile.series))) }
	}

	fn settle(&self) { thread::sleep(self.session.config().wait()); }

	pub fn mode_run(&mut self) -> Result<()> {
		thread::sleep(MODE_SETTLE);
		self.session.write("RUN")
	}

	pub fn mode_stop(&mut self) -> Result<()> {
		thread::sleep(MODE_SETTLE);
		self.session.write("STOP")
	}

	pub fn mode_single(&mut self) -> Result<()> {
		thread::sleep(MODE_SETTLE);
		self.session.write("SINGLE")
	}

	pub fn autoscale(&mut self) -> Result<()> { self.session.write("AUToscale") }

	// Show only `channels` and autoscale them.  An empty list autoscales whatever is displayed.
	pub fn setup_autoscale(&mut self, channels: &[ChannelId]) -> Result<()> {
		if self.profile.autoscale_placement {
			self.session.write("AUToscale:PLACement SEParate")?;
		}

		if !channels.is_empty() {
			self.output_off_all()?;
			for channel in channels {
				if self.profile.is_valid(channel) {
					self.session.write(&format!("VIEW {}", channel.scpi_source()))?;
				} else {
					warn!("Invalid channel {} for autoscale, skipping", channel);
				}
			}
		}

		self.autoscale()
	}

	pub fn output_on(&mut self, channel: ChannelId) -> Result<()> {
		self.require_channel(&channel, "VIEW")?;
		self.session.write(&format!("VIEW {}", channel.scpi_source()))?;
		self.settle();
		Ok(())
	}

	pub fn output_off(&mut self, channel: ChannelId) -> Result<()> {
		self.require_channel(&channel, "BLANK")?;
		self.session.write(&format!("BLANK {}", channel.scpi_source()))?;
		self.settle();
		Ok(())
	}

	pub fn output_on_all(&mut self) -> Result<()> {
		for channel in self.profile.analog() {
			self.session.write(&format!("VIEW {}", channel.scpi_source()))?;
		}
		self.settle();
		Ok(())
	}

	pub fn output_off_all(&mut self) -> Result<()> {
		// Legacy firmware blanks everything when given no argument
		match self.dialect {
			Dialect::Modern => self.session.write("BLANk ALL")?,
			Dialect::Legacy => self.session.write("BLANk")?,
		}
		self.settle();
		Ok(())
	}

	pub fn is_output_on(&mut self, channel: ChannelId) -> Result<bool> {
		self.require_channel(&channel, "STATus?")?;
		let ans: String = self.session.query(&format!("STATus? {}", channel.scpi_source()))?;
		Ok(ans.trim().starts_with('1'))
	}

}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::mock::MockTransport;

	fn scope(mock: &MockTransport, idn: &str) -> Oscilloscope {
		mock.reply_text("*IDN?", idn);
		let session = Session::with_transport("mock", SessionConfig::default(), Box::new(mock.clone()));
		let mut scope = Oscilloscope::with_session(session);
		scope.open().unwrap();
		scope.upgrade().unwrap()
	}

	#[test]
	fn off_all_depends_on_dialect() {
		let mock = MockTransport::new();
		let mut s = scope(&mock, "KEYSIGHT TECHNOLOGIES,MSO-X 3034A,SN1,02.65.2021");
		mock.clear_log();
		s.output_off_all().unwrap();
		assert_eq!(mock.commands()[0], ":BLANk");

		let mock = MockTransport::new();
		let mut s = scope(&mock, "KEYSIGHT TECHNOLOGIES,MXR058A,SN1,11.10.00302");
		mock.clear_log();
		s.output_off_all().unwrap();
		assert_eq!(mock.commands()[0], ":BLANk ALL");
	}

	#[test]
	fn autoscale_skips_invalid_channels() {
		let mock = MockTransport::new();
		let mut s = scope(&mock, "KEYSIGHT TECHNOLOGIES,MXR058A,SN1,11.10.00302");
		mock.clear_log();
		s.setup_autoscale(&[ChannelId::Analog(2), ChannelId::Analog(9)]).unwrap();

		let sent: Vec<String> = mock.commands().into_iter().filter(|c| !c.starts_with(":SYSTem:ERRor")).collect();
		assert_eq!(sent, vec![":AUToscale:PLACement SEParate", ":BLANk ALL", ":VIEW CHAN2", ":AUToscale"]);
	}

	#[test]
	fn output_status() {
		let mock = MockTransport::new();
		let mut s = scope(&mock, "KEYSIGHT TECHNOLOGIES,DSO-X 3034A,SN1,02.65.2021");
		mock.reply_text(":STATus? CHAN3", "1");
		assert!(s.is_output_on(ChannelId::Analog(3)).unwrap());
		assert!(matches!(s.output_on(ChannelId::Pod(1)), Err(Error::Validation(_))));
	}
}
