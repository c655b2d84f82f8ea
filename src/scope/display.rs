use crate::channel::ChannelId;
use crate::dialect::Dialect;
use crate::error::{Error, Result};

use super::Oscilloscope;

// Legacy annotation colour names and the Modern bookmark colours that look closest
static COLOR_MAP: &[(&str, &str)] = &[
	("ch1",    "CHAN1"),
	("ch2",    "CHAN2"),
	("ch3",    "CHAN3"),
	("ch4",    "CHAN4"),
	("ch5",    "CHAN5"),
	("ch6",    "CHAN6"),
	("ch7",    "CHAN7"),
	("ch8",    "CHAN8"),
	("dig",    "DCH"),
	("math",   "FUNC1"),
	("ref",    "WMEM"),
	("marker", "MARK"),
	("white",  "FUNC14"),
	("red",    "FUNC12"),
];

pub fn modern_color(legacy: &str) -> Result<&'static str> {
	let key: String = legacy.to_lowercase();
	COLOR_MAP.iter()
		.find(|(name, _)| *name == key)
		.map(|(_, modern)| *modern)
		.ok_or_else(|| Error::Validation(format!("Unknown annotation colour '{}'", legacy)))
}

impl Oscilloscope {

	// Put `text` on screen.  `background` only applies to Legacy firmware (OPAQue, INVerted or TRANsparent).
	pub fn annotate(&mut self, text: &str, color: Option<&str>, background: &str) -> Result<()> {
		self.annotation_text = text.to_owned();
		self.annotate_color(color)?;

		if self.dialect == Dialect::Legacy {
			self.session.write(&format!("DISPlay:ANN:BACKground {}", background))?;
			self.session.write(&format!("DISPlay:ANN:TEXT \"{}\"", text))?;
			self.session.write("DISPlay:ANN ON")?;
		}
		Ok(())
	}

	// Modern bookmarks carry their colour with the text, so changing it redraws the last annotation
	pub fn annotate_color(&mut self, color: Option<&str>) -> Result<()> {
		match self.dialect {
			Dialect::Modern => {
				let name: String = color.map(str::to_owned).unwrap_or_else(|| self.annotation_color.clone());
				let mapped: &str = modern_color(&name)?;
				self.annotation_color = name;

				let text: &str = &self.annotation_text;
				self.session.write("DISPlay:BOOKmark1:XPOSition 0.015")?;
				self.session.write("DISPlay:BOOKmark1:YPOSition 0.06")?;
				self.session.write(&format!("DISPlay:BOOKmark1:SET NONE,\"{}\",{},\"{}\"", text, mapped, text))
			},
			Dialect::Legacy => {
				if let Some(c) = color {
					self.annotation_color = c.to_owned();
					self.session.write(&format!("DISPlay:ANN:COLor {}", c))?;
				}
				Ok(())
			},
		}
	}

	pub fn annotate_off(&mut self) -> Result<()> {
		match self.dialect {
			Dialect::Modern => self.session.write("DISPlay:BOOKmark1:DELete"),
			Dialect::Legacy => self.session.write("DISPlay:ANN OFF"),
		}
	}

	pub fn channel_label(&mut self, label: &str, channel: ChannelId) -> Result<()> {
		self.require_analog(&channel, "label")?;
		self.session.write(&format!("{}:LABel \"{}\"", channel.scpi_source(), label))?;
		self.session.write("DISPlay:LABel ON")
	}

	pub fn channel_label_off(&mut self) -> Result<()> { self.session.write("DISPlay:LABel OFF") }

	// Screenshot as PNG bytes
	pub fn hardcopy(&mut self) -> Result<Vec<u8>> {
		let params: &str = match self.dialect {
			Dialect::Modern => "PNG,SCReen,ON,NORMal",
			Dialect::Legacy => {
				self.session.write("HARDcopy:INKSaver OFF")?;
				"PNG,COLor"
			},
		};
		self.session.query_binary_block(&format!("DISPlay:DATA? {}", params))
	}

	// The instrument's complete setup as an opaque blob, suitable for setup_load()
	pub fn setup_save(&mut self) -> Result<Vec<u8>> { self.session.query_binary_block("SYSTem:SETup?") }

	pub fn setup_load(&mut self, setup: &[u8]) -> Result<()> { self.session.write_binary_block("SYSTem:SETup ", setup) }

}
