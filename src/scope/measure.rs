use std::thread;
use std::time::{Duration, Instant};

use log::warn;
use serde::Serialize;

use crate::capability::StatisticsStyle;
use crate::channel::{self, ChannelId};
use crate::dialect::Dialect;
use crate::error::{Error, Result, decode_err};

use super::Oscilloscope;

// What the instrument returns when a measurement can't be made
pub const OVER_RANGE: f64 = 9.9e37;
pub const UNDER_RANGE: f64 = -9.9e37;

// Time for a freshly installed measurement to produce its first value
pub const MEASURE_SETTLE: Duration = Duration::from_millis(250);
// Time for the DVM to settle after a mode change
pub const DVM_SETTLE: Duration = Duration::from_millis(500);
pub const DVM_FREQUENCY_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Param {
	None,
	Fixed(&'static str),
	// "<source>,<suffix>"
	Source(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct Command {
	mode: &'static str,
	param: Param,
	// Sent once before anything else
	prelude: Option<&'static str>,
}

const fn cmd(mode: &'static str) -> Option<Command> { Some(Command{ mode, param: Param::None, prelude: None }) }

const fn cmd_with(mode: &'static str, param: Param) -> Option<Command> { Some(Command{ mode, param, prelude: None }) }

struct Measurement {
	name: &'static str,
	units: &'static str,
	legacy: Option<Command>,
	modern: Option<Command>,
	// Some measurements can only be queried, never added to the measurement display
	installable: bool,
}

const fn m(name: &'static str, units: &'static str, legacy: Option<Command>, modern: Option<Command>) -> Measurement {
	Measurement{ name, units, legacy, modern, installable: true }
}

static MEASUREMENTS: &[Measurement] = &[
	m("Bit Rate",              "Hz", cmd("BRATe"),     Some(Command{ mode: "CDRRate", param: Param::None, prelude: Some("ANALyze:AEDGes ON") })),
	m("Burst Width",           "s",  cmd("BWIDth"),    cmd_with("BWIDth", Param::Source("1e-6"))),
	Measurement{ name: "Counter Freq", units: "Hz", legacy: cmd("COUNter"), modern: None, installable: false },
	m("Frequency",             "Hz", cmd("FREQ"),      cmd("FREQ")),
	m("Period",                "s",  cmd("PERiod"),    cmd("PERiod")),
	m("Duty",                  "%",  cmd("DUTYcycle"), cmd_with("DUTYcycle", Param::Source("RISing"))),
	m("Neg Duty",              "%",  cmd("NDUTy"),     cmd_with("DUTYcycle", Param::Source("FALLing"))),
	m("Fall Time",             "s",  cmd("FALLtime"),  cmd("FALLtime")),
	m("Rise Time",             "s",  cmd("RISetime"),  cmd("RISetime")),
	m("Num Falling",           "",   cmd("NEDGes"),    None),
	m("Num Neg Pulses",        "",   cmd("NPULses"),   cmd("NPULses")),
	m("Num Rising",            "",   cmd("PEDGes"),    None),
	m("Num Pos Pulses",        "",   cmd("PPULses"),   cmd("PPULses")),
	m("- Width",               "s",  cmd("NWIDth"),    cmd("NWIDth")),
	m("+ Width",               "s",  cmd("PWIDth"),    cmd("PWIDth")),
	m("Overshoot",             "%",  cmd("OVERshoot"), cmd("OVERshoot")),
	m("Preshoot",              "%",  cmd("PREShoot"),  cmd("PREShoot")),
	m("Amplitude",             "V",  cmd("VAMPlitude"), cmd("VAMPlitude")),
	m("Top",                   "V",  cmd("VTOP"),      cmd("VTOP")),
	m("Base",                  "V",  cmd("VBASe"),     cmd("VBASe")),
	m("Maximum",               "V",  cmd("VMAX"),      cmd("VMAX")),
	m("Minimum",               "V",  cmd("VMIN"),      cmd("VMIN")),
	m("Pk-Pk",                 "V",  cmd("VPP"),       cmd("VPP")),
	m("V p-p",                 "V",  cmd("VPP"),       cmd("VPP")),
	m("Average - Full Screen", "V",  cmd_with("VAVerage", Param::Fixed("DISPlay")), cmd_with("VAVerage", Param::Fixed("DISPlay"))),
	m("RMS - Full Screen",     "V",  cmd_with("VRMS", Param::Fixed("DISPlay,DC")),  cmd_with("VRMS", Param::Fixed("DISPlay,DC"))),
];

fn lookup(name: &str) -> Option<&'static Measurement> { MEASUREMENTS.iter().find(|m| m.name == name) }

// Every measurement name measure() knows about
pub fn measurement_names() -> impl Iterator<Item = &'static str> { MEASUREMENTS.iter().map(|m| m.name) }

pub fn measure_units(name: &str) -> Option<&'static str> { lookup(name).map(|m| m.units) }

// One row of the statistics table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRecord {
	pub label: String,
	pub current: f64,
	pub min: f64,
	pub max: f64,
	pub mean: f64,
	pub std_dev: f64,
	pub count: i64,
}

pub const STATISTICS_COLUMNS: usize = 7;

fn stat_number(s: &str) -> Result<f64> {
	s.trim().parse::<f64>().map_err(|_| decode_err(format!("Statistics value '{}' is not a number", s.trim())))
}

// Rows of label, current, min, max, mean, std dev, count, all run together in one comma separated list
pub fn parse_statistics(s: &str, style: StatisticsStyle) -> Result<Vec<StatRecord>> {
	let fields: Vec<&str> = s.trim().split(',').collect();
	if fields.len() % STATISTICS_COLUMNS != 0 {
		warn!("Statistics table has {} fields, which isn't a whole number of {} column rows", fields.len(), STATISTICS_COLUMNS);
		return Ok(vec![]);
	}

	fields.chunks(STATISTICS_COLUMNS).map(|row| {
		let count: i64 = match style {
			StatisticsStyle::MenuDisplay => row[6].trim().parse::<i64>()
				.map_err(|_| decode_err(format!("Statistics count '{}' is not an integer", row[6].trim())))?,
			// Infiniium reports the count in float notation
			StatisticsStyle::Direct => stat_number(row[6])? as i64,
		};

		Ok(StatRecord {
			label: row[0].trim().trim_matches('"').to_owned(),
			current: stat_number(row[1])?,
			min: stat_number(row[2])?,
			max: stat_number(row[3])?,
			mean: stat_number(row[4])?,
			std_dev: stat_number(row[5])?,
			count,
		})
	}).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DvmMode {
	AcRms,
	Dc,
	DcRms,
	Frequency,
}

impl DvmMode {

	pub fn scpi_name(self) -> &'static str {
		match self {
			DvmMode::AcRms     => "ACRM",
			DvmMode::Dc        => "DC",
			DvmMode::DcRms     => "DCRM",
			DvmMode::Frequency => "FREQ",
		}
	}

}

impl Oscilloscope {

	// Take the named measurement on an analog channel, adding it to the measurement display first when
	// `install` is set.  Names this dialect has no command for read as OVER_RANGE.
	pub fn measure(&mut self, name: &str, channel: ChannelId, install: bool) -> Result<f64> {
		self.measure_settled(name, channel, install, MEASURE_SETTLE)
	}

	pub fn measure_settled(&mut self, name: &str, channel: ChannelId, install: bool, settle: Duration) -> Result<f64> {
		self.require_analog(&channel, "measurement")?;

		let measurement: &Measurement = match lookup(name) {
			Some(m) => m,
			None => {
				warn!("Unknown measurement '{}'", name);
				return Ok(OVER_RANGE);
			},
		};

		let available: Option<Command> = match self.dialect {
			Dialect::Legacy => measurement.legacy,
			Dialect::Modern => measurement.modern,
		};
		let command: Command = match available {
			Some(c) => c,
			None => return Ok(OVER_RANGE),
		};

		if let Some(prelude) = command.prelude {
			self.session.write(prelude)?;
		}

		let src: String = channel.scpi_source();
		let current = channel::parse_source(&self.session.query("MEASure:SOURce?")?);
		if current != Some(channel) {
			self.session.write(&format!("MEASure:SOURce {}", src))?;
		}

		let param: String = match command.param {
			Param::None => String::new(),
			Param::Fixed(p) => format!(" {}", p),
			Param::Source(suffix) => format!(" {},{}", src, suffix),
		};

		if install && measurement.installable {
			match self.dialect {
				Dialect::Modern => self.session.write("MEASure:STATistics ON")?,
				Dialect::Legacy => self.session.write("MEASure:STATistics:DISPlay ON")?,
			}
			self.session.write(&format!("MEASure:{}{}", command.mode, param))?;
		}

		thread::sleep(settle);
		self.session.query_number(&format!("MEASure:{}?{}", command.mode, param))
	}

	pub fn measure_statistics(&mut self) -> Result<Vec<StatRecord>> {
		let style: StatisticsStyle = self.profile.statistics
			.ok_or_else(|| Error::Validation(format!("{} series scopes have no measurement statistics", self.profile.series)))?;

		if style == StatisticsStyle::MenuDisplay {
			self.session.write("SYSTem:MENU MEASure")?;
			self.session.write("MEASure:STATistics:DISPlay ON")?;
		}

		self.session.write("MEASure:STATistics ON")?;
		let table: String = self.session.query("MEASure:RESults?")?;
		parse_statistics(&table, style)
	}

	fn require_dvm(&self) -> Result<()> {
		if self.profile.dvm { Ok(()) }
		else { Err(Error::Validation(format!("{} series scopes have no DVM", self.profile.series))) }
	}

	pub fn dvm_enabled(&mut self) -> Result<bool> {
		self.require_dvm()?;
		Ok(self.session.query("DVM:ENABle?")?.trim().starts_with('1'))
	}

	pub fn enable_dvm(&mut self, enable: bool) -> Result<()> {
		self.require_dvm()?;
		self.session.write(if enable { "DVM:ENABLE ON" } else { "DVM:ENABLE OFF" })
	}

	// Read the DVM, polling until it reports something other than OVER_RANGE or `timeout` runs out.
	// Frequency mode defaults to a 3 s timeout; other modes wait indefinitely when `timeout` is None.
	pub fn measure_dvm(&mut self, mode: DvmMode, channel: ChannelId, timeout: Option<Duration>) -> Result<f64> {
		self.measure_dvm_settled(mode, channel, timeout, DVM_SETTLE)
	}

	pub fn measure_dvm_settled(&mut self, mode: DvmMode, channel: ChannelId, timeout: Option<Duration>, settle: Duration) -> Result<f64> {
		self.require_dvm()?;
		if mode == DvmMode::Frequency && !self.profile.dvm_frequency {
			return Ok(OVER_RANGE);
		}
		self.require_analog(&channel, "DVM")?;

		if !self.dvm_enabled()? {
			self.enable_dvm(true)?;
		}

		let current = channel::parse_source(&self.session.query("DVM:SOURce?")?);
		if current != Some(channel) {
			self.session.write(&format!("DVM:SOURce {}", channel.scpi_source()))?;
		}

		self.session.write(&format!("DVM:MODE {}", mode.scpi_name()))?;
		thread::sleep(settle);

		let timeout: Option<Duration> = match (mode, timeout) {
			(DvmMode::Frequency, None) => Some(DVM_FREQUENCY_TIMEOUT),
			(_, t) => t,
		};

		let started: Instant = Instant::now();
		let mut value: f64 = OVER_RANGE;
		while value >= OVER_RANGE {
			if let Some(t) = timeout {
				if started.elapsed() > t { break; }
			}
			value = self.session.query_number("DVM:CURRent?")?;
		}

		if mode == DvmMode::Frequency {
			value = self.session.query_number("DVM:FREQ?")?;
		}

		Ok(value)
	}

}
