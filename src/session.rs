use std::str;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error};

use crate::block;
use crate::config::SessionConfig;
use crate::error::{Error, ErrorEntry, Result, decode_err};
use crate::error_queue::{ErrorForm, ErrorQueueMonitor};
use crate::identity::Identity;
use crate::transport::{self, Transport};

// Status commands like *IDN? and *CLS never get the command prefix
const COMMON_COMMAND_SIGIL: char = '*';

const OPC_POLL: Duration = Duration::from_millis(10);

fn not_open() -> Error { Error::Connection("Session is not open".to_owned()) }

fn with_prefix(config: &SessionConfig, cmd: &str) -> String {
	if cmd.starts_with(COMMON_COMMAND_SIGIL) { cmd.to_owned() }
	else { format!("{}{}", config.command_prefix, cmd) }
}

fn send(t: &mut dyn Transport, config: &SessionConfig, full_cmd: &str) -> Result<()> {
	debug!("-> {}", full_cmd);
	let mut msg: Vec<u8> = full_cmd.as_bytes().to_vec();
	msg.extend_from_slice(config.write_termination.as_bytes());
	t.write(&msg)
}

fn receive_text(t: &mut dyn Transport, config: &SessionConfig) -> Result<String> {
	let raw: Vec<u8> = t.read()?;
	debug!("<- {} bytes", raw.len());
	let s: &str = str::from_utf8(&raw).map_err(|_| decode_err("Response is not valid UTF-8"))?;
	Ok(s.trim_end_matches(|c: char| config.read_strip.contains(c)).to_owned())
}

// Query without any error-queue monitoring
fn raw_query(t: &mut dyn Transport, config: &SessionConfig, cmd: &str) -> Result<String> {
	send(t, config, &with_prefix(config, cmd))?;
	receive_text(t, config)
}

fn is_transport_failure(e: &Error) -> bool { matches!(e, Error::Timeout | Error::Transport(_)) }

// One open connection to one instrument.  Every call drains the instrument's error queue afterwards unless
// it's one of the *_unchecked variants.
pub struct Session {
	resource: String,
	config: SessionConfig,
	transport: Option<Box<dyn Transport>>,
	identity: Option<Identity>,
	monitor: ErrorQueueMonitor,
	last_errors: Vec<ErrorEntry>,
}

impl Session {

	pub fn new(resource: &str, config: SessionConfig) -> Self {
		let monitor = ErrorQueueMonitor::new(config.strict);
		Self{ resource: resource.to_owned(), config, transport: None, identity: None, monitor, last_errors: vec![] }
	}

	// Use an already connected transport, such as transport::mock::MockTransport
	pub fn with_transport(resource: &str, config: SessionConfig, transport: Box<dyn Transport>) -> Self {
		let mut ans = Self::new(resource, config);
		ans.transport = Some(transport);
		ans
	}

	pub fn resource(&self) -> &str { &self.resource }

	pub fn config(&self) -> &SessionConfig { &self.config }

	pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }

	pub fn is_open(&self) -> bool { self.transport.is_some() }

	// Entries from the most recent error-queue drain
	pub fn last_errors(&self) -> &[ErrorEntry] { &self.last_errors }

	pub fn error_form(&self) -> ErrorForm { self.monitor.form() }

	pub(crate) fn monitor_mut(&mut self) -> &mut ErrorQueueMonitor { &mut self.monitor }

	fn transport_mut(&mut self) -> Result<&mut Box<dyn Transport>> { self.transport.as_mut().ok_or_else(not_open) }

	// Connect, clear the device, read its identity and clear its status
	pub fn open(&mut self) -> Result<&Identity> {
		if self.transport.is_none() {
			let t = transport::open(&self.resource, self.config.timeout())?;
			self.transport = Some(t);
		}

		let resource: String = self.resource.clone();
		let connection_err = |e: Error| transport::connection_err(&resource, e);

		match self.transport_mut()?.clear() {
			Ok(()) | Err(Error::Unsupported(_)) => { },
			Err(e) => return Err(connection_err(e)),
		}

		// Error checking depends on the identity, so this one goes unchecked
		let idn: String = self.query_unchecked("*IDN?").map_err(connection_err)?;
		let identity: Identity = idn.parse()?;
		debug!("Connected to {}", identity);
		self.identity = Some(identity);

		self.clear()?;

		self.identity.as_ref().ok_or_else(not_open)
	}

	// Safe to call whether or not the session was ever opened
	pub fn close(&mut self) -> Result<()> {
		match self.transport.take() {
			Some(mut t) => t.close(),
			None => Ok(()),
		}
	}

	// Drain the error queue on behalf of `command`.  Returns whether anything but "no error" came back.
	pub fn check_errors(&mut self, command: &str) -> Result<bool> {
		let report = {
			let Session{ transport, config, monitor, .. } = self;
			let t: &mut dyn Transport = transport.as_mut().ok_or_else(not_open)?.as_mut();
			let config: &SessionConfig = config;
			monitor.drain(command, |q| raw_query(t, config, q))?
		};

		self.last_errors = report.entries;
		if self.config.raise_instrument_errors && !self.last_errors.is_empty() {
			return Err(Error::Instrument{ command: command.to_owned(), entries: self.last_errors.clone() });
		}

		Ok(report.has_errors)
	}

	fn checked<T, F>(&mut self, full_cmd: &str, op: F) -> Result<T>
		where F: FnOnce(&mut Self) -> Result<T>
	{
		match op(self) {
			Ok(v) => {
				self.check_errors(full_cmd)?;
				Ok(v)
			},
			Err(e) => {
				// Leave a record of whatever the instrument thought of the command, then report the failure itself
				if is_transport_failure(&e) {
					match self.check_errors(full_cmd) {
						Ok(_) => {},
						Err(Error::Instrument{ entries, .. }) => {
							error!("'{}' failed with {} instrument error(s) queued: {}", full_cmd, entries.len(), e);
						},
						Err(drain_err) => {
							error!("Unable to read the error queue after '{}' failed: {}", full_cmd, drain_err);
						},
					}
				}
				Err(e)
			},
		}
	}

	pub fn write_unchecked(&mut self, cmd: &str) -> Result<()> {
		let full_cmd: String = with_prefix(&self.config, cmd);
		let Session{ transport, config, .. } = self;
		send(transport.as_mut().ok_or_else(not_open)?.as_mut(), config, &full_cmd)
	}

	pub fn query_unchecked(&mut self, cmd: &str) -> Result<String> {
		let Session{ transport, config, .. } = self;
		raw_query(transport.as_mut().ok_or_else(not_open)?.as_mut(), config, cmd)
	}

	pub fn query_binary_block_unchecked(&mut self, cmd: &str) -> Result<Vec<u8>> {
		self.write_unchecked(cmd)?;
		let payload: Vec<u8> = self.transport_mut()?.read_block()?;
		debug!("<- block of {} bytes", payload.len());
		Ok(payload)
	}

	pub fn write(&mut self, cmd: &str) -> Result<()> {
		let full_cmd: String = with_prefix(&self.config, cmd);
		self.checked(&full_cmd, |s| s.write_unchecked(cmd))
	}

	pub fn query(&mut self, cmd: &str) -> Result<String> {
		let full_cmd: String = with_prefix(&self.config, cmd);
		self.checked(&full_cmd, |s| s.query_unchecked(cmd))
	}

	pub fn query_number(&mut self, cmd: &str) -> Result<f64> {
		let ans: String = self.query(cmd)?;
		ans.trim().parse::<f64>().map_err(|_| decode_err(format!("Expected a number from '{}', got '{}'", cmd, ans.trim())))
	}

	// Comma separated ASCII numbers
	pub fn query_numbers(&mut self, cmd: &str) -> Result<Vec<f64>> {
		let ans: String = self.query(cmd)?;
		ans.trim().split(',')
			.map(|v| v.trim().parse::<f64>().map_err(|_| decode_err(format!("Expected a number from '{}', got '{}'", cmd, v.trim()))))
			.collect()
	}

	// Raw payload of an IEEE 488.2 block response
	pub fn query_binary_block(&mut self, cmd: &str) -> Result<Vec<u8>> {
		let full_cmd: String = with_prefix(&self.config, cmd);
		self.checked(&full_cmd, |s| s.query_binary_block_unchecked(cmd))
	}

	// Sends `cmd` immediately followed by `data` as an IEEE 488.2 block
	pub fn write_binary_block(&mut self, cmd: &str, data: &[u8]) -> Result<()> {
		let full_cmd: String = with_prefix(&self.config, cmd);
		self.checked(&full_cmd, |s| {
			let mut msg: Vec<u8> = full_cmd.as_bytes().to_vec();
			msg.extend_from_slice(&block::encode(data));
			msg.extend_from_slice(s.config.write_termination.as_bytes());
			debug!("-> {}<block of {} bytes>", full_cmd, data.len());
			s.transport_mut()?.write(&msg)
		})
	}

	pub fn idn(&mut self) -> Result<String> { self.query("*IDN?") }

	pub fn clear(&mut self) -> Result<()> { self.write("*CLS") }

	pub fn reset(&mut self) -> Result<()> { self.write("*RST") }

	pub fn set_local(&mut self) -> Result<()> { self.write("SYSTem:LOCK OFF") }

	pub fn set_remote(&mut self) -> Result<()> { self.write("SYSTem:LOCK ON") }

	// Block until every pending operation has finished, giving up after the session timeout
	pub fn wait_complete(&mut self) -> Result<()> {
		self.write("*OPC")?;
		let deadline: Instant = Instant::now() + self.config.timeout();
		loop {
			if self.query("*OPC?")?.trim().starts_with('1') { return Ok(()); }
			if Instant::now() >= deadline { return Err(Error::Timeout); }
			thread::sleep(OPC_POLL);
		}
	}

}
