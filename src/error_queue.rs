use log::{error, warn};
use serde::Serialize;

use crate::error::{Error, ErrorEntry, Result};

// Reading more than this many entries can't be draining a real queue
pub const ERROR_QUEUE: usize = 30;

// The two ways instruments in this family answer an error-queue query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorForm {
	// "SYSTem:ERRor?" answered with "+0,\"No error\""
	Legacy,
	// "SYSTem:ERRor? STRing" answered with "0,\"No error\""
	Modern,
}

impl ErrorForm {

	pub fn query(self) -> &'static str {
		match self {
			ErrorForm::Legacy => "SYSTem:ERRor?",
			ErrorForm::Modern => "SYSTem:ERRor? STRing",
		}
	}

	pub fn no_error(self) -> &'static str {
		match self {
			ErrorForm::Legacy => "+0,",
			ErrorForm::Modern => "0,",
		}
	}

}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DrainReport {
	pub entries: Vec<ErrorEntry>,
	pub reads: usize,
	// Set when anything other than the no-error sentinel came back, including empty or failed reads
	pub has_errors: bool,
	// Set when the no-error sentinel was seen
	pub drained: bool,
	// Form switches made during this drain
	pub transitions: usize,
}

// A bare number with no explanation is what a modern instrument gives back for the legacy query
fn is_bare_number(s: &str) -> bool {
	let digits: &str = s.strip_prefix('+').or_else(|| s.strip_prefix('-')).unwrap_or(s);
	!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub fn parse_entry(s: &str) -> ErrorEntry {
	let mut parts = s.splitn(2, ',');
	let head: &str = parts.next().unwrap_or("").trim();
	let tail: &str = parts.next().unwrap_or("").trim();

	match head.trim_start_matches('+').parse::<i32>() {
		Ok(code) => ErrorEntry{ code, message: tail.trim_matches('"').to_owned() },
		Err(_)   => ErrorEntry{ code: 0, message: s.to_owned() },
	}
}

pub struct ErrorQueueMonitor {
	form: ErrorForm,
	modern_allowed: bool,
	strict: bool,
}

impl ErrorQueueMonitor {

	// Starts in the legacy form since every instrument answers it with something
	pub fn new(strict: bool) -> Self { Self{ form: ErrorForm::Legacy, modern_allowed: true, strict } }

	pub fn form(&self) -> ErrorForm { self.form }

	// Instruments resolved to the legacy command dialect only ever get the legacy query
	pub fn set_modern_allowed(&mut self, allowed: bool) { self.modern_allowed = allowed; }

	// Reads the queue until the no-error sentinel, at most ERROR_QUEUE times.  `query` must send its command
	// without monitoring it.
	pub fn drain<F>(&mut self, originating: &str, mut query: F) -> Result<DrainReport>
		where F: FnMut(&str) -> Result<String>
	{
		let mut form: ErrorForm = if self.form == ErrorForm::Modern && self.modern_allowed { ErrorForm::Modern } else { ErrorForm::Legacy };
		let mut report = DrainReport::default();
		let mut exhausted: bool = true;

		for reads in 0..ERROR_QUEUE {
			report.reads += 1;

			let response: String = match query(form.query()) {
				Ok(s) => s,
				Err(Error::Timeout) if form == ErrorForm::Modern => {
					// Older firmware ignores a parameter after the '?' and never answers
					form = ErrorForm::Legacy;
					report.transitions += 1;
					continue;
				},
				Err(e) => {
					error!("Unexpected failure reading the error queue: {}, command: '{}'", e, originating);
					report.has_errors = true;
					exhausted = false;
					break;
				},
			};

			let response: &str = response.trim();
			if response.is_empty() {
				error!("ERROR: {} returned nothing, command: '{}'", form.query(), originating);
				report.has_errors = true;
				exhausted = false;
				break;
			}

			if response.starts_with(form.no_error()) {
				report.drained = true;
				exhausted = false;
				break;
			}

			if form == ErrorForm::Legacy && self.modern_allowed && is_bare_number(response) {
				form = ErrorForm::Modern;
				report.transitions += 1;
				continue;
			}

			error!("ERROR({:02}): {}, command: '{}'", reads, response, originating);
			report.has_errors = true;
			report.entries.push(parse_entry(response));
		}

		self.form = form;

		if exhausted {
			self.protocol_issue(format!("Error queue not drained after {} reads, command: '{}'", ERROR_QUEUE, originating))?;
		}
		if report.transitions > 1 {
			self.protocol_issue(format!("Error query form switched {} times in one drain, command: '{}'", report.transitions, originating))?;
		}

		Ok(report)
	}

	fn protocol_issue(&self, msg: String) -> Result<()> {
		if self.strict { return Err(Error::Protocol(msg)); }
		warn!("{}", msg);
		Ok(())
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stops_at_sentinel() {
		let mut monitor = ErrorQueueMonitor::new(false);
		let mut replies = vec!["+0,\"No error\"", "-113,\"Undefined header\""];
		let report = monitor.drain("BOGUS", |_| Ok(replies.pop().unwrap_or("").to_owned())).unwrap();

		assert_eq!(report.reads, 2);
		assert!(report.has_errors && report.drained);
		assert_eq!(report.entries, vec![ErrorEntry{ code: -113, message: "Undefined header".to_owned() }]);
	}

	#[test]
	fn bounded_against_endless_errors() {
		let mut monitor = ErrorQueueMonitor::new(false);
		let mut calls = 0;
		let report = monitor.drain("X", |_| { calls += 1; Ok("-100,\"Command error\"".to_owned()) }).unwrap();

		assert_eq!(calls, ERROR_QUEUE);
		assert_eq!(report.reads, ERROR_QUEUE);
		assert!(report.has_errors);
		assert!(!report.drained);
	}

	#[test]
	fn endless_errors_fail_in_strict_mode() {
		let mut monitor = ErrorQueueMonitor::new(true);
		let result = monitor.drain("X", |_| Ok("-100,\"Command error\"".to_owned()));
		assert!(matches!(result, Err(Error::Protocol(_))));
	}

	#[test]
	fn bare_number_switches_to_modern_and_retries() {
		let mut monitor = ErrorQueueMonitor::new(false);
		let mut sent: Vec<String> = vec![];
		let report = monitor.drain("X", |q| {
			sent.push(q.to_owned());
			Ok(if q == "SYSTem:ERRor?" { "0".to_owned() } else { "0,\"No error\"".to_owned() })
		}).unwrap();

		assert_eq!(sent, vec!["SYSTem:ERRor?", "SYSTem:ERRor? STRing"]);
		assert!(!report.has_errors);
		assert_eq!(monitor.form(), ErrorForm::Modern);

		// The switch sticks for later drains
		let report = monitor.drain("Y", |q| { assert_eq!(q, "SYSTem:ERRor? STRing"); Ok("0,\"No error\"".to_owned()) }).unwrap();
		assert_eq!(report.reads, 1);
	}

	#[test]
	fn modern_timeout_falls_back_to_legacy() {
		let mut monitor = ErrorQueueMonitor::new(false);
		monitor.drain("X", |q| Ok(if q == "SYSTem:ERRor?" { "0".to_owned() } else { "0,\"No error\"".to_owned() })).unwrap();

		let report = monitor.drain("Y", |q| {
			if q == "SYSTem:ERRor? STRing" { Err(Error::Timeout) } else { Ok("+0,\"No error\"".to_owned()) }
		}).unwrap();

		assert_eq!(report.reads, 2);
		assert!(!report.has_errors);
		assert_eq!(monitor.form(), ErrorForm::Legacy);
	}

	fn modern_monitor(strict: bool) -> ErrorQueueMonitor {
		let mut monitor = ErrorQueueMonitor::new(strict);
		monitor.drain("X", |q| Ok(if q == "SYSTem:ERRor?" { "0".to_owned() } else { "0,\"No error\"".to_owned() })).unwrap();
		assert_eq!(monitor.form(), ErrorForm::Modern);
		monitor
	}

	// Modern times out, legacy answers a bare number, then modern answers the sentinel
	fn flip_flop(monitor: &mut ErrorQueueMonitor) -> Result<DrainReport> {
		let mut modern_calls = 0;
		monitor.drain("Y", |q| {
			if q == "SYSTem:ERRor?" { return Ok("0".to_owned()); }
			modern_calls += 1;
			if modern_calls == 1 { Err(Error::Timeout) } else { Ok("0,\"No error\"".to_owned()) }
		})
	}

	#[test]
	fn form_flip_flop_fails_in_strict_mode() {
		let mut monitor = modern_monitor(true);
		assert!(matches!(flip_flop(&mut monitor), Err(Error::Protocol(_))));
	}

	#[test]
	fn form_flip_flop_is_reported() {
		let mut monitor = modern_monitor(false);
		let report = flip_flop(&mut monitor).unwrap();
		assert_eq!(report.transitions, 2);
		assert_eq!(report.reads, 3);
		assert!(report.drained);
		assert!(!report.has_errors);
	}

	#[test]
	fn legacy_dialect_never_uses_modern_query() {
		let mut monitor = ErrorQueueMonitor::new(false);
		monitor.drain("X", |q| Ok(if q == "SYSTem:ERRor?" { "0".to_owned() } else { "0,\"No error\"".to_owned() })).unwrap();
		monitor.set_modern_allowed(false);
		monitor.drain("Y", |q| { assert_eq!(q, "SYSTem:ERRor?"); Ok("+0,\"No error\"".to_owned()) }).unwrap();
	}

	#[test]
	fn empty_response_is_an_error() {
		let mut monitor = ErrorQueueMonitor::new(false);
		let report = monitor.drain("X", |_| Ok(String::new())).unwrap();
		assert!(report.has_errors);
		assert_eq!(report.reads, 1);
	}

	#[test]
	fn entries_parse() {
		assert_eq!(parse_entry("+10,\"Thing\""), ErrorEntry{ code: 10, message: "Thing".to_owned() });
		assert_eq!(parse_entry("garbage").code, 0);
	}
}
