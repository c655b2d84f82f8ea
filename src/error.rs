use std::io;

use serde::Serialize;
use thiserror::Error;

// One entry pulled off the instrument's error queue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
	pub code: i32,
	pub message: String,
}

impl std::fmt::Display for ErrorEntry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.message.is_empty() { write!(f, "{}", self.code) }
		else { write!(f, "{},\"{}\"", self.code, self.message) }
	}
}

fn join_entries(entries: &[ErrorEntry]) -> String {
	entries.iter().map(|e| e.to_string()).collect::<Vec<String>>().join("; ")
}

#[derive(Error, Debug)]
pub enum Error {
	#[error("Connection error: {0}")]
	Connection(String),

	#[error("Invalid input: {0}")]
	Validation(String),

	#[error("Instrument reported errors after '{command}': {}", join_entries(.entries))]
	Instrument { command: String, entries: Vec<ErrorEntry> },

	#[error("Decode error: {0}")]
	Decode(String),

	#[error("Protocol error: {0}")]
	Protocol(String),

	#[error("Timed out waiting for the instrument")]
	Timeout,

	#[error("Transport error: {0}")]
	Transport(io::Error),

	#[error("Not supported: {0}")]
	Unsupported(String),

	#[error("Configuration error: {0}")]
	Config(#[from] serde_json::Error),
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		match e.kind() {
			io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::Timeout,
			_ => Error::Transport(e),
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn decode_err<S: Into<String>>(msg: S) -> Error { Error::Decode(msg.into()) }
