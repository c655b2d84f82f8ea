use std::time::Duration;

use log::debug;

use crate::block;
use crate::error::{Error, Result};

pub mod address;
pub mod mock;
pub mod socket;
pub mod vxi;

pub use address::Resource;

// Byte-level exchange with one instrument.  Message framing belongs to the implementation; everything above
// this trait deals in whole messages.
pub trait Transport: Send {

	fn write(&mut self, data: &[u8]) -> Result<()>;

	// One complete response message, terminator included
	fn read(&mut self) -> Result<Vec<u8>>;

	// One IEEE 488.2 block, payload only
	fn read_block(&mut self) -> Result<Vec<u8>> {
		let raw: Vec<u8> = self.read()?;
		let (payload, _) = block::parse(&raw)?;
		Ok(payload.to_vec())
	}

	// Device clear.  Transports without one return Error::Unsupported.
	fn clear(&mut self) -> Result<()>;

	fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

	fn close(&mut self) -> Result<()>;

}

// Connect to a VISA-style resource string
pub fn open(resource: &str, timeout: Duration) -> Result<Box<dyn Transport>> {
	let parsed: Resource = resource.parse()?;
	debug!("Opening {:?} with a {:?} timeout", parsed, timeout);

	let transport: Box<dyn Transport> = match parsed {
		Resource::Vxi11{ host, device } => Box::new(vxi::VxiTransport::open(&host, &device, timeout)?),
		Resource::Socket{ host, port }  => Box::new(socket::SocketTransport::open(&host, port, timeout)?),
	};

	Ok(transport)
}

// Failures while establishing a connection are reported as connection errors whatever their cause
pub(crate) fn connection_err(resource: &str, e: Error) -> Error {
	match e {
		Error::Connection(_) => e,
		other => Error::Connection(format!("{}: {}", resource, other)),
	}
}
