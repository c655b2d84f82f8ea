// Device core
pub const DEVICE_CORE_PROG:u32  = 0x0607af;
pub const DEVICE_CORE_VERS:u32  = 1;
pub const CREATE_LINK:u32       = 10;
pub const DEVICE_WRITE:u32      = 11;
pub const DEVICE_READ:u32       = 12;
pub const DEVICE_CLEAR:u32      = 15;
pub const DESTROY_LINK:u32      = 23;

pub const CLIENT_ID:i32 = 3333;

// Operation flags
pub const FLAG_END:i32 = 8;

// Read reason bits
pub const REASON_REQCNT:i32 = 1;
pub const REASON_CHR:i32    = 2;
pub const REASON_END:i32    = 4;

use std::convert::TryFrom;
use std::io::{self, Error, ErrorKind};
use std::time::Duration;

use log::debug;

use crate::rpc::port_mapping::{TcpPortMapperClient, Mapping};
use crate::rpc::tcp_clients::TcpClient;

pub mod xdr_pack;

use xdr_pack::{CreateLinkParms, DeviceWriteParms, DeviceReadParms, DeviceGenericParms};

// Extra time given to the socket beyond the timeout handed to the instrument, so the instrument's own
// timeout error arrives before the socket gives up
const SOCKET_MARGIN_MS:u64 = 2000;

// Largest chunk we'll ask for in one device_read
const READ_REQUEST_SIZE:u32 = 0x0010_0000;

// Clamped to what the wire format can carry
fn timeout_ms(timeout: Duration) -> u32 { u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX) }

fn err(msg: &str) -> io::Error { Error::new(ErrorKind::Other, msg) }

// Map a VXI-11 device error code to an io::Error
fn device_error(code: i32) -> io::Result<()> {
	match code {
		0  => Ok(()),
		1  => Err(err("Syntax error")),
		3  => Err(Error::new(ErrorKind::NotConnected, "Device not accessible")),
		4  => Err(err("Invalid link identifier")),
		5  => Err(err("Parameter error")),
		6  => Err(err("Channel not established")),
		8  => Err(err("Operation not supported")),
		9  => Err(err("Out of resources")),
		11 => Err(err("Device locked by another link")),
		12 => Err(err("No lock held by this link")),
		15 => Err(Error::new(ErrorKind::TimedOut, "I/O timeout")),
		17 => Err(err("I/O error")),
		21 => Err(err("Invalid address")),
		23 => Err(err("Abort")),
		29 => Err(err("Channel already established")),
		_  => Err(err("Unknown device error")),
	}
}

pub struct CoreClient {
	client: TcpClient,
	link: Option<Link>,
	io_timeout_ms: u32,
}

pub struct Link {
	pub link_id: i32,
	pub max_recv_size: u32,
}

impl CoreClient {

	fn get_link(&self) -> io::Result<&Link> {
		self.link.as_ref().ok_or_else(|| Error::new(ErrorKind::NotConnected, "No link"))
	}

	pub fn new(host: &str, timeout: Duration) -> io::Result<Self> {
		let socket_timeout = timeout + Duration::from_millis(SOCKET_MARGIN_MS);

		// Find the port to use for the core program
		let mut pmap_client = TcpPortMapperClient::new(host, socket_timeout)?;
		let port: u16 = pmap_client.get_port(&Mapping{ program: DEVICE_CORE_PROG, version: DEVICE_CORE_VERS, port: 0 })?;
		debug!("VXI-11 core channel for {} is on port {}", host, port);

		let client = TcpClient::connect((host, port), DEVICE_CORE_PROG, DEVICE_CORE_VERS, socket_timeout)?;
		Ok(CoreClient{ client, link: None, io_timeout_ms: timeout_ms(timeout) })
	}

	pub fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
		self.io_timeout_ms = timeout_ms(timeout);
		self.client.set_timeout(timeout + Duration::from_millis(SOCKET_MARGIN_MS))
	}

	pub fn create_link(&mut self, device: &str) -> io::Result<()> {
		if self.link.is_some() {
			return Err(err("Already connected to a link"));
		}

		let parms = CreateLinkParms{ client_id: CLIENT_ID, lock_device: false, lock_timeout: self.io_timeout_ms, device };
		let mut reply = self.client.call(CREATE_LINK, |p| parms.pack(p))?;

		let error:i32         = reply.unpack_i32()?;
		let link_id:i32       = reply.unpack_i32()?;
		let abort_port:u32    = reply.unpack_u32()?;
		let max_recv_size:u32 = reply.unpack_u32()?;

		device_error(error)?;
		debug!("Created link {} to {} (abort_port={}, max_recv_size={})", link_id, device, abort_port, max_recv_size);
		self.link = Some(Link{ link_id, max_recv_size });
		Ok(())
	}

	// Large messages are split to fit the instrument's receive buffer; only the last chunk carries END
	pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
		let (link_id, max_recv_size) = {
			let link = self.get_link()?;
			(link.link_id, link.max_recv_size as usize)
		};
		let chunk_size: usize = if max_recv_size == 0 { data.len().max(1) } else { max_recv_size };

		let mut chunks = data.chunks(chunk_size).peekable();
		while let Some(chunk) = chunks.next() {
			let flags: i32 = if chunks.peek().is_none() { FLAG_END } else { 0 };
			let parms = DeviceWriteParms{ link: link_id, io_timeout: self.io_timeout_ms, lock_timeout: self.io_timeout_ms, flags, data: chunk };
			let mut reply = self.client.call(DEVICE_WRITE, |p| parms.pack(p))?;

			let error:i32 = reply.unpack_i32()?;
			let size:u32  = reply.unpack_u32()?;
			device_error(error)?;

			if size as usize != chunk.len() {
				return Err(err("Number of bytes in confirmation doesn't match number of bytes sent"));
			}
		}

		Ok(())
	}

	// Keep reading until the instrument flags END
	pub fn read(&mut self) -> io::Result<Vec<u8>> {
		let link_id: i32 = self.get_link()?.link_id;
		let mut ans: Vec<u8> = vec![];

		loop {
			let parms = DeviceReadParms{ link: link_id, request_size: READ_REQUEST_SIZE, io_timeout: self.io_timeout_ms,
				lock_timeout: self.io_timeout_ms, flags: 0, term_char: 0 };
			let mut reply = self.client.call(DEVICE_READ, |p| parms.pack(p))?;

			let error:i32    = reply.unpack_i32()?;
			let reason:i32   = reply.unpack_i32()?;
			let data:Vec<u8> = reply.unpack_opaque()?;
			device_error(error)?;

			ans.extend_from_slice(&data);

			if reason & REASON_END != 0 { return Ok(ans); }
			if reason & (REASON_REQCNT | REASON_CHR) == 0 {
				return Err(err("Expected one of three reason bits to be set"));
			}
		}
	}

	pub fn device_clear(&mut self) -> io::Result<()> {
		let link_id: i32 = self.get_link()?.link_id;
		let parms = DeviceGenericParms{ link: link_id, flags: 0, lock_timeout: self.io_timeout_ms, io_timeout: self.io_timeout_ms };
		let mut reply = self.client.call(DEVICE_CLEAR, |p| parms.pack(p))?;
		device_error(reply.unpack_i32()?)
	}

	pub fn has_link(&self) -> bool { self.link.is_some() }

	pub fn destroy_link(&mut self) -> io::Result<()> {
		let link_id: i32 = match self.link.take() {
			Some(link) => link.link_id,
			None       => return Err(err("No link to destroy")),
		};

		let mut reply = self.client.call(DESTROY_LINK, |p| p.pack_i32(link_id))?;
		device_error(reply.unpack_i32()?)
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn io_timeout_code_maps_to_timed_out() {
		let e = device_error(15).unwrap_err();
		assert_eq!(e.kind(), ErrorKind::TimedOut);
		assert!(device_error(0).is_ok());
	}

	#[test]
	fn long_timeouts_saturate() {
		assert_eq!(timeout_ms(Duration::from_millis(2500)), 2500);
		assert_eq!(timeout_ms(Duration::from_secs(u64::from(u32::MAX))), u32::MAX);
	}
}
