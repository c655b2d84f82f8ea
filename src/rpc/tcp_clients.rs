
use std::io::{self, Read, Write, Error, ErrorKind};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use byteorder::{BigEndian, WriteBytesExt, ReadBytesExt};

use crate::xdr::{Packer, Unpacker};
use super::{pack_call_header, unpack_reply_header};

const LAST_FRAGMENT:u32 = 0x8000_0000;

pub struct TcpClient {
	stream: TcpStream,
	pub prog: u32,
	pub vers: u32,
	lastxid: u32,
	packer: Packer,
}

fn resolve<A: ToSocketAddrs>(addr: A) -> io::Result<SocketAddr> {
	addr.to_socket_addrs()?
		.next()
		.ok_or_else(|| Error::new(ErrorKind::NotFound, "Address did not resolve"))
}

impl TcpClient {

	// The read timeout applies to every reply, so it should be longer than any timeout passed to the server
	pub fn connect<A: ToSocketAddrs>(addr: A, prog: u32, vers: u32, timeout: Duration) -> io::Result<Self> {
		let stream = TcpStream::connect_timeout(&resolve(addr)?, timeout)?;
		stream.set_read_timeout(Some(timeout))?;
		stream.set_write_timeout(Some(timeout))?;
		stream.set_nodelay(true)?;
		Ok(Self{ stream, prog, vers, lastxid: 0, packer: Packer::new() })
	}

	pub fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
		self.stream.set_read_timeout(Some(timeout))?;
		self.stream.set_write_timeout(Some(timeout))
	}

	// Pack a call to procedure `prc`, send it, and return an unpacker positioned just after the reply header
	pub fn call<F>(&mut self, prc: u32, pack_args: F) -> io::Result<Unpacker>
		where F: FnOnce(&mut Packer) -> io::Result<()>
	{
		self.lastxid = self.lastxid.wrapping_add(1);
		self.packer.reset();
		pack_call_header(&mut self.packer, self.lastxid, self.prog, self.vers, prc)?;
		pack_args(&mut self.packer)?;

		let mut send_bytes: Vec<u8> = Vec::with_capacity(self.packer.len() + 4);
		send_bytes.write_u32::<BigEndian>(self.packer.len() as u32 | LAST_FRAGMENT)?;
		send_bytes.extend_from_slice(self.packer.as_bytes());
		self.stream.write_all(&send_bytes)?;

		loop {
			let mut unpacker = Unpacker::new(self.read_record()?);
			let xid: u32 = unpack_reply_header(&mut unpacker)?;

			if xid == self.lastxid {
				return Ok(unpacker);
			} else if xid < self.lastxid {
				// Late reply to an earlier call that we already gave up on
				continue;
			} else {
				return Err(Error::new(ErrorKind::InvalidData, "Reply xid is newer than the last call"));
			}
		}
	}

	// Reassemble one record from its record-marked fragments
	fn read_record(&mut self) -> io::Result<Vec<u8>> {
		let mut record: Vec<u8> = vec![];
		loop {
			let marker: u32 = self.stream.read_u32::<BigEndian>()?;
			let n: usize = (marker & !LAST_FRAGMENT) as usize;

			let start: usize = record.len();
			record.resize(start + n, 0);
			self.stream.read_exact(&mut record[start..])?;

			if marker & LAST_FRAGMENT != 0 { return Ok(record); }
		}
	}

}
