
pub const PMAP_PROG:u32 = 100000;
pub const PMAP_VERS:u32 = 2;
pub const PMAP_PORT:u16 = 111;

pub const PMAPPROC_GETPORT:u32 = 3;     // (mapping) -> unsigned int

use std::io::{self, Error, ErrorKind};
use std::time::Duration;

use crate::xdr::Packer;

use super::IPPROTO_TCP;
use super::tcp_clients::TcpClient;

#[derive(Debug, Clone, Copy)]
pub struct Mapping {
	pub program: u32,
	pub version: u32,
	pub port: u32,
}

impl Mapping {
	fn pack(&self, packer: &mut Packer) -> io::Result<()> {
		packer.pack_u32(self.program)?;
		packer.pack_u32(self.version)?;
		packer.pack_u32(IPPROTO_TCP)?;
		packer.pack_u32(self.port)
	}
}

pub struct TcpPortMapperClient {
	client: TcpClient,
}

impl TcpPortMapperClient {

	pub fn new(host: &str, timeout: Duration) -> io::Result<Self> {
		let client = TcpClient::connect((host, PMAP_PORT), PMAP_PROG, PMAP_VERS, timeout)?;
		Ok(Self{ client })
	}

	// Port zero in the reply means the program isn't registered
	pub fn get_port(&mut self, m: &Mapping) -> io::Result<u16> {
		let mut unpacker = self.client.call(PMAPPROC_GETPORT, |p| m.pack(p))?;
		let port: u32 = unpacker.unpack_u32()?;

		if !unpacker.all_data_consumed() {
			return Err(Error::new(ErrorKind::InvalidData, "Data unexpectedly left over after unpacking port"));
		}

		match port {
			0 => Err(Error::new(ErrorKind::NotFound, format!("Program {:#x} v{} is not registered with portmap", m.program, m.version))),
			p if p > u16::MAX as u32 => Err(Error::new(ErrorKind::InvalidData, "Portmap returned an out-of-range port")),
			p => Ok(p as u16),
		}
	}

}
