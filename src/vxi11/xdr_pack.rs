use std::io;

use crate::xdr::Packer;

// Argument records for the device core procedures this crate calls

pub struct CreateLinkParms<'a> {
	pub client_id: i32,
	pub lock_device: bool,
	pub lock_timeout: u32,
	pub device: &'a str,
}

impl<'a> CreateLinkParms<'a> {
	pub fn pack(&self, packer: &mut Packer) -> io::Result<()> {
		packer.pack_i32(self.client_id)?;
		packer.pack_bool(self.lock_device)?;
		packer.pack_u32(self.lock_timeout)?;
		packer.pack_string(self.device)
	}
}

pub struct DeviceWriteParms<'a> {
	pub link: i32,
	pub io_timeout: u32,
	pub lock_timeout: u32,
	pub flags: i32,
	pub data: &'a [u8],
}

impl<'a> DeviceWriteParms<'a> {
	pub fn pack(&self, packer: &mut Packer) -> io::Result<()> {
		packer.pack_i32(self.link)?;
		packer.pack_u32(self.io_timeout)?;
		packer.pack_u32(self.lock_timeout)?;
		packer.pack_i32(self.flags)?;
		packer.pack_opaque(self.data)
	}
}

pub struct DeviceReadParms {
	pub link: i32,
	pub request_size: u32,
	pub io_timeout: u32,
	pub lock_timeout: u32,
	pub flags: i32,
	pub term_char: i32,
}

impl DeviceReadParms {
	pub fn pack(&self, packer: &mut Packer) -> io::Result<()> {
		packer.pack_i32(self.link)?;
		packer.pack_u32(self.request_size)?;
		packer.pack_u32(self.io_timeout)?;
		packer.pack_u32(self.lock_timeout)?;
		packer.pack_i32(self.flags)?;
		packer.pack_i32(self.term_char)
	}
}

// Used by device_clear (and the other generic procedures: trigger, remote, local)
pub struct DeviceGenericParms {
	pub link: i32,
	pub flags: i32,
	pub lock_timeout: u32,
	pub io_timeout: u32,
}

impl DeviceGenericParms {
	pub fn pack(&self, packer: &mut Packer) -> io::Result<()> {
		packer.pack_i32(self.link)?;
		packer.pack_i32(self.flags)?;
		packer.pack_u32(self.lock_timeout)?;
		packer.pack_u32(self.io_timeout)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn write_parms_layout() {
		let mut p = Packer::new();
		DeviceWriteParms{ link: 3, io_timeout: 5000, lock_timeout: 5000, flags: 8, data: b"*IDN?\n" }.pack(&mut p).unwrap();
		// four words of fixed fields, a length word, six bytes of data and two of padding
		assert_eq!(p.len(), 4*4 + 4 + 8);
		assert_eq!(&p.as_bytes()[12..16], &[0, 0, 0, 8]);
	}
}
