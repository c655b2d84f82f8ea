use std::io::{self, Cursor, Error, ErrorKind};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

fn err(msg: &str) -> io::Error { Error::new(ErrorKind::InvalidData, msg) }

// Every XDR item occupies a multiple of four bytes
fn padding(n: usize) -> usize { (4 - n % 4) % 4 }

#[derive(Default)]
pub struct Packer {
	buf: Vec<u8>,
}

impl Packer {

	pub fn new() -> Self { Self::default() }

	pub fn reset(&mut self) { self.buf.clear(); }

	pub fn as_bytes(&self) -> &[u8] { &self.buf }

	pub fn len(&self) -> usize { self.buf.len() }

	pub fn is_empty(&self) -> bool { self.buf.is_empty() }

	pub fn pack_u32(&mut self, x: u32) -> io::Result<()> { self.buf.write_u32::<BigEndian>(x) }
	pub fn pack_i32(&mut self, x: i32) -> io::Result<()> { self.buf.write_i32::<BigEndian>(x) }
	pub fn pack_bool(&mut self, b: bool) -> io::Result<()> { self.pack_i32(if b { 1 } else { 0 }) }

	pub fn pack_opaque(&mut self, data: &[u8]) -> io::Result<()> {
		if data.len() > u32::MAX as usize { return Err(err("Opaque data too long for XDR")); }
		self.pack_u32(data.len() as u32)?;
		self.buf.extend_from_slice(data);
		self.buf.extend(std::iter::repeat(0u8).take(padding(data.len())));
		Ok(())
	}

	pub fn pack_string(&mut self, s: &str) -> io::Result<()> {
		if !s.is_ascii() { return Err(err("XDR strings must be ASCII")); }
		self.pack_opaque(s.as_bytes())
	}

}

// Reads items front to back out of one received record
pub struct Unpacker {
	rdr: Cursor<Vec<u8>>,
}

impl Unpacker {

	pub fn new(data: Vec<u8>) -> Self { Self{ rdr: Cursor::new(data) } }

	pub fn remaining(&self) -> usize {
		self.rdr.get_ref().len().saturating_sub(self.rdr.position() as usize)
	}

	pub fn all_data_consumed(&self) -> bool { self.remaining() == 0 }

	pub fn unpack_u32(&mut self) -> io::Result<u32> { self.rdr.read_u32::<BigEndian>() }
	pub fn unpack_i32(&mut self) -> io::Result<i32> { self.rdr.read_i32::<BigEndian>() }

	pub fn unpack_bool(&mut self) -> io::Result<bool> {
		match self.unpack_i32()? {
			0 => Ok(false),
			1 => Ok(true),
			_ => Err(err("Expected 0 or 1 for an XDR bool")),
		}
	}

	pub fn unpack_opaque(&mut self) -> io::Result<Vec<u8>> {
		let n: usize = self.unpack_u32()? as usize;
		if n + padding(n) > self.remaining() {
			return Err(err("XDR opaque length runs past the end of the record"));
		}
		let start: usize = self.rdr.position() as usize;
		let ans: Vec<u8> = self.rdr.get_ref()[start..start + n].to_vec();
		self.rdr.set_position((start + n + padding(n)) as u64);
		Ok(ans)
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn opaque_is_padded_to_four_bytes() {
		let mut p = Packer::new();
		p.pack_opaque(b"inst0").unwrap();
		assert_eq!(p.as_bytes(), &[0, 0, 0, 5, b'i', b'n', b's', b't', b'0', 0, 0, 0]);

		let mut u = Unpacker::new(p.as_bytes().to_vec());
		assert_eq!(u.unpack_opaque().unwrap(), b"inst0".to_vec());
		assert!(u.all_data_consumed());
	}

	#[test]
	fn truncated_opaque_is_rejected() {
		let mut u = Unpacker::new(vec![0, 0, 0, 9, 1, 2, 3]);
		assert!(u.unpack_opaque().is_err());
	}

	#[test]
	fn bool_must_be_zero_or_one() {
		let mut u = Unpacker::new(vec![0, 0, 0, 1, 0, 0, 0, 2]);
		assert_eq!(u.unpack_bool().unwrap(), true);
		assert!(u.unpack_bool().is_err());
	}
}
