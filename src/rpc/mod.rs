
use std::io::{self, Error, ErrorKind};

use crate::xdr::{Packer, Unpacker};

pub const RPCVERSION:u32 = 2;

pub const CALL:i32  = 0;
pub const REPLY:i32 = 1;

pub const MSG_ACCEPTED:i32 = 0;
pub const MSG_DENIED:i32   = 1;

pub const RPC_MISMATCH:i32 = 0;
pub const AUTH_ERROR:i32   = 1;

pub const SUCCESS:i32       = 0;      // RPC executed successfully
pub const PROG_UNAVAIL:i32  = 1;      // remote hasn't exported program
pub const PROG_MISMATCH:i32 = 2;      // remote can't support version #
pub const PROC_UNAVAIL:i32  = 3;      // program can't support procedure
pub const GARBAGE_ARGS:i32  = 4;      // procedure can't decode params

pub const IPPROTO_TCP:u32 = 6;

pub const AUTH_NONE:i32 = 0;

pub mod tcp_clients;
pub mod port_mapping;

fn err(msg: &str) -> io::Error { Error::new(ErrorKind::Other, msg) }

// Call header with AUTH_NONE credentials and verifier
pub fn pack_call_header(packer: &mut Packer, xid: u32, prog: u32, vers: u32, prc: u32) -> io::Result<()> {
	packer.pack_u32(xid)?;
	packer.pack_i32(CALL)?;
	packer.pack_u32(RPCVERSION)?;
	packer.pack_u32(prog)?;
	packer.pack_u32(vers)?;
	packer.pack_u32(prc)?;
	for _ in 0..2 {
		packer.pack_i32(AUTH_NONE)?;
		packer.pack_opaque(&[])?;
	}
	Ok(())
}

// Consumes the reply header and returns its xid; anything but an accepted, successful reply is an error
pub fn unpack_reply_header(unpacker: &mut Unpacker) -> io::Result<u32> {
	let xid: u32 = unpacker.unpack_u32()?;

	if unpacker.unpack_i32()? != REPLY { return Err(err("Expected an RPC REPLY message")); }

	match unpacker.unpack_i32()? {
		MSG_ACCEPTED => { },
		MSG_DENIED => {
			return match unpacker.unpack_i32()? {
				RPC_MISMATCH => Err(err("RPC call denied: RPC version mismatch")),
				AUTH_ERROR   => Err(err("RPC call denied: authentication error")),
				_            => Err(err("RPC call denied for an unknown reason")),
			};
		},
		_ => return Err(err("Reply was neither accepted nor denied")),
	}

	// Verifier is always AUTH_NONE for us, so it's skipped
	unpacker.unpack_i32()?;
	unpacker.unpack_opaque()?;

	match unpacker.unpack_i32()? {
		SUCCESS       => Ok(xid),
		PROG_UNAVAIL  => Err(err("RPC program unavailable")),
		PROG_MISMATCH => Err(err("RPC program version mismatch")),
		PROC_UNAVAIL  => Err(err("RPC procedure unavailable")),
		GARBAGE_ARGS  => Err(err("RPC server could not decode the arguments")),
		_             => Err(err("RPC call failed for an unknown reason")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn accepted_reply(xid: u32, stat: i32) -> Vec<u8> {
		let mut p = Packer::new();
		p.pack_u32(xid).unwrap();
		p.pack_i32(REPLY).unwrap();
		p.pack_i32(MSG_ACCEPTED).unwrap();
		p.pack_i32(AUTH_NONE).unwrap();
		p.pack_opaque(&[]).unwrap();
		p.pack_i32(stat).unwrap();
		p.as_bytes().to_vec()
	}

	#[test]
	fn call_header_is_ten_words() {
		let mut p = Packer::new();
		pack_call_header(&mut p, 7, 0x0607af, 1, 10).unwrap();
		assert_eq!(p.len(), 40);
		assert_eq!(&p.as_bytes()[0..4], &[0, 0, 0, 7]);
	}

	#[test]
	fn accepted_reply_yields_xid() {
		let mut u = Unpacker::new(accepted_reply(42, SUCCESS));
		assert_eq!(unpack_reply_header(&mut u).unwrap(), 42);
		assert!(u.all_data_consumed());
	}

	#[test]
	fn unavailable_program_is_an_error() {
		let mut u = Unpacker::new(accepted_reply(1, PROG_UNAVAIL));
		assert!(unpack_reply_header(&mut u).is_err());
	}
}
