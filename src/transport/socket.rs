use std::io::{self, BufRead, BufReader, Read, Write, Error as IoError, ErrorKind};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use crate::block;
use crate::error::{Error, Result, decode_err};

use super::{Transport, connection_err};

// Raw SCPI over TCP (usually port 5025).  Messages are newline terminated; binary blocks are framed by their
// own header so the payload may contain newlines.
pub struct SocketTransport {
	reader: BufReader<TcpStream>,
	writer: TcpStream,
}

fn eof() -> Error { Error::Transport(IoError::new(ErrorKind::UnexpectedEof, "Instrument closed the connection")) }

impl SocketTransport {

	pub fn open(host: &str, port: u16, timeout: Duration) -> Result<Self> {
		Self::connect(host, port, timeout).map_err(|e| connection_err(host, e.into()))
	}

	fn connect(host: &str, port: u16, timeout: Duration) -> io::Result<Self> {
		let addr = (host, port).to_socket_addrs()?
			.next()
			.ok_or_else(|| IoError::new(ErrorKind::NotFound, "Address did not resolve"))?;

		let writer = TcpStream::connect_timeout(&addr, timeout)?;
		writer.set_read_timeout(Some(timeout))?;
		writer.set_write_timeout(Some(timeout))?;
		writer.set_nodelay(true)?;

		let reader = BufReader::new(writer.try_clone()?);
		Ok(Self{ reader, writer })
	}

	fn read_byte(&mut self) -> Result<u8> {
		let mut b = [0u8; 1];
		self.reader.read_exact(&mut b).map_err(|e| if e.kind() == ErrorKind::UnexpectedEof { eof() } else { e.into() })?;
		Ok(b[0])
	}

}

impl Transport for SocketTransport {

	fn write(&mut self, data: &[u8]) -> Result<()> {
		self.writer.write_all(data)?;
		Ok(self.writer.flush()?)
	}

	fn read(&mut self) -> Result<Vec<u8>> {
		let mut ans: Vec<u8> = vec![];
		let n: usize = self.reader.read_until(b'\n', &mut ans)?;
		if n == 0 { return Err(eof()); }
		debug!("Read {} bytes", ans.len());
		Ok(ans)
	}

	fn read_block(&mut self) -> Result<Vec<u8>> {
		let mut first: u8 = self.read_byte()?;
		while first.is_ascii_whitespace() { first = self.read_byte()?; }
		if first != b'#' { return Err(decode_err("Binary block does not start with '#'")); }

		let n_digits: u8 = self.read_byte()?;
		if !n_digits.is_ascii_digit() { return Err(decode_err("Malformed binary block header")); }

		if n_digits == b'0' {
			// Indefinite length runs to the terminator
			let mut rest: Vec<u8> = vec![];
			self.reader.read_until(b'\n', &mut rest)?;
			let mut whole: Vec<u8> = b"#0".to_vec();
			whole.extend_from_slice(&rest);
			let (payload, _) = block::parse(&whole)?;
			return Ok(payload.to_vec());
		}

		let mut len_digits: Vec<u8> = vec![0u8; (n_digits - b'0') as usize];
		self.reader.read_exact(&mut len_digits)?;
		let len: usize = std::str::from_utf8(&len_digits).ok()
			.and_then(|s| s.parse().ok())
			.ok_or_else(|| decode_err("Malformed binary block length"))?;

		let mut payload: Vec<u8> = vec![0u8; len];
		self.reader.read_exact(&mut payload)?;

		// Swallow the message terminator that follows the block
		let terminated: bool = match self.reader.fill_buf() {
			Ok(buf) => buf.first() == Some(&b'\n'),
			Err(ref e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => false,
			Err(e) => return Err(e.into()),
		};
		if terminated { self.reader.consume(1); }

		debug!("Read a {} byte block", len);
		Ok(payload)
	}

	fn clear(&mut self) -> Result<()> {
		Err(Error::Unsupported("device clear over a raw socket".to_owned()))
	}

	fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
		self.writer.set_read_timeout(Some(timeout))?;
		Ok(self.writer.set_write_timeout(Some(timeout))?)
	}

	fn close(&mut self) -> Result<()> {
		match self.writer.shutdown(Shutdown::Both) {
			Err(e) if e.kind() != ErrorKind::NotConnected => Err(e.into()),
			_ => Ok(()),
		}
	}

}
