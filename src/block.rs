use crate::error::{Result, decode_err};

// IEEE 488.2 arbitrary block data.  Definite form is '#', one digit giving the number of length digits, the
// length itself, then the payload.  The indefinite form '#0' runs to the end of the message.

fn ascii_digit(b: u8) -> Result<usize> {
	if b.is_ascii_digit() { Ok((b - b'0') as usize) }
	else { Err(decode_err(format!("Expected a digit in block header, found {:#04x}", b))) }
}

// Returns the payload and the number of bytes consumed from `data`
pub fn parse(data: &[u8]) -> Result<(&[u8], usize)> {
	// Some instruments send leading whitespace ahead of the block
	let start: usize = data.iter().position(|b| !b.is_ascii_whitespace())
		.ok_or_else(|| decode_err("Empty response where a binary block was expected"))?;
	let data = &data[start..];

	if data[0] != b'#' {
		return Err(decode_err("Binary block does not start with '#'"));
	}
	if data.len() < 2 {
		return Err(decode_err("Truncated binary block header"));
	}

	let n_digits: usize = ascii_digit(data[1])?;
	if n_digits == 0 {
		// Indefinite length; drop the trailing terminator if there is one
		let mut payload = &data[2..];
		if payload.last() == Some(&b'\n') { payload = &payload[..payload.len()-1]; }
		return Ok((payload, start + data.len()));
	}

	let header_len: usize = 2 + n_digits;
	if data.len() < header_len {
		return Err(decode_err("Truncated binary block length"));
	}

	let mut len: usize = 0;
	for &b in &data[2..header_len] {
		len = len * 10 + ascii_digit(b)?;
	}

	if data.len() < header_len + len {
		return Err(decode_err(format!("Binary block declares {} bytes but only {} arrived", len, data.len() - header_len)));
	}

	Ok((&data[header_len..header_len+len], start + header_len + len))
}

pub fn header(len: usize) -> Vec<u8> {
	let digits: String = len.to_string();
	format!("#{}{}", digits.len(), digits).into_bytes()
}

pub fn encode(payload: &[u8]) -> Vec<u8> {
	let mut ans: Vec<u8> = header(payload.len());
	ans.extend_from_slice(payload);
	ans
}
