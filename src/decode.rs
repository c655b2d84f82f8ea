use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{Result, decode_err};
use crate::preamble::{Axes, Format};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
	LsbFirst,
	MsbFirst,
}

impl Endian {

	pub fn host() -> Self {
		if cfg!(target_endian = "big") { Endian::MsbFirst } else { Endian::LsbFirst }
	}

	// Argument to WAVeform:BYTeorder
	pub fn scpi_name(self) -> &'static str {
		match self {
			Endian::LsbFirst => "LSBFirst",
			Endian::MsbFirst => "MSBFirst",
		}
	}

}

#[derive(Debug, Clone, PartialEq)]
pub enum RawSamples {
	Int(Vec<i64>),
	Float(Vec<f64>),
}

impl RawSamples {

	pub fn len(&self) -> usize {
		match self {
			RawSamples::Int(v) => v.len(),
			RawSamples::Float(v) => v.len(),
		}
	}

	pub fn is_empty(&self) -> bool { self.len() == 0 }

}

fn read_with<B: ByteOrder>(data: &[u8], format: Format, signed: bool) -> RawSamples {
	match format {
		Format::Byte if signed => RawSamples::Int(data.iter().map(|&b| b as i8 as i64).collect()),
		Format::Byte           => RawSamples::Int(data.iter().map(|&b| b as i64).collect()),
		Format::Word if signed => RawSamples::Int(data.chunks_exact(2).map(|c| B::read_i16(c) as i64).collect()),
		Format::Word           => RawSamples::Int(data.chunks_exact(2).map(|c| B::read_u16(c) as i64).collect()),
		Format::Long if signed => RawSamples::Int(data.chunks_exact(4).map(|c| B::read_i32(c) as i64).collect()),
		Format::Long           => RawSamples::Int(data.chunks_exact(4).map(|c| B::read_u32(c) as i64).collect()),
		Format::LongLong       => RawSamples::Int(data.chunks_exact(8).map(B::read_i64).collect()),
		Format::Float          => RawSamples::Float(data.chunks_exact(4).map(|c| B::read_f32(c) as f64).collect()),
		Format::Ascii          => RawSamples::Int(vec![]),
	}
}

// Split a binary block into samples of the declared width
pub fn decode_block(data: &[u8], format: Format, signed: bool, endian: Endian) -> Result<RawSamples> {
	let width: usize = format.width()
		.ok_or_else(|| decode_err(format!("{} is not a binary waveform format", format.name())))?;

	if data.len() % width != 0 {
		return Err(decode_err(format!("Block of {} bytes is not a whole number of {} byte {} samples", data.len(), width, format.name())));
	}

	Ok(match endian {
		Endian::LsbFirst => read_with::<LittleEndian>(data, format, signed),
		Endian::MsbFirst => read_with::<BigEndian>(data, format, signed),
	})
}

// x[i] = ((i - x_reference + start) * x_increment) + x_origin
pub fn time_axis(n: usize, axes: &Axes, start: i64) -> Vec<f64> {
	(0..n).map(|i| ((i as f64 - axes.x_reference as f64 + start as f64) * axes.x_increment) + axes.x_origin).collect()
}

// y = ((raw - y_reference) * y_increment) + y_origin
pub fn scale(raw: &[i64], axes: &Axes) -> Vec<f64> {
	raw.iter().map(|&v| ((v - axes.y_reference) as f64 * axes.y_increment) + axes.y_origin).collect()
}

// lanes[bit][i] is bit `bit` of sample i
pub fn unpack_lanes(raw: &[i64], bits: usize) -> Vec<Vec<u8>> {
	(0..bits).map(|bit| raw.iter().map(|&v| ((v >> bit) & 1) as u8).collect()).collect()
}

// Digital channel names for the lanes of a pod: pod 2 of 8 bits is D8..D15
pub fn lane_labels(pod: u8, bits: usize) -> Vec<String> {
	(0..bits).map(|ch| format!("D{}", (pod as usize - 1) * bits + ch)).collect()
}
