use log::{debug, warn};
use serde::Serialize;

use crate::channel::ChannelId;
use crate::decode::{self, Endian, RawSamples};
use crate::dialect::Dialect;
use crate::error::{Result, decode_err};
use crate::preamble::{AcquisitionType, Axes, Format, LegacyPreamble, ModernPreamble};

use super::Oscilloscope;

const TIME_LABEL: &str = "Time (s)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Samples {
	// Physical values, already scaled
	Analog(Vec<f64>),
	// One lane per bit, lanes[bit][sample]
	Digital(Vec<Vec<u8>>),
	// Raw bus codes
	Bus(Vec<i64>),
}

impl Samples {

	pub fn len(&self) -> usize {
		match self {
			Samples::Analog(v) => v.len(),
			Samples::Digital(lanes) => lanes.first().map(|l| l.len()).unwrap_or(0),
			Samples::Bus(v) => v.len(),
		}
	}

	pub fn is_empty(&self) -> bool { self.len() == 0 }

}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
	pub x: Vec<f64>,
	pub y: Samples,
	// Column labels: the time axis first, then one per value column
	pub header: Vec<String>,
	// Everything learned about the acquisition along the way, in the order it was learned
	pub meta: Vec<(String, String)>,
}

#[derive(Default)]
struct Meta(Vec<(String, String)>);

impl Meta {

	fn push<V: ToString>(&mut self, key: &str, value: V) { self.0.push((key.to_owned(), value.to_string())); }

	fn log(&self) {
		for (k, v) in &self.0 {
			debug!("{:>24}: {}", k, v);
		}
	}

}

fn integers(raw: RawSamples) -> Result<Vec<i64>> {
	match raw {
		RawSamples::Int(v) => Ok(v),
		RawSamples::Float(_) => Err(decode_err("Digital data arrived in a floating point format")),
	}
}

fn digital(raw: RawSamples, channel: &ChannelId, bits: usize) -> Result<(Samples, Vec<String>)> {
	let ints: Vec<i64> = integers(raw)?;

	if channel.is_bus() {
		return Ok((Samples::Bus(ints), vec![TIME_LABEL.to_owned(), "BUS Values".to_owned()]));
	}

	let pod: u8 = channel.pod_number().unwrap_or(1);
	let mut header: Vec<String> = vec![TIME_LABEL.to_owned()];
	header.extend(decode::lane_labels(pod, bits));
	Ok((Samples::Digital(decode::unpack_lanes(&ints, bits)), header))
}

fn analog(raw: RawSamples, axes: &Axes) -> Samples {
	match raw {
		RawSamples::Float(v) => Samples::Analog(v),
		RawSamples::Int(v) => Samples::Analog(decode::scale(&v, axes)),
	}
}

impl Oscilloscope {

	// Download one channel.  With `points`, Modern firmware returns that many samples centred on the display
	// while Legacy firmware decimates the whole record down to roughly that many.
	pub fn waveform(&mut self, channel: ChannelId, points: Option<usize>) -> Result<Waveform> {
		self.require_channel(&channel, "waveform")?;

		match self.dialect {
			Dialect::Modern => self.waveform_modern(channel, points),
			Dialect::Legacy => self.waveform_legacy(channel, points),
		}
	}

	fn waveform_modern(&mut self, channel: ChannelId, points: Option<usize>) -> Result<Waveform> {
		let mut meta = Meta::default();
		let src: String = channel.scpi_source();
		let session = &mut self.session;

		session.write(&format!("WAVeform:SOURce {}", src))?;
		meta.push("Waveform source", session.query("WAVeform:SOURce?")?);
		meta.push("Waveform view", session.query("WAVeform:VIEW?")?);

		let format: &str = match channel {
			ChannelId::Histogram => "BINary",
			ChannelId::Pod(1) | ChannelId::Pod(2) => "BYTE",
			_ => "WORD",
		};
		session.write(&format!("WAVeform:FORMat {}", format))?;

		let endian: Endian = Endian::host();
		session.write(&format!("WAVeform:BYTeorder {}", endian.scpi_name()))?;

		let pre: ModernPreamble = ModernPreamble::parse(&session.query("WAVeform:PREamble?")?)?;
		meta.push("Waveform format", pre.format.name());
		meta.push("Acquire type", pre.acquisition_type.name());
		meta.push("Waveform points available", pre.points);
		meta.push("Waveform average count", pre.average_count);
		meta.push("Waveform X increment", pre.axes.x_increment);
		meta.push("Waveform X origin", pre.axes.x_origin);
		meta.push("Waveform X reference", pre.axes.x_reference);
		meta.push("Waveform Y increment", pre.axes.y_increment);
		meta.push("Waveform Y origin", pre.axes.y_origin);
		meta.push("Waveform Y reference", pre.axes.y_reference);
		meta.push("Coupling", pre.coupling.name());
		meta.push("Waveform X display range", pre.x_display_range);
		meta.push("Waveform X display origin", pre.x_display_origin);
		meta.push("Waveform Y display range", pre.y_display_range);
		meta.push("Waveform Y display origin", pre.y_display_origin);
		meta.push("Date", &pre.date);
		meta.push("Time", &pre.time);
		meta.push("Frame model", &pre.frame_model);
		meta.push("Acquire mode", pre.acquire_mode.name());
		meta.push("Completion", &pre.completion);
		meta.push("Waveform X units", pre.x_units.name());
		meta.push("Waveform Y units", pre.y_units.name());
		meta.push("Max BW limit", &pre.max_bw_limit);
		meta.push("Min BW limit", &pre.min_bw_limit);

		let mut start: i64 = 0;
		let mut window: String = String::new();
		if let Some(n) = points {
			if channel.is_histogram() {
				warn!("Histogram sources always return all data, ignoring the request for {} points", n);
				meta.push("Points request", format!("{} ignored for histogram", n));
			} else {
				let (s, len) = pre.centered_window(n)?;
				start = s;
				window = format!(" {},{}", s, len);
				meta.push("Window start", s);
				meta.push("Window points", len);
			}
		}

		session.write("WAVeform:STReaming OFF")?;
		let data: Vec<u8> = session.query_binary_block(&format!("WAVeform:DATA?{}", window))?;
		meta.push("Bytes downloaded", data.len());

		let raw: RawSamples = decode::decode_block(&data, pre.format, true, endian)?;
		meta.push("Number of data values", raw.len());
		meta.log();

		let x: Vec<f64> = decode::time_axis(raw.len(), &pre.axes, start);

		let (y, header) = if pre.acquisition_type == AcquisitionType::Digital && (channel.is_bus() || channel.is_pod()) {
			let bits: usize = pre.format.width().unwrap_or(1) * 8;
			digital(raw, &channel, bits)?
		} else {
			(analog(raw, &pre.axes), vec![pre.x_units.label(), pre.y_units.label()])
		};

		Ok(Waveform{ x, y, header, meta: meta.0 })
	}

	fn waveform_legacy(&mut self, channel: ChannelId, points: Option<usize>) -> Result<Waveform> {
		let mut meta = Meta::default();
		let src: String = channel.scpi_source();
		let session = &mut self.session;

		session.write(&format!("WAVeform:SOURce {}", src))?;
		meta.push("Waveform source", session.query("WAVeform:SOURce?")?);
		meta.push("Waveform view", session.query("WAVeform:VIEW?")?);

		// The legacy y reference assumes unsigned byte codes
		session.write("WAVeform:FORMat BYTE")?;
		session.write("WAVeform:UNSigned ON")?;
		session.write("WAVeform:POINts:MODE MAX")?;
		meta.push("Waveform points mode", session.query("WAVeform:POINts:MODE?")?);

		if let Some(n) = points {
			session.write(&format!("WAVeform:POINts {}", n))?;
		}
		meta.push("Waveform points available", session.query("WAVeform:POINts?")?);

		let pre: LegacyPreamble = LegacyPreamble::parse(&session.query("WAVeform:PREamble?")?)?;
		meta.push("Waveform format", pre.format.name());
		meta.push("Acquire type", pre.acquisition_type.name());
		meta.push("Waveform points", pre.points);
		meta.push("Waveform average count", pre.average_count);
		meta.push("Waveform X increment", pre.axes.x_increment);
		meta.push("Waveform X origin", pre.axes.x_origin);
		meta.push("Waveform X reference", pre.axes.x_reference);
		meta.push("Waveform Y increment", pre.axes.y_increment);
		meta.push("Waveform Y origin", pre.axes.y_origin);
		meta.push("Waveform Y reference", pre.axes.y_reference);

		let data: Vec<u8> = session.query_binary_block("WAVeform:DATA?")?;
		meta.push("Bytes downloaded", data.len());

		let raw: RawSamples = decode::decode_block(&data, pre.format, false, Endian::host())?;
		meta.push("Number of data values", raw.len());
		meta.log();

		let x: Vec<f64> = decode::time_axis(raw.len(), &pre.axes, 0);

		let (y, header) = if channel.is_bus() || channel.is_pod() {
			let bits: usize = if pre.format == Format::Word { 16 } else { 8 };
			digital(raw, &channel, bits)?
		} else {
			(analog(raw, &pre.axes), vec![TIME_LABEL.to_owned(), "Voltage (V)".to_owned()])
		};

		Ok(Waveform{ x, y, header, meta: meta.0 })
	}

}
