#![allow(dead_code)]

use scope_scpi::transport::mock::MockTransport;
use scope_scpi::{Oscilloscope, Session, SessionConfig};

pub const DSOX3034A: &str = "KEYSIGHT TECHNOLOGIES,DSO-X 3034A,MY12345678,02.65.2021032900";
pub const MSOX3034A: &str = "KEYSIGHT TECHNOLOGIES,MSOX3034A,MY12345678,02.65.2021032900";
pub const MSOX3104T: &str = "KEYSIGHT TECHNOLOGIES,MSO-X 3104T,MY12345678,07.30.2020080300";
pub const MXR058A: &str = "KEYSIGHT TECHNOLOGIES,MXR058A,MY12345678,11.10.00302";

pub fn connect_with(mock: &MockTransport, idn: &str, config: SessionConfig) -> Oscilloscope {
	mock.reply_text("*IDN?", idn);
	let session = Session::with_transport("TCPIP0::192.168.1.10::INSTR", config, Box::new(mock.clone()));
	let mut scope = Oscilloscope::with_session(session);
	scope.open().unwrap();
	let scope = scope.upgrade().unwrap();
	mock.clear_log();
	scope
}

pub fn connect(mock: &MockTransport, idn: &str) -> Oscilloscope {
	connect_with(mock, idn, SessionConfig::default())
}

// Modern WAVeform:PREamble? reply; the display window is 100 wide starting at -50
pub fn modern_preamble(format: u8, acquisition: u8, axes: (f64, f64, i64, f64, f64, i64)) -> String {
	let (x_increment, x_origin, x_reference, y_increment, y_origin, y_reference) = axes;
	format!("{},{},1000,1,{:E},{:E},{},{:E},{:E},{},1,1.0E+02,-5.0E+01,8.0E+00,-4.0E+00,\"19 FEB 2021\",\"10:30:00.00\",\"MXR058A:MY12345678\",0,100,2,1,\"6.0E+09\",\"0.0\"",
		format, acquisition, x_increment, x_origin, x_reference, y_increment, y_origin, y_reference)
}

// Every command sent, minus the error-queue reads after each one
pub fn sent(mock: &MockTransport) -> Vec<String> {
	mock.commands().into_iter().filter(|c| !c.starts_with(":SYSTem:ERRor?")).collect()
}
