mod common;

use std::time::Duration;

use scope_scpi::scope::{DvmMode, OVER_RANGE};
use scope_scpi::transport::mock::{MockTransport, Reply};
use scope_scpi::{ChannelId, Error};

use common::*;

const NO_SETTLE: Duration = Duration::from_millis(0);

#[test]
fn legacy_measurement_switches_source_and_installs() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, DSOX3034A);
	mock.reply_text(":MEASure:SOURce?", "CHAN2");
	mock.reply_text(":MEASure:FREQ?", "+1.00000E+03");

	let f = scope.measure_settled("Frequency", ChannelId::Analog(1), true, NO_SETTLE).unwrap();
	assert_eq!(f, 1000.0);
	assert_eq!(sent(&mock), vec![
		":MEASure:SOURce?", ":MEASure:SOURce CHAN1", ":MEASure:STATistics:DISPlay ON", ":MEASure:FREQ", ":MEASure:FREQ?",
	]);
}

#[test]
fn modern_measurement_keeps_matching_source() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);
	mock.reply_text(":MEASure:SOURce?", "CHAN2");
	mock.reply_text(":MEASure:DUTYcycle? CHAN2,RISing", "5.0E+01");

	let d = scope.measure_settled("Duty", ChannelId::Analog(2), true, NO_SETTLE).unwrap();
	assert_eq!(d, 50.0);
	assert_eq!(sent(&mock), vec![
		":MEASure:SOURce?", ":MEASure:STATistics ON", ":MEASure:DUTYcycle CHAN2,RISing", ":MEASure:DUTYcycle? CHAN2,RISing",
	]);
}

#[test]
fn modern_bit_rate_enables_edge_analysis() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);
	mock.reply_text(":MEASure:SOURce?", "CHAN1");
	mock.reply_text(":MEASure:CDRRate?", "1.0E+06");

	assert_eq!(scope.measure_settled("Bit Rate", ChannelId::Analog(1), false, NO_SETTLE).unwrap(), 1.0e6);
	assert_eq!(sent(&mock)[0], ":ANALyze:AEDGes ON");
}

#[test]
fn missing_measurements_are_over_range() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);

	assert_eq!(scope.measure_settled("Num Falling", ChannelId::Analog(1), true, NO_SETTLE).unwrap(), OVER_RANGE);
	assert_eq!(scope.measure_settled("Counter Freq", ChannelId::Analog(1), true, NO_SETTLE).unwrap(), OVER_RANGE);
	assert_eq!(scope.measure_settled("Jitter", ChannelId::Analog(1), true, NO_SETTLE).unwrap(), OVER_RANGE);
	assert!(mock.commands().is_empty());
}

#[test]
fn counter_is_never_installed() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, DSOX3034A);
	mock.reply_text(":MEASure:SOURce?", "CHAN1");
	mock.reply_text(":MEASure:COUNter?", "9.99E+02");

	scope.measure_settled("Counter Freq", ChannelId::Analog(1), true, NO_SETTLE).unwrap();
	assert_eq!(sent(&mock), vec![":MEASure:SOURce?", ":MEASure:COUNter?"]);
}

#[test]
fn infiniivision_statistics_open_the_menu() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, DSOX3034A);
	mock.reply_text(":MEASure:RESults?", "Freq(1),1.0E+03,9.9E+02,1.01E+03,1.0E+03,2.0E+00,120");

	let stats = scope.measure_statistics().unwrap();
	assert_eq!(stats.len(), 1);
	assert_eq!(stats[0].label, "Freq(1)");
	assert_eq!(stats[0].count, 120);
	assert_eq!(sent(&mock), vec![
		":SYSTem:MENU MEASure", ":MEASure:STATistics:DISPlay ON", ":MEASure:STATistics ON", ":MEASure:RESults?",
	]);
}

#[test]
fn infiniium_statistics_ask_directly() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);
	mock.reply_text(":MEASure:RESults?", "Vpp(1),2.0,1.9,2.1,2.0,0.05,1.20E+02");

	let stats = scope.measure_statistics().unwrap();
	assert_eq!(stats[0].count, 120);
	assert_eq!(sent(&mock), vec![":MEASure:STATistics ON", ":MEASure:RESults?"]);
}

#[test]
fn generic_scopes_have_no_statistics() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, "ACME,SCOPE1,1,1.0");
	assert!(matches!(scope.measure_statistics(), Err(Error::Validation(_))));
	assert!(mock.commands().is_empty());
}

#[test]
fn dvm_polls_past_over_range() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, DSOX3034A);
	mock.reply_text(":DVM:ENABle?", "0");
	mock.reply_text(":DVM:SOURce?", "CHAN1");
	mock.reply_text(":DVM:CURRent?", "9.9E+37").reply_text(":DVM:CURRent?", "1.25E+00");

	let v = scope.measure_dvm_settled(DvmMode::Dc, ChannelId::Analog(1), None, NO_SETTLE).unwrap();
	assert_eq!(v, 1.25);
	assert_eq!(sent(&mock), vec![
		":DVM:ENABle?", ":DVM:ENABLE ON", ":DVM:SOURce?", ":DVM:MODE DC", ":DVM:CURRent?", ":DVM:CURRent?",
	]);
}

#[test]
fn dvm_frequency_reads_the_counter() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MSOX3034A);
	mock.reply_text(":DVM:ENABle?", "1");
	mock.reply_text(":DVM:SOURce?", "CHAN1");
	mock.reply_text(":DVM:CURRent?", "3.3E-01");
	mock.reply_text(":DVM:FREQ?", "1.0E+04");

	let f = scope.measure_dvm_settled(DvmMode::Frequency, ChannelId::Analog(3), None, NO_SETTLE).unwrap();
	assert_eq!(f, 1.0e4);
	assert!(mock.commands().contains(&":DVM:SOURce CHAN3".to_owned()));
	assert!(mock.commands().contains(&":DVM:MODE FREQ".to_owned()));
}

#[test]
fn dvm_availability_follows_the_profile() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MSOX3104T);
	assert_eq!(scope.measure_dvm_settled(DvmMode::Frequency, ChannelId::Analog(1), None, NO_SETTLE).unwrap(), OVER_RANGE);
	assert!(mock.commands().is_empty());

	let mock = MockTransport::new();
	let mut scope = connect(&mock, "KEYSIGHT TECHNOLOGIES,UXR0334AP,MY1,10.50.00");
	assert!(matches!(scope.measure_dvm_settled(DvmMode::Dc, ChannelId::Analog(1), None, NO_SETTLE), Err(Error::Validation(_))));
	assert!(matches!(scope.enable_dvm(true), Err(Error::Validation(_))));
	assert!(mock.commands().is_empty());
}

#[test]
fn legacy_annotation() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, DSOX3034A);

	scope.annotate("Run 7", Some("ch2"), "TRANsparent").unwrap();
	scope.annotate_off().unwrap();
	assert_eq!(sent(&mock), vec![
		":DISPlay:ANN:COLor ch2", ":DISPlay:ANN:BACKground TRANsparent", ":DISPlay:ANN:TEXT \"Run 7\"", ":DISPlay:ANN ON", ":DISPlay:ANN OFF",
	]);
}

#[test]
fn modern_annotation_uses_bookmarks() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);

	scope.annotate("Run 7", None, "OPAQue").unwrap();
	scope.annotate_color(Some("red")).unwrap();
	scope.annotate_off().unwrap();
	assert_eq!(sent(&mock), vec![
		":DISPlay:BOOKmark1:XPOSition 0.015", ":DISPlay:BOOKmark1:YPOSition 0.06", ":DISPlay:BOOKmark1:SET NONE,\"Run 7\",CHAN1,\"Run 7\"",
		":DISPlay:BOOKmark1:XPOSition 0.015", ":DISPlay:BOOKmark1:YPOSition 0.06", ":DISPlay:BOOKmark1:SET NONE,\"Run 7\",FUNC12,\"Run 7\"",
		":DISPlay:BOOKmark1:DELete",
	]);

	assert!(matches!(scope.annotate_color(Some("purple")), Err(Error::Validation(_))));
}

#[test]
fn channel_labels() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);
	scope.channel_label("clk", ChannelId::Analog(2)).unwrap();
	scope.channel_label_off().unwrap();
	assert_eq!(sent(&mock), vec![":CHAN2:LABel \"clk\"", ":DISPlay:LABel ON", ":DISPlay:LABel OFF"]);
}

#[test]
fn hardcopy_per_dialect() {
	let png: Vec<u8> = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

	let mock = MockTransport::new();
	let mut scope = connect(&mock, DSOX3034A);
	mock.reply(":DISPlay:DATA? PNG,COLor", Reply::Block(png.clone()));
	assert_eq!(scope.hardcopy().unwrap(), png);
	assert_eq!(sent(&mock), vec![":HARDcopy:INKSaver OFF", ":DISPlay:DATA? PNG,COLor"]);

	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);
	mock.reply(":DISPlay:DATA? PNG,SCReen,ON,NORMal", Reply::Block(png.clone()));
	assert_eq!(scope.hardcopy().unwrap(), png);
}

#[test]
fn setup_round_trip() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);
	let blob: Vec<u8> = (0..=255).collect();
	mock.reply(":SYSTem:SETup?", Reply::Block(blob.clone()));

	let saved: Vec<u8> = scope.setup_save().unwrap();
	assert_eq!(saved, blob);
	scope.setup_load(&saved).unwrap();
	assert_eq!(mock.blocks_written(), vec![blob]);
}
