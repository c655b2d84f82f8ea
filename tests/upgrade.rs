mod common;

use scope_scpi::capability::Series;
use scope_scpi::dialect::Dialect;
use scope_scpi::error_queue::{ErrorForm, ERROR_QUEUE};
use scope_scpi::transport::mock::{MockTransport, Reply};
use scope_scpi::{ChannelId, Error, Oscilloscope, Session, SessionConfig};

use common::*;

#[test]
fn dsox3_resolves_to_legacy() {
	let mock = MockTransport::new();
	let scope = connect(&mock, DSOX3034A);

	assert_eq!(scope.series(), Series::Dsox3);
	assert_eq!(scope.dialect(), Dialect::Legacy);
	let names: Vec<String> = scope.valid_channels().iter().map(|c| c.to_string()).collect();
	assert_eq!(names, vec!["1", "2", "3", "4"]);
}

#[test]
fn msox3_adds_pods() {
	let mock = MockTransport::new();
	let scope = connect(&mock, MSOX3034A);

	assert_eq!(scope.series(), Series::Msox3);
	assert!(scope.profile().is_valid(&ChannelId::Pod(1)));
	assert!(scope.profile().is_valid(&ChannelId::Pod(2)));
	assert!(!scope.profile().is_valid(&ChannelId::Pod(3)));
}

#[test]
fn high_version_3000t_stays_legacy() {
	let mock = MockTransport::new();
	let scope = connect(&mock, MSOX3104T);
	assert_eq!(scope.series(), Series::Msox3T);
	assert_eq!(scope.dialect(), Dialect::Legacy);
}

#[test]
fn mxr_resolves_to_modern() {
	let mock = MockTransport::new();
	let scope = connect(&mock, MXR058A);

	assert_eq!(scope.series(), Series::Mxr);
	assert_eq!(scope.dialect(), Dialect::Modern);
	assert_eq!(scope.profile().analog_channels, 8);
}

#[test]
fn opaque_firmware_is_modern() {
	let mock = MockTransport::new();
	let scope = connect(&mock, "KEYSIGHT TECHNOLOGIES,DSO-X 3034A,MY12345678,A.01.23");
	assert_eq!(scope.dialect(), Dialect::Modern);
}

#[test]
fn upgrade_carries_session_forward() {
	let mock = MockTransport::new();
	let config = SessionConfig{ command_prefix: "".to_owned(), wait_secs: 0.01, ..SessionConfig::default() };
	let scope = connect_with(&mock, MXR058A, config);

	assert_eq!(scope.session().resource(), "TCPIP0::192.168.1.10::INSTR");
	assert_eq!(scope.session().config().command_prefix, "");
	assert_eq!(scope.session().config().wait_secs, 0.01);
	assert!(scope.session().is_open());
	assert_eq!(scope.identity().unwrap().serial, "MY12345678");
}

#[test]
fn upgrade_opens_when_needed() {
	let mock = MockTransport::new();
	mock.reply_text("*IDN?", DSOX3034A);
	let session = Session::with_transport("mock", SessionConfig::default(), Box::new(mock.clone()));
	let scope = Oscilloscope::with_session(session).upgrade().unwrap();

	assert_eq!(scope.series(), Series::Dsox3);
	assert_eq!(mock.clears(), 1);
}

#[test]
fn unknown_vendor_gets_generic_profile() {
	let mock = MockTransport::new();
	let scope = connect(&mock, "RIGOL TECHNOLOGIES,DS1054Z,DS1ZA000000000,00.04.04.SP4");

	assert_eq!(scope.series(), Series::Generic);
	assert_eq!(scope.valid_channels(), vec![ChannelId::Analog(1)]);
}

#[test]
fn invalid_channels_send_nothing() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, DSOX3034A);

	for channel in &[ChannelId::Pod(1), ChannelId::Analog(5), ChannelId::Histogram, ChannelId::Function(1)] {
		assert!(matches!(scope.waveform(*channel, None), Err(Error::Validation(_))));
		assert!(matches!(scope.waveform(*channel, Some(100)), Err(Error::Validation(_))));
	}
	assert!(matches!(scope.measure("Frequency", ChannelId::Pod(1), true), Err(Error::Validation(_))));
	assert!(matches!(scope.channel_label("clk", ChannelId::Analog(7)), Err(Error::Validation(_))));
	assert!(matches!(scope.output_off(ChannelId::Pod(2)), Err(Error::Validation(_))));

	assert!(mock.commands().is_empty());
}

#[test]
fn error_queue_read_is_bounded() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, DSOX3034A);
	mock.reply_always(":SYSTem:ERRor?", Reply::Text("-100,\"Command error\"".to_owned()));

	scope.session_mut().write("RUN").unwrap();
	assert_eq!(mock.count(":SYSTem:ERRor?"), ERROR_QUEUE);
	assert_eq!(scope.session().last_errors().len(), ERROR_QUEUE);
	assert_eq!(scope.session().last_errors()[0].code, -100);
}

#[test]
fn error_queue_overflow_is_fatal_when_strict() {
	let mock = MockTransport::new();
	let config = SessionConfig{ strict: true, ..SessionConfig::default() };
	let mut scope = connect_with(&mock, DSOX3034A, config);
	mock.reply_always(":SYSTem:ERRor?", Reply::Text("-100,\"Command error\"".to_owned()));

	assert!(matches!(scope.session_mut().write("RUN"), Err(Error::Protocol(_))));
}

#[test]
fn modern_error_form_after_bare_number() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);
	mock.reply_text(":SYSTem:ERRor?", "0");

	scope.session_mut().write("RUN").unwrap();
	assert_eq!(scope.session().error_form(), ErrorForm::Modern);
	assert_eq!(mock.commands(), vec![":RUN", ":SYSTem:ERRor?", ":SYSTem:ERRor? STRing"]);
	assert!(scope.session().last_errors().is_empty());
}

#[test]
fn legacy_scopes_never_switch_error_form() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, DSOX3034A);
	mock.reply_text(":SYSTem:ERRor?", "0");

	scope.session_mut().write("RUN").unwrap();
	assert_eq!(scope.session().error_form(), ErrorForm::Legacy);
	assert_eq!(mock.count(":SYSTem:ERRor? STRing"), 0);
}

#[test]
fn close_releases_transport() {
	let mock = MockTransport::new();
	let mut scope = connect(&mock, MXR058A);
	scope.close().unwrap();
	assert!(mock.is_closed());
	assert!(!scope.session().is_open());
	assert!(scope.close().is_ok());
}
