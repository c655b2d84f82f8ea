
// External data representation, a protocol for serializing data to be sent over the network
pub mod xdr;

// Remote procedure call, a protocol build on top of XDR to provide something like C-style function calls over the network
pub mod rpc;

// A protocol using RPC that's meant to communicate with instruments like oscilloscopes, power supplies, waveform generators, etc
pub mod vxi11;

// IEEE 488.2 length-prefixed binary blocks
pub mod block;

// Byte-level connections to instruments, addressed by VISA-style resource strings
pub mod transport;

pub mod error;
pub mod config;

// SCPI command/response session with error-queue checking after every command
pub mod session;
pub mod error_queue;

// What an instrument is and what it can do
pub mod identity;
pub mod dialect;
pub mod channel;
pub mod capability;

// Waveform preamble schemas and sample decoding
pub mod preamble;
pub mod decode;

// Oscilloscope control: waveforms, measurements, display
pub mod scope;

pub use channel::ChannelId;
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use scope::Oscilloscope;
pub use session::Session;
