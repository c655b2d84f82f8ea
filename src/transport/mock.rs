use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::block;
use crate::error::{Error, Result};

use super::Transport;

// Scripted stand-in for an instrument.  Clones share state, so a test can keep one handle to inspect what
// was sent while the session owns the other.

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
	Text(String),
	Block(Vec<u8>),
	Timeout,
}

#[derive(Default)]
struct State {
	once: HashMap<String, VecDeque<Reply>>,
	always: HashMap<String, Reply>,
	log: Vec<String>,
	blocks: Vec<Vec<u8>>,
	pending: Option<Reply>,
	clears: usize,
	closed: bool,
}

#[derive(Clone, Default)]
pub struct MockTransport {
	state: Arc<Mutex<State>>,
}

pub const ERROR_QUERY_PREFIX: &str = "SYSTem:ERRor?";

fn default_reply(cmd: &str) -> Reply {
	// An unscripted error query reports an empty queue in whichever form was asked
	let body: &str = cmd.trim_start_matches(':');
	if body.starts_with(ERROR_QUERY_PREFIX) {
		if body.ends_with("STRing") { Reply::Text("0,\"No error\"".to_owned()) }
		else { Reply::Text("+0,\"No error\"".to_owned()) }
	} else {
		Reply::Timeout
	}
}

impl MockTransport {

	pub fn new() -> Self { Self::default() }

	fn lock(&self) -> MutexGuard<State> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	// Queue a reply for the next time `cmd` is sent.  Replies queued for the same command are used in order.
	pub fn reply(&self, cmd: &str, reply: Reply) -> &Self {
		self.lock().once.entry(cmd.to_owned()).or_insert_with(VecDeque::new).push_back(reply);
		self
	}

	pub fn reply_text(&self, cmd: &str, text: &str) -> &Self { self.reply(cmd, Reply::Text(text.to_owned())) }

	// Reply used whenever nothing is queued for `cmd`
	pub fn reply_always(&self, cmd: &str, reply: Reply) -> &Self {
		self.lock().always.insert(cmd.to_owned(), reply);
		self
	}

	// Every command written so far, without its terminator.  Block writes are logged as the command prefix.
	pub fn commands(&self) -> Vec<String> { self.lock().log.clone() }

	pub fn count(&self, cmd: &str) -> usize { self.lock().log.iter().filter(|c| c.as_str() == cmd).count() }

	pub fn blocks_written(&self) -> Vec<Vec<u8>> { self.lock().blocks.clone() }

	pub fn clears(&self) -> usize { self.lock().clears }

	pub fn is_closed(&self) -> bool { self.lock().closed }

	pub fn clear_log(&self) { self.lock().log.clear(); }

}

// Splits "<cmd>#<n><len><payload>" into the command and payload when the tail is exactly one block
fn split_block(msg: &[u8]) -> Option<(String, Vec<u8>)> {
	let pos: usize = msg.iter().position(|&b| b == b'#')?;
	let (payload, used) = block::parse(&msg[pos..]).ok()?;
	if pos + used != msg.len() { return None; }
	let cmd: String = String::from_utf8_lossy(&msg[..pos]).to_string();
	Some((cmd, payload.to_vec()))
}

impl Transport for MockTransport {

	fn write(&mut self, data: &[u8]) -> Result<()> {
		let mut state = self.lock();
		let msg: &[u8] = data.strip_suffix(b"\n").unwrap_or(data);

		let cmd: String = match split_block(msg) {
			Some((cmd, payload)) => {
				state.blocks.push(payload);
				cmd
			},
			None => String::from_utf8_lossy(msg).to_string(),
		};

		if cmd.contains('?') {
			let queued: Option<Reply> = state.once.get_mut(&cmd).and_then(|q| q.pop_front());
			let reply: Reply = match queued {
				Some(r) => r,
				None => state.always.get(&cmd).cloned().unwrap_or_else(|| default_reply(&cmd)),
			};
			state.pending = Some(reply);
		}

		state.log.push(cmd);
		Ok(())
	}

	fn read(&mut self) -> Result<Vec<u8>> {
		match self.lock().pending.take() {
			Some(Reply::Text(s)) => Ok(format!("{}\n", s).into_bytes()),
			Some(Reply::Block(b)) => {
				let mut ans: Vec<u8> = block::encode(&b);
				ans.push(b'\n');
				Ok(ans)
			},
			Some(Reply::Timeout) | None => Err(Error::Timeout),
		}
	}

	fn clear(&mut self) -> Result<()> {
		let mut state = self.lock();
		state.clears += 1;
		state.pending = None;
		Ok(())
	}

	fn set_timeout(&mut self, _timeout: Duration) -> Result<()> { Ok(()) }

	fn close(&mut self) -> Result<()> {
		self.lock().closed = true;
		Ok(())
	}

}
