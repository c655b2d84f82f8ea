use std::ops::Drop;
use std::time::Duration;

use log::{debug, warn};

use crate::error::Result;
use crate::vxi11::CoreClient;

use super::{Transport, connection_err};

pub struct VxiTransport {
	core: CoreClient,
}

impl VxiTransport {

	pub fn open(host: &str, device: &str, timeout: Duration) -> Result<Self> {
		let mut core = CoreClient::new(host, timeout).map_err(|e| connection_err(host, e.into()))?;
		core.create_link(device).map_err(|e| connection_err(host, e.into()))?;
		Ok(Self{ core })
	}

}

impl Transport for VxiTransport {

	fn write(&mut self, data: &[u8]) -> Result<()> { Ok(self.core.write(data)?) }

	fn read(&mut self) -> Result<Vec<u8>> {
		let ans: Vec<u8> = self.core.read()?;
		debug!("Read {} bytes", ans.len());
		Ok(ans)
	}

	fn clear(&mut self) -> Result<()> { Ok(self.core.device_clear()?) }

	fn set_timeout(&mut self, timeout: Duration) -> Result<()> { Ok(self.core.set_timeout(timeout)?) }

	fn close(&mut self) -> Result<()> {
		if self.core.has_link() { self.core.destroy_link()?; }
		Ok(())
	}

}

impl Drop for VxiTransport {

	fn drop(&mut self) {
		if let Err(e) = self.close() { warn!("Unable to destroy VXI-11 link: {}", e); }
	}

}
