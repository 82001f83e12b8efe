use dmxlink_core::DmxDevice;
use tracing::info;

/// Log-only stand-in for a real fixture.
///
/// Reports its patched channel width and logs the channel values whenever
/// they change, so a rig can be exercised without any hardware attached.
pub struct MonitorDevice {
    name: String,
    channels: usize,
    last: Option<Vec<u8>>,
}

impl MonitorDevice {
    pub fn new(name: impl Into<String>, channels: usize) -> Self {
        Self {
            name: name.into(),
            channels,
            last: None,
        }
    }
}

impl DmxDevice for MonitorDevice {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn set_data(&mut self, data: &[u8]) {
        if self.last.as_deref() == Some(data) {
            return;
        }
        info!(device = %self.name, values = ?data, "channels updated");
        self.last = Some(data.to_vec());
    }
}
