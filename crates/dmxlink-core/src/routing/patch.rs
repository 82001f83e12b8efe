use serde::{Deserialize, Serialize};
use tracing::warn;

use super::device::DmxDevice;
use super::error::PatchError;
use crate::protocol::layout;

/// What to do when a universe's devices collectively claim more than 512
/// channels. `Permissive` logs a warning and keeps the patch, so a partially
/// mis-addressed rig still runs; `Strict` rejects the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    #[default]
    Permissive,
    Strict,
}

/// One universe's device list, in patch order, handed to
/// [`Router::configure`](super::router::Router::configure).
pub struct UniverseDevices {
    pub universe: u16,
    pub devices: Vec<Box<dyn DmxDevice>>,
}

/// Assign sequential start channels to a list of device widths.
///
/// Device `i` starts at the sum of the widths of devices `0..i`. Returns the
/// start offsets and the total channel count.
pub fn allocate_channels(widths: &[usize]) -> (Vec<usize>, usize) {
    let mut starts = Vec::with_capacity(widths.len());
    let mut next = 0usize;
    for width in widths {
        starts.push(next);
        next += width;
    }
    (starts, next)
}

pub(crate) struct PatchedDevice {
    pub(crate) start: usize,
    pub(crate) width: usize,
    pub(crate) sink: Box<dyn DmxDevice>,
}

impl std::fmt::Debug for PatchedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchedDevice")
            .field("start", &self.start)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

pub(crate) struct UniversePatch {
    pub(crate) universe: u16,
    pub(crate) devices: Vec<PatchedDevice>,
}

impl std::fmt::Debug for UniversePatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniversePatch")
            .field("universe", &self.universe)
            .field("devices", &self.devices)
            .finish()
    }
}

impl UniversePatch {
    pub(crate) fn build(
        input: UniverseDevices,
        policy: OverflowPolicy,
    ) -> Result<Self, PatchError> {
        let universe = input.universe;
        let widths: Vec<usize> = input
            .devices
            .iter()
            .map(|device| device.channel_count())
            .collect();
        if let Some(index) = widths.iter().position(|&width| width == 0) {
            return Err(PatchError::ZeroWidthDevice { universe, index });
        }

        let (starts, claimed) = allocate_channels(&widths);
        if claimed > layout::DMX_MAX_SLOTS {
            let excess = claimed - layout::DMX_MAX_SLOTS;
            match policy {
                OverflowPolicy::Strict => {
                    return Err(PatchError::ChannelOverflow {
                        universe,
                        claimed,
                        excess,
                    });
                }
                OverflowPolicy::Permissive => {
                    warn!(
                        universe,
                        claimed, excess, "universe exceeds the 512-channel limit"
                    );
                }
            }
        }

        let devices = input
            .devices
            .into_iter()
            .zip(starts.iter().zip(&widths))
            .map(|(sink, (&start, &width))| PatchedDevice { start, width, sink })
            .collect();
        Ok(Self { universe, devices })
    }

    /// Copy each device's channel range out of `data`, truncated to the
    /// payload's actual end. Returns the number of devices updated.
    pub(crate) fn dispatch(&mut self, data: &[u8]) -> usize {
        for device in &mut self.devices {
            let start = device.start.min(data.len());
            let end = (device.start + device.width).min(data.len());
            device.sink.set_data(&data[start..end]);
        }
        self.devices.len()
    }
}
