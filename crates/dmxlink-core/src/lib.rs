//! DMXLink core library for Art-Net DMX routing.
//!
//! This crate implements the node pipeline used by the CLI: the transport
//! adapter decodes inbound ArtDMX datagrams on a receive thread and stores
//! them into a shared frame buffer, and the router dispatches per-universe
//! channel slices to patched devices on each tick. Parsing and encoding are
//! byte-oriented and side-effect free; all socket I/O is isolated in
//! `transport`. Protocol conventions are captured in readers and writers so
//! the codec stays minimal.
//!
//! Invariants:
//! - The wire length of an encoded frame always equals its payload length.
//! - Devices own contiguous, non-overlapping channel ranges assigned in
//!   patch order within their universe.
//! - A buffered frame is dispatched at most once; a newer frame replaces an
//!   unconsumed one for the same universe (last writer wins).
//!
//! Version française (résumé):
//! Cette crate fournit le cœur d'un nœud Art-Net : transport -> tampon de
//! trames -> routeur -> appareils. Le codec est pur, les E/S restent dans
//! `transport`. Garanties : longueur encodée dérivée de la charge utile,
//! plages de canaux contiguës sans chevauchement, au plus une distribution
//! par trame tamponnée.
//!
//! # Examples
//! ```no_run
//! use dmxlink_core::{
//!     ArtNetSocket, DmxDevice, OverflowPolicy, Router, UniverseDevices,
//! };
//!
//! struct Dimmer {
//!     level: u8,
//! }
//!
//! impl DmxDevice for Dimmer {
//!     fn channel_count(&self) -> usize {
//!         1
//!     }
//!
//!     fn set_data(&mut self, data: &[u8]) {
//!         if let Some(&level) = data.first() {
//!             self.level = level;
//!         }
//!     }
//! }
//!
//! let mut router = Router::configure(
//!     vec![UniverseDevices {
//!         universe: 0,
//!         devices: vec![Box::new(Dimmer { level: 0 })],
//!     }],
//!     OverflowPolicy::default(),
//! )?;
//!
//! let socket = ArtNetSocket::bind(("0.0.0.0", dmxlink_core::ARTNET_PORT))?;
//! let receiver = socket.spawn_receiver(router.buffer())?;
//! for _ in 0..44 {
//!     std::thread::sleep(std::time::Duration::from_millis(23));
//!     router.tick();
//! }
//! receiver.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod protocol;
pub mod routing;
pub mod transport;

pub use protocol::{DmxFrame, ProtocolError, encode_artdmx, parse_artdmx};
pub use routing::{
    DmxDevice, FrameBuffer, OverflowPolicy, PatchError, Router, UniverseDevices,
    allocate_channels,
};
pub use transport::{
    ArtNetSocket, Destination, ReceiverHandle, TransportError, resolve_destination,
};

/// Channels carried by one DMX universe.
pub const UNIVERSE_CHANNELS: usize = protocol::layout::DMX_MAX_SLOTS;
/// Standard Art-Net UDP port.
pub const ARTNET_PORT: u16 = protocol::layout::ARTNET_PORT;

/// A routing table as loaded from a patch file.
///
/// The file declares, per universe, the devices in patch order and the
/// channel width each one consumes. Hosts turn these entries into
/// [`UniverseDevices`] by constructing a sink per device.
///
/// # Examples
/// ```
/// use dmxlink_core::PatchConfig;
///
/// let patch = PatchConfig::from_json_str(
///     r#"{ "universes": [ { "universe": 0, "name": "front truss",
///          "devices": [ { "name": "par-1", "channels": 4 },
///                       { "name": "par-2", "channels": 4 } ] } ] }"#,
/// )?;
/// assert_eq!(patch.universes[0].devices.len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchConfig {
    /// Universe entries; ids must be unique across the file.
    pub universes: Vec<UniverseConfig>,
}

/// One universe's declared device list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Universe (port-address) this entry patches.
    pub universe: u16,
    /// Optional human label, used in messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Devices in patch order; start channels follow from the widths.
    pub devices: Vec<DeviceConfig>,
}

/// A device as declared in a patch file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Display name.
    pub name: String,
    /// Declared channel width; must be at least 1.
    pub channels: u16,
}

impl PatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Pre-flight check on the declared widths: duplicate universes and
    /// zero-width devices always fail; channel overflow fails only under
    /// [`OverflowPolicy::Strict`] and is warned about otherwise. The router
    /// re-validates from device capabilities when the patch is applied.
    pub fn validate(&self, policy: OverflowPolicy) -> Result<(), PatchError> {
        let mut seen = BTreeSet::new();
        for entry in &self.universes {
            if !seen.insert(entry.universe) {
                return Err(PatchError::DuplicateUniverse {
                    universe: entry.universe,
                });
            }
            if let Some(index) = entry.devices.iter().position(|device| device.channels == 0) {
                return Err(PatchError::ZeroWidthDevice {
                    universe: entry.universe,
                    index,
                });
            }
            let claimed = entry.claimed_channels();
            if claimed > UNIVERSE_CHANNELS {
                let excess = claimed - UNIVERSE_CHANNELS;
                match policy {
                    OverflowPolicy::Strict => {
                        return Err(PatchError::ChannelOverflow {
                            universe: entry.universe,
                            claimed,
                            excess,
                        });
                    }
                    OverflowPolicy::Permissive => warn!(
                        universe = entry.universe,
                        claimed, excess, "universe exceeds the 512-channel limit"
                    ),
                }
            }
        }
        Ok(())
    }
}

impl UniverseConfig {
    /// Total channels the declared devices claim.
    pub fn claimed_channels(&self) -> usize {
        self.devices
            .iter()
            .map(|device| device.channels as usize)
            .sum()
    }
}

/// Counters from one [`Router::tick`] pass.
///
/// # Examples
/// ```
/// use dmxlink_core::TickReport;
///
/// let mut totals = TickReport::default();
/// totals.merge(&TickReport {
///     universes_dispatched: 1,
///     devices_updated: 3,
///     unrouted: 0,
/// });
/// assert_eq!(totals.devices_updated, 3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Universes whose buffered frame reached at least one device.
    pub universes_dispatched: usize,
    /// Total `set_data` calls made.
    pub devices_updated: usize,
    /// Buffered frames dropped because no devices were patched.
    pub unrouted: usize,
}

impl TickReport {
    /// Accumulate another tick's counters into this one.
    pub fn merge(&mut self, other: &TickReport) {
        self.universes_dispatched += other.universes_dispatched;
        self.devices_updated += other.devices_updated;
        self.unrouted += other.unrouted;
    }
}
