use std::sync::Arc;

use tracing::debug;

use super::buffer::FrameBuffer;
use super::error::PatchError;
use super::patch::{OverflowPolicy, UniverseDevices, UniversePatch};
use crate::TickReport;
use crate::protocol::DmxFrame;

/// Routes buffered per-universe frames to patched devices.
///
/// The router owns the patch table and the frame buffer. The receive path
/// (a network thread, via [`Router::buffer`] or [`Router::on_frame`]) only
/// ever touches the buffer; the tick path drains it and drives the devices.
#[derive(Debug)]
pub struct Router {
    table: Vec<UniversePatch>,
    buffer: Arc<FrameBuffer>,
}

impl Router {
    /// Build the routing table, assigning each device its channel range in
    /// device-list order.
    ///
    /// Fails on duplicate universe ids, zero-width devices, and (in strict
    /// mode) universes whose devices collectively exceed 512 channels.
    pub fn configure(
        universes: Vec<UniverseDevices>,
        policy: OverflowPolicy,
    ) -> Result<Self, PatchError> {
        let mut table = Vec::with_capacity(universes.len());
        for input in universes {
            table.push(UniversePatch::build(input, policy)?);
        }
        table.sort_by_key(|patch| patch.universe);
        if let Some(pair) = table.windows(2).find(|pair| pair[0].universe == pair[1].universe) {
            return Err(PatchError::DuplicateUniverse {
                universe: pair[0].universe,
            });
        }
        Ok(Self {
            table,
            buffer: Arc::new(FrameBuffer::new()),
        })
    }

    /// Handle for the receive path; cheap to clone into a network thread.
    pub fn buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Buffer a decoded frame (last writer wins per universe).
    pub fn on_frame(&self, frame: DmxFrame) {
        self.buffer.store(frame.universe, frame.data);
    }

    /// Dispatch every buffered frame to its universe's devices, then clear.
    ///
    /// Universes with no patch entry are dropped silently (nobody listening
    /// is a normal condition, not a fault). Each device sees at most one
    /// `set_data` call per tick; short frames yield truncated slices.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        for (universe, data) in self.buffer.take_all() {
            match self
                .table
                .binary_search_by_key(&universe, |patch| patch.universe)
            {
                Ok(index) => {
                    report.devices_updated += self.table[index].dispatch(&data);
                    report.universes_dispatched += 1;
                }
                Err(_) => {
                    debug!(universe, "no devices patched; frame dropped");
                    report.unrouted += 1;
                }
            }
        }
        report
    }
}
