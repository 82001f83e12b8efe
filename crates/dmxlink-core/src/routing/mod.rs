//! Universe-to-device channel routing.
//!
//! Configuration walks each universe's device list in order and assigns
//! every device a contiguous, non-overlapping channel range; the running
//! total is validated against the 512-channel universe limit under a
//! strict or permissive policy. At runtime the shared [`FrameBuffer`] is
//! written by the receive path and swap-and-cleared by [`Router::tick`],
//! which copies each device's channel slice into its sink exactly once per
//! buffered frame.

pub mod buffer;
pub mod device;
pub mod error;
pub mod patch;
pub mod router;

pub use buffer::FrameBuffer;
pub use device::DmxDevice;
pub use error::PatchError;
pub use patch::{OverflowPolicy, UniverseDevices, allocate_channels};
pub use router::Router;
