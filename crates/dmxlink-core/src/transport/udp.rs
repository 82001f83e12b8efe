use std::io;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{trace, warn};

use super::{Destination, TransportError};
use crate::protocol::{DmxFrame, encode_artdmx, layout, parse_artdmx};
use crate::routing::FrameBuffer;

/// How long the receive thread waits on the socket before re-checking its
/// stop flag.
const READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Largest ArtDMX datagram is 530 bytes; leave headroom for other opcodes.
const RECV_BUF_LEN: usize = 1024;

/// A bound Art-Net UDP socket: sends frames and feeds a receive thread.
pub struct ArtNetSocket {
    socket: UdpSocket,
}

impl ArtNetSocket {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_broadcast(true)?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Encode `frame` and transmit it. Encoding completes before any bytes
    /// reach the network; a failed encode sends nothing.
    pub fn send_dmx(
        &self,
        frame: &DmxFrame,
        destination: &Destination,
    ) -> Result<usize, TransportError> {
        let bytes = encode_artdmx(frame)?;
        let target = match destination {
            Destination::Broadcast => {
                SocketAddr::from((Ipv4Addr::BROADCAST, layout::ARTNET_PORT))
            }
            Destination::Unicast(addr) => *addr,
        };
        Ok(self.socket.send_to(&bytes, target)?)
    }

    /// Start the receive thread: every decoded ArtDMX frame is stored into
    /// `buffer`; malformed datagrams are warned about and dropped.
    pub fn spawn_receiver(
        &self,
        buffer: Arc<FrameBuffer>,
    ) -> Result<ReceiverHandle, TransportError> {
        let socket = self.socket.try_clone()?;
        socket.set_read_timeout(Some(READ_TIMEOUT))?;
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("artnet-recv".to_string())
            .spawn(move || receive_loop(&socket, &buffer, &flag))?;
        Ok(ReceiverHandle {
            stop,
            thread: Some(thread),
        })
    }
}

fn receive_loop(socket: &UdpSocket, buffer: &FrameBuffer, stop: &AtomicBool) {
    let mut buf = [0u8; RECV_BUF_LEN];
    while !stop.load(Ordering::Relaxed) {
        let (len, source) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                continue;
            }
            Err(err) => {
                warn!(error = %err, "receive failed");
                continue;
            }
        };
        match parse_artdmx(&buf[..len]) {
            Ok(Some(frame)) => {
                trace!(
                    universe = frame.universe,
                    channels = frame.data.len(),
                    %source,
                    "ArtDMX frame buffered"
                );
                buffer.store(frame.universe, frame.data);
            }
            Ok(None) => trace!(%source, "ignoring non-ArtDMX Art-Net packet"),
            Err(err) => warn!(error = %err, %source, "dropping malformed datagram"),
        }
    }
}

/// Owns the receive thread; stopping (or dropping) joins it.
pub struct ReceiverHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReceiverHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ReceiverHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
