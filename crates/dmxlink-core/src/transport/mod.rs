//! UDP transport adapter.
//!
//! This module owns every socket touch so the codec and router stay pure.
//! Inbound datagrams are decoded on a dedicated receive thread and stored
//! into the router's [`FrameBuffer`](crate::routing::FrameBuffer); malformed
//! datagrams are logged and dropped without reaching the router. Outbound
//! frames are fully encoded before any bytes hit the wire. Art-Net over UDP
//! is best-effort: there is no retry and lost frames are simply never
//! observed.

pub mod udp;

pub use udp::{ArtNetSocket, ReceiverHandle};

use std::net::{SocketAddr, ToSocketAddrs};

use thiserror::Error;

use crate::protocol::{ProtocolError, layout};

/// Where an outbound frame goes: the original controller's broadcast switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Limited broadcast on the standard Art-Net port.
    Broadcast,
    /// A single node.
    Unicast(SocketAddr),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot resolve destination '{host}'")]
    UnresolvableDestination { host: String },
    #[error("encode error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Resolve a `host` or `host:port` string to a socket address, defaulting to
/// the Art-Net port and preferring IPv4 (Art-Net nodes are IPv4 devices).
pub fn resolve_destination(target: &str) -> Result<SocketAddr, TransportError> {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let unresolvable = || TransportError::UnresolvableDestination {
        host: target.to_string(),
    };
    let candidates = if target.contains(':') {
        target.to_socket_addrs()
    } else {
        (target, layout::ARTNET_PORT).to_socket_addrs()
    }
    .map_err(|_| unresolvable())?;

    let mut fallback = None;
    for addr in candidates {
        if addr.is_ipv4() {
            return Ok(addr);
        }
        fallback.get_or_insert(addr);
    }
    fallback.ok_or_else(unresolvable)
}

#[cfg(test)]
mod tests {
    use super::resolve_destination;
    use crate::protocol::layout;

    #[test]
    fn literal_address_passes_through() {
        let addr = resolve_destination("192.168.0.20:7000").unwrap();
        assert_eq!(addr.port(), 7000);
    }

    #[test]
    fn bare_host_gets_the_artnet_port() {
        let addr = resolve_destination("127.0.0.1").unwrap();
        assert_eq!(addr.port(), layout::ARTNET_PORT);
        assert!(addr.is_ipv4());
    }

    #[test]
    fn unresolvable_host_is_reported() {
        let err = resolve_destination("no-such-host.invalid").unwrap_err();
        assert!(err.to_string().contains("no-such-host.invalid"));
    }
}
