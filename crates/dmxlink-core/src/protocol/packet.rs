use super::error::ProtocolError;
use super::layout;

/// A single ArtDMX frame: up to 512 channel values for one universe.
///
/// The frame carries no stored length field. The wire `length` is computed
/// from `data.len()` every time the frame is encoded, so payload and declared
/// length cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxFrame {
    /// Frame counter, passed through as-is; 0 means "sequence disabled".
    pub sequence: u8,
    /// Originating physical input port, opaque pass-through.
    pub physical: u8,
    /// Universe (port-address) this frame targets.
    pub universe: u16,
    /// Channel values, one byte per channel, at most 512.
    pub data: Vec<u8>,
}

impl DmxFrame {
    pub fn new(universe: u16, data: Vec<u8>) -> Result<Self, ProtocolError> {
        if data.len() > layout::DMX_MAX_SLOTS {
            return Err(ProtocolError::OversizedPayload { len: data.len() });
        }
        Ok(Self {
            sequence: 0,
            physical: 0,
            universe,
            data,
        })
    }

    pub fn with_sequence(mut self, sequence: u8) -> Self {
        self.sequence = sequence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::DmxFrame;
    use crate::protocol::error::ProtocolError;
    use crate::protocol::layout;

    #[test]
    fn rejects_payload_beyond_one_universe() {
        let err = DmxFrame::new(0, vec![0u8; layout::DMX_MAX_SLOTS + 1]).unwrap_err();
        assert_eq!(err, ProtocolError::OversizedPayload { len: 513 });
    }

    #[test]
    fn full_universe_is_accepted() {
        let frame = DmxFrame::new(7, vec![0u8; layout::DMX_MAX_SLOTS]).unwrap();
        assert_eq!(frame.universe, 7);
        assert_eq!(frame.sequence, 0);
    }
}
