use super::error::ProtocolError;
use super::layout;
use super::packet::DmxFrame;
use super::reader::FrameReader;

/// Decode an ArtDMX frame from a raw Art-Net datagram.
///
/// Returns `Ok(None)` for well-formed Art-Net traffic that is not an ArtDMX
/// frame (ArtPoll and friends are routine on a live socket). Errors abort the
/// whole datagram; no partial frame is ever produced.
pub fn parse_artdmx(payload: &[u8]) -> Result<Option<DmxFrame>, ProtocolError> {
    let reader = FrameReader::new(payload);
    reader.require_len(layout::DMX_DATA_OFFSET)?;

    if reader.read_slice(0..layout::ARTNET_ID.len())? != layout::ARTNET_ID {
        return Err(ProtocolError::BadSignature);
    }

    let opcode = reader.read_u16_le(layout::OP_CODE_RANGE)?;
    if opcode != layout::ARTDMX_OPCODE {
        return Ok(None);
    }

    let version = reader.read_u16_be(layout::PROT_VER_RANGE)?;
    if version < layout::PROT_VER {
        return Err(ProtocolError::UnsupportedVersion { found: version });
    }

    let sequence = reader.read_u8(layout::SEQUENCE_OFFSET)?;
    let physical = reader.read_u8(layout::PHYSICAL_OFFSET)?;
    let universe = reader.read_u16_le(layout::UNIVERSE_RANGE)?;
    let length = reader.read_u16_be(layout::LENGTH_RANGE)?;
    if length as usize > layout::DMX_MAX_SLOTS {
        return Err(ProtocolError::InvalidLength { length });
    }

    let end = layout::DMX_DATA_OFFSET + length as usize;
    reader.require_len(end)?;
    let data = reader.read_slice(layout::DMX_DATA_OFFSET..end)?.to_vec();

    Ok(Some(DmxFrame {
        sequence,
        physical,
        universe,
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::parse_artdmx;
    use crate::protocol::error::ProtocolError;
    use crate::protocol::layout;

    fn artdmx_bytes(universe: u16, data: &[u8]) -> Vec<u8> {
        let mut payload = vec![0u8; layout::DMX_DATA_OFFSET + data.len()];
        payload[..layout::ARTNET_ID.len()].copy_from_slice(layout::ARTNET_ID);
        payload[layout::OP_CODE_RANGE].copy_from_slice(&layout::ARTDMX_OPCODE.to_le_bytes());
        payload[layout::PROT_VER_RANGE].copy_from_slice(&layout::PROT_VER.to_be_bytes());
        payload[layout::UNIVERSE_RANGE].copy_from_slice(&universe.to_le_bytes());
        payload[layout::LENGTH_RANGE].copy_from_slice(&(data.len() as u16).to_be_bytes());
        payload[layout::DMX_DATA_OFFSET..].copy_from_slice(data);
        payload
    }

    #[test]
    fn parse_valid_artdmx() {
        let mut payload = artdmx_bytes(1, &[10, 20, 30, 40]);
        payload[layout::SEQUENCE_OFFSET] = 0x12;
        payload[layout::PHYSICAL_OFFSET] = 0x02;

        let frame = parse_artdmx(&payload).unwrap().unwrap();
        assert_eq!(frame.universe, 1);
        assert_eq!(frame.sequence, 0x12);
        assert_eq!(frame.physical, 0x02);
        assert_eq!(frame.data, vec![10, 20, 30, 40]);
    }

    #[test]
    fn parse_empty_payload_frame() {
        let payload = artdmx_bytes(3, &[]);
        let frame = parse_artdmx(&payload).unwrap().unwrap();
        assert_eq!(frame.universe, 3);
        assert!(frame.data.is_empty());
    }

    #[test]
    fn non_dmx_opcode_is_filtered() {
        let mut payload = artdmx_bytes(0, &[]);
        // ArtPoll
        payload[layout::OP_CODE_RANGE].copy_from_slice(&0x2000u16.to_le_bytes());
        assert!(parse_artdmx(&payload).unwrap().is_none());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let mut payload = artdmx_bytes(0, &[]);
        payload[0] = b'X';
        assert_eq!(parse_artdmx(&payload), Err(ProtocolError::BadSignature));
    }

    #[test]
    fn old_protocol_version_is_rejected() {
        let mut payload = artdmx_bytes(0, &[]);
        payload[layout::PROT_VER_RANGE].copy_from_slice(&13u16.to_be_bytes());
        assert_eq!(
            parse_artdmx(&payload),
            Err(ProtocolError::UnsupportedVersion { found: 13 })
        );
    }

    #[test]
    fn truncated_header_is_too_short() {
        let payload = vec![0u8; layout::DMX_DATA_OFFSET - 1];
        assert_eq!(
            parse_artdmx(&payload),
            Err(ProtocolError::TooShort {
                needed: layout::DMX_DATA_OFFSET,
                actual: layout::DMX_DATA_OFFSET - 1,
            })
        );
    }

    #[test]
    fn declared_length_beyond_payload_is_too_short() {
        let mut payload = artdmx_bytes(0, &[1, 2, 3, 4]);
        payload[layout::LENGTH_RANGE].copy_from_slice(&8u16.to_be_bytes());
        assert_eq!(
            parse_artdmx(&payload),
            Err(ProtocolError::TooShort {
                needed: layout::DMX_DATA_OFFSET + 8,
                actual: layout::DMX_DATA_OFFSET + 4,
            })
        );
    }

    #[test]
    fn declared_length_beyond_universe_is_invalid() {
        let mut payload = artdmx_bytes(0, &[]);
        payload[layout::LENGTH_RANGE].copy_from_slice(&513u16.to_be_bytes());
        assert_eq!(
            parse_artdmx(&payload),
            Err(ProtocolError::InvalidLength { length: 513 })
        );
    }

    #[test]
    fn trailing_bytes_beyond_declared_length_are_ignored() {
        let mut payload = artdmx_bytes(2, &[9, 9, 9, 9]);
        payload[layout::LENGTH_RANGE].copy_from_slice(&2u16.to_be_bytes());
        let frame = parse_artdmx(&payload).unwrap().unwrap();
        assert_eq!(frame.data, vec![9, 9]);
    }
}
