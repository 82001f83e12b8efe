use super::error::ProtocolError;
use super::layout;
use super::packet::DmxFrame;
use super::writer::FrameWriter;

/// Encode a frame into a complete Art-Net datagram.
///
/// The wire `length` field is derived from `frame.data.len()` at this point,
/// never from a stored value.
pub fn encode_artdmx(frame: &DmxFrame) -> Result<Vec<u8>, ProtocolError> {
    if frame.data.len() > layout::DMX_MAX_SLOTS {
        return Err(ProtocolError::OversizedPayload {
            len: frame.data.len(),
        });
    }

    let mut writer = FrameWriter::with_capacity(layout::DMX_DATA_OFFSET + frame.data.len());
    writer.write_slice(layout::ARTNET_ID);
    writer.write_u16_le(layout::ARTDMX_OPCODE);
    writer.write_u16_be(layout::PROT_VER);
    writer.write_u8(frame.sequence);
    writer.write_u8(frame.physical);
    writer.write_u16_le(frame.universe);
    writer.write_u16_be(frame.data.len() as u16);
    writer.write_slice(&frame.data);
    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::encode_artdmx;
    use crate::protocol::error::ProtocolError;
    use crate::protocol::layout;
    use crate::protocol::packet::DmxFrame;
    use crate::protocol::parser::parse_artdmx;

    #[test]
    fn encodes_header_fields_at_their_offsets() {
        let frame = DmxFrame::new(0x0102, vec![0xAA, 0xBB])
            .unwrap()
            .with_sequence(0x07);
        let bytes = encode_artdmx(&frame).unwrap();

        assert_eq!(&bytes[..8], layout::ARTNET_ID);
        assert_eq!(&bytes[layout::OP_CODE_RANGE], &[0x00, 0x50]);
        assert_eq!(&bytes[layout::PROT_VER_RANGE], &[0x00, 0x0E]);
        assert_eq!(bytes[layout::SEQUENCE_OFFSET], 0x07);
        assert_eq!(bytes[layout::PHYSICAL_OFFSET], 0x00);
        assert_eq!(&bytes[layout::UNIVERSE_RANGE], &[0x02, 0x01]);
        assert_eq!(&bytes[layout::LENGTH_RANGE], &[0x00, 0x02]);
        assert_eq!(&bytes[layout::DMX_DATA_OFFSET..], &[0xAA, 0xBB]);
    }

    #[test]
    fn length_field_tracks_the_payload() {
        let mut frame = DmxFrame::new(0, vec![1, 2, 3]).unwrap();
        let bytes = encode_artdmx(&frame).unwrap();
        assert_eq!(&bytes[layout::LENGTH_RANGE], &3u16.to_be_bytes());

        // Growing the payload after construction must be reflected on re-encode.
        frame.data.extend_from_slice(&[4, 5]);
        let bytes = encode_artdmx(&frame).unwrap();
        assert_eq!(&bytes[layout::LENGTH_RANGE], &5u16.to_be_bytes());
        assert_eq!(bytes.len(), layout::DMX_DATA_OFFSET + 5);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut frame = DmxFrame::new(0, Vec::new()).unwrap();
        frame.data = vec![0u8; layout::DMX_MAX_SLOTS + 1];
        assert_eq!(
            encode_artdmx(&frame),
            Err(ProtocolError::OversizedPayload { len: 513 })
        );
    }

    #[test]
    fn roundtrip_preserves_every_field() {
        let frame = DmxFrame {
            sequence: 0xFE,
            physical: 0x03,
            universe: 0x7FFF,
            data: (0..=255).collect(),
        };
        let decoded = parse_artdmx(&encode_artdmx(&frame).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(decoded, frame);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_roundtrip_preserves_data(
                sequence: u8,
                physical: u8,
                universe: u16,
                data in prop::collection::vec(any::<u8>(), 0..=layout::DMX_MAX_SLOTS),
            ) {
                let frame = DmxFrame { sequence, physical, universe, data };
                let bytes = encode_artdmx(&frame).unwrap();
                prop_assert_eq!(&bytes[layout::LENGTH_RANGE], &(frame.data.len() as u16).to_be_bytes());
                let decoded = parse_artdmx(&bytes).unwrap().unwrap();
                prop_assert_eq!(decoded, frame);
            }
        }
    }
}
