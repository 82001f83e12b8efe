use super::error::ProtocolError;

pub struct FrameReader<'a> {
    payload: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), ProtocolError> {
        if self.payload.len() < needed {
            return Err(ProtocolError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, ProtocolError> {
        self.payload
            .get(offset)
            .copied()
            .ok_or(ProtocolError::TooShort {
                needed: offset + 1,
                actual: self.payload.len(),
            })
    }

    pub fn read_u16_le(&self, range: std::ops::Range<usize>) -> Result<u16, ProtocolError> {
        let [lo, hi] = self.read_pair(range)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub fn read_u16_be(&self, range: std::ops::Range<usize>) -> Result<u16, ProtocolError> {
        let [hi, lo] = self.read_pair(range)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], ProtocolError> {
        self.payload
            .get(range.clone())
            .ok_or(ProtocolError::TooShort {
                needed: range.end,
                actual: self.payload.len(),
            })
    }

    fn read_pair(&self, range: std::ops::Range<usize>) -> Result<[u8; 2], ProtocolError> {
        let bytes = self.read_slice(range)?;
        bytes.try_into().map_err(|_| ProtocolError::TooShort {
            needed: 2,
            actual: bytes.len(),
        })
    }
}
