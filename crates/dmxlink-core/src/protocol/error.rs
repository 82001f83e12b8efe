use thiserror::Error;

use super::layout;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("missing Art-Net signature")]
    BadSignature,
    #[error("unsupported Art-Net protocol version {found} (need {} or later)", layout::PROT_VER)]
    UnsupportedVersion { found: u16 },
    #[error("invalid ArtDMX length {length}: a universe carries at most {} slots", layout::DMX_MAX_SLOTS)]
    InvalidLength { length: u16 },
    #[error("DMX payload of {len} bytes exceeds the {}-slot universe", layout::DMX_MAX_SLOTS)]
    OversizedPayload { len: usize },
}
