use thiserror::Error;

use crate::protocol::layout;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error(
        "universe {universe}: devices claim {claimed} channels, exceeding the {}-channel limit by {excess}",
        layout::DMX_MAX_SLOTS
    )]
    ChannelOverflow {
        universe: u16,
        claimed: usize,
        excess: usize,
    },
    #[error("universe {universe} is patched more than once")]
    DuplicateUniverse { universe: u16 },
    #[error("universe {universe}: device {index} reports zero channels")]
    ZeroWidthDevice { universe: u16, index: usize },
}
