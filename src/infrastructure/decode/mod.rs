//! Packet decode infrastructure module
//!
//! Per-source reorder window plus stateful Opus decode; turns the raw
//! compressed frame stream into PCM ordered by sequence number.

mod opus_decoder;
mod reorder;

pub use opus_decoder::{DecodeError, DecodeOutput, SourceDecoder};
pub use reorder::{Offered, ReorderBuffer};
