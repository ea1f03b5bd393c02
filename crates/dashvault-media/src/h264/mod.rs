//! H.264 elemental stream parsing (the length-prefixed MP4 variant).

mod nal;
mod sei;

pub use nal::{nal_unit_type, strip_emulation_prevention, NalUnits, NAL_TYPE_SEI};
pub use sei::vendor_sei_payload;
