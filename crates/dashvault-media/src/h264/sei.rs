//! Vendor SEI payload extraction.
//!
//! The recorder embeds telemetry in SEI user-data-unregistered messages
//! (payload type 5) marked with a vendor signature: a run of one-or-more
//! `0x42` bytes terminated by a single `0x69`. Not every user-data SEI in
//! the stream belongs to this schema, so anything without the signature is
//! skipped without decoding.

use super::nal::{nal_unit_type, strip_emulation_prevention, NAL_TYPE_SEI};

/// SEI payload type for user-data-unregistered messages.
const SEI_TYPE_USER_DATA_UNREGISTERED: u8 = 5;

const MARKER: u8 = 0x42;
const SIGNATURE_END: u8 = 0x69;

/// Extract the telemetry payload from a NAL unit, if it carries one.
///
/// Returns the de-stuffed bytes following the vendor signature, or `None`
/// for non-SEI NALs, foreign SEI payloads, and units without the signature.
/// Bytes before the marker run (the SEI payload-size encoding) are tolerated.
pub fn vendor_sei_payload(nal: &[u8]) -> Option<Vec<u8>> {
    if nal_unit_type(nal)? != NAL_TYPE_SEI {
        return None;
    }
    if *nal.get(1)? != SEI_TYPE_USER_DATA_UNREGISTERED {
        return None;
    }

    let run_start = nal.iter().skip(2).position(|&b| b == MARKER)? + 2;
    let mut pos = run_start;
    while nal.get(pos) == Some(&MARKER) {
        pos += 1;
    }
    if *nal.get(pos)? != SIGNATURE_END {
        return None;
    }

    Some(strip_emulation_prevention(&nal[pos + 1..]))
}
