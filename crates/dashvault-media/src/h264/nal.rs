//! NAL unit iteration and emulation-prevention handling.
//!
//! Inside an MP4 the elemental stream is framed as length-prefixed NAL units
//! (4-byte big-endian length, then payload) — not the Annex-B start-code
//! form. A truncated length prefix or a length running past the buffer ends
//! iteration; corrupt framing must never read out of bounds.

/// NAL unit type carrying Supplemental Enhancement Information.
pub const NAL_TYPE_SEI: u8 = 6;

/// Iterator over length-prefixed NAL units in a byte range.
pub struct NalUnits<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> NalUnits<'a> {
    /// Iterate the NAL units in `buf[start..end)`.
    pub fn new(buf: &'a [u8], start: usize, end: usize) -> Self {
        let end = end.min(buf.len());
        Self {
            buf,
            pos: start,
            end,
        }
    }
}

impl<'a> Iterator for NalUnits<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.pos + 4 > self.end {
            return None;
        }
        let len = u32::from_be_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]) as usize;

        let start = self.pos + 4;
        let nal_end = start.checked_add(len)?;
        if len == 0 || nal_end > self.end {
            // Zero-length or truncated unit: stop rather than spin or overrun.
            self.pos = self.end;
            return None;
        }

        self.pos = nal_end;
        Some(&self.buf[start..nal_end])
    }
}

/// The NAL unit type from the low 5 bits of the first header byte.
pub fn nal_unit_type(nal: &[u8]) -> Option<u8> {
    nal.first().map(|b| b & 0x1F)
}

/// Remove H.264 emulation-prevention bytes: each `00 00 03` becomes `00 00`.
///
/// The stuffing is a codec-level artifact to avoid accidental start codes
/// and is not part of the logical payload.
pub fn strip_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        if i + 2 < data.len() && data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 3 {
            result.push(0);
            result.push(0);
            i += 3;
        } else {
            result.push(data[i]);
            i += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn length_prefixed(nals: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for nal in nals {
            out.extend_from_slice(&(nal.len() as u32).to_be_bytes());
            out.extend_from_slice(nal);
        }
        out
    }

    #[test]
    fn test_iterates_units() {
        let stream = length_prefixed(&[&[0x65, 1, 2], &[0x06, 5, 9, 9]]);
        let units: Vec<_> = NalUnits::new(&stream, 0, stream.len()).collect();
        assert_eq!(units, vec![&[0x65u8, 1, 2][..], &[0x06u8, 5, 9, 9][..]]);
    }

    #[test]
    fn test_truncated_length_prefix_stops() {
        let stream = [0u8, 0, 0]; // incomplete prefix
        assert_eq!(NalUnits::new(&stream, 0, stream.len()).count(), 0);
    }

    #[test]
    fn test_length_past_end_stops() {
        let mut stream = length_prefixed(&[&[0x65, 1]]);
        stream.extend_from_slice(&100u32.to_be_bytes()); // claims 100 bytes
        stream.push(0xAA);

        let units: Vec<_> = NalUnits::new(&stream, 0, stream.len()).collect();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn test_zero_length_unit_stops() {
        let stream = length_prefixed(&[&[]]);
        assert_eq!(NalUnits::new(&stream, 0, stream.len()).count(), 0);
    }

    #[test]
    fn test_nal_unit_type() {
        assert_eq!(nal_unit_type(&[0x06]), Some(NAL_TYPE_SEI));
        assert_eq!(nal_unit_type(&[0x66]), Some(NAL_TYPE_SEI)); // ref_idc bits masked
        assert_eq!(nal_unit_type(&[0x65]), Some(5));
        assert_eq!(nal_unit_type(&[]), None);
    }

    #[test]
    fn test_strip_emulation_prevention() {
        let input = [0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x03, 0x02];
        assert_eq!(
            strip_emulation_prevention(&input),
            vec![0x00, 0x00, 0x01, 0x00, 0x00, 0x02]
        );
    }

    #[test]
    fn test_strip_leaves_plain_data() {
        let input = [0x00, 0x03, 0x00, 0x01, 0x02];
        assert_eq!(strip_emulation_prevention(&input), input.to_vec());
    }
}
