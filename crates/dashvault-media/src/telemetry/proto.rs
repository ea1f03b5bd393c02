//! Protobuf wire-format decoding for the telemetry schema.
//!
//! The payload is a single flat message; every field is optional with
//! protobuf scalar semantics (absent = zero value), so decoding starts from
//! a default frame and fills in whatever fields are present. Unknown field
//! numbers are skipped by wire type, which keeps firmware supersets of the
//! schema decodable.
//!
//! Field numbering:
//!
//! | # | field                       | wire type       |
//! |---|-----------------------------|-----------------|
//! | 1 | frame_seq_no                | varint          |
//! | 2 | vehicle_speed_mps           | 32-bit float    |
//! | 3 | steering_wheel_angle        | 32-bit float    |
//! | 4 | gear_state                  | varint          |
//! | 5 | autopilot_state             | varint          |
//! | 6 | brake_applied               | varint (bool)   |
//! | 7 | blinker_on_left             | varint (bool)   |
//! | 8 | blinker_on_right            | varint (bool)   |
//! | 9 | latitude_deg                | 64-bit double   |
//! | 10| longitude_deg               | 64-bit double   |
//! | 11| heading_deg                 | 32-bit float    |
//! | 12| accelerator_pedal_position  | 32-bit float    |

use super::TelemetryFrame;
use crate::error::{Error, Result};

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LENGTH_DELIMITED: u8 = 2;
const WIRE_FIXED32: u8 = 5;

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn has_remaining(&self) -> bool {
        self.pos < self.buf.len()
    }

    fn varint(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or(Error::Truncated("varint"))?;
            self.pos += 1;

            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(Error::VarintOverflow);
            }
        }
    }

    fn fixed32(&mut self) -> Result<u32> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + 4)
            .ok_or(Error::BufferUnderflow {
                need: 4,
                have: self.buf.len().saturating_sub(self.pos),
            })?;
        self.pos += 4;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn fixed64(&mut self) -> Result<u64> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + 8)
            .ok_or(Error::BufferUnderflow {
                need: 8,
                have: self.buf.len().saturating_sub(self.pos),
            })?;
        self.pos += 8;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn skip_length_delimited(&mut self) -> Result<()> {
        let len = self.varint()? as usize;
        // The length is attacker-controlled; adding it to the cursor must
        // not wrap.
        let end = self
            .pos
            .checked_add(len)
            .ok_or(Error::Truncated("length-delimited field"))?;
        if end > self.buf.len() {
            return Err(Error::Truncated("length-delimited field"));
        }
        self.pos = end;
        Ok(())
    }
}

/// Decode one telemetry frame from a de-stuffed SEI payload.
///
/// Fields absent from the message keep their zero/false defaults; a malformed
/// message is an error the caller handles by skipping this NAL.
pub fn decode_frame(payload: &[u8]) -> Result<TelemetryFrame> {
    let mut frame = TelemetryFrame::default();
    let mut reader = Reader::new(payload);

    while reader.has_remaining() {
        let tag = reader.varint()?;
        let field = (tag >> 3) as u32;
        let wire = (tag & 0x07) as u8;

        match wire {
            WIRE_VARINT => {
                let v = reader.varint()?;
                match field {
                    1 => frame.frame_seq_no = v,
                    4 => frame.gear_state = v as u32,
                    5 => frame.autopilot_state = v as u32,
                    6 => frame.brake_applied = v != 0,
                    7 => frame.blinker_on_left = v != 0,
                    8 => frame.blinker_on_right = v != 0,
                    _ => {} // unknown varint field
                }
            }
            WIRE_FIXED32 => {
                let v = f32::from_bits(reader.fixed32()?);
                match field {
                    2 => frame.vehicle_speed_mps = v,
                    3 => frame.steering_wheel_angle = v,
                    11 => frame.heading_deg = v,
                    12 => frame.accelerator_pedal_position = v,
                    _ => {}
                }
            }
            WIRE_FIXED64 => {
                let v = f64::from_bits(reader.fixed64()?);
                match field {
                    9 => frame.latitude_deg = v,
                    10 => frame.longitude_deg = v,
                    _ => {}
                }
            }
            WIRE_LENGTH_DELIMITED => reader.skip_length_delimited()?,
            other => return Err(Error::InvalidWireType(other)),
        }
    }

    Ok(frame)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_full_message() {
        let mut payload = Vec::new();
        encode::varint(&mut payload, 1, 123_456);
        encode::float(&mut payload, 2, 17.5);
        encode::float(&mut payload, 3, -42.25);
        encode::varint(&mut payload, 4, 3);
        encode::varint(&mut payload, 5, 1);
        encode::varint(&mut payload, 6, 1);
        encode::varint(&mut payload, 7, 0);
        encode::varint(&mut payload, 8, 1);
        encode::double(&mut payload, 9, 37.7749);
        encode::double(&mut payload, 10, -122.4194);
        encode::float(&mut payload, 11, 270.0);
        encode::float(&mut payload, 12, 0.35);

        let frame = decode_frame(&payload).unwrap();
        assert_eq!(frame.frame_seq_no, 123_456);
        assert_eq!(frame.vehicle_speed_mps, 17.5);
        assert_eq!(frame.steering_wheel_angle, -42.25);
        assert_eq!(frame.gear_state, 3);
        assert_eq!(frame.autopilot_state, 1);
        assert!(frame.brake_applied);
        assert!(!frame.blinker_on_left);
        assert!(frame.blinker_on_right);
        assert_eq!(frame.latitude_deg, 37.7749);
        assert_eq!(frame.longitude_deg, -122.4194);
        assert_eq!(frame.heading_deg, 270.0);
        assert_eq!(frame.accelerator_pedal_position, 0.35);
    }

    #[test]
    fn test_all_fields_unset_decode_to_zero() {
        let frame = decode_frame(&[]).unwrap();
        assert_eq!(frame, TelemetryFrame::default());
        assert_eq!(frame.frame_seq_no, 0);
        assert_eq!(frame.vehicle_speed_mps, 0.0);
        assert_eq!(frame.gear_state, 0);
        assert!(!frame.brake_applied);
        assert_eq!(frame.latitude_deg, 0.0);
    }

    #[test]
    fn test_partial_message_defaults_rest() {
        let mut payload = Vec::new();
        encode::varint(&mut payload, 1, 7);
        encode::float(&mut payload, 2, 3.0);

        let frame = decode_frame(&payload).unwrap();
        assert_eq!(frame.frame_seq_no, 7);
        assert_eq!(frame.vehicle_speed_mps, 3.0);
        assert_eq!(frame.steering_wheel_angle, 0.0);
        assert!(!frame.blinker_on_right);
    }

    #[test]
    fn test_unknown_fields_skipped() {
        let mut payload = Vec::new();
        encode::varint(&mut payload, 99, 5);
        encode::bytes(&mut payload, 50, b"future extension");
        encode::double(&mut payload, 40, 1.0);
        encode::varint(&mut payload, 1, 9);

        let frame = decode_frame(&payload).unwrap();
        assert_eq!(frame.frame_seq_no, 9);
    }

    #[test]
    fn test_truncated_message_errors() {
        let mut payload = Vec::new();
        encode::float(&mut payload, 2, 1.0);
        payload.truncate(payload.len() - 2);
        assert!(decode_frame(&payload).is_err());

        // Varint with continuation bit but no next byte.
        assert!(decode_frame(&[0x08, 0x80]).is_err());
    }

    #[test]
    fn test_invalid_wire_type_errors() {
        // Field 1 with deprecated group wire type 3.
        assert!(matches!(
            decode_frame(&[0x0B]),
            Err(Error::InvalidWireType(3))
        ));
    }

    #[test]
    fn test_huge_skip_length_errors() {
        // Field 1, wire type 2, with a length varint near u64::MAX. The
        // cursor advance must report truncation, not wrap around.
        let mut payload = vec![0x0A];
        payload.extend_from_slice(&[0xFF; 9]);
        payload.push(0x01);
        assert!(matches!(
            decode_frame(&payload),
            Err(Error::Truncated("length-delimited field"))
        ));
    }

    #[test]
    fn test_fixed_width_underflow() {
        let mut payload = Vec::new();
        encode::float(&mut payload, 2, 1.0);
        payload.truncate(payload.len() - 1);
        assert!(matches!(
            decode_frame(&payload),
            Err(Error::BufferUnderflow { need: 4, have: 3 })
        ));
    }

    #[test]
    fn test_varint_overflow_errors() {
        let payload = [0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(decode_frame(&payload), Err(Error::VarintOverflow)));
    }
}
