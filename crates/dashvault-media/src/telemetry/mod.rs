//! Telemetry extraction: SEI scan, protobuf decode, and frame timing.

mod proto;

use crate::h264::{vendor_sei_payload, NalUnits};
use crate::mp4;

/// Fallback frame rate assumed when the file carries no usable `stts` table.
///
/// An approximation inherited from the recorder's typical capture rate; if
/// the true rate differs the mapped times drift, which is an accepted,
/// documented limitation.
const FALLBACK_FPS: f64 = 36.0;

/// One decoded SEI telemetry sample.
///
/// All fields default to zero/false per protobuf scalar semantics: a field
/// absent from the wire message must not fail the frame.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
pub struct TelemetryFrame {
    /// Absolute sequence number assigned by the recorder. Only meaningful
    /// relative to the other frames of the same segment; the counter does
    /// not reset per file.
    pub frame_seq_no: u64,
    pub vehicle_speed_mps: f32,
    pub steering_wheel_angle: f32,
    /// Gear selector state, 0..3.
    pub gear_state: u32,
    /// Driver-assist engagement state, 0..3.
    pub autopilot_state: u32,
    pub brake_applied: bool,
    pub blinker_on_left: bool,
    pub blinker_on_right: bool,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub heading_deg: f32,
    pub accelerator_pedal_position: f32,
}

/// Extraction result for one segment+camera: parallel arrays of millisecond
/// offsets and decoded frames.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "camelCase"))]
pub struct TelemetryData {
    /// Millisecond offset from segment start, one entry per frame,
    /// non-decreasing when frames are ordered by sequence number.
    pub frame_times_ms: Vec<f64>,
    pub frames: Vec<TelemetryFrame>,
}

/// Decode every vendor SEI frame in `buf[start..end)`, in stream order.
///
/// Individual NALs that fail to decode are skipped; the scan continues.
pub fn scan_frames(buf: &[u8], start: usize, end: usize) -> Vec<TelemetryFrame> {
    let mut frames = Vec::new();

    for nal in NalUnits::new(buf, start, end) {
        let Some(payload) = vendor_sei_payload(nal) else {
            continue;
        };
        match proto::decode_frame(&payload) {
            Ok(frame) => frames.push(frame),
            Err(_) => continue, // foreign or corrupt payload, keep scanning
        }
    }

    frames
}

/// Assign each frame a millisecond offset within the segment.
///
/// Sequence numbers are normalized by the minimum observed value, then used
/// to index a cumulative sum of the per-frame durations (clamped to the
/// table). Without a duration table the offset falls back to a constant
/// [`FALLBACK_FPS`] spacing.
pub fn map_frame_times(frames: &[TelemetryFrame], durations_ms: Option<&[f64]>) -> Vec<f64> {
    let Some(min_seq) = frames.iter().map(|f| f.frame_seq_no).min() else {
        return Vec::new();
    };

    match durations_ms {
        Some(durations) if !durations.is_empty() => {
            // cumulative[i] = sum of durations of frames 0..i-1
            let mut cumulative = Vec::with_capacity(durations.len());
            let mut acc = 0.0;
            for d in durations {
                cumulative.push(acc);
                acc += d;
            }

            frames
                .iter()
                .map(|f| {
                    let index = (f.frame_seq_no - min_seq) as usize;
                    cumulative[index.min(cumulative.len() - 1)]
                })
                .collect()
        }
        _ => frames
            .iter()
            .map(|f| (f.frame_seq_no - min_seq) as f64 * (1000.0 / FALLBACK_FPS))
            .collect(),
    }
}

/// Extract telemetry from a complete MP4 buffer.
///
/// Returns `None` when the file has no `mdat` or no decodable vendor SEI
/// frames — callers distinguish "checked, none present" from "has data",
/// never receiving an empty `TelemetryData`.
pub fn extract_telemetry(buf: &[u8]) -> Option<TelemetryData> {
    let mdat = mp4::media_data_bounds(buf)?;

    let frames = scan_frames(buf, mdat.content_start, mdat.content_end);
    if frames.is_empty() {
        return None;
    }

    let durations = mp4::video_frame_durations_ms(buf);
    let frame_times_ms = map_frame_times(&frames, durations.as_deref());

    Some(TelemetryData {
        frame_times_ms,
        frames,
    })
}
