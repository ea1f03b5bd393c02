//! Random-access MP4 box walking over a byte buffer.
//!
//! Boxes are framed by an 8-byte header (32-bit big-endian size, 4-byte ASCII
//! type); size 1 switches to a 16-byte header with a 64-bit extended size,
//! and size 0 means "extends to the end of the enclosing range". A declared
//! size smaller than its own header, or one running past the enclosing range,
//! terminates the scan: corrupt sizes must never cause unbounded loops or
//! out-of-bounds reads.

/// Location of one box's content within the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxSpan {
    /// First byte of the box content (after the header).
    pub content_start: usize,
    /// One past the last byte of the box content.
    pub content_end: usize,
    /// Total box size including its header.
    pub total_size: u64,
}

impl BoxSpan {
    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.content_end - self.content_start
    }

    /// Whether the box has no content.
    pub fn is_empty(&self) -> bool {
        self.content_end == self.content_start
    }
}

/// Pack a 4-character box type into its big-endian code.
pub const fn fourcc(name: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*name)
}

fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    let bytes = buf.get(at..at + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_u64(buf: &[u8], at: usize) -> Option<u64> {
    let bytes = buf.get(at..at + 8)?;
    Some(u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}

/// Scan sibling boxes in `buf[start..end)` for the first box of the given
/// type, returning the span of its content.
///
/// Returns `None` if the type is not present or the sibling chain is
/// malformed before the type is found.
pub fn find_box(buf: &[u8], start: usize, end: usize, name: &[u8; 4]) -> Option<BoxSpan> {
    let end = end.min(buf.len());
    let wanted = fourcc(name);
    let mut pos = start;

    while pos + 8 <= end {
        let size32 = read_u32(buf, pos)? as u64;
        let box_type = read_u32(buf, pos + 4)?;

        let (total_size, header_size) = if size32 == 1 {
            let ext = read_u64(buf, pos + 8)?;
            (ext, 16u64)
        } else if size32 == 0 {
            ((end - pos) as u64, 8u64)
        } else {
            (size32, 8u64)
        };

        // Malformed: size cannot even cover its own header.
        if total_size < header_size {
            return None;
        }
        // Malformed: box runs past the enclosing range.
        let box_end = (pos as u64).checked_add(total_size)?;
        if box_end > end as u64 {
            return None;
        }

        if box_type == wanted {
            return Some(BoxSpan {
                content_start: pos + header_size as usize,
                content_end: box_end as usize,
                total_size,
            });
        }

        pos = box_end as usize;
    }

    None
}
