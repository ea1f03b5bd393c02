//! MP4 container parsing.

mod boxes;
mod timing;

pub use boxes::{find_box, fourcc, BoxSpan};
pub use timing::{
    media_data_bounds, movie_duration_secs, mvhd_duration_secs, video_frame_durations_ms,
};
