//! HLS streaming handlers.
//!
//! One route serves both playlist and chunk requests for a clip. A playlist
//! request triggers on-demand segmentation and blocks until the stream is
//! ready (or fails); chunk requests only ever read what the segmenter has
//! already written.
//!
//! Playlists are served uncacheable because an in-progress event playlist
//! grows between requests; chunks are immutable once written.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use dashvault_common::{ClipLocation, EncodingProfile, Error, StreamCacheKey};
use dashvault_media::hls;
use tokio_util::io::ReaderStream;

use crate::segmenter::{SegmentOutcome, SegmentSource};
use crate::server::AppContext;
use crate::storage::ClipStorage;

pub async fn stream_artifact(
    State(ctx): State<AppContext>,
    Path((kind, event, segment, camera, file)): Path<(String, String, String, String, String)>,
) -> Result<Response, StatusCode> {
    let clip = super::routes_telemetry::parse_location(&kind, &event, &segment, &camera)?;
    let profile = EncodingProfile::from_bitrate(&ctx.config.streaming.target_bitrate);
    let key = StreamCacheKey::new(profile, &clip);

    if file == "stream.m3u8" {
        serve_playlist(&ctx, &clip, key).await
    } else {
        serve_chunk(&ctx, key, &file).await
    }
}

async fn serve_playlist(
    ctx: &AppContext,
    clip: &ClipLocation,
    key: StreamCacheKey,
) -> Result<Response, StatusCode> {
    let source = match ctx.storage.stream_url(clip) {
        Some(remote) => SegmentSource::Remote(remote),
        None => match ctx.storage.local_path(clip) {
            Ok(path) => SegmentSource::Local(path),
            Err(Error::NotFound(_)) => return Err(StatusCode::NOT_FOUND),
            Err(Error::InvalidInput(_)) => return Err(StatusCode::BAD_REQUEST),
            Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
        },
    };

    match ctx.engine.ensure_segments_ready(source, key.clone()).await {
        SegmentOutcome::Ready => {}
        SegmentOutcome::SourceMissing => return Err(StatusCode::NOT_FOUND),
        SegmentOutcome::Failed(reason) => {
            tracing::warn!(key = %key, error = %reason, "Refusing stream");
            return Err(StatusCode::BAD_GATEWAY);
        }
    }

    let manifest = key.manifest_path(ctx.engine.cache_root());
    let content = tokio::fs::read_to_string(&manifest)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from(content))
        .unwrap())
}

async fn serve_chunk(
    ctx: &AppContext,
    key: StreamCacheKey,
    file: &str,
) -> Result<Response, StatusCode> {
    // Strict name check; the request path never touches the filesystem
    // with anything but a known-shape chunk name.
    if !hls::is_chunk_name(file) {
        return Err(StatusCode::NOT_FOUND);
    }

    let path = key.cache_dir(ctx.engine.cache_root()).join(file);
    let chunk = tokio::fs::File::open(&path)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let len = chunk
        .metadata()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .len();

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp2t")
        .header(header::CONTENT_LENGTH, len.to_string())
        .header(header::CACHE_CONTROL, "max-age=31536000, immutable")
        .body(Body::from_stream(ReaderStream::new(chunk)))
        .unwrap())
}
