//! Telemetry extraction handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use dashvault_common::paths::validate_component;
use dashvault_common::{ClipKind, ClipLocation, Error};
use dashvault_media::TelemetryData;

use crate::server::AppContext;
use crate::storage::RECENT_ROOT_EVENT;

/// Telemetry for one clip as JSON; 404 when the clip is missing or carries
/// no telemetry.
pub async fn clip_telemetry(
    State(ctx): State<AppContext>,
    Path((kind, event, segment, camera)): Path<(String, String, String, String)>,
) -> Result<Json<TelemetryData>, StatusCode> {
    let clip = parse_location(&kind, &event, &segment, &camera)?;

    match ctx.telemetry.telemetry_for_clip(&clip).await {
        Ok(Some(data)) => Ok(Json((*data).clone())),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(Error::NotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(Error::InvalidInput(_)) => Err(StatusCode::BAD_REQUEST),
        Err(e) => {
            tracing::error!("Telemetry extraction failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Validate raw path parameters into a [`ClipLocation`].
///
/// Everything is checked here, before any filesystem path is built from
/// request input.
pub(super) fn parse_location(
    kind: &str,
    event: &str,
    segment: &str,
    camera: &str,
) -> Result<ClipLocation, StatusCode> {
    let kind: ClipKind = kind.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let segment = segment.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let camera = camera.parse().map_err(|_| StatusCode::BAD_REQUEST)?;

    if event == RECENT_ROOT_EVENT {
        // "-" stands for the RecentClips root; saved/sentry events are
        // always real folders.
        if kind != ClipKind::Recent {
            return Err(StatusCode::BAD_REQUEST);
        }
    } else {
        validate_component(event).map_err(|_| StatusCode::BAD_REQUEST)?;
    }

    Ok(ClipLocation {
        kind,
        event_id: event.to_string(),
        segment,
        camera,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashvault_common::Camera;

    #[test]
    fn test_parse_location() {
        let clip = parse_location(
            "saved",
            "2024-03-01_17-40-12",
            "2024-03-01_17-42-00",
            "front",
        )
        .unwrap();
        assert_eq!(clip.kind, ClipKind::Saved);
        assert_eq!(clip.camera, Camera::Front);
    }

    #[test]
    fn test_recent_root_event_allowed() {
        let clip = parse_location("recent", "-", "2024-03-01_17-42-00", "back").unwrap();
        assert_eq!(clip.event_id, "-");
    }

    #[test]
    fn test_rejects_bad_parameters() {
        // "-" only stands for the root under recent.
        assert!(parse_location("saved", "-", "2024-03-01_17-42-00", "front").is_err());
        assert!(parse_location("archived", "e", "2024-03-01_17-42-00", "front").is_err());
        assert!(parse_location("saved", "../e", "2024-03-01_17-42-00", "front").is_err());
        assert!(parse_location("saved", "e", "not-a-stamp", "front").is_err());
        assert!(parse_location("saved", "e", "2024-03-01_17-42-00", "drone").is_err());
    }
}
