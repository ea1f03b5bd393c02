//! Event listing handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use dashvault_common::ClipKind;

use crate::server::AppContext;
use crate::storage::scanner::{self, EventSummary};

/// List all events of one kind, newest first.
pub async fn list_events(
    State(ctx): State<AppContext>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<EventSummary>>, StatusCode> {
    let kind: ClipKind = kind.parse().map_err(|_| StatusCode::BAD_REQUEST)?;

    // The scan walks directories and probes files; keep it off the workers.
    let storage = ctx.storage.clone();
    let events = tokio::task::spawn_blocking(move || scanner::scan_events(&storage, kind))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(events))
}
