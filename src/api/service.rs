use std::collections::BTreeMap;

use axum::{extract::State, Json};

use crate::{error::Result, models::Status, AppState};

pub async fn status(State(state): State<AppState>) -> Result<Json<Status>> {
    let status = state.db.status().await?;
    Ok(Json(status))
}

/// Truncate every table
pub async fn clear(State(state): State<AppState>) -> Result<()> {
    state.db.clear().await
}

/// Request counts per route since startup
pub async fn stats(State(state): State<AppState>) -> Json<BTreeMap<String, u64>> {
    Json(state.stats.snapshot().await)
}
