use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, Result},
    models::{CreateForumRequest, CreateThreadRequest, Forum, ListQuery, Thread, User},
    AppState,
};

/// 201 for a new row, 409 with the row already holding the key
fn created_status(is_new: bool) -> StatusCode {
    if is_new {
        StatusCode::CREATED
    } else {
        StatusCode::CONFLICT
    }
}

pub async fn create_forum(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateForumRequest>, AppError>,
) -> Result<(StatusCode, Json<Forum>)> {
    let created = state.db.create_forum(&req).await?;
    let status = created_status(created.is_new());
    let forum = created.into_inner();

    if status == StatusCode::CREATED {
        tracing::info!(slug = %forum.slug, owner = %forum.user, "forum created");
    }

    Ok((status, Json(forum)))
}

pub async fn get_forum(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Forum>> {
    let forum = state.db.get_forum(&slug).await?;
    Ok(Json(forum))
}

/// Create a thread in a forum; a slug clash returns the existing thread (409)
pub async fn create_thread(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<CreateThreadRequest>, AppError>,
) -> Result<(StatusCode, Json<Thread>)> {
    let created = state.db.create_thread(&slug, &req).await?;
    let status = created_status(created.is_new());

    Ok((status, Json(created.into_inner())))
}

/// Threads of a forum; `since` is a creation timestamp
pub async fn get_forum_threads(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery<DateTime<Utc>>>, AppError>,
) -> Result<Json<Vec<Thread>>> {
    let threads = state.db.get_forum_threads(&slug, &query.into()).await?;
    Ok(Json(threads))
}

/// Users active in a forum; `since` is a nickname
pub async fn get_forum_users(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery<String>>, AppError>,
) -> Result<Json<Vec<User>>> {
    let users = state.db.get_forum_users(&slug, &query.into()).await?;
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_status() {
        assert_eq!(created_status(true), StatusCode::CREATED);
        assert_eq!(created_status(false), StatusCode::CONFLICT);
    }
}
