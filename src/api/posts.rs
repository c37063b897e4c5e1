use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::{AppError, Result},
    models::{Post, PostDetails, PostDetailsQuery, UpdatePostRequest},
    AppState,
};

/// Get a post, optionally with its author, thread and forum (`?related=user,thread,forum`)
pub async fn get_post(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<PostDetailsQuery>, AppError>,
) -> Result<Json<PostDetails>> {
    let details = state.db.get_post_details(id, query.related()).await?;
    Ok(Json(details))
}

pub async fn update_post(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdatePostRequest>, AppError>,
) -> Result<Json<Post>> {
    let post = state.db.update_post(id, &req).await?;
    Ok(Json(post))
}
