use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    db::Page,
    error::{AppError, Result},
    models::{
        CreatePostRequest, Post, Thread, ThreadPostsQuery, ThreadRef, UpdateThreadRequest,
        VoteRequest,
    },
    AppState,
};

pub async fn get_thread(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
) -> Result<Json<Thread>> {
    let thread = state.db.get_thread(&ThreadRef::parse(slug_or_id)).await?;
    Ok(Json(thread))
}

pub async fn update_thread(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateThreadRequest>, AppError>,
) -> Result<Json<Thread>> {
    let thread = state
        .db
        .update_thread(&ThreadRef::parse(slug_or_id), &req)
        .await?;
    Ok(Json(thread))
}

pub async fn vote(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<VoteRequest>, AppError>,
) -> Result<Json<Thread>> {
    let thread = state.db.vote(&ThreadRef::parse(slug_or_id), &req).await?;
    Ok(Json(thread))
}

/// Create a batch of posts in one thread
pub async fn create_posts(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    WithRejection(Json(posts), _): WithRejection<Json<Vec<CreatePostRequest>>, AppError>,
) -> Result<(StatusCode, Json<Vec<Post>>)> {
    let posts = state
        .db
        .create_posts(&ThreadRef::parse(slug_or_id), &posts)
        .await?;

    Ok((StatusCode::CREATED, Json(posts)))
}

/// List thread posts; `sort` is one of `flat`, `tree`, `parent_tree`
pub async fn get_thread_posts(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<ThreadPostsQuery>, AppError>,
) -> Result<Json<Vec<Post>>> {
    let page = Page {
        since: query.since,
        desc: query.desc,
        limit: query.limit,
    };
    let posts = state
        .db
        .get_thread_posts(&ThreadRef::parse(slug_or_id), query.sort, &page)
        .await?;

    Ok(Json(posts))
}
