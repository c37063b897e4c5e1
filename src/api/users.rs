use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    db::Created,
    error::{AppError, Result},
    models::{CreateUserRequest, UpdateUserRequest, User},
    AppState,
};

/// Create a user; a nickname or email clash returns every user holding either (409)
pub async fn create_user(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<CreateUserRequest>, AppError>,
) -> Result<Response> {
    let user = req.into_user(nickname);

    let response = match state.db.create_user(&user).await? {
        Created::New(user) => {
            tracing::info!(nickname = %user.nickname, "user created");
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Created::Existing(users) => (StatusCode::CONFLICT, Json(users)).into_response(),
    };

    Ok(response)
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
) -> Result<Json<User>> {
    let user = state.db.get_user(&nickname).await?;
    Ok(Json(user))
}

/// Update profile fields; absent or empty fields are kept
pub async fn update_user(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateUserRequest>, AppError>,
) -> Result<Json<User>> {
    let user = state.db.update_user(&nickname, &req).await?;
    Ok(Json(user))
}
