use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    extractors::ApiPath,
    models::{
        like::{LikeResponse, LikeStatus, LikeTarget, TargetKind},
        user::{ActingUser, Viewer},
    },
    services::likes,
};

/// `/likes/{target_type}/{id}` path pieces, with the type checked against the closed set.
fn parse_target((target_type, id): (String, i64)) -> Result<LikeTarget, AppError> {
    let kind = target_type.parse::<TargetKind>()?;
    Ok(LikeTarget::new(kind, id))
}

async fn like(
    pool: &SqlitePool,
    actor: &ActingUser,
    target: LikeTarget,
) -> Result<(StatusCode, Json<LikeResponse>), AppError> {
    let like = likes::like(pool, actor, target).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

async fn unlike(
    pool: &SqlitePool,
    actor: &ActingUser,
    target: LikeTarget,
) -> Result<StatusCode, AppError> {
    likes::unlike(pool, actor, target).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn status(
    pool: &SqlitePool,
    viewer: &Viewer,
    target: LikeTarget,
) -> Result<Json<LikeStatus>, AppError> {
    let status = likes::status(pool, viewer.user_id(), target).await?;
    Ok(Json(status))
}

/// Like a post. Liking twice is rejected with 400.
pub async fn like_post(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    like(&pool, &actor, LikeTarget::Post(id)).await
}

/// Remove the caller's like from a post. 404 when there is none.
pub async fn unlike_post(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    unlike(&pool, &actor, LikeTarget::Post(id)).await
}

pub async fn post_like_status(
    State(pool): State<SqlitePool>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    status(&pool, &viewer, LikeTarget::Post(id)).await
}

/// Like a comment. Liking twice is rejected with 400.
pub async fn like_comment(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    like(&pool, &actor, LikeTarget::Comment(id)).await
}

/// Remove the caller's like from a comment. 404 when there is none.
pub async fn unlike_comment(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    unlike(&pool, &actor, LikeTarget::Comment(id)).await
}

pub async fn comment_like_status(
    State(pool): State<SqlitePool>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    status(&pool, &viewer, LikeTarget::Comment(id)).await
}

/// List who liked a target, newest first.
pub async fn list_likes(
    State(pool): State<SqlitePool>,
    ApiPath(path): ApiPath<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let target = parse_target(path)?;
    let likes = likes::list(&pool, target).await?;
    Ok(Json(likes))
}

pub async fn create_like(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(path): ApiPath<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let target = parse_target(path)?;
    like(&pool, &actor, target).await
}

pub async fn delete_like(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(path): ApiPath<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let target = parse_target(path)?;
    unlike(&pool, &actor, target).await
}

pub async fn like_status(
    State(pool): State<SqlitePool>,
    viewer: Viewer,
    ApiPath(path): ApiPath<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let target = parse_target(path)?;
    status(&pool, &viewer, target).await
}
