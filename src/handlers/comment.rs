use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    extractors::{ApiJson, ApiPath},
    models::{
        comment::{CreateCommentRequest, UpdateCommentRequest},
        user::{ActingUser, Viewer},
    },
    services::comments,
};

/// Create a comment on a post, or a reply when `parent` is set.
pub async fn create_comment(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(post_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let comment =
        comments::create(&pool, post_id, &actor, &payload.content, payload.parent).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// List the top-level comments of a post with their replies nested.
pub async fn list_comments(
    State(pool): State<SqlitePool>,
    viewer: Viewer,
    ApiPath(post_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comments = comments::list_top_level(&pool, post_id, &viewer).await?;
    Ok(Json(comments))
}

pub async fn get_comment(
    State(pool): State<SqlitePool>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comments::get(&pool, id, &viewer).await?;
    Ok(Json(comment))
}

pub async fn list_replies(
    State(pool): State<SqlitePool>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let replies = comments::list_replies(&pool, id, &viewer).await?;
    Ok(Json(replies))
}

/// Edit a comment.
/// Requires: Login + (Author OR Staff).
pub async fn update_comment(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let comment = comments::update(&pool, id, &actor, &payload.content).await?;
    Ok(Json(comment))
}

/// Delete a comment (Soft Delete).
/// Requires: Login + (Author OR Staff).
pub async fn delete_comment(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    comments::soft_delete(&pool, id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_comment(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comments::restore(&pool, id, &actor).await?;
    Ok(Json(comment))
}
