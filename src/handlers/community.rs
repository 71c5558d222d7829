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
    extractors::{ApiJson, ApiPath, ApiQuery},
    models::{
        post::{CreatePostRequest, PostListParams, UpdatePostRequest},
        user::{ActingUser, Viewer},
    },
    services::posts,
};

/// Create a new post. The caller becomes its owner.
pub async fn create_post(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let post = posts::create(&pool, &actor, payload).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// List posts (Recent first).
/// Filter out soft-deleted posts.
/// Supports id-cursor pagination.
pub async fn list_posts(
    State(pool): State<SqlitePool>,
    viewer: Viewer,
    ApiQuery(params): ApiQuery<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let posts = posts::list(&pool, &viewer, &params).await?;
    Ok(Json(posts))
}

/// Get a single post by ID. Counts as a view.
pub async fn get_post(
    State(pool): State<SqlitePool>,
    viewer: Viewer,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts::get(&pool, id, &viewer).await?;
    Ok(Json(post))
}

/// Edit a post.
/// Requires: Login + (Author OR Staff).
pub async fn update_post(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let post = posts::update(&pool, id, &actor, payload).await?;
    Ok(Json(post))
}

/// Delete a post (Soft Delete).
/// Requires: Login + (Author OR Staff).
pub async fn delete_post(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    posts::soft_delete(&pool, id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Undo a soft delete.
/// Requires: Login + (Author OR Staff).
pub async fn restore_post(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts::restore(&pool, id, &actor).await?;
    Ok(Json(post))
}

/// Permanently delete a post with all of its comments and likes.
/// Requires: Login + (Author OR Staff).
pub async fn purge_post(
    State(pool): State<SqlitePool>,
    actor: ActingUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    posts::purge(&pool, id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
