//! Post lifecycle: create, read, edit, soft delete, restore and purge.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};

use crate::{
    error::AppError,
    models::{
        like::TargetKind,
        post::{
            CONTENT_LENGTH_MESSAGE, CONTENT_MAX_CHARS, CreatePostRequest, Post, PostListParams,
            PostResponse, TITLE_LENGTH_MESSAGE, TITLE_MAX_CHARS, UpdatePostRequest,
        },
        user::{ActingUser, Viewer},
    },
    policy::authorize_mutation,
    services::likes,
    utils::html::clean_text,
    views::post_view,
};

/// Loads a post whatever its deletion state.
pub async fn fetch_any<'e, E>(executor: E, id: i64) -> Result<Option<Post>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let post = sqlx::query_as::<_, Post>(
        r#"
        SELECT
            p.id, p.user_id, u.username, p.title, p.content, p.image_url, p.views,
            p.created_at, p.updated_at, p.is_deleted, p.deleted_at, p.deleted_by,
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id AND c.is_deleted = FALSE)
                AS comments_count
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(post)
}

/// Loads a post that has not been soft-deleted.
pub async fn fetch_active<'e, E>(executor: E, id: i64) -> Result<Post, AppError>
where
    E: SqliteExecutor<'e>,
{
    fetch_any(executor, id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

fn clean_title(title: &str) -> Result<String, AppError> {
    clean_text("title", title, TITLE_MAX_CHARS, TITLE_LENGTH_MESSAGE)
}

fn clean_content(content: &str) -> Result<String, AppError> {
    clean_text("content", content, CONTENT_MAX_CHARS, CONTENT_LENGTH_MESSAGE)
}

async fn render(pool: &SqlitePool, post: Post, viewer: Option<i64>) -> Result<PostResponse, AppError> {
    let stats = likes::stats_for(pool, TargetKind::Post, &[post.id], viewer).await?;
    Ok(post_view(post, &stats))
}

pub async fn create(
    pool: &SqlitePool,
    actor: &ActingUser,
    payload: CreatePostRequest,
) -> Result<PostResponse, AppError> {
    let title = clean_title(&payload.title)?;
    let content = clean_content(&payload.content)?;
    let now = Utc::now();

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO posts (user_id, title, content, image_url, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        RETURNING id
        "#,
    )
    .bind(actor.id)
    .bind(title)
    .bind(content)
    .bind(payload.image_url)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create post: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(post = id, author = actor.id, "post created");

    let post = fetch_active(pool, id).await?;
    Ok(post_view(post, &Default::default()))
}

/// Live posts, newest first.
pub async fn list(
    pool: &SqlitePool,
    viewer: &Viewer,
    params: &PostListParams,
) -> Result<Vec<PostResponse>, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT
            p.id, p.user_id, u.username, p.title, p.content, p.image_url, p.views,
            p.created_at, p.updated_at, p.is_deleted, p.deleted_at, p.deleted_by,
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id AND c.is_deleted = FALSE)
                AS comments_count
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.is_deleted = FALSE
          AND (?1 IS NULL OR p.id < ?1)
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT ?2
        "#,
    )
    .bind(params.cursor)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let stats = likes::stats_for(pool, TargetKind::Post, &ids, viewer.user_id()).await?;

    Ok(posts.into_iter().map(|p| post_view(p, &stats)).collect())
}

/// Fetches a live post and counts the view.
pub async fn get(pool: &SqlitePool, id: i64, viewer: &Viewer) -> Result<PostResponse, AppError> {
    let result = sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ?1 AND is_deleted = FALSE")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let post = fetch_active(pool, id).await?;
    render(pool, post, viewer.user_id()).await
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    actor: &ActingUser,
    payload: UpdatePostRequest,
) -> Result<PostResponse, AppError> {
    let post = fetch_active(pool, id).await?;
    authorize_mutation(&post, actor)?;

    let title = match payload.title {
        Some(title) => clean_title(&title)?,
        None => post.title,
    };
    let content = match payload.content {
        Some(content) => clean_content(&content)?,
        None => post.content,
    };
    let image_url = payload.image_url.or(post.image_url);

    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?1, content = ?2, image_url = ?3, updated_at = ?4
        WHERE id = ?5
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(image_url)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    tracing::info!(post = id, actor = actor.id, "post updated");

    let post = fetch_active(pool, id).await?;
    render(pool, post, Some(actor.id)).await
}

/// Flags the post as deleted; the row and its comments stay for restore.
pub async fn soft_delete(pool: &SqlitePool, id: i64, actor: &ActingUser) -> Result<(), AppError> {
    let post = fetch_active(pool, id).await?;
    authorize_mutation(&post, actor)?;

    sqlx::query("UPDATE posts SET is_deleted = TRUE, deleted_at = ?1, deleted_by = ?2 WHERE id = ?3")
        .bind(Utc::now())
        .bind(actor.id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete post: {:?}", e);
            AppError::from(e)
        })?;

    tracing::info!(post = id, actor = actor.id, "post soft-deleted");
    Ok(())
}

/// Clears the deletion flags. Restoring a live post is a no-op.
pub async fn restore(pool: &SqlitePool, id: i64, actor: &ActingUser) -> Result<PostResponse, AppError> {
    let post = fetch_any(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    authorize_mutation(&post, actor)?;

    if post.is_deleted {
        sqlx::query(
            "UPDATE posts SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL WHERE id = ?1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        tracing::info!(post = id, actor = actor.id, "post restored");
    }

    let post = fetch_active(pool, id).await?;
    render(pool, post, Some(actor.id)).await
}

/// Hard delete. Comments go with the post through the foreign keys and the
/// likes on both through the purge triggers, whatever their deletion state.
pub async fn purge(pool: &SqlitePool, id: i64, actor: &ActingUser) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let post = fetch_any(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    authorize_mutation(&post, actor)?;

    sqlx::query("DELETE FROM posts WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::warn!(post = id, actor = actor.id, "post purged");
    Ok(())
}
