//! Comment threading and the comment soft-delete lifecycle.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};

use crate::{
    error::AppError,
    models::{
        comment::{COMMENT_LENGTH_MESSAGE, COMMENT_MAX_CHARS, Comment, CommentResponse},
        like::TargetKind,
        user::{ActingUser, Viewer},
    },
    policy::{authorize_mutation, check_reply_parent},
    services::{likes, posts},
    utils::html::clean_text,
    views::{assemble_thread, comment_view},
};

/// Loads a comment whatever its deletion state.
pub async fn fetch_any<'e, E>(executor: E, id: i64) -> Result<Option<Comment>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        SELECT
            c.id, c.post_id, c.user_id, u.username, c.parent_id, c.content,
            c.created_at, c.updated_at, c.is_deleted, c.deleted_at, c.deleted_by
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(comment)
}

/// Loads a comment that has not been soft-deleted.
pub async fn fetch_active<'e, E>(executor: E, id: i64) -> Result<Comment, AppError>
where
    E: SqliteExecutor<'e>,
{
    fetch_any(executor, id)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

/// Live direct replies of `parent_id`, oldest first.
async fn fetch_replies(pool: &SqlitePool, parent_id: i64) -> Result<Vec<Comment>, AppError> {
    let replies = sqlx::query_as::<_, Comment>(
        r#"
        SELECT
            c.id, c.post_id, c.user_id, u.username, c.parent_id, c.content,
            c.created_at, c.updated_at, c.is_deleted, c.deleted_at, c.deleted_by
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.parent_id = ?1 AND c.is_deleted = FALSE
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(parent_id)
    .fetch_all(pool)
    .await?;
    Ok(replies)
}

/// Full view of one comment: like state plus its live replies.
async fn render(
    pool: &SqlitePool,
    comment: Comment,
    viewer: Option<i64>,
) -> Result<CommentResponse, AppError> {
    let replies = fetch_replies(pool, comment.id).await?;

    let mut ids = vec![comment.id];
    ids.extend(replies.iter().map(|r| r.id));
    let stats = likes::stats_for(pool, TargetKind::Comment, &ids, viewer).await?;

    let replies = replies
        .into_iter()
        .map(|r| comment_view(r, Vec::new(), &stats))
        .collect();
    Ok(comment_view(comment, replies, &stats))
}

/// Creates a comment on a live post, or a reply when `parent_id` is given.
///
/// Replies may only target live top-level comments of the same post.
pub async fn create(
    pool: &SqlitePool,
    post_id: i64,
    actor: &ActingUser,
    content: &str,
    parent_id: Option<i64>,
) -> Result<CommentResponse, AppError> {
    let content = clean_text("content", content, COMMENT_MAX_CHARS, COMMENT_LENGTH_MESSAGE)?;

    let mut tx = pool.begin().await?;

    let post = posts::fetch_active(&mut *tx, post_id).await?;

    if let Some(pid) = parent_id {
        let parent = fetch_any(&mut *tx, pid)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;
        check_reply_parent(&parent, post.id)?;
    }

    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO comments (post_id, user_id, parent_id, content, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        RETURNING id
        "#,
    )
    .bind(post.id)
    .bind(actor.id)
    .bind(parent_id)
    .bind(content)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let comment = fetch_active(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!(
        comment = id,
        post = post_id,
        parent = ?parent_id,
        author = actor.id,
        "comment created"
    );

    Ok(comment_view(comment, Vec::new(), &Default::default()))
}

pub async fn get(pool: &SqlitePool, id: i64, viewer: &Viewer) -> Result<CommentResponse, AppError> {
    let comment = fetch_active(pool, id).await?;
    render(pool, comment, viewer.user_id()).await
}

/// Live top-level comments of a live post, newest first, each with its replies.
pub async fn list_top_level(
    pool: &SqlitePool,
    post_id: i64,
    viewer: &Viewer,
) -> Result<Vec<CommentResponse>, AppError> {
    posts::fetch_active(pool, post_id).await?;

    let top_level = sqlx::query_as::<_, Comment>(
        r#"
        SELECT
            c.id, c.post_id, c.user_id, u.username, c.parent_id, c.content,
            c.created_at, c.updated_at, c.is_deleted, c.deleted_at, c.deleted_by
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.post_id = ?1 AND c.parent_id IS NULL AND c.is_deleted = FALSE
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    let replies = sqlx::query_as::<_, Comment>(
        r#"
        SELECT
            c.id, c.post_id, c.user_id, u.username, c.parent_id, c.content,
            c.created_at, c.updated_at, c.is_deleted, c.deleted_at, c.deleted_by
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.post_id = ?1 AND c.parent_id IS NOT NULL AND c.is_deleted = FALSE
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = top_level.iter().chain(replies.iter()).map(|c| c.id).collect();
    let stats = likes::stats_for(pool, TargetKind::Comment, &ids, viewer.user_id()).await?;

    Ok(assemble_thread(top_level, replies, &stats))
}

/// Live replies of a live comment, oldest first.
pub async fn list_replies(
    pool: &SqlitePool,
    comment_id: i64,
    viewer: &Viewer,
) -> Result<Vec<CommentResponse>, AppError> {
    fetch_active(pool, comment_id).await?;

    let replies = fetch_replies(pool, comment_id).await?;
    let ids: Vec<i64> = replies.iter().map(|r| r.id).collect();
    let stats = likes::stats_for(pool, TargetKind::Comment, &ids, viewer.user_id()).await?;

    Ok(replies
        .into_iter()
        .map(|r| comment_view(r, Vec::new(), &stats))
        .collect())
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    actor: &ActingUser,
    content: &str,
) -> Result<CommentResponse, AppError> {
    let comment = fetch_active(pool, id).await?;
    authorize_mutation(&comment, actor)?;
    let content = clean_text("content", content, COMMENT_MAX_CHARS, COMMENT_LENGTH_MESSAGE)?;

    sqlx::query("UPDATE comments SET content = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(content)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    tracing::info!(comment = id, actor = actor.id, "comment updated");

    let comment = fetch_active(pool, id).await?;
    render(pool, comment, Some(actor.id)).await
}

/// Flags the comment as deleted, recording when and by whom.
pub async fn soft_delete(pool: &SqlitePool, id: i64, actor: &ActingUser) -> Result<(), AppError> {
    let comment = fetch_active(pool, id).await?;
    authorize_mutation(&comment, actor)?;

    sqlx::query(
        "UPDATE comments SET is_deleted = TRUE, deleted_at = ?1, deleted_by = ?2 WHERE id = ?3",
    )
    .bind(Utc::now())
    .bind(actor.id)
    .bind(id)
    .execute(pool)
    .await?;

    tracing::info!(comment = id, actor = actor.id, "comment soft-deleted");
    Ok(())
}

/// Clears all deletion metadata. Restoring a live comment is a no-op.
pub async fn restore(
    pool: &SqlitePool,
    id: i64,
    actor: &ActingUser,
) -> Result<CommentResponse, AppError> {
    let comment = fetch_any(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
    authorize_mutation(&comment, actor)?;

    if comment.is_deleted {
        sqlx::query(
            "UPDATE comments SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL WHERE id = ?1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        tracing::info!(comment = id, actor = actor.id, "comment restored");
    }

    let comment = fetch_active(pool, id).await?;
    render(pool, comment, Some(actor.id)).await
}
