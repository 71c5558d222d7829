//! Polymorphic like ledger over posts and comments.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    models::{
        like::{Like, LikeResponse, LikeStats, LikeStatus, LikeTarget, TargetKind},
        user::ActingUser,
    },
    services::{comments, posts},
};

/// Resolves `target` to a live post or comment, or 404s.
pub async fn ensure_target(pool: &SqlitePool, target: LikeTarget) -> Result<(), AppError> {
    match target {
        LikeTarget::Post(id) => posts::fetch_active(pool, id).await.map(|_| ()),
        LikeTarget::Comment(id) => comments::fetch_active(pool, id).await.map(|_| ()),
    }
}

/// Records that `actor` likes `target`.
/// A second like by the same user is rejected; the unique index settles races.
pub async fn like(
    pool: &SqlitePool,
    actor: &ActingUser,
    target: LikeTarget,
) -> Result<LikeResponse, AppError> {
    ensure_target(pool, target).await?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO likes (user_id, target_type, target_id, created_at)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id
        "#,
    )
    .bind(actor.id)
    .bind(target.kind().as_str())
    .bind(target.id())
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!("You already liked this {}", target.kind())),
        other => other,
    })?;

    tracing::info!(user = actor.id, kind = %target.kind(), target = target.id(), "like recorded");

    let like = sqlx::query_as::<_, Like>(
        r#"
        SELECT l.id, l.user_id, u.username, l.target_type, l.target_id, l.created_at
        FROM likes l
        JOIN users u ON u.id = l.user_id
        WHERE l.id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(like.into())
}

/// Removes `actor`'s like on `target`. Only the liking user can address the row.
pub async fn unlike(
    pool: &SqlitePool,
    actor: &ActingUser,
    target: LikeTarget,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "DELETE FROM likes WHERE user_id = ?1 AND target_type = ?2 AND target_id = ?3",
    )
    .bind(actor.id)
    .bind(target.kind().as_str())
    .bind(target.id())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Like not found".to_string()));
    }

    tracing::info!(user = actor.id, kind = %target.kind(), target = target.id(), "like removed");
    Ok(())
}

pub async fn is_liked(
    pool: &SqlitePool,
    user_id: i64,
    target: LikeTarget,
) -> Result<bool, AppError> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM likes WHERE user_id = ?1 AND target_type = ?2 AND target_id = ?3",
    )
    .bind(user_id)
    .bind(target.kind().as_str())
    .bind(target.id())
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}

pub async fn count_likes(pool: &SqlitePool, target: LikeTarget) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM likes WHERE target_type = ?1 AND target_id = ?2",
    )
    .bind(target.kind().as_str())
    .bind(target.id())
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// `{liked, likes_count}` for a live target. Anonymous viewers never like anything.
pub async fn status(
    pool: &SqlitePool,
    viewer: Option<i64>,
    target: LikeTarget,
) -> Result<LikeStatus, AppError> {
    ensure_target(pool, target).await?;

    let liked = match viewer {
        Some(user_id) => is_liked(pool, user_id, target).await?,
        None => false,
    };

    Ok(LikeStatus {
        liked,
        likes_count: count_likes(pool, target).await?,
    })
}

/// Likes on a live target, newest first.
pub async fn list(pool: &SqlitePool, target: LikeTarget) -> Result<Vec<LikeResponse>, AppError> {
    ensure_target(pool, target).await?;

    let likes = sqlx::query_as::<_, Like>(
        r#"
        SELECT l.id, l.user_id, u.username, l.target_type, l.target_id, l.created_at
        FROM likes l
        JOIN users u ON u.id = l.user_id
        WHERE l.target_type = ?1 AND l.target_id = ?2
        ORDER BY l.created_at DESC, l.id DESC
        "#,
    )
    .bind(target.kind().as_str())
    .bind(target.id())
    .fetch_all(pool)
    .await?;

    Ok(likes.into_iter().map(LikeResponse::from).collect())
}

/// Ids bound per stats query, well under SQLite's bound-parameter limit.
const STATS_CHUNK: usize = 500;

/// Like counts for `ids` plus which of them `viewer` liked, one query per
/// chunk of ids.
pub async fn stats_for(
    pool: &SqlitePool,
    kind: TargetKind,
    ids: &[i64],
    viewer: Option<i64>,
) -> Result<LikeStats, AppError> {
    let mut stats = LikeStats::default();

    for chunk in ids.chunks(STATS_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT target_id, COUNT(*), MAX(CASE WHEN user_id = ",
        );
        qb.push_bind(viewer);
        qb.push(" THEN 1 ELSE 0 END) FROM likes WHERE target_type = ");
        qb.push_bind(kind.as_str());
        qb.push(" AND target_id IN (");
        let mut separated = qb.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") GROUP BY target_id");

        let rows: Vec<(i64, i64, i64)> = qb.build_query_as().fetch_all(pool).await?;
        for (target_id, count, liked) in rows {
            stats.record(target_id, count, liked != 0);
        }
    }

    Ok(stats)
}
