use std::{
    collections::{HashMap, HashSet},
    fmt,
    str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::Author;
use crate::error::AppError;

/// Kinds of entity a like may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    /// Value stored in `likes.target_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Post => "post",
            TargetKind::Comment => "comment",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" | "posts" => Ok(TargetKind::Post),
            "comment" | "comments" => Ok(TargetKind::Comment),
            other => Err(AppError::field(
                "target_type",
                format!("unsupported like target '{other}', expected 'post' or 'comment'"),
            )),
        }
    }
}

/// The entity a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post(i64),
    Comment(i64),
}

impl LikeTarget {
    pub fn new(kind: TargetKind, id: i64) -> Self {
        match kind {
            TargetKind::Post => LikeTarget::Post(id),
            TargetKind::Comment => LikeTarget::Comment(id),
        }
    }

    pub fn kind(self) -> TargetKind {
        match self {
            LikeTarget::Post(_) => TargetKind::Post,
            LikeTarget::Comment(_) => TargetKind::Comment,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            LikeTarget::Post(id) | LikeTarget::Comment(id) => id,
        }
    }
}

/// A row of the 'likes' table joined with the liking user's display name.
#[derive(Debug, Clone, FromRow)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub target_type: String,
    pub target_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub id: i64,
    pub user: Author,
    pub target_type: String,
    pub target_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Like> for LikeResponse {
    fn from(like: Like) -> Self {
        LikeResponse {
            id: like.id,
            user: Author {
                id: like.user_id,
                username: like.username,
            },
            target_type: like.target_type,
            target_id: like.target_id,
            created_at: like.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub likes_count: i64,
}

/// Like counts and the viewer's own likes for a batch of targets of one kind.
#[derive(Debug, Clone, Default)]
pub struct LikeStats {
    counts: HashMap<i64, i64>,
    liked: HashSet<i64>,
}

impl LikeStats {
    pub fn record(&mut self, target_id: i64, count: i64, liked_by_viewer: bool) {
        self.counts.insert(target_id, count);
        if liked_by_viewer {
            self.liked.insert(target_id);
        }
    }

    pub fn count(&self, target_id: i64) -> i64 {
        self.counts.get(&target_id).copied().unwrap_or(0)
    }

    pub fn is_liked(&self, target_id: i64) -> bool {
        self.liked.contains(&target_id)
    }
}
