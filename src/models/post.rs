use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

use super::user::Author;

pub const TITLE_MAX_CHARS: usize = 200;
pub const TITLE_LENGTH_MESSAGE: &str = "Title length must be between 1 and 200 chars";
pub const CONTENT_MAX_CHARS: usize = 10000;
pub const CONTENT_LENGTH_MESSAGE: &str = "Content length must be between 1 and 10000 chars";

/// A row of the 'posts' table joined with its author's display name.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,

    /// Non-deleted comments, computed by the query.
    pub comments_count: i64,
}

/// Wire representation of a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub author: Author,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
    /// Whether the requesting user has liked this post. Always false for anonymous callers.
    pub is_liked: bool,
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content length must be between 1 and 10000 chars"
    ))]
    pub content: String,

    /// Public URL handed back by the image store.
    #[validate(length(max = 500), custom(function = validate_image_url))]
    pub image_url: Option<String>,
}

/// DTO for a partial post update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: Option<String>,

    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content length must be between 1 and 10000 chars"
    ))]
    pub content: Option<String>,

    #[validate(length(max = 500), custom(function = validate_image_url))]
    pub image_url: Option<String>,
}

/// Query parameters for listing posts.
#[derive(Debug, Default, Deserialize)]
pub struct PostListParams {
    /// Id of the last post of the previous page.
    pub cursor: Option<i64>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}

/// Image references must be absolute http(s) URLs.
fn validate_image_url(url: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_url")
            .with_message("image_url must be an http(s) URL".into())),
    }
}
