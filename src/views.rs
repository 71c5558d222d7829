// src/views.rs

//! Pure builders from rows plus precomputed like statistics to response DTOs.
//! Nothing in here touches the database.

use std::collections::HashMap;

use crate::models::{
    comment::{Comment, CommentResponse},
    like::LikeStats,
    post::{Post, PostResponse},
    user::Author,
};

pub fn post_view(post: Post, likes: &LikeStats) -> PostResponse {
    PostResponse {
        likes_count: likes.count(post.id),
        is_liked: likes.is_liked(post.id),
        id: post.id,
        author: Author {
            id: post.user_id,
            username: post.username,
        },
        title: post.title,
        content: post.content,
        image_url: post.image_url,
        views: post.views,
        created_at: post.created_at,
        updated_at: post.updated_at,
        comments_count: post.comments_count,
    }
}

/// Builds a comment view with the given (already filtered and ordered) replies.
pub fn comment_view(
    comment: Comment,
    replies: Vec<CommentResponse>,
    likes: &LikeStats,
) -> CommentResponse {
    CommentResponse {
        likes_count: likes.count(comment.id),
        is_liked: likes.is_liked(comment.id),
        replies_count: replies.len() as i64,
        id: comment.id,
        post: comment.post_id,
        author: Author {
            id: comment.user_id,
            username: comment.username,
        },
        content: comment.content,
        parent: comment.parent_id,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        replies,
    }
}

/// Attaches each reply to its top-level comment.
///
/// Both inputs keep the order they were fetched in, so top-level comments
/// come out newest first and replies oldest first. Deleted rows and replies
/// whose parent is not among `top_level` are dropped.
pub fn assemble_thread(
    top_level: Vec<Comment>,
    replies: Vec<Comment>,
    likes: &LikeStats,
) -> Vec<CommentResponse> {
    let mut by_parent: HashMap<i64, Vec<CommentResponse>> = HashMap::new();
    for reply in replies.into_iter().filter(|r| !r.is_deleted) {
        if let Some(parent_id) = reply.parent_id {
            by_parent
                .entry(parent_id)
                .or_default()
                .push(comment_view(reply, Vec::new(), likes));
        }
    }

    top_level
        .into_iter()
        .filter(|c| !c.is_deleted && !c.is_reply())
        .map(|c| {
            let replies = by_parent.remove(&c.id).unwrap_or_default();
            comment_view(c, replies, likes)
        })
        .collect()
}
