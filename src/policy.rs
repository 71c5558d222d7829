// src/policy.rs

//! Business rules shared by the post, comment and like services.

use crate::{
    error::AppError,
    models::{comment::Comment, post::Post, user::ActingUser},
};

/// Anything with a single owning author.
pub trait Authored {
    fn author_id(&self) -> i64;
}

impl Authored for Post {
    fn author_id(&self) -> i64 {
        self.user_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> i64 {
        self.user_id
    }
}

/// Allows a mutation when the actor wrote the entity or is staff.
///
/// Denial is a permission error, never a not-found, so callers must only ask
/// after the entity has been resolved.
pub fn authorize_mutation<E: Authored>(entity: &E, actor: &ActingUser) -> Result<(), AppError> {
    if entity.author_id() == actor.id || actor.is_staff {
        return Ok(());
    }
    tracing::debug!(
        actor = actor.id,
        author = entity.author_id(),
        "mutation rejected by ownership gate"
    );
    Err(AppError::Permission(
        "You do not have permission to modify this content".to_string(),
    ))
}

/// Checks that `parent` may receive a reply created under `post_id`.
///
/// Replies only attach to live top-level comments of the same post, which
/// caps threads at two levels.
pub fn check_reply_parent(parent: &Comment, post_id: i64) -> Result<(), AppError> {
    if parent.is_deleted {
        return Err(AppError::field("parent", "cannot reply to a deleted comment"));
    }
    if parent.is_reply() {
        return Err(AppError::field("parent", "cannot reply to a reply"));
    }
    if parent.post_id != post_id {
        return Err(AppError::field(
            "parent",
            "parent comment belongs to a different post",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64, is_staff: bool) -> ActingUser {
        ActingUser {
            id,
            username: format!("user{id}"),
            is_staff,
        }
    }

    fn comment(id: i64, post_id: i64, author: i64, parent_id: Option<i64>) -> Comment {
        let now = Utc::now();
        Comment {
            id,
            post_id,
            user_id: author,
            username: format!("user{author}"),
            parent_id,
            content: "hello".to_string(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn author_and_staff_may_mutate() {
        let c = comment(1, 1, 10, None);
        assert!(authorize_mutation(&c, &user(10, false)).is_ok());
        assert!(authorize_mutation(&c, &user(99, true)).is_ok());
    }

    #[test]
    fn strangers_get_permission_error() {
        let c = comment(1, 1, 10, None);
        assert!(matches!(
            authorize_mutation(&c, &user(11, false)),
            Err(AppError::Permission(_))
        ));
    }

    #[test]
    fn top_level_parent_accepts_reply() {
        assert!(check_reply_parent(&comment(1, 5, 10, None), 5).is_ok());
    }

    #[test]
    fn reply_to_reply_is_rejected() {
        let err = check_reply_parent(&comment(2, 5, 10, Some(1)), 5).unwrap_err();
        assert_eq!(err.to_string(), "cannot reply to a reply");
    }

    #[test]
    fn parent_from_other_post_is_rejected() {
        let err = check_reply_parent(&comment(1, 6, 10, None), 5).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn deleted_parent_is_rejected() {
        let mut parent = comment(1, 5, 10, None);
        parent.is_deleted = true;
        let err = check_reply_parent(&parent, 5).unwrap_err();
        assert_eq!(err.to_string(), "cannot reply to a deleted comment");
    }
}
