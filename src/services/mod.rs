// src/services/mod.rs

//! Operations behind the HTTP handlers. Every mutating call takes the acting
//! user explicitly.

pub mod comments;
pub mod likes;
pub mod posts;
pub mod users;
