// src/models/mod.rs

pub mod comment;
pub mod like;
pub mod post;
pub mod user;
