// src/handlers/mod.rs

pub mod comment;
pub mod community;
pub mod interaction;
