// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    handlers::{comment, community, interaction},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (posts, comments, likes).
/// * Applies global middleware (Auth, Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let post_routes = Router::new()
        .route("/", get(community::list_posts).post(community::create_post))
        .route(
            "/{id}",
            get(community::get_post)
                .patch(community::update_post)
                .delete(community::delete_post),
        )
        .route("/{id}/restore", post(community::restore_post))
        .route("/{id}/purge", delete(community::purge_post))
        .route(
            "/{id}/comments",
            get(comment::list_comments).post(comment::create_comment),
        )
        .route(
            "/{id}/likes",
            post(interaction::like_post).delete(interaction::unlike_post),
        )
        .route("/{id}/like-status", get(interaction::post_like_status));

    let comment_routes = Router::new()
        .route(
            "/{id}",
            get(comment::get_comment)
                .patch(comment::update_comment)
                .delete(comment::delete_comment),
        )
        .route("/{id}/restore", post(comment::restore_comment))
        .route("/{id}/replies", get(comment::list_replies))
        .route(
            "/{id}/likes",
            post(interaction::like_comment).delete(interaction::unlike_comment),
        )
        .route("/{id}/like-status", get(interaction::comment_like_status));

    let like_routes = Router::new()
        .route(
            "/{target_type}/{id}",
            get(interaction::list_likes)
                .post(interaction::create_like)
                .delete(interaction::delete_like),
        )
        .route("/{target_type}/{id}/status", get(interaction::like_status));

    Router::new()
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/api/posts", post_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/likes", like_routes)
        .fallback(|| async { AppError::NotFound("Not found".to_string()) })
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
