use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::{AppError, Result},
    models::{CreatePostRequest, Post, PostStatus, PostView},
    services::{community_service, post_service},
};

pub async fn create_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    payload.validate()?;

    let community = community_service::get_community_by_id(&state.db, payload.community_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Community not found".to_string()))?;

    // Only subscribers may post
    let subscribed = community_service::get_community_view(
        &state.db,
        &community.name,
        Some(auth_user.user_id),
    )
    .await?
    .is_some_and(|view| view.is_subscribed);
    if !subscribed {
        return Err(AppError::Authorization(
            "Subscribe to the community to post".to_string(),
        ));
    }

    let post = post_service::create_post(&state.db, auth_user.user_id, &payload).await?;

    tracing::info!(post_id = %post.id, community = %community.name, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    auth_user: OptionalAuthUser,
) -> Result<Json<PostView>> {
    let post = post_service::get_post_view(&state.db, post_id, auth_user.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let post = post_service::get_post_by_id_raw(&state.db, post_id)
        .await?
        .filter(|post| post.status != PostStatus::Deleted)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if post.author_id != auth_user.user_id {
        return Err(AppError::Authorization(
            "You can only delete your own posts".to_string(),
        ));
    }

    post_service::delete_post(&state.db, post_id).await?;

    Ok(Json(json!({ "message": "Post deleted" })))
}
