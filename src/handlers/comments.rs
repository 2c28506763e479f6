use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::{AppError, Result},
    models::{
        Comment, CommentSort, CommentStatus, CreateCommentRequest, PostStatus,
        UpdateCommentRequest,
    },
    services::{comment_service, post_service},
};

#[derive(Debug, Deserialize)]
pub struct GetCommentsQuery {
    pub sort: Option<CommentSort>,
}

async fn find_own_comment(state: &AppState, comment_id: Uuid, user_id: Uuid) -> Result<Comment> {
    let comment = comment_service::get_comment_by_id_raw(&state.db, comment_id)
        .await?
        .filter(|c| c.status == CommentStatus::Active)
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != user_id {
        return Err(AppError::Authorization(
            "You can only change your own comments".to_string(),
        ));
    }

    Ok(comment)
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    payload.validate()?;

    let rate_limit_key = format!("comment_create:user:{}", auth_user.user_id);
    if !state
        .redis
        .check_rate_limit(&rate_limit_key, state.config.comment_rate_limit, 60)
        .await?
    {
        return Err(AppError::RateLimit);
    }

    let post = post_service::get_post_by_id_raw(&state.db, payload.post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if post.status != PostStatus::Active {
        return Err(AppError::BadRequest(
            "Cannot comment on inactive post".to_string(),
        ));
    }

    // Replies must stay within the same post
    if let Some(parent_id) = payload.parent_comment_id {
        let parent_comment = comment_service::get_comment_by_id_raw(&state.db, parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;

        if parent_comment.post_id != payload.post_id {
            return Err(AppError::BadRequest(
                "Parent comment is not on the same post".to_string(),
            ));
        }

        if parent_comment.status != CommentStatus::Active {
            return Err(AppError::BadRequest(
                "Cannot reply to inactive comment".to_string(),
            ));
        }
    }

    let comment = comment_service::create_comment(&state.db, auth_user.user_id, &payload).await?;

    tracing::debug!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(params): Query<GetCommentsQuery>,
    auth_user: OptionalAuthUser,
) -> Result<Json<Value>> {
    post_service::get_post_by_id_raw(&state.db, post_id)
        .await?
        .filter(|post| post.status == PostStatus::Active)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let sort = params.sort.unwrap_or_default();

    let comments =
        comment_service::get_post_comment_tree(&state.db, post_id, auth_user.user_id(), sort)
            .await?;

    Ok(Json(json!({
        "comments": comments,
        "post_id": post_id
    })))
}

pub async fn update_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>> {
    payload.validate()?;

    find_own_comment(&state, comment_id, auth_user.user_id).await?;

    let comment = comment_service::update_comment(&state.db, comment_id, &payload).await?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<Value>> {
    find_own_comment(&state, comment_id, auth_user.user_id).await?;

    comment_service::delete_comment(&state.db, comment_id).await?;

    Ok(Json(json!({ "message": "Comment deleted" })))
}
