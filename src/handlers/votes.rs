use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::{AppError, Result},
    models::{
        CastVoteRequest, CommentStatus, PostStatus, VoteRequest, VoteResponse, VoteSummary,
        VoteTarget, VoteValue,
    },
    services::{comment_service, post_service},
};

async fn ensure_target_exists(state: &AppState, target: VoteTarget) -> Result<()> {
    let exists = match target {
        VoteTarget::Post(post_id) => post_service::get_post_by_id_raw(&state.db, post_id)
            .await?
            .is_some_and(|post| post.status == PostStatus::Active),
        VoteTarget::Comment(comment_id) => {
            comment_service::get_comment_by_id_raw(&state.db, comment_id)
                .await?
                .is_some_and(|comment| comment.status == CommentStatus::Active)
        }
    };

    if !exists {
        return Err(AppError::NotFound(format!("{} not found", target.kind())));
    }
    Ok(())
}

async fn toggle_vote(
    state: &AppState,
    auth_user: &AuthUser,
    target: VoteTarget,
    raw_value: i16,
) -> Result<Json<VoteResponse>> {
    let value = VoteValue::try_from(raw_value)?;

    let rate_limit_key = format!("vote:{}", auth_user.user_id);
    if !state
        .redis
        .check_rate_limit(&rate_limit_key, state.config.vote_rate_limit, 3600)
        .await?
    {
        return Err(AppError::RateLimit);
    }

    ensure_target_exists(state, target).await?;

    let outcome = state.votes.toggle(auth_user.user_id, target, value).await?;

    tracing::debug!(
        user_id = %auth_user.user_id,
        kind = target.kind(),
        target_id = %target.id(),
        action = ?outcome.action,
        score = ?outcome.score,
        "vote toggled"
    );

    Ok(Json(outcome.into()))
}

pub async fn vote_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    toggle_vote(&state, &auth_user, VoteTarget::Post(post_id), payload.value).await
}

pub async fn vote_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    toggle_vote(
        &state,
        &auth_user,
        VoteTarget::Comment(comment_id),
        payload.value,
    )
    .await
}

pub async fn cast_vote(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CastVoteRequest>,
) -> Result<Json<VoteResponse>> {
    let target = VoteTarget::try_from(payload.target)?;
    toggle_vote(&state, &auth_user, target, payload.value).await
}

pub async fn get_post_votes(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    auth_user: OptionalAuthUser,
) -> Result<Json<VoteSummary>> {
    let target = VoteTarget::Post(post_id);
    ensure_target_exists(&state, target).await?;

    Ok(Json(state.votes.summary(auth_user.user_id(), target).await?))
}

pub async fn get_comment_votes(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    auth_user: OptionalAuthUser,
) -> Result<Json<VoteSummary>> {
    let target = VoteTarget::Comment(comment_id);
    ensure_target_exists(&state, target).await?;

    Ok(Json(state.votes.summary(auth_user.user_id(), target).await?))
}
