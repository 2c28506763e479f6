use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::{AppError, Result},
    models::{Community, CommunityView, CreateCommunityRequest, PostSort, PostView},
    services::{community_service, post_service},
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct GetPostsQuery {
    pub sort: Option<PostSort>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

async fn find_community(state: &AppState, name: &str) -> Result<Community> {
    community_service::get_community_by_name(&state.db, name)
        .await?
        .ok_or_else(|| AppError::NotFound("Community not found".to_string()))
}

pub async fn get_communities(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
    auth_user: OptionalAuthUser,
) -> Result<Json<Vec<CommunityView>>> {
    let limit = params.limit.unwrap_or(25).min(100);
    let offset = params.offset.unwrap_or(0);

    let communities =
        community_service::list_communities(&state.db, auth_user.user_id(), limit, offset).await?;

    Ok(Json(communities))
}

pub async fn create_community(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCommunityRequest>,
) -> Result<(StatusCode, Json<Community>)> {
    payload.validate()?;

    if community_service::get_community_by_name(&state.db, &payload.name)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Community already exists".to_string()));
    }

    let community =
        community_service::create_community(&state.db, auth_user.user_id, &payload).await?;

    tracing::info!(community = %community.name, creator = %auth_user.user_id, "community created");

    Ok((StatusCode::CREATED, Json(community)))
}

pub async fn get_community(
    State(state): State<AppState>,
    Path(name): Path<String>,
    auth_user: OptionalAuthUser,
) -> Result<Json<CommunityView>> {
    let community = community_service::get_community_view(&state.db, &name, auth_user.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Community not found".to_string()))?;

    Ok(Json(community))
}

pub async fn join_community(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(name): Path<String>,
) -> Result<Json<Value>> {
    let community = find_community(&state, &name).await?;

    if !community_service::subscribe(&state.db, auth_user.user_id, community.id).await? {
        return Err(AppError::Conflict(
            "Already subscribed to this community".to_string(),
        ));
    }

    Ok(Json(json!({ "message": "Subscribed", "community": community.name })))
}

pub async fn leave_community(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(name): Path<String>,
) -> Result<Json<Value>> {
    let community = find_community(&state, &name).await?;

    if community.created_by == Some(auth_user.user_id) {
        return Err(AppError::BadRequest(
            "The creator cannot leave their own community".to_string(),
        ));
    }

    if !community_service::unsubscribe(&state.db, auth_user.user_id, community.id).await? {
        return Err(AppError::BadRequest(
            "Not subscribed to this community".to_string(),
        ));
    }

    Ok(Json(json!({ "message": "Unsubscribed", "community": community.name })))
}

pub async fn get_community_posts(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<GetPostsQuery>,
    auth_user: OptionalAuthUser,
) -> Result<Json<Vec<PostView>>> {
    let community = find_community(&state, &name).await?;

    let sort = params.sort.unwrap_or_default();
    let limit = params.limit.unwrap_or(25).min(100);
    let offset = params.offset.unwrap_or(0);

    let posts = post_service::get_community_posts(
        &state.db,
        community.id,
        auth_user.user_id(),
        sort,
        limit,
        offset,
    )
    .await?;

    Ok(Json(posts))
}
