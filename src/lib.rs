pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redis;
pub mod services;

use axum::{
    Json, Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    redis::RedisClient,
    services::{vote_ledger::VoteLedger, vote_store::PgVoteStore},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: Arc<RedisClient>,
    pub config: Arc<Config>,
    pub votes: VoteLedger<PgVoteStore>,
}

impl AppState {
    pub fn new(db: PgPool, redis: Arc<RedisClient>, config: Arc<Config>) -> Self {
        let votes = VoteLedger::new(PgVoteStore::new(db.clone()));
        Self {
            db,
            redis,
            config,
            votes,
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_app(state: AppState) -> Router {
    let origins = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // Public routes (no auth required, viewer resolved when a token is sent)
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/communities",
            get(handlers::communities::get_communities),
        )
        .route(
            "/api/communities/{name}",
            get(handlers::communities::get_community),
        )
        .route(
            "/api/communities/{name}/posts",
            get(handlers::communities::get_community_posts),
        )
        .route("/api/posts/{post_id}", get(handlers::posts::get_post))
        .route(
            "/api/posts/{post_id}/comments",
            get(handlers::comments::get_post_comments),
        )
        .route(
            "/api/posts/{post_id}/votes",
            get(handlers::votes::get_post_votes),
        )
        .route(
            "/api/comments/{comment_id}/votes",
            get(handlers::votes::get_comment_votes),
        );

    // Protected routes
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/users/me", get(handlers::auth::get_current_user))
        // Community routes
        .route(
            "/api/communities",
            post(handlers::communities::create_community),
        )
        .route(
            "/api/communities/{name}/join",
            post(handlers::communities::join_community),
        )
        .route(
            "/api/communities/{name}/leave",
            post(handlers::communities::leave_community),
        )
        // Post routes
        .route("/api/posts", post(handlers::posts::create_post))
        .route(
            "/api/posts/{post_id}",
            delete(handlers::posts::delete_post),
        )
        .route(
            "/api/posts/{post_id}/vote",
            post(handlers::votes::vote_post),
        )
        // Comment routes
        .route("/api/comments", post(handlers::comments::create_comment))
        .route(
            "/api/comments/{comment_id}",
            put(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
        .route(
            "/api/comments/{comment_id}/vote",
            post(handlers::votes::vote_comment),
        )
        // Vote routes
        .route("/api/votes", post(handlers::votes::cast_vote));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
