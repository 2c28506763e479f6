use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Community, CommunityView, CreateCommunityRequest},
};

pub async fn get_community_by_name(db: &PgPool, name: &str) -> Result<Option<Community>> {
    let community = sqlx::query_as::<_, Community>("SELECT * FROM communities WHERE name = $1")
        .bind(name)
        .fetch_optional(db)
        .await?;

    Ok(community)
}

pub async fn get_community_by_id(db: &PgPool, id: Uuid) -> Result<Option<Community>> {
    let community = sqlx::query_as::<_, Community>("SELECT * FROM communities WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(community)
}

const COMMUNITY_VIEW_SELECT: &str = r#"
    SELECT c.id, c.name, c.description, c.created_by, c.created_at,
           (SELECT COUNT(*) FROM subscriptions s WHERE s.community_id = c.id) AS subscriber_count,
           EXISTS(
               SELECT 1 FROM subscriptions s
               WHERE s.community_id = c.id AND s.user_id = $1
           ) AS is_subscribed
    FROM communities c
"#;

pub async fn get_community_view(
    db: &PgPool,
    name: &str,
    viewer_id: Option<Uuid>,
) -> Result<Option<CommunityView>> {
    let query = format!("{} WHERE c.name = $2", COMMUNITY_VIEW_SELECT);

    let community = sqlx::query_as::<_, CommunityView>(&query)
        .bind(viewer_id)
        .bind(name)
        .fetch_optional(db)
        .await?;

    Ok(community)
}

pub async fn list_communities(
    db: &PgPool,
    viewer_id: Option<Uuid>,
    limit: u32,
    offset: u32,
) -> Result<Vec<CommunityView>> {
    let query = format!(
        "{} ORDER BY subscriber_count DESC, c.created_at ASC LIMIT $2 OFFSET $3",
        COMMUNITY_VIEW_SELECT
    );

    let communities = sqlx::query_as::<_, CommunityView>(&query)
        .bind(viewer_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(db)
        .await?;

    Ok(communities)
}

/// Create a community and subscribe its creator, in one transaction.
pub async fn create_community(
    db: &PgPool,
    creator_id: Uuid,
    request: &CreateCommunityRequest,
) -> Result<Community> {
    let mut tx = db.begin().await?;

    let community = sqlx::query_as::<_, Community>(
        r#"
        INSERT INTO communities (id, name, description, created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.name)
    .bind(&request.description)
    .bind(creator_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO subscriptions (user_id, community_id) VALUES ($1, $2)")
        .bind(creator_id)
        .bind(community.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(community)
}

/// Returns `false` when the user was already subscribed.
pub async fn subscribe(db: &PgPool, user_id: Uuid, community_id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO subscriptions (user_id, community_id, created_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (user_id, community_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(community_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns `false` when the user was not subscribed.
pub async fn unsubscribe(db: &PgPool, user_id: Uuid, community_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND community_id = $2")
        .bind(user_id)
        .bind(community_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}
