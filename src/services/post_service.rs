use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{CreatePostRequest, Post, PostSort, PostView},
};

pub async fn get_post_by_id_raw(db: &PgPool, post_id: Uuid) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(db)
        .await?;

    Ok(post)
}

// $1 is always the viewer id (NULL for anonymous readers).
const POST_VIEW_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.content, p.url, p.post_type, p.author_id,
        u.username AS author_username,
        p.community_id, c.name AS community_name,
        (SELECT COALESCE(SUM(pv.vote_type), 0)::BIGINT FROM post_votes pv WHERE pv.post_id = p.id) AS score,
        (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id AND cm.status = 'active') AS comment_count,
        COALESCE(own.vote_type, 0::SMALLINT) AS user_vote,
        p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON p.author_id = u.id
    JOIN communities c ON p.community_id = c.id
    LEFT JOIN post_votes own ON own.post_id = p.id AND own.user_id = $1
"#;

pub async fn get_post_view(
    db: &PgPool,
    post_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Option<PostView>> {
    let query = format!("{} WHERE p.id = $2 AND p.status = 'active'", POST_VIEW_SELECT);

    let post = sqlx::query_as::<_, PostView>(&query)
        .bind(viewer_id)
        .bind(post_id)
        .fetch_optional(db)
        .await?;

    Ok(post)
}

pub async fn get_community_posts(
    db: &PgPool,
    community_id: Uuid,
    viewer_id: Option<Uuid>,
    sort: PostSort,
    limit: u32,
    offset: u32,
) -> Result<Vec<PostView>> {
    let query = format!(
        "{} WHERE p.community_id = $2 AND p.status = 'active' ORDER BY {} LIMIT $3 OFFSET $4",
        POST_VIEW_SELECT,
        sort.order_clause()
    );

    let posts = sqlx::query_as::<_, PostView>(&query)
        .bind(viewer_id)
        .bind(community_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(db)
        .await?;

    Ok(posts)
}

pub async fn create_post(db: &PgPool, author_id: Uuid, request: &CreatePostRequest) -> Result<Post> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (
            id, title, content, url, post_type, status,
            author_id, community_id, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.title)
    .bind(&request.content)
    .bind(&request.url)
    .bind(request.post_type)
    .bind(author_id)
    .bind(request.community_id)
    .fetch_one(db)
    .await?;

    Ok(post)
}

pub async fn delete_post(db: &PgPool, post_id: Uuid) -> Result<()> {
    // Soft delete keeps comment and vote rows intact
    sqlx::query("UPDATE posts SET status = 'deleted', updated_at = NOW() WHERE id = $1")
        .bind(post_id)
        .execute(db)
        .await?;

    Ok(())
}
