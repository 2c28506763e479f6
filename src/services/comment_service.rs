use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        Comment, CommentNode, CommentSort, CommentView, CreateCommentRequest, UpdateCommentRequest,
    },
    services::comment_tree,
};

pub async fn get_comment_by_id_raw(db: &PgPool, comment_id: Uuid) -> Result<Option<Comment>> {
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(db)
        .await?;

    Ok(comment)
}

pub async fn create_comment(
    db: &PgPool,
    author_id: Uuid,
    request: &CreateCommentRequest,
) -> Result<Comment> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (
            id, content, post_id, author_id, parent_comment_id,
            status, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, 'active', NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.content)
    .bind(request.post_id)
    .bind(author_id)
    .bind(request.parent_comment_id)
    .fetch_one(db)
    .await?;

    Ok(comment)
}

pub async fn update_comment(
    db: &PgPool,
    comment_id: Uuid,
    request: &UpdateCommentRequest,
) -> Result<Comment> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        UPDATE comments
        SET content = $1, is_edited = true, updated_at = NOW()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(&request.content)
    .bind(comment_id)
    .fetch_one(db)
    .await?;

    Ok(comment)
}

pub async fn delete_comment(db: &PgPool, comment_id: Uuid) -> Result<()> {
    // Deleted comments are left out of thread fetches, which also hides
    // their replies.
    sqlx::query(
        r#"
        UPDATE comments
        SET status = 'deleted', content = '[deleted]', updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .execute(db)
    .await?;

    Ok(())
}

/// Flat, sorted list of the active comments on a post.
pub async fn get_post_comments(
    db: &PgPool,
    post_id: Uuid,
    viewer_id: Option<Uuid>,
    sort: CommentSort,
) -> Result<Vec<CommentView>> {
    let query = format!(
        r#"
        SELECT
            c.id, c.content, c.post_id, c.parent_comment_id, c.author_id,
            u.username AS author_username, c.is_edited,
            (SELECT COALESCE(SUM(cv.vote_type), 0)::BIGINT FROM comment_votes cv WHERE cv.comment_id = c.id) AS score,
            COALESCE(own.vote_type, 0::SMALLINT) AS user_vote,
            c.created_at, c.updated_at
        FROM comments c
        JOIN users u ON c.author_id = u.id
        LEFT JOIN comment_votes own ON own.comment_id = c.id AND own.user_id = $1
        WHERE c.post_id = $2 AND c.status = 'active'
        ORDER BY {}
        "#,
        sort.order_clause()
    );

    let comments = sqlx::query_as::<_, CommentView>(&query)
        .bind(viewer_id)
        .bind(post_id)
        .fetch_all(db)
        .await?;

    Ok(comments)
}

pub async fn get_post_comment_tree(
    db: &PgPool,
    post_id: Uuid,
    viewer_id: Option<Uuid>,
    sort: CommentSort,
) -> Result<Vec<CommentNode<CommentView>>> {
    let comments = get_post_comments(db, post_id, viewer_id, sort).await?;
    let forest = comment_tree::build_tree(&comments);

    let shown = comment_tree::count_nodes(&forest);
    if shown < comments.len() {
        tracing::debug!(
            %post_id,
            fetched = comments.len(),
            shown,
            "dropped comments whose parent is not in the thread"
        );
    }

    Ok(forest)
}
