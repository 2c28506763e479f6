use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::Result, models::User};

pub async fn get_user_by_id(db: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;

    Ok(user)
}

/// Usernames cannot contain `@`, so at most one row matches.
pub async fn get_user_by_login(db: &PgPool, username_or_email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 OR email = $1")
        .bind(username_or_email)
        .fetch_optional(db)
        .await?;

    Ok(user)
}

pub async fn username_or_email_taken(
    db: &PgPool,
    username: &str,
    email: Option<&str>,
) -> Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM users
            WHERE username = $1
               OR email = $1
               OR ($2::TEXT IS NOT NULL AND (email = $2 OR username = $2))
        )
        "#,
    )
    .bind(username)
    .bind(email)
    .fetch_one(db)
    .await?;

    Ok(taken)
}

pub async fn create_user(
    db: &PgPool,
    username: &str,
    email: Option<&str>,
    password_hash: &str,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(db)
    .await?;

    Ok(user)
}
