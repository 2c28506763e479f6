use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "post_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Text,
    Link,
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Active,
    Removed,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub post_type: PostType,
    pub status: PostStatus,
    pub author_id: Uuid,
    pub community_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub post_type: PostType,
    pub author_id: Uuid,
    pub author_username: String,
    pub community_id: Uuid,
    pub community_name: String,
    pub score: i64,
    pub comment_count: i64,
    pub user_vote: i16, // 0 when the viewer has no vote
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Create post request
#[derive(Debug, Validate, Deserialize)]
#[validate(schema(function = "validate_post_body"))]
pub struct CreatePostRequest {
    #[validate(length(min = 3, max = 300))]
    pub title: String,
    #[validate(length(max = 40000))]
    pub content: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    pub post_type: PostType,
    pub community_id: Uuid,
}

// Text posts carry content, link and image posts carry a url.
fn validate_post_body(request: &CreatePostRequest) -> Result<(), ValidationError> {
    let ok = match request.post_type {
        PostType::Text => request.content.as_deref().is_some_and(|c| !c.trim().is_empty()),
        PostType::Link | PostType::Image => request.url.is_some(),
    };

    if ok {
        Ok(())
    } else {
        let mut error = ValidationError::new("post_body");
        error.message = Some("Text posts need content, link and image posts need a url".into());
        Err(error)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    #[default]
    New,
    Top,
}

impl PostSort {
    pub(crate) fn order_clause(self) -> &'static str {
        match self {
            PostSort::New => "p.created_at DESC",
            PostSort::Top => "score DESC, p.created_at DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(post_type: PostType, content: Option<&str>, url: Option<&str>) -> CreatePostRequest {
        CreatePostRequest {
            title: "A reasonable title".to_string(),
            content: content.map(str::to_string),
            url: url.map(str::to_string),
            post_type,
            community_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn text_post_requires_content() {
        assert!(request(PostType::Text, Some("hello"), None).validate().is_ok());
        assert!(request(PostType::Text, Some("   "), None).validate().is_err());
        assert!(request(PostType::Text, None, None).validate().is_err());
    }

    #[test]
    fn link_and_image_posts_require_url() {
        assert!(
            request(PostType::Link, None, Some("https://example.com"))
                .validate()
                .is_ok()
        );
        assert!(request(PostType::Image, None, None).validate().is_err());
        assert!(request(PostType::Link, None, Some("not a url")).validate().is_err());
    }
}
