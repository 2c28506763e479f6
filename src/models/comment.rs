use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "comment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Active,
    Removed,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub status: CommentStatus,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment row as shown in a thread: joined with its author and vote tally.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub author_id: Uuid,
    pub author_username: String,
    pub is_edited: bool,
    pub score: i64,
    pub user_vote: i16, // 0 when the viewer has no vote
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Anything that can be placed in a reply tree.
pub trait Threaded {
    fn id(&self) -> Uuid;
    fn parent_id(&self) -> Option<Uuid>;
}

impl Threaded for Comment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_comment_id
    }
}

impl Threaded for CommentView {
    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_comment_id
    }
}

/// A comment together with its direct replies, in fetch order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommentNode<T> {
    #[serde(flatten)]
    pub comment: T,
    pub replies: Vec<CommentNode<T>>,
}

// Create comment request
#[derive(Debug, Validate, Deserialize)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
}

// Update comment request
#[derive(Debug, Validate, Deserialize)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

// Comment sorting options
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
    #[default]
    Top,
    New,
    Old,
}

impl CommentSort {
    pub(crate) fn order_clause(self) -> &'static str {
        match self {
            CommentSort::Top => "score DESC, c.created_at ASC",
            CommentSort::New => "c.created_at DESC",
            CommentSort::Old => "c.created_at ASC",
        }
    }
}
