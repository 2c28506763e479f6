use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommunityView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub subscriber_count: i64,
    pub is_subscribed: bool,
    pub created_at: DateTime<Utc>,
}

// Create community request
#[derive(Debug, Validate, Deserialize)]
pub struct CreateCommunityRequest {
    #[validate(length(min = 3, max = 21), custom(function = "validate_community_name"))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

fn validate_community_name(name: &str) -> Result<(), ValidationError> {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        let mut error = ValidationError::new("community_name");
        error.message = Some("Only letters, numbers and underscores are allowed".into());
        Err(error)
    }
}
