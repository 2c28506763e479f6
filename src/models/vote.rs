use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// The thing a vote applies to. A vote always points at exactly one post or
/// exactly one comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum VoteTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl VoteTarget {
    pub fn id(&self) -> Uuid {
        match self {
            VoteTarget::Post(id) | VoteTarget::Comment(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            VoteTarget::Post(_) => "post",
            VoteTarget::Comment(_) => "comment",
        }
    }

    pub(crate) fn table(&self) -> &'static str {
        match self {
            VoteTarget::Post(_) => "post_votes",
            VoteTarget::Comment(_) => "comment_votes",
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            VoteTarget::Post(_) => "post_id",
            VoteTarget::Comment(_) => "comment_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i16(self) -> i16 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }
}

impl From<VoteValue> for i16 {
    fn from(value: VoteValue) -> Self {
        value.as_i16()
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = AppError;

    fn try_from(raw: i16) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(VoteValue::Up),
            -1 => Ok(VoteValue::Down),
            other => Err(AppError::Validation(format!(
                "Vote value must be 1 or -1, got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: VoteTarget,
    pub value: VoteValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Created,
    Updated,
    Deleted,
}

/// One step of the per-(caster, target) vote state machine.
///
/// States are `None` (no row), `Some(Up)` and `Some(Down)`. Repeating the
/// current direction clears the vote, the opposite direction flips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub action: VoteAction,
    pub next: Option<VoteValue>,
    /// Change to the target's aggregate score caused by this step.
    pub score_delta: i64,
}

impl VoteTransition {
    pub fn resolve(current: Option<VoteValue>, requested: VoteValue) -> Self {
        let requested_value = i64::from(requested.as_i16());
        match current {
            None => Self {
                action: VoteAction::Created,
                next: Some(requested),
                score_delta: requested_value,
            },
            Some(existing) if existing == requested => Self {
                action: VoteAction::Deleted,
                next: None,
                score_delta: -requested_value,
            },
            Some(_) => Self {
                action: VoteAction::Updated,
                next: Some(requested),
                score_delta: 2 * requested_value,
            },
        }
    }
}

/// Wire form of a vote target: two optional ids of which exactly one must be
/// present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteTargetRef {
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
}

impl TryFrom<VoteTargetRef> for VoteTarget {
    type Error = AppError;

    fn try_from(target: VoteTargetRef) -> Result<Self, Self::Error> {
        match (target.post_id, target.comment_id) {
            (Some(post_id), None) => Ok(VoteTarget::Post(post_id)),
            (None, Some(comment_id)) => Ok(VoteTarget::Comment(comment_id)),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "Provide either post_id or comment_id, not both".to_string(),
            )),
            (None, None) => Err(AppError::Validation(
                "Either post_id or comment_id is required".to_string(),
            )),
        }
    }
}

// Vote request for /posts/{id}/vote and /comments/{id}/vote
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: i16, // 1 for upvote, -1 for downvote
}

// Vote request for /votes, target given in the body
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    #[serde(flatten)]
    pub target: VoteTargetRef,
    pub value: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub action: VoteAction,
    pub user_vote: Option<VoteValue>,
    /// `None` when the write succeeded but the score could not be read back.
    pub score: Option<i64>,
}

// Vote response
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub action: VoteAction,
    pub user_vote: i16, // 0 when the caster has no vote
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
}

impl From<ToggleOutcome> for VoteResponse {
    fn from(outcome: ToggleOutcome) -> Self {
        Self {
            action: outcome.action,
            user_vote: outcome.user_vote.map(VoteValue::as_i16).unwrap_or(0),
            score: outcome.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteSummary {
    pub score: i64,
    pub user_vote: i16, // 0 when the viewer has no vote
}
