use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{Vote, VoteTarget, VoteValue},
};

/// Persistence operations the vote ledger needs.
///
/// Implementations must key lookups on `(user_id, target)` and aggregate
/// scores exactly. Each method is a single statement; nothing spans calls.
pub trait VoteStore: Send + Sync {
    fn find_vote(
        &self,
        user_id: Uuid,
        target: VoteTarget,
    ) -> impl Future<Output = Result<Option<Vote>>> + Send;

    fn create_vote(
        &self,
        user_id: Uuid,
        target: VoteTarget,
        value: VoteValue,
    ) -> impl Future<Output = Result<Vote>> + Send;

    fn update_vote_value(
        &self,
        vote_id: Uuid,
        target: VoteTarget,
        value: VoteValue,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_vote(
        &self,
        vote_id: Uuid,
        target: VoteTarget,
    ) -> impl Future<Output = Result<()>> + Send;

    fn score(&self, target: VoteTarget) -> impl Future<Output = Result<i64>> + Send;
}

#[derive(Debug, FromRow)]
struct VoteRow {
    id: Uuid,
    user_id: Uuid,
    target_id: Uuid,
    vote_type: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VoteRow {
    fn into_vote(self, target: VoteTarget) -> Result<Vote> {
        debug_assert_eq!(self.target_id, target.id());
        let value = VoteValue::try_from(self.vote_type).map_err(|_| {
            AppError::Internal(format!(
                "Stored vote {} has invalid value {}",
                self.id, self.vote_type
            ))
        })?;

        Ok(Vote {
            id: self.id,
            user_id: self.user_id,
            target,
            value,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Postgres-backed store over the `post_votes` and `comment_votes` tables.
#[derive(Clone)]
pub struct PgVoteStore {
    db: PgPool,
}

impl PgVoteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl VoteStore for PgVoteStore {
    async fn find_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<Vote>> {
        let query = format!(
            r#"
            SELECT id, user_id, {column} AS target_id, vote_type, created_at, updated_at
            FROM {table}
            WHERE user_id = $1 AND {column} = $2
            "#,
            table = target.table(),
            column = target.column(),
        );

        let row = sqlx::query_as::<_, VoteRow>(&query)
            .bind(user_id)
            .bind(target.id())
            .fetch_optional(&self.db)
            .await?;

        row.map(|row| row.into_vote(target)).transpose()
    }

    async fn create_vote(&self, user_id: Uuid, target: VoteTarget, value: VoteValue) -> Result<Vote> {
        // A concurrent toggle by the same caster may have inserted first; the
        // later write wins instead of failing on the unique key.
        let query = format!(
            r#"
            INSERT INTO {table} (id, user_id, {column}, vote_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (user_id, {column})
            DO UPDATE SET vote_type = EXCLUDED.vote_type, updated_at = NOW()
            RETURNING id, user_id, {column} AS target_id, vote_type, created_at, updated_at
            "#,
            table = target.table(),
            column = target.column(),
        );

        let row = sqlx::query_as::<_, VoteRow>(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(target.id())
            .bind(value.as_i16())
            .fetch_one(&self.db)
            .await?;

        tracing::debug!(vote_id = %row.id, kind = target.kind(), "vote row created");
        row.into_vote(target)
    }

    async fn update_vote_value(&self, vote_id: Uuid, target: VoteTarget, value: VoteValue) -> Result<()> {
        let query = format!(
            "UPDATE {} SET vote_type = $1, updated_at = NOW() WHERE id = $2",
            target.table()
        );

        sqlx::query(&query)
            .bind(value.as_i16())
            .bind(vote_id)
            .execute(&self.db)
            .await?;

        tracing::debug!(%vote_id, kind = target.kind(), "vote row flipped");
        Ok(())
    }

    async fn delete_vote(&self, vote_id: Uuid, target: VoteTarget) -> Result<()> {
        let query = format!("DELETE FROM {} WHERE id = $1", target.table());

        sqlx::query(&query).bind(vote_id).execute(&self.db).await?;

        tracing::debug!(%vote_id, kind = target.kind(), "vote row deleted");
        Ok(())
    }

    async fn score(&self, target: VoteTarget) -> Result<i64> {
        let query = format!(
            "SELECT COALESCE(SUM(vote_type), 0)::BIGINT FROM {} WHERE {} = $1",
            target.table(),
            target.column()
        );

        let score = sqlx::query_scalar::<_, i64>(&query)
            .bind(target.id())
            .fetch_one(&self.db)
            .await?;

        Ok(score)
    }
}

/// In-process store. Used by tests and local tooling where no database is
/// available.
#[derive(Clone, Default)]
pub struct MemoryVoteStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    votes: Vec<Vote>,
    unavailable: bool,
}

impl MemoryState {
    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail the way an unreachable database does.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().await.unavailable = unavailable;
    }

    pub async fn votes(&self) -> Vec<Vote> {
        self.inner.lock().await.votes.clone()
    }
}

impl VoteStore for MemoryVoteStore {
    async fn find_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<Vote>> {
        let state = self.inner.lock().await;
        state.check_available()?;

        Ok(state
            .votes
            .iter()
            .find(|v| v.user_id == user_id && v.target == target)
            .cloned())
    }

    async fn create_vote(&self, user_id: Uuid, target: VoteTarget, value: VoteValue) -> Result<Vote> {
        let mut state = self.inner.lock().await;
        state.check_available()?;

        let now = Utc::now();
        if let Some(existing) = state
            .votes
            .iter_mut()
            .find(|v| v.user_id == user_id && v.target == target)
        {
            existing.value = value;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let vote = Vote {
            id: Uuid::new_v4(),
            user_id,
            target,
            value,
            created_at: now,
            updated_at: now,
        };
        state.votes.push(vote.clone());
        Ok(vote)
    }

    async fn update_vote_value(&self, vote_id: Uuid, _target: VoteTarget, value: VoteValue) -> Result<()> {
        let mut state = self.inner.lock().await;
        state.check_available()?;

        if let Some(vote) = state.votes.iter_mut().find(|v| v.id == vote_id) {
            vote.value = value;
            vote.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_vote(&self, vote_id: Uuid, _target: VoteTarget) -> Result<()> {
        let mut state = self.inner.lock().await;
        state.check_available()?;

        state.votes.retain(|v| v.id != vote_id);
        Ok(())
    }

    async fn score(&self, target: VoteTarget) -> Result<i64> {
        let state = self.inner.lock().await;
        state.check_available()?;

        Ok(state
            .votes
            .iter()
            .filter(|v| v.target == target)
            .map(|v| i64::from(v.value.as_i16()))
            .sum())
    }
}
