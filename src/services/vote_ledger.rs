use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{ToggleOutcome, VoteSummary, VoteTarget, VoteTransition, VoteValue},
    services::vote_store::VoteStore,
};

/// Keeps at most one vote per (caster, target) and applies toggle requests
/// against it.
///
/// The read-then-write in [`VoteLedger::toggle`] is not locked. Two toggles
/// racing for the same caster and target resolve last-write-wins; toggles by
/// different casters never touch the same row.
#[derive(Clone)]
pub struct VoteLedger<S> {
    store: S,
}

impl<S: VoteStore> VoteLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create, flip or clear the caster's vote on `target`.
    ///
    /// Performs exactly one insert, update or delete, then reads back the
    /// target's aggregate score. Once the write has gone through the outcome
    /// stands; a failed read-back leaves `score` empty instead of failing.
    pub async fn toggle(
        &self,
        caster_id: Uuid,
        target: VoteTarget,
        requested: VoteValue,
    ) -> Result<ToggleOutcome> {
        ensure_caster(caster_id)?;

        let existing = self.store.find_vote(caster_id, target).await?;
        let transition = VoteTransition::resolve(existing.as_ref().map(|v| v.value), requested);

        match existing {
            None => {
                self.store.create_vote(caster_id, target, requested).await?;
            }
            Some(vote) if transition.next.is_none() => {
                self.store.delete_vote(vote.id, target).await?;
            }
            Some(vote) => {
                self.store
                    .update_vote_value(vote.id, target, requested)
                    .await?;
            }
        }

        let score = match self.store.score(target).await {
            Ok(score) => Some(score),
            Err(e) => {
                tracing::warn!(
                    kind = target.kind(),
                    target_id = %target.id(),
                    "score read-back failed after vote write: {}",
                    e
                );
                None
            }
        };

        Ok(ToggleOutcome {
            action: transition.action,
            user_vote: transition.next,
            score,
        })
    }

    /// Aggregate score plus the viewer's own vote, `0` meaning no vote.
    pub async fn summary(&self, viewer_id: Option<Uuid>, target: VoteTarget) -> Result<VoteSummary> {
        let score = self.store.score(target).await?;

        let user_vote = match viewer_id {
            Some(viewer_id) => self
                .store
                .find_vote(viewer_id, target)
                .await?
                .map(|v| v.value.as_i16())
                .unwrap_or(0),
            None => 0,
        };

        Ok(VoteSummary { score, user_vote })
    }
}

fn ensure_caster(caster_id: Uuid) -> Result<()> {
    if caster_id.is_nil() {
        return Err(AppError::Validation("Caster id is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::VoteAction, services::vote_store::MemoryVoteStore};

    #[tokio::test]
    async fn flip_updates_the_existing_row_in_place() {
        let ledger = VoteLedger::new(MemoryVoteStore::new());
        let caster = Uuid::new_v4();
        let target = VoteTarget::Comment(Uuid::new_v4());

        ledger.toggle(caster, target, VoteValue::Up).await.unwrap();
        let before = ledger.store().votes().await;

        let outcome = ledger.toggle(caster, target, VoteValue::Down).await.unwrap();
        let after = ledger.store().votes().await;

        assert_eq!(outcome.action, VoteAction::Updated);
        assert_eq!(outcome.user_vote, Some(VoteValue::Down));
        assert_eq!(outcome.score, Some(-1));
        assert_eq!(after.len(), 1);
        assert_eq!(before[0].id, after[0].id);
        assert_eq!(after[0].value, VoteValue::Down);
    }

    #[tokio::test]
    async fn nil_caster_is_rejected_before_the_store_is_touched() {
        let store = MemoryVoteStore::new();
        // an unavailable store would surface a database error if it were reached
        store.set_unavailable(true).await;
        let ledger = VoteLedger::new(store);

        let err = ledger
            .toggle(Uuid::nil(), VoteTarget::Post(Uuid::new_v4()), VoteValue::Up)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn summary_reports_zero_for_anonymous_and_non_voters() {
        let ledger = VoteLedger::new(MemoryVoteStore::new());
        let voter = Uuid::new_v4();
        let target = VoteTarget::Post(Uuid::new_v4());
        ledger.toggle(voter, target, VoteValue::Down).await.unwrap();

        let anonymous = ledger.summary(None, target).await.unwrap();
        assert_eq!(anonymous, VoteSummary { score: -1, user_vote: 0 });

        let other = ledger.summary(Some(Uuid::new_v4()), target).await.unwrap();
        assert_eq!(other.user_vote, 0);

        let own = ledger.summary(Some(voter), target).await.unwrap();
        assert_eq!(own.user_vote, -1);
    }
}
