//! Behaviour of the vote toggle against the in-memory store.
//!
//! These tests do not need a database; `MemoryVoteStore` implements the same
//! `VoteStore` contract as the Postgres store.

use assert_matches::assert_matches;
use forum::error::AppError;
use forum::error::Result;
use forum::models::{Vote, VoteAction, VoteTarget, VoteValue};
use forum::services::vote_ledger::VoteLedger;
use forum::services::vote_store::{MemoryVoteStore, VoteStore};
use uuid::Uuid;

/// Writes go through; reading the score back always fails.
struct ScoreUnavailable(MemoryVoteStore);

impl VoteStore for ScoreUnavailable {
    async fn find_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<Vote>> {
        self.0.find_vote(user_id, target).await
    }

    async fn create_vote(&self, user_id: Uuid, target: VoteTarget, value: VoteValue) -> Result<Vote> {
        self.0.create_vote(user_id, target, value).await
    }

    async fn update_vote_value(&self, vote_id: Uuid, target: VoteTarget, value: VoteValue) -> Result<()> {
        self.0.update_vote_value(vote_id, target, value).await
    }

    async fn delete_vote(&self, vote_id: Uuid, target: VoteTarget) -> Result<()> {
        self.0.delete_vote(vote_id, target).await
    }

    async fn score(&self, _target: VoteTarget) -> Result<i64> {
        Err(AppError::Database(sqlx::Error::PoolTimedOut))
    }
}

fn ledger() -> VoteLedger<MemoryVoteStore> {
    VoteLedger::new(MemoryVoteStore::new())
}

// ---------------------------------------------------------------------------
// Repeating the same direction cycles created -> deleted -> created
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_same_direction_cycles_between_vote_and_no_vote() {
    let ledger = ledger();
    let caster = Uuid::new_v4();
    let target = VoteTarget::Post(Uuid::new_v4());

    let first = ledger.toggle(caster, target, VoteValue::Down).await.unwrap();
    assert_eq!(first.action, VoteAction::Created);
    assert_eq!(first.user_vote, Some(VoteValue::Down));

    let second = ledger.toggle(caster, target, VoteValue::Down).await.unwrap();
    assert_eq!(second.action, VoteAction::Deleted);
    assert_eq!(second.user_vote, None);
    assert!(ledger.store().votes().await.is_empty());

    let third = ledger.toggle(caster, target, VoteValue::Down).await.unwrap();
    assert_eq!(third.action, VoteAction::Created);
    assert_eq!(third.user_vote, Some(VoteValue::Down));
    assert_eq!(ledger.store().votes().await.len(), 1);
}

// ---------------------------------------------------------------------------
// Flipping direction mutates the single row
// ---------------------------------------------------------------------------

#[tokio::test]
async fn flip_from_down_to_up_keeps_one_row() {
    let ledger = ledger();
    let caster = Uuid::new_v4();
    let target = VoteTarget::Comment(Uuid::new_v4());

    ledger.toggle(caster, target, VoteValue::Down).await.unwrap();
    let id_before = ledger.store().votes().await[0].id;

    let outcome = ledger.toggle(caster, target, VoteValue::Up).await.unwrap();

    assert_eq!(outcome.action, VoteAction::Updated);
    assert_eq!(outcome.score, Some(1));
    let votes = ledger.store().votes().await;
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].id, id_before);
    assert_eq!(votes[0].value, VoteValue::Up);
}

// ---------------------------------------------------------------------------
// Score is the exact sum of stored values
// ---------------------------------------------------------------------------

#[tokio::test]
async fn score_equals_sum_of_stored_values() {
    let ledger = ledger();
    let target = VoteTarget::Post(Uuid::new_v4());
    let casters: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();

    for (i, caster) in casters.iter().enumerate() {
        let value = if i % 2 == 0 { VoteValue::Up } else { VoteValue::Down };
        ledger.toggle(*caster, target, value).await.unwrap();
    }

    let stored: i64 = ledger
        .store()
        .votes()
        .await
        .iter()
        .map(|v| i64::from(v.value.as_i16()))
        .sum();
    assert_eq!(stored, 1);
    assert_eq!(ledger.store().score(target).await.unwrap(), stored);

    // removing a downvote raises the score by exactly one
    let outcome = ledger.toggle(casters[1], target, VoteValue::Down).await.unwrap();
    assert_eq!(outcome.action, VoteAction::Deleted);
    assert_eq!(outcome.score, Some(stored + 1));

    // a new upvote raises it by exactly one more
    let outcome = ledger
        .toggle(Uuid::new_v4(), target, VoteValue::Up)
        .await
        .unwrap();
    assert_eq!(outcome.score, Some(stored + 2));
}

#[tokio::test]
async fn votes_on_one_target_do_not_touch_another() {
    let ledger = ledger();
    let caster = Uuid::new_v4();
    let id = Uuid::new_v4();
    // same uuid, different kind of target
    let post = VoteTarget::Post(id);
    let comment = VoteTarget::Comment(id);

    ledger.toggle(caster, post, VoteValue::Up).await.unwrap();
    let outcome = ledger.toggle(caster, comment, VoteValue::Up).await.unwrap();

    assert_eq!(outcome.action, VoteAction::Created);
    assert_eq!(ledger.store().score(post).await.unwrap(), 1);
    assert_eq!(ledger.store().score(comment).await.unwrap(), 1);
    assert_eq!(ledger.store().votes().await.len(), 2);
}

// ---------------------------------------------------------------------------
// u1 / u2 on p1, step by step
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_casters_on_one_post() {
    let ledger = ledger();
    let u1 = Uuid::new_v4();
    let u2 = Uuid::new_v4();
    let p1 = VoteTarget::Post(Uuid::new_v4());

    let steps = [
        (u1, VoteValue::Up, VoteAction::Created, 1),
        (u1, VoteValue::Up, VoteAction::Deleted, 0),
        (u2, VoteValue::Down, VoteAction::Created, -1),
        (u1, VoteValue::Down, VoteAction::Created, -2),
        (u1, VoteValue::Up, VoteAction::Updated, 0),
    ];

    let mut previous = ledger.store().score(p1).await.unwrap();
    assert_eq!(previous, 0);

    for (caster, value, action, score) in steps {
        let outcome = ledger.toggle(caster, p1, value).await.unwrap();
        assert_eq!(outcome.action, action);
        assert_eq!(outcome.score, Some(score));
        previous = score;
    }

    // the final flip swung the score by two
    assert_eq!(previous, 0);
    let summary = ledger.summary(Some(u1), p1).await.unwrap();
    assert_eq!(summary.user_vote, 1);
    let summary = ledger.summary(Some(u2), p1).await.unwrap();
    assert_eq!(summary.user_vote, -1);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_failure_propagates_without_partial_state() {
    let ledger = ledger();
    let caster = Uuid::new_v4();
    let target = VoteTarget::Post(Uuid::new_v4());
    ledger.toggle(caster, target, VoteValue::Up).await.unwrap();

    ledger.store().set_unavailable(true).await;
    let err = ledger
        .toggle(caster, target, VoteValue::Down)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Database(sqlx::Error::PoolTimedOut));

    ledger.store().set_unavailable(false).await;
    let votes = ledger.store().votes().await;
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].value, VoteValue::Up);
}

#[tokio::test]
async fn nil_caster_is_invalid_input() {
    let ledger = ledger();

    let err = ledger
        .toggle(Uuid::nil(), VoteTarget::Comment(Uuid::new_v4()), VoteValue::Up)
        .await
        .unwrap_err();

    assert_matches!(err, AppError::Validation(_));
    assert!(ledger.store().votes().await.is_empty());
}

#[tokio::test]
async fn committed_write_is_reported_when_score_read_back_fails() {
    let ledger = VoteLedger::new(ScoreUnavailable(MemoryVoteStore::new()));
    let caster = Uuid::new_v4();
    let target = VoteTarget::Post(Uuid::new_v4());

    let outcome = ledger.toggle(caster, target, VoteValue::Up).await.unwrap();
    assert_eq!(outcome.action, VoteAction::Created);
    assert_eq!(outcome.user_vote, Some(VoteValue::Up));
    assert_eq!(outcome.score, None);
    assert_eq!(ledger.store().0.votes().await.len(), 1);

    // a retry of the same direction sees the stored vote and clears it
    let outcome = ledger.toggle(caster, target, VoteValue::Up).await.unwrap();
    assert_eq!(outcome.action, VoteAction::Deleted);
    assert!(ledger.store().0.votes().await.is_empty());
}
