use std::collections::HashMap;

use serde::Serialize;

use crate::models::{VoteTarget, VoteTransition, VoteValue};

/// What a client shows for one target: its score and the viewer's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VoteSnapshot {
    pub score: i64,
    pub user_vote: Option<VoteValue>,
}

impl VoteSnapshot {
    /// Predict the state after a toggle without waiting for the server.
    pub fn after_toggle(self, requested: VoteValue) -> Self {
        let transition = VoteTransition::resolve(self.user_vote, requested);
        Self {
            score: self.score + transition.score_delta,
            user_vote: transition.next,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    last_known_good: VoteSnapshot,
    optimistic: VoteSnapshot,
}

/// Optimistic vote state layered over the last state confirmed by the server.
///
/// `apply` before sending a toggle, then either `reconcile` with the server's
/// answer or `rollback` when the request fails.
#[derive(Debug, Default)]
pub struct VoteOverlay {
    pending: HashMap<VoteTarget, Pending>,
}

impl VoteOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending toggle and return what should be displayed now.
    ///
    /// A second toggle while one is in flight stacks on the optimistic state
    /// but keeps the first confirmed state for rollback.
    pub fn apply(
        &mut self,
        target: VoteTarget,
        confirmed: VoteSnapshot,
        requested: VoteValue,
    ) -> VoteSnapshot {
        let entry = self.pending.entry(target).or_insert(Pending {
            last_known_good: confirmed,
            optimistic: confirmed,
        });
        entry.optimistic = entry.optimistic.after_toggle(requested);
        entry.optimistic
    }

    /// Replace the optimistic state with the server's answer.
    pub fn reconcile(&mut self, target: VoteTarget, server: VoteSnapshot) -> VoteSnapshot {
        self.pending.remove(&target);
        server
    }

    /// Discard the optimistic state, returning the state to fall back to.
    pub fn rollback(&mut self, target: VoteTarget) -> Option<VoteSnapshot> {
        self.pending.remove(&target).map(|p| p.last_known_good)
    }

    /// The state to display for `target` given the canonical store's value.
    pub fn view(&self, target: VoteTarget, canonical: VoteSnapshot) -> VoteSnapshot {
        self.pending
            .get(&target)
            .map(|p| p.optimistic)
            .unwrap_or(canonical)
    }

    pub fn is_pending(&self, target: VoteTarget) -> bool {
        self.pending.contains_key(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn apply_shows_prediction_until_reconciled() {
        let mut overlay = VoteOverlay::new();
        let target = VoteTarget::Post(Uuid::new_v4());
        let confirmed = VoteSnapshot {
            score: 4,
            user_vote: None,
        };

        let shown = overlay.apply(target, confirmed, VoteValue::Up);
        assert_eq!(shown.score, 5);
        assert_eq!(overlay.view(target, confirmed), shown);

        // server saw another voter in the meantime
        let server = VoteSnapshot {
            score: 6,
            user_vote: Some(VoteValue::Up),
        };
        assert_eq!(overlay.reconcile(target, server), server);
        assert!(!overlay.is_pending(target));
        assert_eq!(overlay.view(target, server), server);
    }

    #[test]
    fn rollback_returns_state_before_first_pending_toggle() {
        let mut overlay = VoteOverlay::new();
        let target = VoteTarget::Comment(Uuid::new_v4());
        let confirmed = VoteSnapshot {
            score: -2,
            user_vote: Some(VoteValue::Down),
        };

        assert_eq!(overlay.apply(target, confirmed, VoteValue::Up).score, 0);
        assert_eq!(overlay.apply(target, confirmed, VoteValue::Up).score, -1);

        assert_eq!(overlay.rollback(target), Some(confirmed));
        assert_eq!(overlay.rollback(target), None);
        assert_eq!(overlay.view(target, confirmed), confirmed);
    }

    #[test]
    fn overlays_are_independent_per_target() {
        let mut overlay = VoteOverlay::new();
        let post = VoteTarget::Post(Uuid::new_v4());
        let comment = VoteTarget::Comment(post.id());

        overlay.apply(post, VoteSnapshot::default(), VoteValue::Down);

        assert!(overlay.is_pending(post));
        assert!(!overlay.is_pending(comment));
        assert_eq!(
            overlay.view(comment, VoteSnapshot::default()),
            VoteSnapshot::default()
        );
    }
}
