//! In-flight user actions awaiting confirmation from the chain.
//!
//! Each `(kind, target)` pair runs its own small state machine: `Idle` (no
//! entry) -> `Pending` -> back to `Idle`, either confirmed or reverted. While
//! an entry exists the UI shows the optimistic outcome; the tracker never
//! holds final truth, only the fact that something is awaiting an answer.

use busy_ref::{ContentId, Username};
use log::{debug, warn};
use std::{collections::HashMap, fmt, time::Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Vote,
    Follow,
    Reblog,
    BookmarkToggle,
    CommentSubmit,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Vote => "vote",
            OperationKind::Follow => "follow",
            OperationKind::Reblog => "reblog",
            OperationKind::BookmarkToggle => "bookmark-toggle",
            OperationKind::CommentSubmit => "comment-submit",
        })
    }
}

/// What an operation acts on. Follows name an account, everything else a
/// post or comment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetId {
    Content(ContentId),
    Account(Username),
}

impl From<ContentId> for TargetId {
    fn from(id: ContentId) -> Self {
        TargetId::Content(id)
    }
}

impl From<Username> for TargetId {
    fn from(name: Username) -> Self {
        TargetId::Account(name)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetId::Content(id) => write!(f, "#{}", id),
            TargetId::Account(name) => write!(f, "@{}", name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Add,
    Remove,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationParams {
    Vote { percent: i32 },
    Follow(Toggle),
    Reblog(Toggle),
    Bookmark(Toggle),
    Comment { body: String },
}

impl OperationParams {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationParams::Vote { .. } => OperationKind::Vote,
            OperationParams::Follow(_) => OperationKind::Follow,
            OperationParams::Reblog(_) => OperationKind::Reblog,
            OperationParams::Bookmark(_) => OperationKind::BookmarkToggle,
            OperationParams::Comment { .. } => OperationKind::CommentSubmit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub target: TargetId,
    pub params: OperationParams,
    pub requested_at: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// How a pending operation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Canonical state is now authoritative.
    Confirmed(PendingOperation),
    /// The optimistic outcome must be dropped and the user told.
    Reverted(PendingOperation),
}

impl Resolution {
    pub fn operation(&self) -> &PendingOperation {
        match self {
            Resolution::Confirmed(operation) | Resolution::Reverted(operation) => operation,
        }
    }
}

#[derive(Debug, Default)]
pub struct InteractionTracker {
    pending: HashMap<(OperationKind, TargetId), PendingOperation>,
}

impl InteractionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action. Returns false, changing nothing, if one is
    /// already in flight for the same kind and target.
    pub fn begin(
        &mut self,
        kind: OperationKind,
        target: impl Into<TargetId>,
        params: OperationParams,
    ) -> bool {
        debug_assert_eq!(kind, params.kind(), "params do not match operation kind");

        let target = target.into();
        let key = (kind, target);
        if self.pending.contains_key(&key) {
            debug!("Ignoring duplicate {} on {}", kind, key.1);
            return false;
        }

        debug!("Begin {} on {}: {:?}", kind, key.1, params);
        let operation = PendingOperation {
            kind,
            target: key.1.clone(),
            params,
            requested_at: Instant::now(),
        };
        self.pending.insert(key, operation);
        true
    }

    pub fn resolve_success(
        &mut self,
        kind: OperationKind,
        target: &TargetId,
    ) -> Option<PendingOperation> {
        self.resolve(kind, target, Outcome::Success)
            .map(|resolution| resolution.operation().clone())
    }

    pub fn resolve_error(
        &mut self,
        kind: OperationKind,
        target: &TargetId,
    ) -> Option<PendingOperation> {
        self.resolve(kind, target, Outcome::Failure)
            .map(|resolution| resolution.operation().clone())
    }

    /// End the pending operation for `(kind, target)`. Returns `None` if
    /// nothing was pending there.
    pub fn resolve(
        &mut self,
        kind: OperationKind,
        target: &TargetId,
        outcome: Outcome,
    ) -> Option<Resolution> {
        let operation = match self.pending.remove(&(kind, target.clone())) {
            Some(operation) => operation,
            None => {
                warn!("No pending {} on {} to resolve", kind, target);
                return None;
            }
        };

        let resolution = match outcome {
            Outcome::Success => {
                debug!(
                    "Confirmed {} on {} after {:?}",
                    kind,
                    target,
                    operation.requested_at.elapsed()
                );
                Resolution::Confirmed(operation)
            }
            Outcome::Failure => {
                warn!("Reverted {} on {}", kind, target);
                Resolution::Reverted(operation)
            }
        };
        Some(resolution)
    }

    pub fn is_pending(&self, kind: OperationKind, target: &TargetId) -> bool {
        self.pending.contains_key(&(kind, target.clone()))
    }

    pub fn state(&self, kind: OperationKind, target: &TargetId) -> OperationState {
        if self.is_pending(kind, target) {
            OperationState::Pending
        } else {
            OperationState::Idle
        }
    }

    pub fn pending(&self, kind: OperationKind, target: &TargetId) -> Option<&PendingOperation> {
        self.pending.get(&(kind, target.clone()))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
        self.pending.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64) -> TargetId {
        TargetId::Content(ContentId(id))
    }

    fn like() -> OperationParams {
        OperationParams::Vote { percent: 10000 }
    }

    #[test]
    fn test_duplicate_begin_is_rejected() {
        let mut tracker = InteractionTracker::new();

        assert!(tracker.begin(OperationKind::Vote, ContentId(5), like()));
        assert!(!tracker.begin(
            OperationKind::Vote,
            ContentId(5),
            OperationParams::Vote { percent: 0 }
        ));

        // the second request did not overwrite the first
        let operation = tracker.pending(OperationKind::Vote, &post(5)).unwrap();
        assert_eq!(operation.params, like());
        assert_eq!(tracker.pending_count(), 1);
    }

    #[test]
    fn test_guard_is_per_kind_and_target() {
        let mut tracker = InteractionTracker::new();

        assert!(tracker.begin(OperationKind::Vote, ContentId(5), like()));
        assert!(tracker.begin(OperationKind::Vote, ContentId(6), like()));
        assert!(tracker.begin(
            OperationKind::Reblog,
            ContentId(5),
            OperationParams::Reblog(Toggle::Add)
        ));
        assert_eq!(tracker.pending_count(), 3);
    }

    #[test]
    fn test_error_then_retry() {
        let mut tracker = InteractionTracker::new();

        assert!(tracker.begin(OperationKind::Vote, ContentId(10), like()));
        assert_eq!(tracker.state(OperationKind::Vote, &post(10)), OperationState::Pending);

        let reverted = tracker.resolve_error(OperationKind::Vote, &post(10)).unwrap();
        assert_eq!(reverted.params, like());
        assert!(!tracker.is_pending(OperationKind::Vote, &post(10)));
        assert_eq!(tracker.state(OperationKind::Vote, &post(10)), OperationState::Idle);

        assert!(tracker.begin(OperationKind::Vote, ContentId(10), like()));
    }

    #[test]
    fn test_success_clears_entry() {
        let mut tracker = InteractionTracker::new();
        let alice: Username = "alice".parse().unwrap();
        let target = TargetId::from(alice.clone());

        assert!(tracker.begin(
            OperationKind::Follow,
            alice,
            OperationParams::Follow(Toggle::Add)
        ));
        assert!(tracker.is_pending(OperationKind::Follow, &target));

        let resolution = tracker
            .resolve(OperationKind::Follow, &target, Outcome::Success)
            .unwrap();
        assert!(matches!(resolution, Resolution::Confirmed(_)));
        assert_eq!(resolution.operation().target, target);
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn test_resolve_without_entry() {
        let mut tracker = InteractionTracker::new();
        assert_eq!(tracker.resolve_success(OperationKind::Reblog, &post(1)), None);
        assert_eq!(tracker.resolve_error(OperationKind::Reblog, &post(1)), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OperationKind::BookmarkToggle.to_string(), "bookmark-toggle");
        assert_eq!(post(3).to_string(), "#3");
        assert_eq!(
            OperationParams::Comment { body: "hi".to_string() }.kind(),
            OperationKind::CommentSubmit
        );
    }
}
