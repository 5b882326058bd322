//! Per-item UI state derived from canonical data plus the pending overlay.
//!
//! Everything here is a pure projection: no I/O, no mutation, safe to call
//! on every render.

use busy_msg::{Comment, Post, Votable};
use busy_pending::{InteractionTracker, OperationKind, OperationParams, TargetId, Toggle};
use busy_ref::{ContentId, Username};
use std::collections::HashSet;

mod vote;
pub use vote::{next_vote_percent, presence_toggle, VoteAction};

/// The signed-in user's canonical memberships, as last confirmed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collections {
    bookmarks: HashSet<ContentId>,
    reblogged: HashSet<ContentId>,
    following: HashSet<Username>,
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bookmarked(&self, id: ContentId) -> bool {
        self.bookmarks.contains(&id)
    }

    pub fn is_reblogged(&self, id: ContentId) -> bool {
        self.reblogged.contains(&id)
    }

    pub fn is_following(&self, name: &Username) -> bool {
        self.following.contains(name)
    }

    pub fn set_bookmarks(&mut self, ids: impl IntoIterator<Item = ContentId>) {
        self.bookmarks = ids.into_iter().collect();
    }

    pub fn set_reblogged(&mut self, ids: impl IntoIterator<Item = ContentId>) {
        self.reblogged = ids.into_iter().collect();
    }

    pub fn set_following(&mut self, names: impl IntoIterator<Item = Username>) {
        self.following = names.into_iter().collect();
    }

    pub fn apply_bookmark(&mut self, id: ContentId, toggle: Toggle) {
        match toggle {
            Toggle::Add => self.bookmarks.insert(id),
            Toggle::Remove => self.bookmarks.remove(&id),
        };
    }

    pub fn apply_reblog(&mut self, id: ContentId, toggle: Toggle) {
        match toggle {
            Toggle::Add => self.reblogged.insert(id),
            Toggle::Remove => self.reblogged.remove(&id),
        };
    }

    pub fn apply_follow(&mut self, name: Username, toggle: Toggle) {
        match toggle {
            Toggle::Add => self.following.insert(name),
            Toggle::Remove => self.following.remove(&name),
        };
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PostViewState {
    pub is_liked: bool,
    pub is_reported: bool,
    pub is_bookmarked: bool,
    pub is_reblogged: bool,
    pub is_following_author: bool,
    pub like_pending: bool,
    pub reblog_pending: bool,
    pub follow_pending: bool,
    pub bookmark_pending: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommentViewState {
    pub is_liked: bool,
    pub is_disliked: bool,
    pub vote_pending: bool,
    /// Percent of the in-flight vote, so the UI can tell which button spins.
    pub pending_percent: Option<i32>,
}

pub fn resolve_post_state(
    post: &Post,
    user: Option<&Username>,
    collections: &Collections,
    tracker: &InteractionTracker,
) -> PostViewState {
    let target = TargetId::Content(post.id);
    let author = TargetId::Account(post.author.clone());

    let mut state = PostViewState {
        like_pending: tracker.is_pending(OperationKind::Vote, &target),
        reblog_pending: tracker.is_pending(OperationKind::Reblog, &target),
        follow_pending: tracker.is_pending(OperationKind::Follow, &author),
        bookmark_pending: tracker.is_pending(OperationKind::BookmarkToggle, &target),
        ..PostViewState::default()
    };

    if let Some(user) = user {
        let vote = post.vote_of(user);
        state.is_liked = vote.map(|vote| vote.is_like()).unwrap_or(false);
        state.is_reported = vote.map(|vote| vote.is_dislike()).unwrap_or(false);
        state.is_bookmarked = collections.is_bookmarked(post.id);
        state.is_reblogged = collections.is_reblogged(post.id);
        state.is_following_author = collections.is_following(&post.author);
    }

    state
}

pub fn resolve_comment_state(
    comment: &Comment,
    user: Option<&Username>,
    tracker: &InteractionTracker,
) -> CommentViewState {
    let pending = tracker.pending(OperationKind::Vote, &TargetId::Content(comment.id));
    let vote = user.and_then(|user| comment.vote_of(user));

    CommentViewState {
        is_liked: vote.map(|vote| vote.is_like()).unwrap_or(false),
        is_disliked: vote.map(|vote| vote.is_dislike()).unwrap_or(false),
        vote_pending: pending.is_some(),
        pending_percent: pending.and_then(|operation| match operation.params {
            OperationParams::Vote { percent } => Some(percent),
            _ => None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busy_msg::ActiveVote;

    fn name(name: &str) -> Username {
        name.parse().unwrap()
    }

    fn post() -> Post {
        Post::new(ContentId(7), name("bob"), "a-post".parse().unwrap())
    }

    #[test]
    fn test_fresh_post_state() {
        let state = resolve_post_state(
            &post(),
            Some(&name("alice")),
            &Collections::new(),
            &InteractionTracker::new(),
        );
        assert_eq!(state, PostViewState::default());
    }

    #[test]
    fn test_votes_and_collections() {
        let post = post()
            .with_vote(ActiveVote::new(name("carol"), -10000))
            .with_vote(ActiveVote::new(name("alice"), 10000));
        let mut collections = Collections::new();
        collections.set_bookmarks(vec![ContentId(7)]);
        collections.set_reblogged(vec![ContentId(8)]);
        collections.set_following(vec![name("bob")]);

        let state = resolve_post_state(
            &post,
            Some(&name("alice")),
            &collections,
            &InteractionTracker::new(),
        );
        assert!(state.is_liked);
        assert!(!state.is_reported);
        assert!(state.is_bookmarked);
        assert!(!state.is_reblogged);
        assert!(state.is_following_author);

        let carol = resolve_post_state(
            &post,
            Some(&name("carol")),
            &collections,
            &InteractionTracker::new(),
        );
        assert!(carol.is_reported);
        assert!(!carol.is_liked);
    }

    #[test]
    fn test_first_matching_vote_wins() {
        let post = post()
            .with_vote(ActiveVote::new(name("alice"), -10000))
            .with_vote(ActiveVote::new(name("alice"), 10000));

        let state = resolve_post_state(
            &post,
            Some(&name("alice")),
            &Collections::new(),
            &InteractionTracker::new(),
        );
        assert!(state.is_reported);
        assert!(!state.is_liked);
    }

    #[test]
    fn test_pending_flags() {
        let mut tracker = InteractionTracker::new();
        tracker.begin(
            OperationKind::Vote,
            ContentId(7),
            OperationParams::Vote { percent: 10000 },
        );
        tracker.begin(
            OperationKind::Follow,
            name("bob"),
            OperationParams::Follow(Toggle::Add),
        );

        let state = resolve_post_state(&post(), Some(&name("alice")), &Collections::new(), &tracker);
        assert!(state.like_pending);
        assert!(state.follow_pending);
        assert!(!state.reblog_pending);
        assert!(!state.bookmark_pending);
        // the overlay never changes canonical flags
        assert!(!state.is_liked);
        assert!(!state.is_following_author);
    }

    #[test]
    fn test_bookmark_error_restores_canonical_state() {
        let mut collections = Collections::new();
        collections.set_bookmarks(vec![ContentId(7)]);
        let mut tracker = InteractionTracker::new();

        let toggle = presence_toggle(collections.is_bookmarked(ContentId(7)));
        assert_eq!(toggle, Toggle::Remove);
        assert!(tracker.begin(
            OperationKind::BookmarkToggle,
            ContentId(7),
            OperationParams::Bookmark(toggle)
        ));
        assert!(resolve_post_state(&post(), Some(&name("alice")), &collections, &tracker).bookmark_pending);

        tracker.resolve_error(OperationKind::BookmarkToggle, &TargetId::Content(ContentId(7)));

        let state = resolve_post_state(&post(), Some(&name("alice")), &collections, &tracker);
        assert!(!tracker.is_pending(OperationKind::BookmarkToggle, &TargetId::Content(ContentId(7))));
        assert!(!state.bookmark_pending);
        assert!(state.is_bookmarked);
    }

    #[test]
    fn test_signed_out_user() {
        let post = post().with_vote(ActiveVote::new(name("alice"), 10000));
        let mut collections = Collections::new();
        collections.set_bookmarks(vec![ContentId(7)]);

        let state = resolve_post_state(&post, None, &collections, &InteractionTracker::new());
        assert_eq!(state, PostViewState::default());
    }

    #[test]
    fn test_apply_toggles() {
        let mut collections = Collections::new();
        collections.apply_follow(name("bob"), Toggle::Add);
        collections.apply_reblog(ContentId(3), Toggle::Add);
        collections.apply_bookmark(ContentId(4), Toggle::Add);
        assert!(collections.is_following(&name("bob")));
        assert!(collections.is_reblogged(ContentId(3)));
        assert!(collections.is_bookmarked(ContentId(4)));

        collections.apply_follow(name("bob"), Toggle::Remove);
        collections.apply_bookmark(ContentId(4), Toggle::Remove);
        assert!(!collections.is_following(&name("bob")));
        assert!(!collections.is_bookmarked(ContentId(4)));
    }

    #[test]
    fn test_comment_state() {
        let mut comment = Comment::new(ContentId(2), name("bob"), Some(ContentId(1)));
        comment.active_votes.push(ActiveVote::new(name("alice"), -10000));
        let mut tracker = InteractionTracker::new();
        tracker.begin(
            OperationKind::Vote,
            ContentId(2),
            OperationParams::Vote { percent: 0 },
        );

        let state = resolve_comment_state(&comment, Some(&name("alice")), &tracker);
        assert_eq!(
            state,
            CommentViewState {
                is_liked: false,
                is_disliked: true,
                vote_pending: true,
                pending_percent: Some(0),
            }
        );
    }
}
