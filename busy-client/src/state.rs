//! The state container owned by the composition root.
//!
//! Every user action runs in two phases. `begin_*` decides what to send
//! (vote tie-break, presence toggle), registers the pending entry and hands
//! back a request, or `None` when the dedup guard rejects it. `complete_*`
//! takes the capability's answer, updates canonical data on success or rolls
//! the optimistic bits back on failure. Keeping the phases apart lets several
//! targets be in flight at once and resolve in any order.

use busy_msg::{Comment, CommentRecord, Post, Votable};
use busy_pending::{InteractionTracker, OperationKind, OperationParams, TargetId, Toggle};
use busy_ref::{ContentId, Username};
use busy_threads::{CommentStore, MergeSummary, ThreadView};
use busy_view::{
    next_vote_percent, presence_toggle, resolve_comment_state, resolve_post_state, Collections,
    CommentViewState, PostViewState, VoteAction,
};
use log::{debug, info, warn};

use crate::{
    capability::{FeedCursor, VoteResult},
    feed::{FeedKey, FeedStore},
    posts::PostsCache,
    ActionStatus, Error, Notice,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteRequest {
    pub target: ContentId,
    pub voter: Username,
    pub percent: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowRequest {
    pub username: Username,
    pub toggle: Toggle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReblogRequest {
    pub post_id: ContentId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookmarkRequest {
    pub post_id: ContentId,
    pub toggle: Toggle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentRequest {
    pub parent_id: ContentId,
    pub body: String,
    /// Reply count of the parent post before the optimistic bump, `None`
    /// when replying to a comment.
    pub bumped_from: Option<u32>,
}

impl CommentRequest {
    pub fn reply_to_post(&self) -> bool {
        self.bumped_from.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedRequest {
    pub cursor: FeedCursor,
    more: bool,
}

#[derive(Debug, Default)]
pub struct State {
    user: Option<Username>,
    posts: PostsCache,
    feeds: FeedStore,
    comments: CommentStore,
    comments_target: Option<ContentId>,
    comments_loading: bool,
    collections: Collections,
    tracker: InteractionTracker,
}

impl State {
    pub fn new(user: Option<Username>) -> Self {
        Self {
            user,
            ..Self::default()
        }
    }

    pub fn user(&self) -> Option<&Username> {
        self.user.as_ref()
    }

    pub fn posts(&self) -> &PostsCache {
        &self.posts
    }

    pub fn feeds(&self) -> &FeedStore {
        &self.feeds
    }

    pub fn comments(&self) -> &CommentStore {
        &self.comments
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn tracker(&self) -> &InteractionTracker {
        &self.tracker
    }

    pub fn displayed_comments(&self) -> Option<ContentId> {
        self.comments_target
    }

    pub fn comments_loading(&self) -> bool {
        self.comments_loading
    }

    /// Install the signed-in user's canonical bookmarks, reblogs and follows.
    pub fn replace_collections(&mut self, collections: Collections) {
        self.collections = collections;
    }

    // views

    pub fn post_state(&self, id: ContentId) -> Option<PostViewState> {
        let post = self.posts.get(id)?;
        Some(resolve_post_state(
            post,
            self.user.as_ref(),
            &self.collections,
            &self.tracker,
        ))
    }

    pub fn comment_state(&self, id: ContentId) -> Option<CommentViewState> {
        let comment = self.comments.get(id)?;
        Some(resolve_comment_state(
            comment,
            self.user.as_ref(),
            &self.tracker,
        ))
    }

    pub fn thread(&self, root: ContentId) -> ThreadView {
        self.comments.build_thread(root)
    }

    pub fn feed_content(&self, key: &FeedKey) -> Vec<&Post> {
        self.feeds.feed_content(key, &self.posts)
    }

    // votes

    pub fn begin_vote(
        &mut self,
        target: ContentId,
        action: VoteAction,
    ) -> Result<Option<VoteRequest>, Error> {
        let voter = self.require_user()?.clone();
        let item = self.votable(target).ok_or(Error::UnknownContent(target))?;
        let percent = next_vote_percent(item, &voter, action);

        if !self.tracker.begin(
            OperationKind::Vote,
            target,
            OperationParams::Vote { percent },
        ) {
            return Ok(None);
        }

        Ok(Some(VoteRequest {
            target,
            voter,
            percent,
        }))
    }

    pub fn complete_vote(
        &mut self,
        request: VoteRequest,
        result: Result<VoteResult, Error>,
    ) -> ActionStatus {
        let target = request.target;
        self.finish(
            OperationKind::Vote,
            TargetId::Content(target),
            result,
            |state, vote_result| {
                let VoteResult { id, active_votes } = vote_result;
                if id != target {
                    warn!("Vote result for {} names {}, ignoring that id", target, id);
                }
                let updated = state.posts.update_votes(target, active_votes.clone())
                    | state.comments.update_votes(target, active_votes);
                if !updated {
                    warn!("Vote confirmed for {} which is no longer cached", target);
                }
            },
            |_| {},
        )
    }

    // follows

    pub fn begin_follow(&mut self, username: Username) -> Result<Option<FollowRequest>, Error> {
        self.require_user()?;
        let toggle = presence_toggle(self.collections.is_following(&username));

        if !self.tracker.begin(
            OperationKind::Follow,
            username.clone(),
            OperationParams::Follow(toggle),
        ) {
            return Ok(None);
        }

        Ok(Some(FollowRequest { username, toggle }))
    }

    pub fn complete_follow(
        &mut self,
        request: FollowRequest,
        result: Result<(), Error>,
    ) -> ActionStatus {
        let FollowRequest { username, toggle } = request;
        self.finish(
            OperationKind::Follow,
            TargetId::Account(username.clone()),
            result,
            move |state, ()| state.collections.apply_follow(username, toggle),
            |_| {},
        )
    }

    // reblogs

    pub fn begin_reblog(&mut self, post_id: ContentId) -> Result<Option<ReblogRequest>, Error> {
        self.require_user()?;
        let toggle = presence_toggle(self.collections.is_reblogged(post_id));
        if toggle == Toggle::Remove {
            // a reblog is permanent on chain
            debug!("Post {} is already reblogged", post_id);
            return Ok(None);
        }

        if !self.tracker.begin(
            OperationKind::Reblog,
            post_id,
            OperationParams::Reblog(toggle),
        ) {
            return Ok(None);
        }

        Ok(Some(ReblogRequest { post_id }))
    }

    pub fn complete_reblog(
        &mut self,
        request: ReblogRequest,
        result: Result<(), Error>,
    ) -> ActionStatus {
        let post_id = request.post_id;
        self.finish(
            OperationKind::Reblog,
            TargetId::Content(post_id),
            result,
            |state, ()| state.collections.apply_reblog(post_id, Toggle::Add),
            |_| {},
        )
    }

    // bookmarks

    pub fn begin_bookmark_toggle(
        &mut self,
        post_id: ContentId,
    ) -> Result<Option<BookmarkRequest>, Error> {
        self.require_user()?;
        let toggle = presence_toggle(self.collections.is_bookmarked(post_id));

        if !self.tracker.begin(
            OperationKind::BookmarkToggle,
            post_id,
            OperationParams::Bookmark(toggle),
        ) {
            return Ok(None);
        }

        Ok(Some(BookmarkRequest { post_id, toggle }))
    }

    pub fn complete_bookmark_toggle(
        &mut self,
        request: BookmarkRequest,
        result: Result<(), Error>,
    ) -> ActionStatus {
        let BookmarkRequest { post_id, toggle } = request;
        self.finish(
            OperationKind::BookmarkToggle,
            TargetId::Content(post_id),
            result,
            |state, ()| state.collections.apply_bookmark(post_id, toggle),
            |_| {},
        )
    }

    // comments

    pub fn begin_comment(
        &mut self,
        parent_id: ContentId,
        body: String,
    ) -> Result<Option<CommentRequest>, Error> {
        self.require_user()?;

        if !self.tracker.begin(
            OperationKind::CommentSubmit,
            parent_id,
            OperationParams::Comment { body: body.clone() },
        ) {
            return Ok(None);
        }

        let bumped_from = self.posts.get_mut(parent_id).map(|post| {
            let before = post.children;
            post.children += 1;
            before
        });

        Ok(Some(CommentRequest {
            parent_id,
            body,
            bumped_from,
        }))
    }

    pub fn complete_comment(
        &mut self,
        request: CommentRequest,
        result: Result<Comment, Error>,
    ) -> ActionStatus {
        let CommentRequest {
            parent_id,
            bumped_from,
            ..
        } = request;

        self.finish(
            OperationKind::CommentSubmit,
            TargetId::Content(parent_id),
            result,
            |state, comment| {
                info!("Comment {} published under {}", comment.id, parent_id);
                state.comments.merge_comment(comment);
            },
            |state| {
                let before = match bumped_from {
                    Some(before) => before,
                    None => return,
                };
                match state.posts.get_mut(parent_id) {
                    // only undo our own bump; a refetched post already
                    // carries the server's count
                    Some(post) if post.children == before + 1 => post.children = before,
                    Some(post) => debug!(
                        "Post {} reply count refreshed to {} meanwhile, keeping it",
                        parent_id, post.children
                    ),
                    None => {}
                }
            },
        )
    }

    // feeds

    pub fn begin_feed_load(&mut self, key: FeedKey, more: bool, limit: u32) -> Option<FeedRequest> {
        let start_after = self.feeds.begin_load(&key, more)?;
        let start_after = start_after
            .and_then(|id| self.posts.get(id))
            .map(Post::post_ref);

        Some(FeedRequest {
            cursor: FeedCursor {
                key,
                start_after,
                limit,
            },
            more,
        })
    }

    pub fn complete_feed_load(
        &mut self,
        request: FeedRequest,
        result: Result<Vec<Post>, Error>,
    ) -> Result<usize, Error> {
        let FeedRequest { cursor, more } = request;

        match result {
            Ok(page) => {
                let ids: Vec<ContentId> = page.iter().map(|post| post.id).collect();
                self.posts.upsert_page(page);
                self.feeds.complete_load(&cursor.key, &ids, more, cursor.limit);
                debug!("Loaded {} posts into {:?}", ids.len(), cursor.key);
                Ok(ids.len())
            }
            Err(error) => {
                warn!("Failed to load feed {:?}: {}", cursor.key, error);
                self.feeds.fail_load(&cursor.key);
                Err(error)
            }
        }
    }

    // comment threads

    /// Switch the displayed discussion. Returns the post whose comments must
    /// be fetched, if the target changed; `None` hides comments.
    ///
    /// The comment store holds one discussion at a time: moving to another
    /// post starts from an empty store.
    pub fn begin_display_comments(&mut self, post_id: Option<ContentId>) -> Option<ContentId> {
        match post_id {
            None => {
                self.comments_target = None;
                self.comments_loading = false;
                None
            }
            Some(id) if self.comments_target == Some(id) => None,
            Some(id) => {
                if !self.comments.is_empty() {
                    debug!("Dropping {} comments of the previous discussion", self.comments.len());
                    self.comments = CommentStore::new();
                }
                self.comments_target = Some(id);
                self.comments_loading = true;
                Some(id)
            }
        }
    }

    pub fn begin_refresh_comments(&mut self) -> Option<ContentId> {
        let id = self.comments_target?;
        self.comments_loading = true;
        Some(id)
    }

    pub fn complete_comments(
        &mut self,
        post_id: ContentId,
        result: Result<Vec<CommentRecord>, Error>,
    ) -> Result<MergeSummary, Error> {
        if self.comments_target != Some(post_id) {
            debug!("Discarding comments of {}, no longer displayed", post_id);
            return result.map(|_| MergeSummary::default());
        }
        self.comments_loading = false;

        match result {
            Ok(page) => Ok(self.comments.merge_comment_page(page)),
            Err(error) => {
                warn!("Failed to load comments of {}: {}", post_id, error);
                Err(error)
            }
        }
    }

    fn require_user(&self) -> Result<&Username, Error> {
        self.user.as_ref().ok_or(Error::NotSignedIn)
    }

    fn votable(&self, id: ContentId) -> Option<&dyn Votable> {
        match self.posts.get(id) {
            Some(post) => Some(post as &dyn Votable),
            None => self.comments.get(id).map(|comment| comment as &dyn Votable),
        }
    }

    fn finish<T>(
        &mut self,
        kind: OperationKind,
        target: TargetId,
        result: Result<T, Error>,
        on_success: impl FnOnce(&mut Self, T),
        on_failure: impl FnOnce(&mut Self),
    ) -> ActionStatus {
        match result {
            Ok(value) => match self.tracker.resolve_success(kind, &target) {
                Some(_) => {
                    on_success(self, value);
                    ActionStatus::Confirmed
                }
                None => ActionStatus::Ignored,
            },
            Err(error) => match self.tracker.resolve_error(kind, &target) {
                Some(_) => {
                    on_failure(self);
                    ActionStatus::Reverted(Notice::error(error.to_string()))
                }
                None => ActionStatus::Ignored,
            },
        }
    }
}
