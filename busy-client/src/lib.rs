//! Client core: wires the comment store, the interaction tracker and the view
//! resolver to the fetch and mutation capabilities supplied by the host.

use busy_pending::{OperationKind, Toggle};
use busy_ref::{ContentId, Username};
use busy_threads::{MergeSummary, ThreadView};
use busy_view::{Collections, CommentViewState, PostViewState, VoteAction};
use log::{debug, info};
use thiserror::Error as ThisError;

mod capability;
mod config;
mod debounce;
mod feed;
mod posts;
mod state;

pub use capability::{ContentFetcher, FeedCursor, Mutations, NotificationSink, VoteResult};
pub use config::ClientConfig;
pub use debounce::Debouncer;
pub use feed::{FeedKey, FeedList, FeedStore};
pub use posts::PostsCache;
pub use state::{
    BookmarkRequest, CommentRequest, FeedRequest, FollowRequest, ReblogRequest, State,
    VoteRequest,
};

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Failed to fetch {what}, cause: {reason}")]
    Fetch { what: String, reason: String },
    #[error("Failed to submit {kind}, cause: {reason}")]
    Mutation { kind: OperationKind, reason: String },
    #[error("Config error, cause: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Content {0} is not loaded")]
    UnknownContent(ContentId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// A user-visible message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub level: Level,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: Level::Error,
        }
    }
}

/// How an action ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionStatus {
    /// Nothing was sent: the same action is already in flight, or there was
    /// nothing to do.
    Ignored,
    Confirmed,
    Reverted(Notice),
}

pub struct Client<F, M, N> {
    config: ClientConfig,
    fetcher: F,
    mutations: M,
    notifier: N,
    state: State,
}

impl<F, M, N> Client<F, M, N>
where
    F: ContentFetcher,
    M: Mutations,
    N: NotificationSink,
{
    pub fn new(config: ClientConfig, fetcher: F, mutations: M, notifier: N) -> Self {
        let state = State::new(config.username.clone());
        info!(
            "Client ready for {}",
            config
                .username
                .as_ref()
                .map(Username::as_str)
                .unwrap_or("anonymous visitor")
        );

        Self {
            config,
            fetcher,
            mutations,
            notifier,
            state,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn mutations(&self) -> &M {
        &self.mutations
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn load_collections(&mut self, collections: Collections) {
        self.state.replace_collections(collections);
    }

    /// A debouncer for editor drafts using the configured quiet period.
    pub fn draft_saver<T>(&self) -> Debouncer<T> {
        Debouncer::new(self.config.draft_quiet_period())
    }

    pub fn post_state(&self, id: ContentId) -> Option<PostViewState> {
        self.state.post_state(id)
    }

    pub fn comment_state(&self, id: ContentId) -> Option<CommentViewState> {
        self.state.comment_state(id)
    }

    pub fn thread(&self, root: ContentId) -> ThreadView {
        self.state.thread(root)
    }

    pub async fn like_post(&mut self, post_id: ContentId) -> Result<ActionStatus, Error> {
        self.vote(post_id, VoteAction::Like).await
    }

    pub async fn dislike_post(&mut self, post_id: ContentId) -> Result<ActionStatus, Error> {
        self.vote(post_id, VoteAction::Dislike).await
    }

    pub async fn vote_comment(
        &mut self,
        comment_id: ContentId,
        action: VoteAction,
    ) -> Result<ActionStatus, Error> {
        self.vote(comment_id, action).await
    }

    async fn vote(&mut self, target: ContentId, action: VoteAction) -> Result<ActionStatus, Error> {
        let request = match self.state.begin_vote(target, action)? {
            Some(request) => request,
            None => return Ok(ActionStatus::Ignored),
        };

        let result = self
            .mutations
            .submit_vote(request.target, &request.voter, request.percent)
            .await;
        let status = self.state.complete_vote(request, result);
        Ok(self.surface(status))
    }

    pub async fn toggle_follow(&mut self, username: Username) -> Result<ActionStatus, Error> {
        let request = match self.state.begin_follow(username)? {
            Some(request) => request,
            None => return Ok(ActionStatus::Ignored),
        };

        let result = match request.toggle {
            Toggle::Add => self.mutations.submit_follow(&request.username).await,
            Toggle::Remove => self.mutations.submit_unfollow(&request.username).await,
        };
        let status = self.state.complete_follow(request, result);
        Ok(self.surface(status))
    }

    pub async fn reblog(&mut self, post_id: ContentId) -> Result<ActionStatus, Error> {
        let request = match self.state.begin_reblog(post_id)? {
            Some(request) => request,
            None => return Ok(ActionStatus::Ignored),
        };

        let result = self.mutations.submit_reblog(request.post_id).await;
        let status = self.state.complete_reblog(request, result);
        Ok(self.surface(status))
    }

    pub async fn toggle_bookmark(&mut self, post_id: ContentId) -> Result<ActionStatus, Error> {
        let request = match self.state.begin_bookmark_toggle(post_id)? {
            Some(request) => request,
            None => return Ok(ActionStatus::Ignored),
        };

        let result = self.mutations.submit_bookmark_toggle(request.post_id).await;
        let status = self.state.complete_bookmark_toggle(request, result);
        Ok(self.surface(status))
    }

    pub async fn send_comment(
        &mut self,
        parent_id: ContentId,
        body: impl Into<String>,
    ) -> Result<ActionStatus, Error> {
        let request = match self.state.begin_comment(parent_id, body.into())? {
            Some(request) => request,
            None => return Ok(ActionStatus::Ignored),
        };

        let result = self
            .mutations
            .submit_comment(request.parent_id, &request.body)
            .await;
        let status = self.state.complete_comment(request, result);
        Ok(self.surface(status))
    }

    /// Load the first page of a feed. Returns the number of posts received,
    /// zero when a load for that feed is already running.
    pub async fn load_feed(&mut self, key: FeedKey) -> Result<usize, Error> {
        self.fetch_feed(key, false).await
    }

    pub async fn load_more_feed(&mut self, key: FeedKey) -> Result<usize, Error> {
        self.fetch_feed(key, true).await
    }

    async fn fetch_feed(&mut self, key: FeedKey, more: bool) -> Result<usize, Error> {
        let request = match self
            .state
            .begin_feed_load(key, more, self.config.feed_page_size)
        {
            Some(request) => request,
            None => {
                debug!("Feed load skipped");
                return Ok(0);
            }
        };

        let result = self.fetcher.fetch_feed_page(&request.cursor).await;
        self.state.complete_feed_load(request, result)
    }

    /// Show the discussion of `post_id`, fetching it only when the displayed
    /// post changes. `None` hides the comments.
    pub async fn display_comments(
        &mut self,
        post_id: Option<ContentId>,
    ) -> Result<Option<MergeSummary>, Error> {
        match self.state.begin_display_comments(post_id) {
            Some(id) => self.fetch_comments(id).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn refresh_comments(&mut self) -> Result<Option<MergeSummary>, Error> {
        match self.state.begin_refresh_comments() {
            Some(id) => self.fetch_comments(id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_comments(&mut self, post_id: ContentId) -> Result<MergeSummary, Error> {
        let result = self.fetcher.fetch_comments(post_id).await;
        self.state.complete_comments(post_id, result)
    }

    fn surface(&self, status: ActionStatus) -> ActionStatus {
        if let ActionStatus::Reverted(notice) = &status {
            self.notifier.notify(&notice.message, notice.level);
        }
        status
    }
}
