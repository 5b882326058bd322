// The outside world, as seen from the client core. Everything here runs on
// the caller's single logical thread, hence the `?Send` futures.

use async_trait::async_trait;
use busy_msg::{ActiveVote, Comment, CommentRecord, Post};
use busy_ref::{ContentId, PostRef, Username};
use serde::{Deserialize, Serialize};

use crate::{feed::FeedKey, Error, Level};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedCursor {
    pub key: FeedKey,
    /// Last post already loaded, `None` for the first page.
    pub start_after: Option<PostRef>,
    pub limit: u32,
}

/// Canonical votes of an item after a vote landed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct VoteResult {
    pub id: ContentId,
    pub active_votes: Vec<ActiveVote>,
}

#[async_trait(?Send)]
pub trait ContentFetcher {
    async fn fetch_comments(&self, post_id: ContentId) -> Result<Vec<CommentRecord>, Error>;

    async fn fetch_feed_page(&self, cursor: &FeedCursor) -> Result<Vec<Post>, Error>;
}

/// Each method is called at most once per pending operation.
#[async_trait(?Send)]
pub trait Mutations {
    async fn submit_vote(
        &self,
        target: ContentId,
        voter: &Username,
        percent: i32,
    ) -> Result<VoteResult, Error>;

    async fn submit_follow(&self, username: &Username) -> Result<(), Error>;

    async fn submit_unfollow(&self, username: &Username) -> Result<(), Error>;

    async fn submit_reblog(&self, post_id: ContentId) -> Result<(), Error>;

    async fn submit_bookmark_toggle(&self, post_id: ContentId) -> Result<(), Error>;

    async fn submit_comment(&self, parent_id: ContentId, body: &str) -> Result<Comment, Error>;
}

pub trait NotificationSink {
    fn notify(&self, message: &str, level: Level);
}
