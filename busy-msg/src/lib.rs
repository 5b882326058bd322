// Shapes of the content the blockchain API hands back. Only the fields the
// client reasons about are typed; everything else rides along untouched.

use busy_ref::{ContentId, Permlink, PostRef, Username};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DefaultOnError, DisplayFromStr, PickFirst, VecSkipError};
use std::convert::TryFrom;
use thiserror::Error as ThisError;

/// Vote weights are integer percents scaled by 100, so 10000 is 100.00%.
pub const FULL_WEIGHT: i32 = 10000;

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum MsgError {
    #[error("Comment is missing an id")]
    MissingId,
    #[error("Comment {id} is missing an author")]
    MissingAuthor { id: ContentId },
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ActiveVote {
    pub voter: Username,
    // the API is not consistent about numbers vs numeric strings
    #[serde_as(deserialize_as = "PickFirst<(_, DisplayFromStr)>")]
    pub percent: i32,
}

impl ActiveVote {
    pub fn new(voter: Username, percent: i32) -> Self {
        Self { voter, percent }
    }

    pub fn is_like(&self) -> bool {
        self.percent > 0
    }

    pub fn is_dislike(&self) -> bool {
        self.percent < 0
    }
}

/// Anything users can vote on.
pub trait Votable {
    fn id(&self) -> ContentId;

    fn active_votes(&self) -> &[ActiveVote];

    fn replace_active_votes(&mut self, votes: Vec<ActiveVote>);

    /// The first active vote cast by `user`, in list order.
    fn vote_of(&self, user: &Username) -> Option<&ActiveVote> {
        self.active_votes().iter().find(|vote| &vote.voter == user)
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Post {
    pub id: ContentId,
    pub author: Username,
    pub permlink: Permlink,
    #[serde_as(deserialize_as = "DefaultOnError<VecSkipError<_>>")]
    #[serde(default)]
    pub active_votes: Vec<ActiveVote>,
    /// Number of direct replies.
    #[serde_as(deserialize_as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub children: u32,
    /// Reward and metadata fields that are carried but never interpreted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    pub fn new(id: ContentId, author: Username, permlink: Permlink) -> Self {
        Self {
            id,
            author,
            permlink,
            active_votes: Vec::new(),
            children: 0,
            extra: Map::new(),
        }
    }

    pub fn with_vote(mut self, vote: ActiveVote) -> Self {
        self.active_votes.push(vote);
        self
    }

    pub fn post_ref(&self) -> PostRef {
        PostRef::new(self.author.clone(), self.permlink.clone())
    }
}

impl Votable for Post {
    fn id(&self) -> ContentId {
        self.id
    }

    fn active_votes(&self) -> &[ActiveVote] {
        &self.active_votes
    }

    fn replace_active_votes(&mut self, votes: Vec<ActiveVote>) {
        self.active_votes = votes;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Comment {
    pub id: ContentId,
    pub author: Username,
    pub body: String,
    /// ISO 8601 creation time as sent by the API.
    pub created: String,
    pub score: i64,
    /// `None` for top-level content (the root post itself).
    pub parent_id: Option<ContentId>,
    #[serde(default)]
    pub active_votes: Vec<ActiveVote>,
}

impl Comment {
    pub fn new(id: ContentId, author: Username, parent_id: Option<ContentId>) -> Self {
        Self {
            id,
            author,
            body: String::new(),
            created: String::new(),
            score: 0,
            parent_id,
            active_votes: Vec::new(),
        }
    }
}

impl Votable for Comment {
    fn id(&self) -> ContentId {
        self.id
    }

    fn active_votes(&self) -> &[ActiveVote] {
        &self.active_votes
    }

    fn replace_active_votes(&mut self, votes: Vec<ActiveVote>) {
        self.active_votes = votes;
    }
}

/// A comment as delivered in a fetched page, before validation.
///
/// Malformed fields decode to their default instead of failing the whole
/// page, so one bad entry cannot hide its siblings.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommentRecord {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub id: Option<ContentId>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub author: Option<Username>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub body: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub created: String,
    #[serde_as(deserialize_as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub score: i64,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub parent_id: Option<ContentId>,
    #[serde_as(deserialize_as = "DefaultOnError<VecSkipError<_>>")]
    #[serde(default)]
    pub active_votes: Vec<ActiveVote>,
}

impl TryFrom<CommentRecord> for Comment {
    type Error = MsgError;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        let id = record.id.ok_or(MsgError::MissingId)?;
        let author = record.author.ok_or(MsgError::MissingAuthor { id })?;
        Ok(Comment {
            id,
            author,
            body: record.body,
            created: record.created,
            score: record.score,
            parent_id: record.parent_id,
            active_votes: record.active_votes,
        })
    }
}

impl From<Comment> for CommentRecord {
    fn from(comment: Comment) -> Self {
        CommentRecord {
            id: Some(comment.id),
            author: Some(comment.author),
            body: comment.body,
            created: comment.created,
            score: comment.score,
            parent_id: comment.parent_id,
            active_votes: comment.active_votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alice() -> Username {
        "alice".parse().unwrap()
    }

    #[test]
    fn test_post_keeps_uninterpreted_fields() {
        let post: Post = serde_json::from_value(json!({
            "id": 10,
            "author": "alice",
            "permlink": "hello-world",
            "children": "3",
            "pending_payout_value": "1.234 SBD",
            "active_votes": [
                { "voter": "bob", "percent": 10000, "rshares": "12345" },
                { "voter": "carol", "percent": "-5000" }
            ]
        }))
        .unwrap();

        assert_eq!(post.id, ContentId(10));
        assert_eq!(post.children, 3);
        assert_eq!(post.active_votes.len(), 2);
        assert_eq!(post.active_votes[1].percent, -5000);
        assert_eq!(post.extra.get("pending_payout_value"), Some(&json!("1.234 SBD")));
        assert_eq!(post.post_ref().to_string(), "@alice/hello-world");
    }

    #[test]
    fn test_post_skips_bad_votes() {
        let post: Post = serde_json::from_value(json!({
            "id": 11,
            "author": "alice",
            "permlink": "p",
            "active_votes": [
                { "voter": "NOT A NAME", "percent": 100 },
                { "voter": "bob", "percent": 100 }
            ]
        }))
        .unwrap();

        assert_eq!(post.active_votes.len(), 1);
        assert_eq!(post.active_votes[0].voter.as_str(), "bob");
    }

    #[test]
    fn test_record_without_id() {
        let record: CommentRecord = serde_json::from_value(json!({
            "id": "not a number",
            "author": "alice",
            "body": "hi"
        }))
        .unwrap();

        assert_eq!(record.id, None);
        assert_eq!(Comment::try_from(record), Err(MsgError::MissingId));
    }

    #[test]
    fn test_record_into_comment() {
        let record: CommentRecord = serde_json::from_value(json!({
            "id": 2,
            "author": "alice",
            "body": "a reply",
            "created": "2017-08-01T12:00:00",
            "score": 4,
            "parent_id": 1
        }))
        .unwrap();

        let comment = Comment::try_from(record).unwrap();
        assert_eq!(comment.id, ContentId(2));
        assert_eq!(comment.parent_id, Some(ContentId(1)));
        assert_eq!(comment.author, alice());
        assert!(comment.active_votes.is_empty());
    }

    #[test]
    fn test_record_without_author() {
        let record = CommentRecord {
            id: Some(ContentId(5)),
            ..CommentRecord::default()
        };
        assert_eq!(
            Comment::try_from(record),
            Err(MsgError::MissingAuthor { id: ContentId(5) })
        );
    }

    #[test]
    fn test_first_vote_wins() {
        let post = Post::new(ContentId(1), alice(), "p".parse().unwrap())
            .with_vote(ActiveVote::new(alice(), -10000))
            .with_vote(ActiveVote::new(alice(), 10000));

        let vote = post.vote_of(&alice()).unwrap();
        assert!(vote.is_dislike());
        assert!(post.vote_of(&"bob".parse().unwrap()).is_none());
    }
}
