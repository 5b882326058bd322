use busy_msg::{ActiveVote, Post, Votable};
use busy_ref::{ContentId, PostRef};
use log::trace;
use std::collections::HashMap;

/// Every post seen in any feed, keyed by id. Later copies replace earlier
/// ones wholesale.
#[derive(Clone, Debug, Default)]
pub struct PostsCache {
    posts: HashMap<ContentId, Post>,
}

impl PostsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, post: Post) {
        trace!("Caching post {} ({})", post.id, post.post_ref());
        self.posts.insert(post.id, post);
    }

    pub fn upsert_page(&mut self, page: impl IntoIterator<Item = Post>) {
        for post in page {
            self.upsert(post);
        }
    }

    pub fn get(&self, id: ContentId) -> Option<&Post> {
        self.posts.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ContentId) -> Option<&mut Post> {
        self.posts.get_mut(&id)
    }

    pub fn contains(&self, id: ContentId) -> bool {
        self.posts.contains_key(&id)
    }

    pub fn get_by_ref(&self, post_ref: &PostRef) -> Option<&Post> {
        self.posts
            .values()
            .find(|post| post.author == post_ref.author && post.permlink == post_ref.permlink)
    }

    pub fn update_votes(&mut self, id: ContentId, votes: Vec<ActiveVote>) -> bool {
        match self.posts.get_mut(&id) {
            Some(post) => {
                post.replace_active_votes(votes);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, author: &str, permlink: &str) -> Post {
        Post::new(ContentId(id), author.parse().unwrap(), permlink.parse().unwrap())
    }

    #[test]
    fn test_get_by_ref() {
        let mut cache = PostsCache::new();
        cache.upsert_page(vec![post(1, "alice", "first"), post(2, "bob", "first")]);

        let found = cache.get_by_ref(&"@bob/first".parse().unwrap()).unwrap();
        assert_eq!(found.id, ContentId(2));
        assert!(cache.get_by_ref(&"@carol/first".parse().unwrap()).is_none());
    }

    #[test]
    fn test_upsert_replaces() {
        let mut cache = PostsCache::new();
        cache.upsert(post(1, "alice", "first"));
        let mut updated = post(1, "alice", "first");
        updated.children = 4;
        cache.upsert(updated);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(ContentId(1)).unwrap().children, 4);
    }

    #[test]
    fn test_update_votes() {
        let mut cache = PostsCache::new();
        cache.upsert(post(1, "alice", "first"));
        let vote = ActiveVote::new("bob".parse().unwrap(), 10000);

        assert!(cache.update_votes(ContentId(1), vec![vote.clone()]));
        assert_eq!(cache.get(ContentId(1)).unwrap().active_votes, vec![vote]);
        assert!(!cache.update_votes(ContentId(9), Vec::new()));
    }
}
