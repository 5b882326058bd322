use busy_msg::Post;
use busy_ref::ContentId;
use itertools::Itertools;
use log::debug;
use std::collections::HashMap;

use crate::posts::PostsCache;

/// Which listing: a sort order and the tag, user or "all" it applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub sort_by: String,
    pub category: String,
}

impl FeedKey {
    pub fn new(sort_by: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            sort_by: sort_by.into(),
            category: category.into(),
        }
    }

    pub fn bookmarks() -> Self {
        Self::new("bookmarks", "all")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedList {
    pub ids: Vec<ContentId>,
    pub is_fetching: bool,
    pub has_more: bool,
}

impl Default for FeedList {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            is_fetching: false,
            has_more: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FeedStore {
    feeds: HashMap<FeedKey, FeedList>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FeedKey) -> Option<&FeedList> {
        self.feeds.get(key)
    }

    pub fn is_fetching(&self, key: &FeedKey) -> bool {
        self.get(key).map(|list| list.is_fetching).unwrap_or(false)
    }

    pub fn has_more(&self, key: &FeedKey) -> bool {
        self.get(key).map(|list| list.has_more).unwrap_or(true)
    }

    /// Mark `key` as loading. Returns the id to continue after, wrapped in
    /// `Some`, or `None` if no request should go out.
    pub(crate) fn begin_load(&mut self, key: &FeedKey, more: bool) -> Option<Option<ContentId>> {
        let list = self.feeds.entry(key.clone()).or_default();
        if list.is_fetching {
            debug!("Feed {:?} is already loading", key);
            return None;
        }
        if more && !list.has_more {
            debug!("Feed {:?} has no more pages", key);
            return None;
        }

        list.is_fetching = true;
        Some(if more { list.ids.last().copied() } else { None })
    }

    /// Store a loaded page. A first page replaces the list, later pages
    /// extend it; an id is never listed twice.
    pub(crate) fn complete_load(
        &mut self,
        key: &FeedKey,
        page: &[ContentId],
        more: bool,
        page_size: u32,
    ) {
        let list = self.feeds.entry(key.clone()).or_default();
        let previous: &[ContentId] = if more { &list.ids } else { &[] };

        list.ids = previous.iter().chain(page).copied().unique().collect();
        list.has_more = page.len() >= page_size as usize;
        list.is_fetching = false;
    }

    pub(crate) fn fail_load(&mut self, key: &FeedKey) {
        if let Some(list) = self.feeds.get_mut(key) {
            list.is_fetching = false;
        }
    }

    pub fn feed_content<'a>(&self, key: &FeedKey, posts: &'a PostsCache) -> Vec<&'a Post> {
        self.get(key)
            .map(|list| list.ids.iter().filter_map(|id| posts.get(*id)).collect())
            .unwrap_or_default()
    }
}
