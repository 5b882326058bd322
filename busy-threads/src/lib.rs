//! Normalized comment storage and the nested thread views built from it.

use busy_msg::{ActiveVote, Comment, CommentRecord, Votable};
use busy_ref::ContentId;
use log::{debug, trace, warn};
use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    convert::TryFrom,
    slice,
};

/// Every comment fetched so far, plus the parent -> children index.
///
/// Children keep the order they were first merged in. Merging only ever adds
/// or replaces, so refetching a page cannot drop a subtree already loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommentStore {
    comments_by_id: HashMap<ContentId, Comment>,
    children_by_parent: HashMap<ContentId, Vec<ContentId>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub merged: usize,
    pub dropped: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadNode {
    pub id: ContentId,
    /// `None` when the id is referenced but its comment is not loaded yet.
    pub comment: Option<Comment>,
    pub children: Vec<ThreadNode>,
}

pub type ThreadView = Vec<ThreadNode>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThreadOrder {
    #[default]
    Merged,
    Trending,
    Newest,
    Oldest,
}

const NO_CHILDREN: &[ContentId] = &[];

struct Frame<'a> {
    node: ThreadNode,
    pending: slice::Iter<'a, ContentId>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_comment_page<I>(&mut self, page: I) -> MergeSummary
    where
        I: IntoIterator<Item = CommentRecord>,
    {
        let mut summary = MergeSummary::default();

        for record in page {
            match Comment::try_from(record) {
                Ok(comment) => {
                    self.merge_comment(comment);
                    summary.merged += 1;
                }
                Err(error) => {
                    warn!("Dropping malformed comment: {}", error);
                    summary.dropped += 1;
                }
            }
        }

        debug!(
            "Merged comment page: {} merged, {} dropped, {} stored",
            summary.merged,
            summary.dropped,
            self.comments_by_id.len()
        );

        summary
    }

    pub fn merge_comment(&mut self, comment: Comment) {
        let id = comment.id;
        self.children_by_parent.entry(id).or_default();

        // a comment has one parent, so the stored copy says where it is linked
        let linked_under = self
            .comments_by_id
            .get(&id)
            .and_then(|stored| stored.parent_id)
            .filter(|&parent_id| parent_id != id);

        match comment.parent_id {
            Some(parent_id) if parent_id == id => {
                warn!("Comment {} names itself as parent, not linking", id);
                self.unlink(id, linked_under);
            }
            Some(parent_id) if linked_under == Some(parent_id) => {}
            Some(parent_id) => {
                self.unlink(id, linked_under);
                self.children_by_parent.entry(parent_id).or_default().push(id);
            }
            None => self.unlink(id, linked_under),
        }

        self.comments_by_id.insert(id, comment);
    }

    fn unlink(&mut self, id: ContentId, parent_id: Option<ContentId>) {
        let parent_id = match parent_id {
            Some(parent_id) => parent_id,
            None => return,
        };
        if let Some(siblings) = self.children_by_parent.get_mut(&parent_id) {
            debug!("Comment {} moved away from parent {}", id, parent_id);
            siblings.retain(|&sibling| sibling != id);
        }
    }

    pub fn get(&self, id: ContentId) -> Option<&Comment> {
        self.comments_by_id.get(&id)
    }

    pub fn contains(&self, id: ContentId) -> bool {
        self.comments_by_id.contains_key(&id)
    }

    pub fn children_of(&self, id: ContentId) -> &[ContentId] {
        self.children_by_parent
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.comments_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments_by_id.is_empty()
    }

    /// Replace the canonical votes of a stored comment. Returns false if the
    /// comment is unknown.
    pub fn update_votes(&mut self, id: ContentId, votes: Vec<ActiveVote>) -> bool {
        match self.comments_by_id.get_mut(&id) {
            Some(comment) => {
                comment.replace_active_votes(votes);
                true
            }
            None => false,
        }
    }

    /// Nested view of the discussion under `root`.
    ///
    /// If `root` is itself a stored comment (the root post came back inside
    /// the page) the view is that single node; otherwise it is the list of
    /// `root`'s replies.
    pub fn build_thread(&self, root: ContentId) -> ThreadView {
        let mut visited = HashSet::new();

        if self.contains(root) {
            self.build_forest(slice::from_ref(&root), &mut visited)
        } else {
            visited.insert(root);
            self.build_forest(self.children_of(root), &mut visited)
        }
    }

    // Depth-first, with an explicit stack so deep threads cannot overflow.
    // Ids already emitted are skipped, which also breaks cycles.
    fn build_forest(&self, roots: &[ContentId], visited: &mut HashSet<ContentId>) -> ThreadView {
        let mut forest = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut roots = roots.iter();

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.pending.next(),
                None => roots.next(),
            };

            match next {
                Some(&id) => {
                    if !visited.insert(id) {
                        trace!("Comment {} already in thread, skipping", id);
                        continue;
                    }
                    stack.push(self.frame(id));
                }
                None => match stack.pop() {
                    Some(frame) => match stack.last_mut() {
                        Some(parent) => parent.node.children.push(frame.node),
                        None => forest.push(frame.node),
                    },
                    None => break,
                },
            }
        }

        forest
    }

    fn frame(&self, id: ContentId) -> Frame<'_> {
        let comment = self.comments_by_id.get(&id).cloned();
        let pending = match comment {
            Some(_) => self.children_of(id).iter(),
            None => {
                trace!("Comment {} not loaded, rendering as empty leaf", id);
                NO_CHILDREN.iter()
            }
        };

        Frame {
            node: ThreadNode {
                id,
                comment,
                children: Vec::new(),
            },
            pending,
        }
    }
}

/// Reorder every level of a built view. Ties keep their merged order and
/// unloaded nodes sink to the end.
pub fn sort_thread(view: &mut ThreadView, order: ThreadOrder) {
    if order == ThreadOrder::Merged {
        return;
    }

    let mut stack: Vec<&mut ThreadView> = vec![view];
    while let Some(level) = stack.pop() {
        level.sort_by(|a, b| compare_nodes(a, b, order));
        for node in level {
            stack.push(&mut node.children);
        }
    }
}

fn compare_nodes(a: &ThreadNode, b: &ThreadNode, order: ThreadOrder) -> Ordering {
    match (&a.comment, &b.comment) {
        (Some(a), Some(b)) => match order {
            ThreadOrder::Merged => Ordering::Equal,
            ThreadOrder::Trending => b.score.cmp(&a.score),
            ThreadOrder::Newest => b.created.cmp(&a.created),
            ThreadOrder::Oldest => a.created.cmp(&b.created),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
