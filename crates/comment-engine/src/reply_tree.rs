use std::collections::HashMap;

use crate::config::DEFAULT_MAX_DISPLAY_DEPTH;
use crate::model::{EntityRef, Reply, ReplyRecord};
use crate::{CommentId, Error, ReplyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("reply {0} not found")]
    NotFound(ReplyId),
    #[error("reply id {0} already used in this tree")]
    DuplicateId(ReplyId),
}

impl TreeError {
    /// Attach the owning comment so the error can name the full entity.
    pub(crate) fn in_comment(self, comment: CommentId) -> Error {
        match self {
            TreeError::NotFound(reply) => Error::NotFound {
                entity: EntityRef::Reply { comment, reply },
            },
            TreeError::DuplicateId(reply) => Error::DuplicateId {
                entity: EntityRef::Reply { comment, reply },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    reply: Reply,
    parent: Option<ReplyId>,
    children: Vec<ReplyId>,
}

/// The replies of one comment, nested to any depth.
///
/// Nodes live in a flat map keyed by id, each remembering its parent and its
/// children in insertion order, so lookups, edits and subtree deletes never
/// rebuild the tree. Reply ids are unique across the whole tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyTree {
    nodes: HashMap<ReplyId, Node>,
    depth1: Vec<ReplyId>,
}

impl ReplyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of replies at every depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ReplyId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn find(&self, id: ReplyId) -> Option<&Reply> {
        self.nodes.get(&id).map(|node| &node.reply)
    }

    pub(crate) fn find_mut(&mut self, id: ReplyId) -> Option<&mut Reply> {
        self.nodes.get_mut(&id).map(|node| &mut node.reply)
    }

    /// Replies attached directly to the comment, oldest first.
    pub fn depth1(&self) -> &[ReplyId] {
        &self.depth1
    }

    pub fn depth1_count(&self) -> usize {
        self.depth1.len()
    }

    pub fn children(&self, id: ReplyId) -> Option<&[ReplyId]> {
        self.nodes.get(&id).map(|node| node.children.as_slice())
    }

    pub fn parent_of(&self, id: ReplyId) -> Option<ReplyId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Append `reply` under `parent`, or at depth 1 when `parent` is `None`.
    pub fn insert(&mut self, parent: Option<ReplyId>, reply: Reply) -> Result<(), TreeError> {
        let id = reply.id;
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        match parent {
            Some(parent_id) => {
                let parent_node = self
                    .nodes
                    .get_mut(&parent_id)
                    .ok_or(TreeError::NotFound(parent_id))?;
                parent_node.children.push(id);
            }
            None => self.depth1.push(id),
        }
        self.nodes.insert(
            id,
            Node {
                reply,
                parent,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    /// Replace the content of one reply, returning the previous content.
    pub fn update_content(&mut self, id: ReplyId, content: String) -> Result<String, TreeError> {
        let reply = self.find_mut(id).ok_or(TreeError::NotFound(id))?;
        Ok(std::mem::replace(&mut reply.content, content))
    }

    /// Remove a reply together with all of its descendants.
    ///
    /// Returns the removed ids in depth-first order, starting with `id`.
    pub fn delete_subtree(&mut self, id: ReplyId) -> Result<Vec<ReplyId>, TreeError> {
        let parent = self
            .nodes
            .get(&id)
            .ok_or(TreeError::NotFound(id))?
            .parent;
        match parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    parent_node.children.retain(|child| *child != id);
                }
            }
            None => self.depth1.retain(|root| *root != id),
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                removed.push(next);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(removed)
    }

    /// Nesting depth of a reply, 1 for replies attached to the comment.
    pub fn nesting_depth(&self, id: ReplyId) -> Option<usize> {
        let mut node = self.nodes.get(&id)?;
        let mut depth = 1;
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Indent level used for layout: the nesting depth saturated at `cap`.
    pub fn display_depth(&self, id: ReplyId, cap: usize) -> Option<usize> {
        self.nesting_depth(id).map(|depth| depth.min(cap.max(1)))
    }

    /// [`Self::display_depth`] with the default cap of 3.
    pub fn depth_of(&self, id: ReplyId) -> Option<usize> {
        self.display_depth(id, DEFAULT_MAX_DISPLAY_DEPTH)
    }

    /// Depth-first, pre-order walk yielding each reply with its display depth.
    pub fn walk(&self, cap: usize) -> Walk<'_> {
        Walk {
            tree: self,
            cap: cap.max(1),
            stack: self.depth1.iter().rev().map(|id| (1, *id)).collect(),
        }
    }

    /// Every reply id in walk order.
    pub fn ids(&self) -> Vec<ReplyId> {
        self.walk(usize::MAX).map(|(_, reply)| reply.id).collect()
    }

    /// Every reply, mutably, in no particular order.
    pub(crate) fn replies_mut(&mut self) -> impl Iterator<Item = &mut Reply> {
        self.nodes.values_mut().map(|node| &mut node.reply)
    }

    /// Rebuild a tree from flat records. A record's parent has to appear
    /// before it, which [`Self::to_records`] guarantees.
    pub(crate) fn from_records(records: Vec<ReplyRecord>) -> Result<Self, TreeError> {
        let mut tree = ReplyTree::new();
        for record in records {
            tree.insert(record.parent, record.reply)?;
        }
        Ok(tree)
    }

    /// Flat records in walk order, so parents always precede their children.
    pub(crate) fn to_records(&self) -> Vec<ReplyRecord> {
        self.walk(usize::MAX)
            .map(|(_, reply)| ReplyRecord {
                parent: self.parent_of(reply.id),
                reply: reply.clone(),
            })
            .collect()
    }
}

/// Iterator returned by [`ReplyTree::walk`].
pub struct Walk<'a> {
    tree: &'a ReplyTree,
    cap: usize,
    stack: Vec<(usize, ReplyId)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Reply);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let (depth, id) = self.stack.pop()?;
            let Some(node) = tree.nodes.get(&id) else {
                continue;
            };
            self.stack.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|child| (depth.saturating_add(1), *child)),
            );
            return Some((depth.min(self.cap), &node.reply));
        }
    }
}
