use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reaction::ReactionState;
use crate::reply_tree::ReplyTree;
use crate::{CommentId, Error, ReplyId, UserId};

const DEFAULT_RATING_GIVEN: u8 = 5;

/// The signed-in user, as injected by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub organization: String,
}

/// Address of anything that can be reacted to, edited or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    Comment(CommentId),
    Reply { comment: CommentId, reply: ReplyId },
}

impl EntityRef {
    pub fn comment_id(self) -> CommentId {
        match self {
            EntityRef::Comment(comment) => comment,
            EntityRef::Reply { comment, .. } => comment,
        }
    }

    pub fn reply_id(self) -> Option<ReplyId> {
        match self {
            EntityRef::Comment(_) => None,
            EntityRef::Reply { reply, .. } => Some(reply),
        }
    }

    pub fn is_reply(self) -> bool {
        matches!(self, EntityRef::Reply { .. })
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityRef::Comment(comment) => write!(f, "comment {}", comment),
            EntityRef::Reply { comment, reply } => {
                write!(f, "reply {} of comment {}", reply, comment)
            }
        }
    }
}

/// A top-level comment on an event, owning its whole reply tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CommentRecord", into = "CommentRecord")]
pub struct Comment {
    pub id: CommentId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: String,
    /// Star rating (1..5) the author had given when posting.
    pub rating_given: u8,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub reaction: ReactionState,
    pub replies: ReplyTree,
}

impl Comment {
    /// Number of depth-1 replies, derived from the tree so it cannot drift.
    pub fn reply_count(&self) -> usize {
        self.replies.depth1_count()
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef::Comment(self.id)
    }
}

/// A single reply. Its children live in the owning [`ReplyTree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: ReplyId,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Author of the reply this one answers, rendered as an `@` mention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_name: Option<String>,
    #[serde(flatten)]
    pub reaction: ReactionState,
}

impl Reply {
    /// Content with the mention prefix the view shows, e.g. `@Alice thanks!`.
    pub fn display_content(&self) -> String {
        match &self.reply_to_name {
            Some(name) => format!("@{} {}", name, self.content),
            None => self.content.clone(),
        }
    }
}

/// Serialized form of a comment: replies as a flat list, `reply_count`
/// emitted for consumers that do not walk the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CommentRecord {
    id: CommentId,
    author_id: UserId,
    author_name: String,
    #[serde(default)]
    author_avatar: String,
    #[serde(default = "default_rating_given")]
    rating_given: u8,
    content: String,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    reaction: ReactionState,
    #[serde(default)]
    reply_count: usize,
    #[serde(default)]
    replies: Vec<ReplyRecord>,
}

/// Serialized form of a reply: the reply plus the id of the reply it
/// answers, absent at depth 1. Keeping the list flat keeps the JSON depth
/// constant however long a thread gets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ReplyRecord {
    #[serde(flatten)]
    pub(crate) reply: Reply,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent: Option<ReplyId>,
}

fn default_rating_given() -> u8 {
    DEFAULT_RATING_GIVEN
}

impl TryFrom<CommentRecord> for Comment {
    type Error = Error;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        let replies =
            ReplyTree::from_records(record.replies).map_err(|err| err.in_comment(record.id))?;
        if record.reply_count != 0 && record.reply_count != replies.depth1_count() {
            log::warn!(
                "comment {} declares reply_count={} but holds {} depth-1 replies; using the tree",
                record.id,
                record.reply_count,
                replies.depth1_count()
            );
        }
        Ok(Comment {
            id: record.id,
            author_id: record.author_id,
            author_name: record.author_name,
            author_avatar: record.author_avatar,
            rating_given: record.rating_given,
            content: record.content,
            created_at: record.created_at,
            reaction: record.reaction,
            replies,
        })
    }
}

impl From<Comment> for CommentRecord {
    fn from(comment: Comment) -> Self {
        CommentRecord {
            reply_count: comment.reply_count(),
            replies: comment.replies.to_records(),
            id: comment.id,
            author_id: comment.author_id,
            author_name: comment.author_name,
            author_avatar: comment.author_avatar,
            rating_given: comment.rating_given,
            content: comment.content,
            created_at: comment.created_at,
            reaction: comment.reaction,
        }
    }
}
