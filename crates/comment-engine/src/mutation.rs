use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Comment, EntityRef, Reply};
use crate::reaction::ReactionState;
use crate::{CommentId, ReplyId};

/// A committed change to the comment state, in the form a persistence
/// backend would replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    CommentCreated {
        comment: Comment,
    },
    ReplyCreated {
        comment: CommentId,
        parent: Option<ReplyId>,
        reply: Reply,
    },
    ContentEdited {
        entity: EntityRef,
        content: String,
    },
    /// A comment removed along with every reply beneath it.
    CommentDeleted {
        comment: CommentId,
        replies: Vec<ReplyId>,
    },
    /// A reply subtree removed; `replies` starts with the subtree root.
    RepliesDeleted {
        comment: CommentId,
        replies: Vec<ReplyId>,
    },
    Reacted {
        entity: EntityRef,
        reaction: ReactionState,
    },
    RatingSubmitted {
        value: u8,
    },
    RatingEdited {
        previous: u8,
        value: u8,
    },
}

impl Mutation {
    /// The entity the mutation touched, if it is about one.
    pub fn entity(&self) -> Option<EntityRef> {
        match self {
            Mutation::CommentCreated { comment } => Some(comment.entity()),
            Mutation::ReplyCreated { comment, reply, .. } => Some(EntityRef::Reply {
                comment: *comment,
                reply: reply.id,
            }),
            Mutation::ContentEdited { entity, .. } | Mutation::Reacted { entity, .. } => {
                Some(*entity)
            }
            Mutation::CommentDeleted { comment, .. } => Some(EntityRef::Comment(*comment)),
            Mutation::RepliesDeleted { comment, replies } => {
                replies.first().map(|reply| EntityRef::Reply {
                    comment: *comment,
                    reply: *reply,
                })
            }
            Mutation::RatingSubmitted { .. } | Mutation::RatingEdited { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEntry {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub mutation: Mutation,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_entry_serializes_flat() {
        let entry = MutationEntry {
            at: Utc.with_ymd_and_hms(2026, 1, 5, 14, 30, 0).unwrap(),
            mutation: Mutation::RatingEdited {
                previous: 4,
                value: 2,
            },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "at": "2026-01-05T14:30:00Z",
                "type": "rating_edited",
                "previous": 4,
                "value": 2,
            })
        );
        let back: MutationEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_entity_of_reply_delete_is_subtree_root() {
        let mutation = Mutation::RepliesDeleted {
            comment: CommentId::new(1),
            replies: vec![ReplyId::new(12), ReplyId::new(13)],
        };
        assert_eq!(
            mutation.entity(),
            Some(EntityRef::Reply {
                comment: CommentId::new(1),
                reply: ReplyId::new(12),
            })
        );
        assert_eq!(Mutation::RatingSubmitted { value: 3 }.entity(), None);
    }
}
