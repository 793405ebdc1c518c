mod event_id;
mod numeric_id;

pub use event_id::EventId;
pub use numeric_id::{CommentId, ReplyId, UserId};
