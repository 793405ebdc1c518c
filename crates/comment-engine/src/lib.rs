mod clock;
mod config;
mod model;
mod mutation;
mod overlay;
mod rating;
mod reaction;
mod relative_time;
mod reply_tree;
mod session;
mod sort;

pub use clock::{Clock, SystemClock};
pub use comment_types::{CommentId, EventId, ReplyId, UserId};
pub use config::EngineConfig;
pub use model::{Comment, EntityRef, Reply, User};
pub use mutation::{Mutation, MutationEntry};
pub use overlay::{DismissGesture, MenuHost, Overlay, OverlayCoordinator};
pub use rating::{Rating, Star};
pub use reaction::ReactionState;
pub use relative_time::{RelativeAge, relative_age};
pub use reply_tree::{ReplyTree, TreeError, Walk};
pub use session::{CommentSession, EditDraft, EventSnapshot, Removed};
pub use sort::{SortMode, sort_comments};

/// Failures of a comment use-case.
///
/// Every variant is local and recoverable: the operation that produced it left
/// the session unchanged. Serializes with a `type` tag so a host can forward
/// it to the view layer as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Error {
    #[error("Content is empty")]
    EmptyContent,
    #[error("Content too long: {len} characters (max {max})")]
    ContentTooLong { len: usize, max: usize },
    #[error("Event already rated")]
    AlreadyRated,
    #[error("Event not rated yet")]
    NotRated,
    #[error("Invalid rating: {value} (expected 1 to 5)")]
    InvalidRating { value: u8 },
    #[error("Current user is not the author of {entity}")]
    Unauthorized { entity: EntityRef },
    #[error("Not found: {entity}")]
    NotFound { entity: EntityRef },
    #[error("Duplicate id: {entity}")]
    DuplicateId { entity: EntityRef },
    #[error("Cannot open while {active} is active")]
    OverlayBusy { active: &'static str },
    #[error("No {expected} is open")]
    NoActiveOverlay { expected: &'static str },
    #[error("No ids left to allocate")]
    IdsExhausted,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Outcome signal handed to the host, which turns it into a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Success,
    EmptyContent,
    AlreadyRated,
    Unauthorized,
    NotFound,
    Invalid,
}

impl Error {
    pub fn signal(&self) -> Signal {
        match self {
            Error::EmptyContent => Signal::EmptyContent,
            Error::AlreadyRated => Signal::AlreadyRated,
            Error::Unauthorized { .. } => Signal::Unauthorized,
            Error::NotFound { .. } => Signal::NotFound,
            Error::ContentTooLong { .. }
            | Error::NotRated
            | Error::InvalidRating { .. }
            | Error::DuplicateId { .. }
            | Error::OverlayBusy { .. }
            | Error::NoActiveOverlay { .. }
            | Error::IdsExhausted => Signal::Invalid,
        }
    }
}

impl Signal {
    pub fn of<T>(result: &Result<T>) -> Signal {
        match result {
            Ok(_) => Signal::Success,
            Err(err) => err.signal(),
        }
    }
}
