use std::{cell::Cell, rc::Rc};

use chrono::{DateTime, Duration, TimeZone, Utc};
use comment_engine::{
    Clock, Comment, CommentId, CommentSession, EngineConfig, EventId, EventSnapshot, Rating,
    ReactionState, Reply, ReplyId, ReplyTree, User, UserId,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Engine error: {0}")]
    Engine(#[from] comment_engine::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Seed error: {0}")]
    Seed(String),
}

type Result<T> = std::result::Result<T, Error>;

/// Seed of an event page with two comments, one of them with a nested thread.
pub const SAMPLE_SEED: &str = r#"{
    "event_id": "1",
    "rating": {
        "average": 9.6,
        "total_count": 128,
        "user_rating": 0,
        "distribution": { "5": 98, "4": 20, "3": 6, "2": 2, "1": 2 }
    },
    "comments": [
        {
            "id": 1,
            "author_id": 2,
            "author_name": "Li",
            "content": "Well organized, the talks were great.",
            "created_at": "2026-01-05T14:30:00Z",
            "like_count": 70,
            "is_liked": false,
            "reply_count": 0,
            "replies": []
        },
        {
            "id": 2,
            "author_id": 1,
            "author_name": "Wang",
            "rating_given": 4,
            "content": "Venue was hard to find.",
            "created_at": "2026-01-18T09:00:00Z",
            "like_count": 12,
            "is_liked": true,
            "replies": [
                {
                    "id": 21,
                    "author_id": 2,
                    "author_name": "Li",
                    "content": "Take exit B from the station.",
                    "created_at": "2026-01-18T10:00:00Z",
                    "like_count": 3
                },
                {
                    "id": 22,
                    "parent": 21,
                    "author_id": 1,
                    "author_name": "Wang",
                    "content": "Thanks!",
                    "created_at": "2026-01-18T11:00:00Z",
                    "reply_to_name": "Li"
                }
            ]
        }
    ]
}"#;

/// The instant every seeded session starts at.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// A clock that only moves when told to. Clones share the same time, so a
/// test keeps one handle while the session owns another.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(at)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(base_time())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// The signed-in user of seeded sessions.
pub fn current_user() -> User {
    User {
        id: UserId::new(1),
        name: "Wang".to_string(),
        avatar_url: "https://example.com/avatar/wang.png".to_string(),
        organization: "Hangzhou".to_string(),
    }
}

pub fn other_user() -> User {
    User {
        id: UserId::new(2),
        name: "Li".to_string(),
        avatar_url: String::new(),
        organization: String::new(),
    }
}

pub fn sample_snapshot() -> Result<EventSnapshot> {
    Ok(serde_json::from_str(SAMPLE_SEED)?)
}

/// A session over [`SAMPLE_SEED`] for [`current_user`], plus its clock.
pub fn sample_session() -> Result<(CommentSession, FixedClock)> {
    let clock = FixedClock::default();
    let session = CommentSession::new(sample_snapshot()?, current_user(), EngineConfig::default())?
        .with_clock(clock.clone());
    Ok((session, clock))
}

/// Builds snapshots comment by comment.
pub struct SeedBuilder {
    event_id: EventId,
    rating: Rating,
    comments: Vec<Comment>,
    created_at: DateTime<Utc>,
}

impl Default for SeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedBuilder {
    pub fn new() -> Self {
        Self {
            event_id: EventId::from(1),
            rating: Rating::default(),
            comments: Vec::new(),
            created_at: base_time() - Duration::days(1),
        }
    }

    pub fn event(mut self, event_id: impl Into<EventId>) -> Self {
        self.event_id = event_id.into();
        self
    }

    pub fn rating(mut self, rating: Rating) -> Self {
        self.rating = rating;
        self
    }

    /// Append a comment; later comments are one minute newer.
    pub fn comment(mut self, id: u64, author: &User, likes: u32) -> Self {
        self.created_at += Duration::minutes(1);
        self.comments.push(Comment {
            id: CommentId::new(id),
            author_id: author.id,
            author_name: author.name.clone(),
            author_avatar: author.avatar_url.clone(),
            rating_given: 5,
            content: format!("comment {}", id),
            created_at: self.created_at,
            reaction: ReactionState::new(likes, false),
            replies: ReplyTree::new(),
        });
        self
    }

    pub fn reply(
        mut self,
        comment: u64,
        parent: Option<u64>,
        id: u64,
        author: &User,
    ) -> Result<Self> {
        self.created_at += Duration::minutes(1);
        let target = self
            .comments
            .iter_mut()
            .find(|seeded| seeded.id == CommentId::new(comment))
            .ok_or_else(|| Error::Seed(format!("no comment {} to reply to", comment)))?;
        let parent = parent.map(ReplyId::new);
        let reply_to_name = match parent {
            Some(parent) => target
                .replies
                .find(parent)
                .map(|answered| answered.author_name.clone()),
            None => None,
        };
        let reply = Reply {
            id: ReplyId::new(id),
            author_id: author.id,
            author_name: author.name.clone(),
            author_avatar: author.avatar_url.clone(),
            content: format!("reply {}", id),
            created_at: self.created_at,
            reply_to_name,
            reaction: ReactionState::default(),
        };
        target
            .replies
            .insert(parent, reply)
            .map_err(|err| Error::Seed(err.to_string()))?;
        Ok(self)
    }

    pub fn build(self) -> EventSnapshot {
        EventSnapshot {
            event_id: self.event_id,
            rating: self.rating,
            comments: self.comments,
        }
    }

    pub fn session(self, user: User) -> Result<(CommentSession, FixedClock)> {
        self.session_with_config(user, EngineConfig::default())
    }

    pub fn session_with_config(
        self,
        user: User,
        config: EngineConfig,
    ) -> Result<(CommentSession, FixedClock)> {
        let clock = FixedClock::default();
        let session = CommentSession::new(self.build(), user, config)?.with_clock(clock.clone());
        Ok((session, clock))
    }
}
