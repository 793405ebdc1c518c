use std::path::Path;

use clap::Subcommand;
use comment_engine::{
    CommentId, CommentSession, EngineConfig, EntityRef, EventId, EventSnapshot, MutationEntry,
    ReplyId, Signal, SortMode, User, UserId,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::lock::StateLock;
use crate::{store, view};

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an empty state file for an event
    Init {
        /// Event the comments belong to
        #[arg(long, default_value = "1")]
        event: String,
    },
    /// Print the page: rating, sorted comments and their replies
    Show {
        /// hottest, time, newest or rating_desc
        #[arg(long, default_value_t = SortMode::Hottest)]
        sort: SortMode,
    },
    /// Post a top-level comment
    Comment { text: String },
    /// Reply to a comment, or to one of its replies with --to
    Reply {
        comment: CommentId,
        #[arg(long)]
        to: Option<ReplyId>,
        text: String,
    },
    /// Rewrite your own comment, or one of your replies with --reply
    Edit {
        comment: CommentId,
        #[arg(long)]
        reply: Option<ReplyId>,
        text: String,
    },
    /// Delete your own comment with all its replies, or one reply subtree
    Delete {
        comment: CommentId,
        #[arg(long)]
        reply: Option<ReplyId>,
    },
    /// Toggle like on a comment or reply
    Like {
        comment: CommentId,
        #[arg(long)]
        reply: Option<ReplyId>,
    },
    /// Toggle dislike on a comment or reply
    Dislike {
        comment: CommentId,
        #[arg(long)]
        reply: Option<ReplyId>,
    },
    /// Rate the event with 1 to 5 stars, once
    Rate { value: u8 },
    /// Change your earlier rating
    Rerate { value: u8 },
}

/// What one invocation prints on stdout.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub signal: Signal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<comment_engine::Error>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mutations: Vec<MutationEntry>,
}

impl Outcome {
    fn success(result: Value, mutations: Vec<MutationEntry>) -> Self {
        Self {
            signal: Signal::Success,
            result: Some(result),
            error: None,
            message: None,
            mutations,
        }
    }

    fn failure(err: comment_engine::Error) -> Self {
        Self {
            signal: err.signal(),
            result: None,
            message: Some(err.to_string()),
            error: Some(err),
            mutations: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.signal == Signal::Success
    }
}

/// Everything one invocation needs besides the command itself.
pub struct Context<'a> {
    pub state: &'a Path,
    pub config: EngineConfig,
    pub user: UserId,
    pub name: Option<String>,
}

/// Run one command against the state file, holding its lock throughout.
/// Engine failures come back as a failed [`Outcome`]; everything else
/// (IO, JSON, locking) is an error.
pub fn run(ctx: Context<'_>, command: &Command) -> anyhow::Result<Outcome> {
    let _lock = StateLock::new(ctx.state)?;

    if let Command::Init { event } = command {
        let snapshot = store::init(ctx.state, EventId::from(event.as_str()))?;
        return Ok(Outcome::success(
            json!({ "event_id": snapshot.event_id, "state": ctx.state.display().to_string() }),
            Vec::new(),
        ));
    }

    let snapshot = store::load(ctx.state)?;
    let user = resolve_user(&snapshot, ctx.user, ctx.name);
    let mut session = CommentSession::new(snapshot, user, ctx.config)?;

    let result = execute(&mut session, command);
    let mutations = session.take_mutations();
    if !mutations.is_empty() {
        store::write(ctx.state, &session.snapshot())?;
        log::info!("{} mutations saved to {}", mutations.len(), ctx.state.display());
    }

    Ok(match result {
        Ok(value) => Outcome::success(value, mutations),
        Err(err) => {
            log::debug!("command failed: {}", err);
            Outcome::failure(err)
        }
    })
}

fn execute(session: &mut CommentSession, command: &Command) -> comment_engine::Result<Value> {
    match command {
        Command::Init { .. } => Ok(Value::Null),
        Command::Show { sort } => {
            session.set_sort_mode(*sort);
            view::render_page(session)
        }
        Command::Comment { text } => {
            let id = session.submit_comment(text)?;
            Ok(json!({ "comment": id }))
        }
        Command::Reply { comment, to, text } => {
            let id = session.submit_reply(*comment, *to, text)?;
            Ok(json!({ "comment": comment, "reply": id }))
        }
        Command::Edit {
            comment,
            reply,
            text,
        } => {
            let entity = entity(*comment, *reply);
            session.edit(entity, text)?;
            Ok(json!({ "edited": entity }))
        }
        Command::Delete { comment, reply } => {
            session.request_delete(entity(*comment, *reply))?;
            let removed = session.confirm_delete()?;
            Ok(json!({ "deleted": removed.entity, "replies": removed.replies }))
        }
        Command::Like { comment, reply } => {
            let entity = entity(*comment, *reply);
            let reaction = session.like(entity)?;
            Ok(json!({ "entity": entity, "reaction": reaction }))
        }
        Command::Dislike { comment, reply } => {
            let entity = entity(*comment, *reply);
            let reaction = session.dislike(entity)?;
            Ok(json!({ "entity": entity, "reaction": reaction }))
        }
        Command::Rate { value } => {
            session.click_rate()?;
            session.submit_rating(*value)?;
            Ok(json!({ "rating": view::render_rating(session.rating()) }))
        }
        Command::Rerate { value } => {
            let previous = session.edit_rating(*value)?;
            Ok(json!({ "previous": previous, "rating": view::render_rating(session.rating()) }))
        }
    }
}

fn entity(comment: CommentId, reply: Option<ReplyId>) -> EntityRef {
    match reply {
        Some(reply) => EntityRef::Reply { comment, reply },
        None => EntityRef::Comment(comment),
    }
}

/// The signed-in user. Without an explicit name, reuse the name the user
/// last posted under, falling back to `user {id}`.
fn resolve_user(snapshot: &EventSnapshot, id: UserId, name: Option<String>) -> User {
    let known = || {
        snapshot
            .comments
            .iter()
            .flat_map(|comment| {
                std::iter::once((comment.author_id, &comment.author_name, &comment.author_avatar))
                    .chain(comment.replies.walk(usize::MAX).map(|(_, reply)| {
                        (reply.author_id, &reply.author_name, &reply.author_avatar)
                    }))
            })
            .find(|(author, _, _)| *author == id)
    };
    let (name, avatar_url) = match (name, known()) {
        (Some(name), known) => (name, known.map(|(_, _, avatar)| avatar.clone())),
        (None, Some((_, name, avatar))) => (name.clone(), Some(avatar.clone())),
        (None, None) => {
            log::debug!("user {} has not posted yet, using a placeholder name", id);
            (format!("user {}", id), None)
        }
    };
    User {
        id,
        name,
        avatar_url: avatar_url.unwrap_or_default(),
        organization: String::new(),
    }
}
