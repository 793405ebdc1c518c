use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::model::{Comment, EntityRef, Reply, User};
use crate::mutation::{Mutation, MutationEntry};
use crate::overlay::{DismissGesture, MenuHost, Overlay, OverlayCoordinator};
use crate::rating::Rating;
use crate::reaction::ReactionState;
use crate::relative_time::{RelativeAge, relative_age};
use crate::reply_tree::ReplyTree;
use crate::sort::{SortMode, sort_comments};
use crate::{CommentId, Error, EventId, ReplyId, Result, UserId};

/// Rating given to a new comment when the author has not rated the event.
const UNRATED_COMMENT_STARS: u8 = 5;

/// Everything persisted for one event page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub event_id: EventId,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl EventSnapshot {
    pub fn empty(event_id: EventId) -> Self {
        Self {
            event_id,
            rating: Rating::default(),
            comments: Vec::new(),
        }
    }
}

/// An edit in progress: which entity, and the content it was prefilled with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditDraft {
    pub entity: EntityRef,
    pub original: String,
}

/// What a confirmed delete took away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removed {
    pub entity: EntityRef,
    /// Every reply removed with it, subtree root first.
    pub replies: Vec<ReplyId>,
}

fn not_found(entity: EntityRef) -> Error {
    log::warn!("{} not found", entity);
    Error::NotFound { entity }
}

/// The comment section of one event as seen by one signed-in user.
///
/// Holds the comments, the rating aggregate and the overlay state, and turns
/// user intents into validated mutations. An operation that returns an error
/// leaves every part of the session as it was. Reaction flags and
/// `user_rating` always show the signed-in user's own votes.
pub struct CommentSession {
    event_id: EventId,
    user: User,
    config: EngineConfig,
    comments: Vec<Comment>,
    rating: Rating,
    sort_mode: SortMode,
    overlay: OverlayCoordinator,
    editing: Option<EditDraft>,
    reply_target: Option<ReplyId>,
    next_id: u64,
    mutations: Vec<MutationEntry>,
    clock: Box<dyn Clock>,
}

impl CommentSession {
    pub fn new(mut snapshot: EventSnapshot, user: User, config: EngineConfig) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut max_id = 0;
        for comment in &mut snapshot.comments {
            if !seen.insert(comment.id) {
                return Err(Error::DuplicateId {
                    entity: comment.entity(),
                });
            }
            max_id = max_id.max(comment.id.get());
            comment.reaction.view_as(user.id);
            for reply in comment.replies.replies_mut() {
                max_id = max_id.max(reply.id.get());
                reply.reaction.view_as(user.id);
            }
        }
        let next_id = max_id.checked_add(1).ok_or(Error::IdsExhausted)?;
        snapshot.rating.view_as(user.id);
        log::debug!(
            "session for event {} with {} comments, user {}",
            snapshot.event_id,
            snapshot.comments.len(),
            user.id
        );
        Ok(Self {
            event_id: snapshot.event_id,
            overlay: OverlayCoordinator::new(config.drag_dismiss_threshold),
            user,
            config,
            comments: snapshot.comments,
            rating: snapshot.rating,
            sort_mode: SortMode::default(),
            editing: None,
            reply_target: None,
            next_id,
            mutations: Vec::new(),
            clock: Box::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Comments in storage order, newest submissions first.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == id)
    }

    pub fn reply(&self, comment: CommentId, reply: ReplyId) -> Option<&Reply> {
        self.comment(comment)?.replies.find(reply)
    }

    pub fn rating(&self) -> &Rating {
        &self.rating
    }

    pub fn overlay(&self) -> &Overlay {
        self.overlay.state()
    }

    pub fn editing(&self) -> Option<&EditDraft> {
        self.editing.as_ref()
    }

    /// Reply the next panel submission answers; `None` answers the comment.
    pub fn reply_target(&self) -> Option<ReplyId> {
        self.reply_target
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
    }

    pub fn sorted_comments(&self) -> Vec<&Comment> {
        sort_comments(&self.comments, self.sort_mode)
    }

    /// Replies of a comment in reading order, each with its indent level.
    pub fn replies_for_display(&self, comment: CommentId) -> Result<Vec<(usize, &Reply)>> {
        let comment = self
            .comment(comment)
            .ok_or_else(|| not_found(EntityRef::Comment(comment)))?;
        Ok(comment.replies.walk(self.config.max_display_depth).collect())
    }

    pub fn age_of(&self, entity: EntityRef) -> Result<RelativeAge> {
        let created_at = match entity {
            EntityRef::Comment(id) => self.comment(id).map(|comment| comment.created_at),
            EntityRef::Reply { comment, reply } => {
                self.reply(comment, reply).map(|reply| reply.created_at)
            }
        }
        .ok_or_else(|| not_found(entity))?;
        Ok(relative_age(created_at, self.clock.now()))
    }

    pub fn mutations(&self) -> &[MutationEntry] {
        &self.mutations
    }

    /// Drain the mutation log for persistence.
    pub fn take_mutations(&mut self) -> Vec<MutationEntry> {
        std::mem::take(&mut self.mutations)
    }

    /// Everything worth persisting, without the signed-in user's view: the
    /// flags and `user_rating` are cleared, the per-user votes stay.
    pub fn snapshot(&self) -> EventSnapshot {
        let mut rating = self.rating.clone();
        rating.user_rating = None;
        let mut comments = self.comments.clone();
        for comment in &mut comments {
            comment.reaction.clear_view();
            for reply in comment.replies.replies_mut() {
                reply.reaction.clear_view();
            }
        }
        EventSnapshot {
            event_id: self.event_id.clone(),
            rating,
            comments,
        }
    }

    // Composer

    pub fn open_composer(&mut self) -> Result<()> {
        self.overlay.open_composer(None)
    }

    pub fn cancel_composer(&mut self) -> Result<()> {
        self.overlay.close_composer()
    }

    /// Post a new top-level comment. It goes to the front of the list.
    pub fn submit_comment(&mut self, content: &str) -> Result<CommentId> {
        let mut content = self.validate_content(content)?;
        let composer_open = matches!(self.overlay.state(), Overlay::Composer { .. });
        if let Overlay::Composer {
            reply_to_name: Some(name),
        } = self.overlay.state()
        {
            content = format!("@{} {}", name, content);
        }

        let id = CommentId::new(self.allocate_id()?);
        let comment = Comment {
            id,
            author_id: self.user.id,
            author_name: self.user.name.clone(),
            author_avatar: self.user.avatar_url.clone(),
            rating_given: self.rating.user_rating.unwrap_or(UNRATED_COMMENT_STARS),
            content,
            created_at: self.clock.now(),
            reaction: ReactionState::default(),
            replies: ReplyTree::new(),
        };
        if composer_open {
            self.overlay.close_composer()?;
        }
        self.comments.insert(0, comment.clone());
        log::info!("comment {} posted on event {}", id, self.event_id);
        self.record(Mutation::CommentCreated { comment });
        Ok(id)
    }

    // Replies

    /// Answer a comment directly (`parent` = `None`) or one of its replies.
    pub fn submit_reply(
        &mut self,
        comment: CommentId,
        parent: Option<ReplyId>,
        content: &str,
    ) -> Result<ReplyId> {
        let content = self.validate_content(content)?;
        let index = self.comment_index(comment)?;
        let reply_to_name = match parent {
            Some(parent) => {
                let answered = self.comments[index]
                    .replies
                    .find(parent)
                    .ok_or_else(|| not_found(EntityRef::Reply { comment, reply: parent }))?;
                Some(answered.author_name.clone())
            }
            None => None,
        };

        let id = ReplyId::new(self.allocate_id()?);
        let reply = Reply {
            id,
            author_id: self.user.id,
            author_name: self.user.name.clone(),
            author_avatar: self.user.avatar_url.clone(),
            content,
            created_at: self.clock.now(),
            reply_to_name,
            reaction: ReactionState::default(),
        };
        self.comments[index]
            .replies
            .insert(parent, reply.clone())
            .map_err(|err| err.in_comment(comment))?;
        log::info!("reply {} posted under comment {}", id, comment);
        self.record(Mutation::ReplyCreated {
            comment,
            parent,
            reply,
        });
        Ok(id)
    }

    /// Submit from the open reply panel, answering the selected reply target.
    pub fn submit_panel_reply(&mut self, content: &str) -> Result<ReplyId> {
        let comment = self.overlay.reply_panel().ok_or(Error::NoActiveOverlay {
            expected: "reply panel",
        })?;
        let id = self.submit_reply(comment, self.reply_target, content)?;
        self.reply_target = None;
        Ok(id)
    }

    pub fn open_reply_panel(&mut self, comment: CommentId) -> Result<()> {
        self.comment_index(comment)?;
        self.overlay.open_reply_panel(comment)?;
        self.reply_target = None;
        Ok(())
    }

    pub fn close_reply_panel(&mut self, gesture: DismissGesture) -> Result<bool> {
        let closed = self.overlay.close_reply_panel(gesture)?;
        if closed {
            self.reply_target = None;
        }
        Ok(closed)
    }

    // Context menu

    pub fn toggle_menu(&mut self, entity: EntityRef) -> Result<()> {
        self.author_of(entity)?;
        self.overlay.toggle_menu(entity)
    }

    pub fn background_click(&mut self) -> bool {
        self.overlay.background_click()
    }

    /// "Reply" picked from the open menu. On a comment this opens the composer
    /// mentioning its author; on a reply it selects that reply as the target
    /// of the next panel submission.
    pub fn menu_reply(&mut self) -> Result<()> {
        let (entity, host) = self.menu()?;
        match (entity, host) {
            (EntityRef::Comment(comment), MenuHost::Page) => {
                let name = self
                    .comment(comment)
                    .map(|comment| comment.author_name.clone())
                    .ok_or_else(|| not_found(entity))?;
                self.overlay.dismiss_menu();
                self.overlay.open_composer(Some(name))?;
            }
            (EntityRef::Comment(_), MenuHost::ReplyPanel(_)) => {
                self.overlay.dismiss_menu();
                self.reply_target = None;
            }
            (EntityRef::Reply { comment, reply }, host) => {
                self.author_of(entity)?;
                self.overlay.dismiss_menu();
                if host == MenuHost::Page {
                    self.overlay.open_reply_panel(comment)?;
                }
                self.reply_target = Some(reply);
            }
        }
        Ok(())
    }

    /// "Edit" picked from the open menu; returns the content to prefill.
    pub fn menu_edit(&mut self) -> Result<String> {
        let (entity, _) = self.menu()?;
        let content = self.begin_edit(entity)?;
        self.overlay.dismiss_menu();
        Ok(content)
    }

    /// "Delete" picked from the open menu; asks for confirmation.
    pub fn menu_delete(&mut self) -> Result<EntityRef> {
        let (entity, _) = self.menu()?;
        self.check_author(entity)?;
        self.overlay.request_delete()
    }

    // Edit

    pub fn begin_edit(&mut self, entity: EntityRef) -> Result<String> {
        self.check_author(entity)?;
        let original = self.content_of(entity)?;
        self.editing = Some(EditDraft {
            entity,
            original: original.clone(),
        });
        Ok(original)
    }

    pub fn confirm_edit(&mut self, content: &str) -> Result<()> {
        let entity = self
            .editing
            .as_ref()
            .map(|draft| draft.entity)
            .ok_or(Error::NoActiveOverlay { expected: "edit" })?;
        self.edit(entity, content)?;
        self.editing = None;
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> Option<EditDraft> {
        self.editing.take()
    }

    /// Rewrite the content of a comment or reply the current user wrote.
    /// Nothing else about the entity changes.
    pub fn edit(&mut self, entity: EntityRef, content: &str) -> Result<()> {
        let content = self.validate_content(content)?;
        self.check_author(entity)?;
        match entity {
            EntityRef::Comment(id) => {
                let comment = self
                    .comments
                    .iter_mut()
                    .find(|comment| comment.id == id)
                    .ok_or_else(|| not_found(entity))?;
                comment.content = content.clone();
            }
            EntityRef::Reply { comment, reply } => {
                let index = self.comment_index(comment)?;
                self.comments[index]
                    .replies
                    .update_content(reply, content.clone())
                    .map_err(|err| err.in_comment(comment))?;
            }
        }
        log::info!("{} edited", entity);
        self.record(Mutation::ContentEdited { entity, content });
        Ok(())
    }

    // Delete

    pub fn request_delete(&mut self, entity: EntityRef) -> Result<()> {
        self.check_author(entity)?;
        self.overlay.confirm_delete_of(entity)
    }

    pub fn cancel_delete(&mut self) -> Result<()> {
        self.overlay.cancel_delete()
    }

    /// Carry out the pending delete. The overlay returns to the bare page
    /// whether or not the entity was still there.
    pub fn confirm_delete(&mut self) -> Result<Removed> {
        let entity = self.overlay.pending_delete().ok_or(Error::NoActiveOverlay {
            expected: "delete confirmation",
        })?;
        let removed = self.remove(entity);
        self.overlay.finish_delete()?;
        removed
    }

    fn remove(&mut self, entity: EntityRef) -> Result<Removed> {
        let index = self.comment_index(entity.comment_id())?;
        let removed = match entity {
            EntityRef::Comment(comment) => {
                let removed = self.comments.remove(index);
                let replies = removed.replies.ids();
                log::info!("comment {} deleted with {} replies", comment, replies.len());
                self.record(Mutation::CommentDeleted {
                    comment,
                    replies: replies.clone(),
                });
                Removed { entity, replies }
            }
            EntityRef::Reply { comment, reply } => {
                let replies = self.comments[index]
                    .replies
                    .delete_subtree(reply)
                    .map_err(|err| err.in_comment(comment))?;
                log::info!("reply {} deleted with {} descendants", reply, replies.len() - 1);
                self.record(Mutation::RepliesDeleted {
                    comment,
                    replies: replies.clone(),
                });
                Removed { entity, replies }
            }
        };

        let gone = |target: EntityRef| match entity {
            EntityRef::Comment(comment) => target.comment_id() == comment,
            EntityRef::Reply { comment, .. } => {
                target.comment_id() == comment
                    && target
                        .reply_id()
                        .is_some_and(|reply| removed.replies.contains(&reply))
            }
        };
        if self.editing.as_ref().is_some_and(|draft| gone(draft.entity)) {
            self.editing = None;
        }
        if let Some(target) = self.reply_target {
            if gone(EntityRef::Reply {
                comment: entity.comment_id(),
                reply: target,
            }) {
                self.reply_target = None;
            }
        }
        Ok(removed)
    }

    // Reactions

    pub fn like(&mut self, entity: EntityRef) -> Result<ReactionState> {
        self.react(entity, ReactionState::like)
    }

    pub fn dislike(&mut self, entity: EntityRef) -> Result<ReactionState> {
        self.react(entity, ReactionState::dislike)
    }

    fn react(
        &mut self,
        entity: EntityRef,
        toggle: fn(&mut ReactionState, UserId),
    ) -> Result<ReactionState> {
        let voter = self.user.id;
        let reaction = self.reaction_mut(entity)?;
        toggle(reaction, voter);
        let reaction = reaction.clone();
        log::debug!("{} reaction now {:?}", entity, reaction);
        self.record(Mutation::Reacted {
            entity,
            reaction: reaction.clone(),
        });
        Ok(reaction)
    }

    fn reaction_mut(&mut self, entity: EntityRef) -> Result<&mut ReactionState> {
        let comment = self
            .comments
            .iter_mut()
            .find(|comment| comment.id == entity.comment_id())
            .ok_or_else(|| not_found(EntityRef::Comment(entity.comment_id())))?;
        match entity.reply_id() {
            None => Ok(&mut comment.reaction),
            Some(reply) => comment
                .replies
                .find_mut(reply)
                .map(|reply| &mut reply.reaction)
                .ok_or_else(|| not_found(entity)),
        }
    }

    // Rating

    /// The rate button: opens the rating dialog unless the user already rated.
    pub fn click_rate(&mut self) -> Result<()> {
        self.overlay.open_rating_dialog(self.rating.is_rated())
    }

    pub fn close_rating_dialog(&mut self) -> Result<()> {
        self.overlay.close_rating_dialog()
    }

    pub fn submit_rating(&mut self, value: u8) -> Result<()> {
        self.rating.submit(self.user.id, value)?;
        if matches!(self.overlay.state(), Overlay::RatingDialog) {
            self.overlay.close_rating_dialog()?;
        }
        log::info!("event {} rated {}", self.event_id, value);
        self.record(Mutation::RatingSubmitted { value });
        Ok(())
    }

    /// Change an earlier vote, returning the previous value.
    pub fn edit_rating(&mut self, value: u8) -> Result<u8> {
        let previous = self.rating.edit(self.user.id, value)?;
        log::info!("event {} rating changed {} -> {}", self.event_id, previous, value);
        self.record(Mutation::RatingEdited { previous, value });
        Ok(previous)
    }

    // Helpers

    /// Trim and bound user text; the trimmed form is what gets stored.
    fn validate_content(&self, content: &str) -> Result<String> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyContent);
        }
        let len = trimmed.chars().count();
        if len > self.config.max_content_chars {
            return Err(Error::ContentTooLong {
                len,
                max: self.config.max_content_chars,
            });
        }
        Ok(trimmed.to_string())
    }

    fn menu(&self) -> Result<(EntityRef, MenuHost)> {
        self.overlay.open_menu().ok_or(Error::NoActiveOverlay {
            expected: "context menu",
        })
    }

    fn comment_index(&self, id: CommentId) -> Result<usize> {
        self.comments
            .iter()
            .position(|comment| comment.id == id)
            .ok_or_else(|| not_found(EntityRef::Comment(id)))
    }

    fn author_of(&self, entity: EntityRef) -> Result<UserId> {
        match entity {
            EntityRef::Comment(id) => self.comment(id).map(|comment| comment.author_id),
            EntityRef::Reply { comment, reply } => {
                self.reply(comment, reply).map(|reply| reply.author_id)
            }
        }
        .ok_or_else(|| not_found(entity))
    }

    fn check_author(&self, entity: EntityRef) -> Result<()> {
        if self.author_of(entity)? != self.user.id {
            log::debug!("user {} is not the author of {}", self.user.id, entity);
            return Err(Error::Unauthorized { entity });
        }
        Ok(())
    }

    fn content_of(&self, entity: EntityRef) -> Result<String> {
        match entity {
            EntityRef::Comment(id) => self.comment(id).map(|comment| comment.content.clone()),
            EntityRef::Reply { comment, reply } => {
                self.reply(comment, reply).map(|reply| reply.content.clone())
            }
        }
        .ok_or_else(|| not_found(entity))
    }

    fn allocate_id(&mut self) -> Result<u64> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(Error::IdsExhausted)?;
        Ok(id)
    }

    fn record(&mut self, mutation: Mutation) {
        self.mutations.push(MutationEntry {
            at: self.clock.now(),
            mutation,
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap()
    }

    fn user(id: u64, name: &str) -> User {
        User {
            id: UserId::new(id),
            name: name.to_string(),
            avatar_url: String::new(),
            organization: String::new(),
        }
    }

    fn comment(id: u64, author: u64, likes: u32) -> Comment {
        Comment {
            id: CommentId::new(id),
            author_id: UserId::new(author),
            author_name: format!("user{author}"),
            author_avatar: String::new(),
            rating_given: 5,
            content: format!("comment {id}"),
            created_at: now() - Duration::days(2),
            reaction: ReactionState::new(likes, false),
            replies: ReplyTree::new(),
        }
    }

    fn session_with(comments: Vec<Comment>) -> CommentSession {
        let snapshot = EventSnapshot {
            event_id: EventId::from(42),
            rating: Rating::default(),
            comments,
        };
        session_as(snapshot, user(1, "Wang"))
    }

    fn session_as(snapshot: EventSnapshot, user: User) -> CommentSession {
        CommentSession::new(snapshot, user, EngineConfig::default())
            .unwrap()
            .with_clock(FixedClock(now()))
    }

    fn c(id: u64) -> EntityRef {
        EntityRef::Comment(CommentId::new(id))
    }

    fn r(comment: u64, reply: u64) -> EntityRef {
        EntityRef::Reply {
            comment: CommentId::new(comment),
            reply: ReplyId::new(reply),
        }
    }

    #[test]
    fn test_duplicate_comment_ids_rejected() {
        let snapshot = EventSnapshot {
            event_id: EventId::from(1),
            rating: Rating::default(),
            comments: vec![comment(3, 1, 0), comment(3, 2, 0)],
        };
        let err = CommentSession::new(snapshot, user(1, "Wang"), EngineConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, Error::DuplicateId { entity: c(3) });
    }

    #[test]
    fn test_submit_comment_prepends() {
        let mut session = session_with(vec![comment(1, 2, 0)]);
        session.open_composer().unwrap();
        let id = session.submit_comment("  hello  ").unwrap();
        assert_eq!(id, CommentId::new(2));
        assert_eq!(session.comments()[0].id, id);
        assert_eq!(session.comments()[0].content, "hello");
        assert_eq!(session.comments()[0].rating_given, 5);
        assert_eq!(session.comments()[0].created_at, now());
        assert_eq!(session.overlay(), &Overlay::None);
        assert_eq!(session.age_of(EntityRef::Comment(id)).unwrap(), RelativeAge::JustNow);
    }

    #[test]
    fn test_blank_comment_keeps_composer_open() {
        let mut session = session_with(vec![]);
        session.open_composer().unwrap();
        assert_eq!(session.submit_comment("   "), Err(Error::EmptyContent));
        assert_eq!(session.overlay(), &Overlay::Composer { reply_to_name: None });
        assert!(session.comments().is_empty());
        assert!(session.mutations().is_empty());
    }

    #[test]
    fn test_content_limit_counts_chars() {
        let mut session = session_with(vec![]);
        let exact = "é".repeat(500);
        session.submit_comment(&exact).unwrap();
        let over = "é".repeat(501);
        assert_eq!(
            session.submit_comment(&over),
            Err(Error::ContentTooLong { len: 501, max: 500 })
        );
    }

    #[test]
    fn test_new_comment_uses_own_rating() {
        let mut session = session_with(vec![]);
        session.submit_rating(3).unwrap();
        let id = session.submit_comment("ok").unwrap();
        assert_eq!(session.comment(id).unwrap().rating_given, 3);
    }

    #[test]
    fn test_reply_to_reply_mentions_author() {
        let mut session = session_with(vec![comment(1, 2, 0)]);
        let first = session.submit_reply(CommentId::new(1), None, "first").unwrap();
        let nested = session
            .submit_reply(CommentId::new(1), Some(first), "second")
            .unwrap();
        let comment = session.comment(CommentId::new(1)).unwrap();
        assert_eq!(comment.reply_count(), 1);
        assert_eq!(comment.replies.parent_of(nested), Some(first));
        let nested = comment.replies.find(nested).unwrap();
        assert_eq!(nested.reply_to_name.as_deref(), Some("Wang"));
        assert_eq!(nested.display_content(), "@Wang second");
    }

    #[test]
    fn test_reply_to_missing_parent() {
        let mut session = session_with(vec![comment(1, 2, 0)]);
        assert_eq!(
            session.submit_reply(CommentId::new(1), Some(ReplyId::new(77)), "hi"),
            Err(Error::NotFound { entity: r(1, 77) })
        );
        assert_eq!(
            session.submit_reply(CommentId::new(9), None, "hi"),
            Err(Error::NotFound { entity: c(9) })
        );
    }

    #[test]
    fn test_menu_reply_on_comment_opens_composer_with_mention() {
        let mut session = session_with(vec![comment(1, 2, 0)]);
        session.toggle_menu(c(1)).unwrap();
        session.menu_reply().unwrap();
        assert_eq!(
            session.overlay(),
            &Overlay::Composer {
                reply_to_name: Some("user2".to_string())
            }
        );
        let id = session.submit_comment("see above").unwrap();
        assert_eq!(session.comment(id).unwrap().content, "@user2 see above");
    }

    #[test]
    fn test_menu_reply_on_reply_selects_target() {
        let mut session = session_with(vec![comment(1, 2, 0)]);
        let first = session.submit_reply(CommentId::new(1), None, "first").unwrap();
        session.open_reply_panel(CommentId::new(1)).unwrap();
        session.toggle_menu(r(1, first.get())).unwrap();
        session.menu_reply().unwrap();
        assert_eq!(
            session.overlay(),
            &Overlay::ReplyPanel {
                comment: CommentId::new(1)
            }
        );
        assert_eq!(session.reply_target(), Some(first));

        let nested = session.submit_panel_reply("answer").unwrap();
        assert_eq!(session.reply_target(), None);
        let tree = &session.comment(CommentId::new(1)).unwrap().replies;
        assert_eq!(tree.parent_of(nested), Some(first));
    }

    #[test]
    fn test_edit_only_touches_content() {
        let mut session = session_with(vec![comment(1, 1, 7)]);
        let before = session.comment(CommentId::new(1)).unwrap().clone();
        assert_eq!(session.begin_edit(c(1)).unwrap(), "comment 1");
        session.confirm_edit(" rewritten ").unwrap();
        assert_eq!(session.editing(), None);
        let after = session.comment(CommentId::new(1)).unwrap();
        assert_eq!(after.content, "rewritten");
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.reaction, before.reaction);
        assert_eq!(after.id, before.id);
    }

    #[test]
    fn test_edit_foreign_entity_unauthorized() {
        let mut session = session_with(vec![comment(1, 2, 0)]);
        assert_eq!(
            session.begin_edit(c(1)),
            Err(Error::Unauthorized { entity: c(1) })
        );
        assert_eq!(session.edit(c(1), "mine now"), Err(Error::Unauthorized { entity: c(1) }));
        assert_eq!(session.comment(CommentId::new(1)).unwrap().content, "comment 1");
        assert_eq!(session.editing(), None);
    }

    #[test]
    fn test_empty_edit_keeps_draft() {
        let mut session = session_with(vec![comment(1, 1, 0)]);
        session.begin_edit(c(1)).unwrap();
        assert_eq!(session.confirm_edit(" "), Err(Error::EmptyContent));
        assert!(session.editing().is_some());
        assert_eq!(session.cancel_edit().unwrap().original, "comment 1");
    }

    #[test]
    fn test_delete_comment_with_replies() {
        let mut session = session_with(vec![comment(1, 1, 0), comment(2, 2, 0)]);
        let first = session.submit_reply(CommentId::new(1), None, "a").unwrap();
        session.submit_reply(CommentId::new(1), Some(first), "b").unwrap();
        session.request_delete(c(1)).unwrap();
        assert_eq!(session.overlay(), &Overlay::DeleteConfirm { entity: c(1) });
        let removed = session.confirm_delete().unwrap();
        assert_eq!(removed.replies.len(), 2);
        assert!(session.comment(CommentId::new(1)).is_none());
        assert_eq!(session.comments().len(), 1);
        assert_eq!(session.overlay(), &Overlay::None);
    }

    #[test]
    fn test_delete_requires_author() {
        let mut session = session_with(vec![comment(2, 2, 0)]);
        assert_eq!(
            session.request_delete(c(2)),
            Err(Error::Unauthorized { entity: c(2) })
        );
        assert_eq!(session.overlay(), &Overlay::None);
        session.toggle_menu(c(2)).unwrap();
        assert_eq!(session.menu_delete(), Err(Error::Unauthorized { entity: c(2) }));
        assert_eq!(session.overlay().name(), "context menu");
    }

    #[test]
    fn test_delete_clears_reply_target_and_draft() {
        let mut session = session_with(vec![comment(1, 2, 0)]);
        let first = session.submit_reply(CommentId::new(1), None, "a").unwrap();
        let nested = session.submit_reply(CommentId::new(1), Some(first), "b").unwrap();
        session.begin_edit(r(1, nested.get())).unwrap();
        session.open_reply_panel(CommentId::new(1)).unwrap();
        session.toggle_menu(r(1, nested.get())).unwrap();
        session.menu_reply().unwrap();
        assert_eq!(session.reply_target(), Some(nested));

        session.toggle_menu(r(1, first.get())).unwrap();
        session.menu_delete().unwrap();
        let removed = session.confirm_delete().unwrap();
        assert_eq!(removed.replies, vec![first, nested]);
        assert_eq!(session.reply_target(), None);
        assert_eq!(session.editing(), None);
        assert_eq!(session.comment(CommentId::new(1)).unwrap().reply_count(), 0);
    }

    #[test]
    fn test_reactions_on_reply() {
        let mut session = session_with(vec![comment(1, 2, 0)]);
        let reply = session.submit_reply(CommentId::new(1), None, "a").unwrap();
        let state = session.like(r(1, reply.get())).unwrap();
        assert!(state.liked);
        assert_eq!(state.count, 1);
        let state = session.dislike(r(1, reply.get())).unwrap();
        assert!(state.disliked);
        assert_eq!(state.count, 0);
        assert_eq!(
            session.like(r(1, 99)),
            Err(Error::NotFound { entity: r(1, 99) })
        );
    }

    #[test]
    fn test_rate_flow() {
        let mut session = session_with(vec![]);
        session.click_rate().unwrap();
        assert_eq!(session.overlay(), &Overlay::RatingDialog);
        session.submit_rating(4).unwrap();
        assert_eq!(session.overlay(), &Overlay::None);
        assert_eq!(session.click_rate(), Err(Error::AlreadyRated));
        assert_eq!(session.submit_rating(2), Err(Error::AlreadyRated));
        assert_eq!(session.edit_rating(2), Ok(4));
        assert_eq!(session.rating().user_rating, Some(2));
    }

    #[test]
    fn test_sorted_view_and_mode() {
        let mut session = session_with(vec![comment(1, 2, 5), comment(2, 2, 5), comment(3, 2, 9)]);
        let ids: Vec<u64> = session.sorted_comments().iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        session.set_sort_mode(SortMode::Newest);
        assert_eq!(session.sort_mode(), SortMode::Newest);
    }

    #[test]
    fn test_mutation_log_drains() {
        let mut session = session_with(vec![comment(1, 1, 0)]);
        session.like(c(1)).unwrap();
        session.edit(c(1), "new").unwrap();
        let log = session.take_mutations();
        assert_eq!(log.len(), 2);
        assert!(matches!(log[0].mutation, Mutation::Reacted { .. }));
        assert_eq!(
            log[1].mutation,
            Mutation::ContentEdited {
                entity: c(1),
                content: "new".to_string()
            }
        );
        assert!(session.mutations().is_empty());
    }

    #[test]
    fn test_ids_continue_after_seed() {
        let mut seeded = comment(5, 2, 0);
        seeded
            .replies
            .insert(
                None,
                Reply {
                    id: ReplyId::new(12),
                    author_id: UserId::new(2),
                    author_name: "user2".to_string(),
                    author_avatar: String::new(),
                    content: "seed".to_string(),
                    created_at: now(),
                    reply_to_name: None,
                    reaction: ReactionState::default(),
                },
            )
            .unwrap();
        let mut session = session_with(vec![seeded]);
        assert_eq!(session.submit_comment("x").unwrap(), CommentId::new(13));
        assert_eq!(
            session.submit_reply(CommentId::new(5), None, "y").unwrap(),
            ReplyId::new(14)
        );
    }

    #[test]
    fn test_exhausted_id_space_is_an_error() {
        let snapshot = EventSnapshot {
            event_id: EventId::from(1),
            rating: Rating::default(),
            comments: vec![comment(u64::MAX, 2, 0)],
        };
        let err = CommentSession::new(snapshot, user(1, "Wang"), EngineConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, Error::IdsExhausted);
    }

    #[test]
    fn test_last_id_is_refused_without_side_effects() {
        let mut session = session_with(vec![comment(u64::MAX - 1, 2, 0)]);
        session.open_composer().unwrap();
        assert_eq!(session.submit_comment("a"), Err(Error::IdsExhausted));
        assert_eq!(session.overlay(), &Overlay::Composer { reply_to_name: None });
        assert_eq!(session.comments().len(), 1);
        assert!(session.mutations().is_empty());
    }

    #[test]
    fn test_votes_follow_the_signed_in_user() {
        let mut first = session_with(vec![comment(1, 2, 0)]);
        first.like(c(1)).unwrap();
        first.submit_rating(5).unwrap();

        let mut second = session_as(first.snapshot(), user(2, "Li"));
        assert!(!second.comment(CommentId::new(1)).unwrap().reaction.liked);
        assert!(!second.rating().is_rated());
        assert_eq!(second.click_rate(), Ok(()));
        second.submit_rating(1).unwrap();
        let state = second.like(c(1)).unwrap();
        assert!(state.liked);
        assert_eq!(state.count, 2);
        assert_eq!(second.edit_rating(2), Ok(1));

        let back = session_as(second.snapshot(), user(1, "Wang"));
        assert!(back.comment(CommentId::new(1)).unwrap().reaction.liked);
        assert_eq!(back.rating().user_rating, Some(5));
        assert_eq!(back.rating().total_count, 2);
        assert_eq!(back.rating().vote_of(UserId::new(2)), Some(2));
    }

    #[test]
    fn test_snapshot_drops_viewer_flags() {
        let mut session = session_with(vec![comment(1, 2, 3)]);
        session.like(c(1)).unwrap();
        session.submit_rating(4).unwrap();
        let snapshot = session.snapshot();
        let reaction = &snapshot.comments[0].reaction;
        assert!(!reaction.liked);
        assert_eq!(reaction.count, 4);
        assert!(reaction.liked_by.contains(&UserId::new(1)));
        assert_eq!(snapshot.rating.user_rating, None);
        assert_eq!(snapshot.rating.vote_of(UserId::new(1)), Some(4));
    }

    #[test]
    fn test_display_walk_uses_configured_depth() {
        let mut session = session_with(vec![comment(1, 2, 0)]);
        let mut parent = None;
        for n in 0..5 {
            let id = session
                .submit_reply(CommentId::new(1), parent, &format!("level {n}"))
                .unwrap();
            parent = Some(id);
        }
        let depths: Vec<usize> = session
            .replies_for_display(CommentId::new(1))
            .unwrap()
            .into_iter()
            .map(|(depth, _)| depth)
            .collect();
        assert_eq!(depths, vec![1, 2, 3, 3, 3]);
    }
}
