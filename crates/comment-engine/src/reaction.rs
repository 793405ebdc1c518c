use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Like/dislike state of a comment or a reply.
///
/// Votes are kept per user in `liked_by` / `disliked_by`; a user is never in
/// both. `liked` and `disliked` are the view of one user, the one the state
/// was last viewed as. `count` only carries the likes; a dislike is a private
/// signal and does not show up in any counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionState {
    #[serde(rename = "is_liked", default)]
    pub liked: bool,
    #[serde(rename = "is_disliked", default)]
    pub disliked: bool,
    #[serde(rename = "like_count", default)]
    pub count: u32,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub liked_by: BTreeSet<UserId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub disliked_by: BTreeSet<UserId>,
}

impl ReactionState {
    /// A seeded state: `liked` is the viewing user's flag as handed over by
    /// the host, not yet tied to a user id.
    pub fn new(count: u32, liked: bool) -> Self {
        Self {
            liked,
            count,
            ..Self::default()
        }
    }

    /// Show the state as `viewer` sees it.
    ///
    /// Seeds carry only the viewer's flags and no per-user sets; the first
    /// view attributes those flags to `viewer`.
    pub fn view_as(&mut self, viewer: UserId) {
        if self.liked_by.is_empty() && self.disliked_by.is_empty() {
            if self.liked {
                self.liked_by.insert(viewer);
            } else if self.disliked {
                self.disliked_by.insert(viewer);
            }
        }
        self.refresh(viewer);
    }

    /// Drop the per-viewer flags, leaving only what every user shares.
    pub fn clear_view(&mut self) {
        self.liked = false;
        self.disliked = false;
    }

    /// Toggle `voter`'s like. Liking clears their previous dislike.
    pub fn like(&mut self, voter: UserId) {
        self.view_as(voter);
        if self.liked_by.remove(&voter) {
            self.count = self.count.saturating_sub(1);
        } else {
            self.liked_by.insert(voter);
            self.disliked_by.remove(&voter);
            self.count += 1;
        }
        self.refresh(voter);
    }

    /// Toggle `voter`'s dislike. Disliking withdraws their previous like.
    pub fn dislike(&mut self, voter: UserId) {
        self.view_as(voter);
        if !self.disliked_by.remove(&voter) {
            self.disliked_by.insert(voter);
            if self.liked_by.remove(&voter) {
                self.count = self.count.saturating_sub(1);
            }
        }
        self.refresh(voter);
    }

    fn refresh(&mut self, viewer: UserId) {
        self.liked = self.liked_by.contains(&viewer);
        self.disliked = self.disliked_by.contains(&viewer);
    }
}
