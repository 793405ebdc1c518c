use serde::Serialize;

use crate::config::DEFAULT_DRAG_DISMISS_THRESHOLD;
use crate::model::EntityRef;
use crate::{CommentId, Error, Result};

/// Where a context menu was opened, and so where dismissing it returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuHost {
    Page,
    ReplyPanel(CommentId),
}

impl MenuHost {
    fn base(self) -> Overlay {
        match self {
            MenuHost::Page => Overlay::None,
            MenuHost::ReplyPanel(comment) => Overlay::ReplyPanel { comment },
        }
    }
}

/// The single surface drawn above the comment page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Overlay {
    #[default]
    None,
    RatingDialog,
    Composer {
        reply_to_name: Option<String>,
    },
    ReplyPanel {
        comment: CommentId,
    },
    ContextMenu {
        entity: EntityRef,
        host: MenuHost,
    },
    DeleteConfirm {
        entity: EntityRef,
    },
}

impl Overlay {
    pub fn name(&self) -> &'static str {
        match self {
            Overlay::None => "none",
            Overlay::RatingDialog => "rating dialog",
            Overlay::Composer { .. } => "composer",
            Overlay::ReplyPanel { .. } => "reply panel",
            Overlay::ContextMenu { .. } => "context menu",
            Overlay::DeleteConfirm { .. } => "delete confirmation",
        }
    }
}

/// How the user tried to close the reply panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DismissGesture {
    /// Close or back button.
    Explicit,
    /// Tap on the dimmed mask around the panel.
    Mask,
    /// Drag of the panel handle, released after `distance`.
    Drag { distance: f32 },
}

/// State machine keeping at most one overlay open.
///
/// Modal surfaces (rating dialog, composer, reply panel) open from the bare
/// page or over a page-level context menu, which closes implicitly. Context
/// menus open from the page or from inside the reply panel and fall back to
/// wherever they were opened from when dismissed.
#[derive(Debug, Clone)]
pub struct OverlayCoordinator {
    state: Overlay,
    drag_dismiss_threshold: f32,
}

impl Default for OverlayCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_DISMISS_THRESHOLD)
    }
}

impl OverlayCoordinator {
    pub fn new(drag_dismiss_threshold: f32) -> Self {
        Self {
            state: Overlay::None,
            drag_dismiss_threshold,
        }
    }

    pub fn state(&self) -> &Overlay {
        &self.state
    }

    /// The open context menu's entity and host, if any.
    pub fn open_menu(&self) -> Option<(EntityRef, MenuHost)> {
        match self.state {
            Overlay::ContextMenu { entity, host } => Some((entity, host)),
            _ => None,
        }
    }

    pub fn reply_panel(&self) -> Option<CommentId> {
        match self.state {
            Overlay::ReplyPanel { comment } => Some(comment),
            _ => None,
        }
    }

    pub fn open_rating_dialog(&mut self, already_rated: bool) -> Result<()> {
        if already_rated {
            return Err(Error::AlreadyRated);
        }
        self.open_modal(Overlay::RatingDialog)
    }

    pub fn close_rating_dialog(&mut self) -> Result<()> {
        self.close_modal(|state| matches!(state, Overlay::RatingDialog), "rating dialog")
    }

    pub fn open_composer(&mut self, reply_to_name: Option<String>) -> Result<()> {
        self.open_modal(Overlay::Composer { reply_to_name })
    }

    pub fn close_composer(&mut self) -> Result<()> {
        self.close_modal(|state| matches!(state, Overlay::Composer { .. }), "composer")
    }

    pub fn open_reply_panel(&mut self, comment: CommentId) -> Result<()> {
        self.open_modal(Overlay::ReplyPanel { comment })
    }

    /// Close the reply panel. A drag shorter than the threshold snaps back and
    /// leaves the panel open; returns whether it closed.
    pub fn close_reply_panel(&mut self, gesture: DismissGesture) -> Result<bool> {
        if self.reply_panel().is_none() {
            return Err(Error::NoActiveOverlay {
                expected: "reply panel",
            });
        }
        if let DismissGesture::Drag { distance } = gesture {
            if distance <= self.drag_dismiss_threshold {
                log::debug!(
                    "reply panel drag of {} below threshold {}",
                    distance,
                    self.drag_dismiss_threshold
                );
                return Ok(false);
            }
        }
        self.transition(Overlay::None);
        Ok(true)
    }

    /// Open the menu of `entity`, close it if it is already the open one, or
    /// move the open menu over to `entity`.
    pub fn toggle_menu(&mut self, entity: EntityRef) -> Result<()> {
        let next = match &self.state {
            Overlay::ContextMenu { entity: open, host } if *open == entity => host.base(),
            Overlay::ContextMenu { host, .. } => Overlay::ContextMenu {
                entity,
                host: *host,
            },
            Overlay::None => Overlay::ContextMenu {
                entity,
                host: MenuHost::Page,
            },
            Overlay::ReplyPanel { comment } => Overlay::ContextMenu {
                entity,
                host: MenuHost::ReplyPanel(*comment),
            },
            other => {
                return Err(Error::OverlayBusy {
                    active: other.name(),
                });
            }
        };
        self.transition(next);
        Ok(())
    }

    /// Collapse an open context menu back to its host. Modal overlays ignore
    /// clicks outside of them. Returns whether a menu was closed.
    pub fn background_click(&mut self) -> bool {
        self.dismiss_menu().is_some()
    }

    /// Close the open context menu, returning what it was opened for.
    pub fn dismiss_menu(&mut self) -> Option<(EntityRef, MenuHost)> {
        let (entity, host) = self.open_menu()?;
        self.transition(host.base());
        Some((entity, host))
    }

    /// Turn the open context menu into a delete confirmation for its entity.
    pub fn request_delete(&mut self) -> Result<EntityRef> {
        let (entity, _) = self.open_menu().ok_or(Error::NoActiveOverlay {
            expected: "context menu",
        })?;
        self.transition(Overlay::DeleteConfirm { entity });
        Ok(entity)
    }

    /// Ask for delete confirmation without going through a menu.
    pub fn confirm_delete_of(&mut self, entity: EntityRef) -> Result<()> {
        match self.state {
            Overlay::None | Overlay::ReplyPanel { .. } | Overlay::ContextMenu { .. } => {
                self.transition(Overlay::DeleteConfirm { entity });
                Ok(())
            }
            _ => Err(Error::OverlayBusy {
                active: self.state.name(),
            }),
        }
    }

    pub fn pending_delete(&self) -> Option<EntityRef> {
        match self.state {
            Overlay::DeleteConfirm { entity } => Some(entity),
            _ => None,
        }
    }

    pub fn cancel_delete(&mut self) -> Result<()> {
        self.finish_delete().map(|_| ())
    }

    /// Leave the delete confirmation, returning the entity it was for.
    pub fn finish_delete(&mut self) -> Result<EntityRef> {
        let entity = self.pending_delete().ok_or(Error::NoActiveOverlay {
            expected: "delete confirmation",
        })?;
        self.transition(Overlay::None);
        Ok(entity)
    }

    fn open_modal(&mut self, next: Overlay) -> Result<()> {
        match self.state {
            Overlay::None
            | Overlay::ContextMenu {
                host: MenuHost::Page,
                ..
            } => {
                self.transition(next);
                Ok(())
            }
            _ => Err(Error::OverlayBusy {
                active: self.state.name(),
            }),
        }
    }

    fn close_modal(&mut self, is_open: impl Fn(&Overlay) -> bool, expected: &'static str) -> Result<()> {
        if !is_open(&self.state) {
            return Err(Error::NoActiveOverlay { expected });
        }
        self.transition(Overlay::None);
        Ok(())
    }

    fn transition(&mut self, next: Overlay) {
        log::debug!("overlay {} -> {}", self.state.name(), next.name());
        self.state = next;
    }
}
