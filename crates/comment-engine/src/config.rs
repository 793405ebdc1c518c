use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_MAX_CONTENT_CHARS: usize = 500;
pub(crate) const DEFAULT_MAX_DISPLAY_DEPTH: usize = 3;
pub(crate) const DEFAULT_DRAG_DISMISS_THRESHOLD: f32 = 100.0;

/// Tunables of a comment session. Every field falls back to its default when
/// absent from the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest accepted comment, reply or edit, in characters after trimming.
    pub max_content_chars: usize,
    /// Indent level at which reply rendering saturates. Data nesting is unbounded.
    pub max_display_depth: usize,
    /// Drag distance past which the reply panel dismisses itself.
    pub drag_dismiss_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            max_display_depth: DEFAULT_MAX_DISPLAY_DEPTH,
            drag_dismiss_threshold: DEFAULT_DRAG_DISMISS_THRESHOLD,
        }
    }
}
