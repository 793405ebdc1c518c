use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Comment;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Most liked first.
    #[default]
    Hottest,
    /// Most recent first.
    Time,
    /// Most recent first; a separate tab in the view with the same ordering as `Time`.
    Newest,
    /// Highest star rating given by the author first.
    RatingDesc,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Hottest => "hottest",
            SortMode::Time => "time",
            SortMode::Newest => "newest",
            SortMode::RatingDesc => "rating_desc",
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hottest" => Ok(SortMode::Hottest),
            "time" => Ok(SortMode::Time),
            "newest" => Ok(SortMode::Newest),
            "rating_desc" => Ok(SortMode::RatingDesc),
            other => Err(format!("unknown sort mode: {}", other)),
        }
    }
}

/// Order top-level comments for display without touching the input.
///
/// The sort is stable: comments that tie keep their relative order, so
/// repeated calls on the same input give the same result.
pub fn sort_comments(comments: &[Comment], mode: SortMode) -> Vec<&Comment> {
    let mut sorted: Vec<&Comment> = comments.iter().collect();
    match mode {
        SortMode::Hottest => sorted.sort_by(|a, b| b.reaction.count.cmp(&a.reaction.count)),
        SortMode::Time | SortMode::Newest => sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::RatingDesc => sorted.sort_by(|a, b| b.rating_given.cmp(&a.rating_given)),
    }
    sorted
}
