use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result, UserId};

const MIN_STARS: u8 = 1;
const MAX_STARS: u8 = 5;
/// Fraction of a star from which a half star is drawn.
const HALF_STAR_THRESHOLD: f64 = 0.25;
/// `average` is kept on a 0-10 scale, twice the star scale.
const AVERAGE_SCALE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Star {
    Full,
    Half,
    Empty,
}

/// Rating aggregate of one event plus the votes behind it.
///
/// `votes` holds each user's own vote; `user_rating` is the vote of the user
/// the aggregate was last viewed as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Mean vote on a 0-10 scale; 0 means nobody rated yet.
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub total_count: u32,
    /// Seeds encode "not rated" as 0, which loads as `None`.
    #[serde(default, deserialize_with = "deserialize_user_rating")]
    pub user_rating: Option<u8>,
    /// Vote count per star value.
    #[serde(default)]
    pub distribution: BTreeMap<u8, u32>,
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "deserialize_votes"
    )]
    pub votes: BTreeMap<UserId, u8>,
}

fn deserialize_user_rating<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u8>, D::Error> {
    match Option::<u8>::deserialize(deserializer)? {
        None | Some(0) => Ok(None),
        Some(value) => validate_stars(value)
            .map(|()| Some(value))
            .map_err(serde::de::Error::custom),
    }
}

fn deserialize_votes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<BTreeMap<UserId, u8>, D::Error> {
    let votes = BTreeMap::<UserId, u8>::deserialize(deserializer)?;
    for value in votes.values() {
        validate_stars(*value).map_err(serde::de::Error::custom)?;
    }
    Ok(votes)
}

fn validate_stars(value: u8) -> Result<()> {
    if (MIN_STARS..=MAX_STARS).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidRating { value })
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self {
            average: 0.0,
            total_count: 0,
            user_rating: None,
            distribution: (MIN_STARS..=MAX_STARS).map(|star| (star, 0)).collect(),
            votes: BTreeMap::new(),
        }
    }
}

impl Rating {
    /// Whether the user the aggregate is viewed as has voted.
    pub fn is_rated(&self) -> bool {
        self.user_rating.is_some()
    }

    pub fn vote_of(&self, voter: UserId) -> Option<u8> {
        self.votes.get(&voter).copied()
    }

    /// Show the aggregate as `viewer` sees it.
    ///
    /// A seed carries only the viewer's own vote and no `votes`; the first
    /// view attributes that vote to `viewer`. It is already part of the
    /// aggregate, so no counter moves.
    pub fn view_as(&mut self, viewer: UserId) {
        if self.votes.is_empty() {
            if let Some(value) = self.user_rating {
                self.votes.insert(viewer, value);
            }
        }
        self.user_rating = self.vote_of(viewer);
    }

    /// Record `voter`'s vote. A user votes once; changing the vote goes
    /// through [`Rating::edit`].
    pub fn submit(&mut self, voter: UserId, value: u8) -> Result<()> {
        validate_stars(value)?;
        self.view_as(voter);
        if self.is_rated() {
            return Err(Error::AlreadyRated);
        }
        let count = f64::from(self.total_count);
        let average = (self.average * count + f64::from(value) * AVERAGE_SCALE) / (count + 1.0);
        self.average = clamp_average(average);
        self.total_count += 1;
        *self.distribution.entry(value).or_default() += 1;
        self.votes.insert(voter, value);
        self.user_rating = Some(value);
        Ok(())
    }

    /// Replace `voter`'s earlier vote, returning the previous value.
    pub fn edit(&mut self, voter: UserId, value: u8) -> Result<u8> {
        validate_stars(value)?;
        self.view_as(voter);
        let previous = self.user_rating.ok_or(Error::NotRated)?;
        if self.total_count == 0 {
            self.average = f64::from(value) * AVERAGE_SCALE;
        } else {
            let count = f64::from(self.total_count);
            let delta = (f64::from(value) - f64::from(previous)) * AVERAGE_SCALE;
            self.average = clamp_average(self.average + delta / count);
        }
        if let Some(bucket) = self.distribution.get_mut(&previous) {
            *bucket = bucket.saturating_sub(1);
        }
        *self.distribution.entry(value).or_default() += 1;
        self.votes.insert(voter, value);
        self.user_rating = Some(value);
        Ok(previous)
    }

    /// Five stars for the aggregate: full up to the whole part of
    /// `average / 2`, then a half star when the remainder reaches a quarter.
    pub fn star_display(&self) -> [Star; 5] {
        let stars = self.average / AVERAGE_SCALE;
        let whole = stars.floor();
        let half = stars - whole >= HALF_STAR_THRESHOLD;
        std::array::from_fn(|index| {
            let position = (index + 1) as f64;
            if position <= whole {
                Star::Full
            } else if position == whole + 1.0 && half {
                Star::Half
            } else {
                Star::Empty
            }
        })
    }

    /// The numeric label next to the stars; hidden while nobody rated.
    pub fn average_label(&self) -> Option<String> {
        if self.average == 0.0 {
            None
        } else {
            Some(format!("{:.1}", self.average))
        }
    }

    /// The current user's own vote drawn as whole stars.
    pub fn user_stars(&self) -> [Star; 5] {
        let given = usize::from(self.user_rating.unwrap_or(0));
        std::array::from_fn(|index| if index < given { Star::Full } else { Star::Empty })
    }

    pub fn votes_for(&self, star: u8) -> u32 {
        self.distribution.get(&star).copied().unwrap_or(0)
    }
}

fn clamp_average(average: f64) -> f64 {
    average.clamp(0.0, f64::from(MAX_STARS) * AVERAGE_SCALE)
}
