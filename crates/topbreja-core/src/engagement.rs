//! Engagement records: votes, favorites, ratings and comments.
//!
//! Votes and favorites are toggles. Each `(user, beer, kind)` triple owns at
//! most one record, which moves through a three-state machine; toggling off
//! is a soft delete and toggling back on reactivates the same record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

const MAX_COMMENT: usize = 2000;
const MAX_REVIEW: usize = 4000;

// ─── Toggle state machine ────────────────────────────────────────────────────

/// Which toggle-style engagement a record belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EngagementKind {
  Vote,
  Favorite,
}

/// Lifecycle of a single vote or favorite record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementState {
  /// No record exists for the pair.
  #[default]
  Absent,
  Active,
  /// A record exists but is soft-deleted.
  Inactive,
}

impl EngagementState {
  /// The only transitions a toggle may perform:
  /// `Absent → Active`, `Active → Inactive`, `Inactive → Active`.
  pub fn toggled(self) -> Self {
    match self {
      Self::Absent | Self::Inactive => Self::Active,
      Self::Active => Self::Inactive,
    }
  }

  /// Decode the stored soft-delete flag; `None` means no row.
  pub fn from_deleted_flag(deleted: Option<bool>) -> Self {
    match deleted {
      None => Self::Absent,
      Some(false) => Self::Active,
      Some(true) => Self::Inactive,
    }
  }

  pub fn is_active(self) -> bool { self == Self::Active }
}

// ─── Optimistic toggle reducer ───────────────────────────────────────────────

/// Events fed to [`OptimisticToggle::reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEvent {
  /// The user pressed the button; the request is in flight.
  Requested,
  /// The backend accepted the toggle and reported the resulting state.
  Confirmed(EngagementState),
  /// The backend rejected the toggle; revert to the committed state.
  Failed,
}

/// Client-side view of a toggle button with optimistic updates.
///
/// `committed` is the last state the backend confirmed; `pending` is the
/// state shown while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptimisticToggle {
  pub committed: EngagementState,
  pub pending:   Option<EngagementState>,
}

impl OptimisticToggle {
  pub fn new(committed: EngagementState) -> Self { Self { committed, pending: None } }

  /// The state the UI should display.
  pub fn displayed(&self) -> EngagementState { self.pending.unwrap_or(self.committed) }

  pub fn in_flight(&self) -> bool { self.pending.is_some() }

  pub fn reduce(self, event: ToggleEvent) -> Self {
    match event {
      // A second press while in flight is ignored; the button is busy.
      ToggleEvent::Requested if self.in_flight() => self,
      ToggleEvent::Requested => Self {
        committed: self.committed,
        pending:   Some(self.committed.toggled()),
      },
      ToggleEvent::Confirmed(state) => Self { committed: state, pending: None },
      ToggleEvent::Failed => Self { committed: self.committed, pending: None },
    }
  }
}

/// Current vote and favorite state of one user for one beer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngagementSummary {
  pub vote:     EngagementState,
  pub favorite: EngagementState,
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// A user's star rating (and optional review) of a beer. One per pair;
/// resubmitting overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
  pub user_id:      Uuid,
  pub beer_id:      Uuid,
  pub stars:        u8,
  pub review_score: Option<u8>,
  pub review:       Option<String>,
  pub updated_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRating {
  pub stars:        u8,
  pub review_score: Option<u8>,
  pub review:       Option<String>,
}

impl NewRating {
  pub fn stars(stars: u8) -> Self { Self { stars, review_score: None, review: None } }

  pub fn normalized(&self) -> Result<Self> {
    if !(1..=5).contains(&self.stars) {
      return Err(Error::validation("stars must be between 1 and 5"));
    }
    if self.review_score.is_some_and(|s| s > 10) {
      return Err(Error::validation("review score must be between 0 and 10"));
    }
    let review = self
      .review
      .as_deref()
      .map(str::trim)
      .filter(|r| !r.is_empty())
      .map(str::to_owned);
    if review.as_ref().is_some_and(|r| r.chars().count() > MAX_REVIEW) {
      return Err(Error::validation(format!(
        "review must be at most {MAX_REVIEW} characters"
      )));
    }
    Ok(Self { stars: self.stars, review_score: self.review_score, review })
  }
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub user_id:    Uuid,
  pub beer_id:    Uuid,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}

/// Trim a comment body and check its length.
pub fn validate_comment(body: &str) -> Result<String> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return Err(Error::validation("comment must not be empty"));
  }
  if trimmed.chars().count() > MAX_COMMENT {
    return Err(Error::validation(format!(
      "comment must be at most {MAX_COMMENT} characters"
    )));
  }
  Ok(trimmed.to_owned())
}
