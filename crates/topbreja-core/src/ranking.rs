//! Leaderboard scoring, badge assignment and battle pairing.
//!
//! Counters live in the `ranking` row of each beer and are maintained by the
//! store. This module turns them into a composite score, a total order and
//! the gold/silver/bronze badges. Everything here is pure; the store calls
//! [`rank`] inside the transaction that persists positions.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result, beer::Beer};

const MAX_STARS: f64 = 5.0;
const MAX_REVIEW_SCORE: f64 = 10.0;

// ─── Stored aggregate ────────────────────────────────────────────────────────

/// Aggregate counters of one beer (one `ranking` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
  pub beer_id:          Uuid,
  pub total_votes:      u64,
  pub avg_stars:        f64,
  pub avg_review_score: f64,
  pub total_ratings:    u64,
  pub total_favorites:  u64,
  pub total_comments:   u64,
  pub composite_score:  f64,
  /// 1-based leaderboard position; `None` for inactive beers.
  pub position:         Option<u32>,
  pub updated_at:       DateTime<Utc>,
}

// ─── Weights ─────────────────────────────────────────────────────────────────

/// Weights of the composite score. Each counter is normalised to `0..=1`
/// before weighting: vote, favorite and comment counts against the catalog
/// maximum, averages against their scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
  pub votes:     f64,
  pub stars:     f64,
  pub review:    f64,
  pub favorites: f64,
  pub comments:  f64,
}

impl Default for RankingWeights {
  fn default() -> Self {
    Self { votes: 0.4, stars: 0.3, review: 0.0, favorites: 0.2, comments: 0.1 }
  }
}

impl RankingWeights {
  pub fn validate(&self) -> Result<()> {
    let all = [
      ("votes", self.votes),
      ("stars", self.stars),
      ("review", self.review),
      ("favorites", self.favorites),
      ("comments", self.comments),
    ];
    for (name, w) in all {
      if !w.is_finite() || w < 0.0 {
        return Err(Error::validation(format!(
          "ranking weight {name} must be a non-negative number"
        )));
      }
    }
    Ok(())
  }
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

/// A beer's position after [`rank`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedEntry {
  pub beer_id:         Uuid,
  pub composite_score: f64,
  pub position:        u32,
}

fn ratio(value: u64, max: u64) -> f64 {
  if max == 0 { 0.0 } else { value as f64 / max as f64 }
}

/// Composite score of `r` given the catalog maxima.
pub fn composite_score(
  r: &Ranking,
  weights: &RankingWeights,
  max_votes: u64,
  max_favorites: u64,
  max_comments: u64,
) -> f64 {
  weights.votes * ratio(r.total_votes, max_votes)
    + weights.stars * (r.avg_stars / MAX_STARS).clamp(0.0, 1.0)
    + weights.review * (r.avg_review_score / MAX_REVIEW_SCORE).clamp(0.0, 1.0)
    + weights.favorites * ratio(r.total_favorites, max_favorites)
    + weights.comments * ratio(r.total_comments, max_comments)
}

/// Total order of the leaderboard: higher score first, then lower beer id.
pub fn leaderboard_order(a: (f64, Uuid), b: (f64, Uuid)) -> Ordering {
  b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1))
}

/// Score and order `rankings`. Callers pass only active beers.
pub fn rank(rankings: &[Ranking], weights: &RankingWeights) -> Vec<RankedEntry> {
  let max_votes = rankings.iter().map(|r| r.total_votes).max().unwrap_or(0);
  let max_favorites = rankings.iter().map(|r| r.total_favorites).max().unwrap_or(0);
  let max_comments = rankings.iter().map(|r| r.total_comments).max().unwrap_or(0);

  let mut scored: Vec<(f64, Uuid)> = rankings
    .iter()
    .map(|r| {
      let score = composite_score(r, weights, max_votes, max_favorites, max_comments);
      (score, r.beer_id)
    })
    .collect();

  scored.sort_by(|a, b| leaderboard_order(*a, *b));

  scored
    .into_iter()
    .enumerate()
    .map(|(i, (composite_score, beer_id))| RankedEntry {
      beer_id,
      composite_score,
      position: i as u32 + 1,
    })
    .collect()
}

// ─── Badges ──────────────────────────────────────────────────────────────────

/// Badge (selo) tier derived from a leaderboard position.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BadgeTier {
  Gold,
  Silver,
  Bronze,
}

impl BadgeTier {
  pub fn for_position(position: u32) -> Option<Self> {
    match position {
      1 => Some(Self::Gold),
      2 => Some(Self::Silver),
      3 => Some(Self::Bronze),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Badge {
  pub beer_id:  Uuid,
  pub tier:     BadgeTier,
  pub position: u32,
}

/// Badges for a ranked leaderboard. Beers without any engagement
/// (composite score 0) earn nothing, whatever their position.
pub fn assign_badges(ranked: &[RankedEntry]) -> Vec<Badge> {
  ranked
    .iter()
    .filter(|e| e.composite_score > 0.0)
    .filter_map(|e| {
      BadgeTier::for_position(e.position).map(|tier| Badge {
        beer_id: e.beer_id,
        tier,
        position: e.position,
      })
    })
    .collect()
}

/// A leaderboard row: the beer with its counters and badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedBeer {
  pub beer:    Beer,
  pub ranking: Ranking,
  pub badge:   Option<BadgeTier>,
}

// ─── Battle ──────────────────────────────────────────────────────────────────

/// Pick two distinct active beers uniformly at random. Returns `None` when
/// fewer than two active beers exist.
pub fn pick_battle_pair<R>(beers: &[Beer], rng: &mut R) -> Option<(Beer, Beer)>
where
  R: Rng + ?Sized,
{
  let active: Vec<&Beer> = beers.iter().filter(|b| b.active).collect();
  let mut picked = active.choose_multiple(rng, 2);
  let first = picked.next()?;
  let second = picked.next()?;
  Some(((*first).clone(), (*second).clone()))
}
