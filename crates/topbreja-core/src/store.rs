//! The `BrejaStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `topbreja-store-sqlite`).
//! Higher layers (`topbreja-api`, the [`crate::recorder::Recorder`]) depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  beer::{Beer, BeerQuery, NewBeer},
  engagement::{Comment, EngagementKind, EngagementState, EngagementSummary, NewRating, Rating},
  ranking::{Badge, BadgeTier, RankedBeer, RankedEntry, Ranking, RankingWeights},
  user::{NewUser, User},
};

/// Abstraction over the TopBreja relational store.
///
/// Nothing is ever hard-deleted: beers are deactivated, engagement records
/// are soft-deleted and reactivated. Every method that writes more than one
/// row does so atomically.
///
/// Writes that can move the leaderboard take the [`RankingWeights`] and
/// re-rank the catalog in the same transaction: either the write and the new
/// positions and badges are both persisted, or neither is.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BrejaStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Provision the row for a user created by the authentication provider.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Returns `NotFound` if the user does not exist.
  fn update_display_name(
    &self,
    id: Uuid,
    display_name: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Beers ─────────────────────────────────────────────────────────────

  /// Insert a beer together with its zeroed `ranking` row.
  fn add_beer(
    &self,
    input: NewBeer,
    weights: RankingWeights,
  ) -> impl Future<Output = Result<Beer, Self::Error>> + Send + '_;

  fn update_beer(
    &self,
    id: Uuid,
    input: NewBeer,
  ) -> impl Future<Output = Result<Beer, Self::Error>> + Send + '_;

  fn set_beer_active(
    &self,
    id: Uuid,
    active: bool,
    weights: RankingWeights,
  ) -> impl Future<Output = Result<Beer, Self::Error>> + Send + '_;

  fn get_beer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Beer>, Self::Error>> + Send + '_;

  /// Beers matching `query`, ordered by name.
  fn list_beers<'a>(
    &'a self,
    query: &'a BeerQuery,
  ) -> impl Future<Output = Result<Vec<Beer>, Self::Error>> + Send + 'a;

  // ── Votes & favorites ─────────────────────────────────────────────────

  /// Flip the `(user, beer, kind)` record in one conditional upsert and
  /// recompute the beer's counters in the same transaction. Returns the
  /// resulting state (never `Absent`).
  fn toggle_engagement(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    kind: EngagementKind,
    weights: RankingWeights,
  ) -> impl Future<Output = Result<EngagementState, Self::Error>> + Send + '_;

  /// Like [`Self::toggle_engagement`] but always ends `Active`.
  fn activate_engagement(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    kind: EngagementKind,
    weights: RankingWeights,
  ) -> impl Future<Output = Result<EngagementState, Self::Error>> + Send + '_;

  fn engagement_summary(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
  ) -> impl Future<Output = Result<EngagementSummary, Self::Error>> + Send + '_;

  /// Active beers the user has an active favorite for, most recent first.
  fn list_favorites(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Beer>, Self::Error>> + Send + '_;

  // ── Ratings & comments ────────────────────────────────────────────────

  /// Insert or overwrite the user's rating and recompute counters.
  fn upsert_rating(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    input: NewRating,
    weights: RankingWeights,
  ) -> impl Future<Output = Result<Rating, Self::Error>> + Send + '_;

  fn get_rating(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
  ) -> impl Future<Output = Result<Option<Rating>, Self::Error>> + Send + '_;

  fn add_comment(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    body: String,
    weights: RankingWeights,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// A non-deleted comment by id.
  fn get_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Soft-delete a comment and recompute counters.
  fn delete_comment(
    &self,
    id: Uuid,
    weights: RankingWeights,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Non-deleted comments of a beer, newest first.
  fn list_comments(
    &self,
    beer_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Ranking ───────────────────────────────────────────────────────────

  /// Re-rank every active beer with `weights`, persist scores and positions
  /// and rewrite the badges, all in one transaction.
  fn refresh_ranking<'a>(
    &'a self,
    weights: &'a RankingWeights,
  ) -> impl Future<Output = Result<Vec<RankedEntry>, Self::Error>> + Send + 'a;

  fn get_ranking(
    &self,
    beer_id: Uuid,
  ) -> impl Future<Output = Result<Option<Ranking>, Self::Error>> + Send + '_;

  /// Counters and badge of each listed beer that has a `ranking` row, in one
  /// query. Order is unspecified.
  fn rankings_for<'a>(
    &'a self,
    beer_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<(Ranking, Option<BadgeTier>)>, Self::Error>> + Send + 'a;

  /// Active beers in persisted leaderboard order, with their badges.
  fn leaderboard(
    &self,
  ) -> impl Future<Output = Result<Vec<RankedBeer>, Self::Error>> + Send + '_;

  fn badges(
    &self,
  ) -> impl Future<Output = Result<Vec<Badge>, Self::Error>> + Send + '_;
}
