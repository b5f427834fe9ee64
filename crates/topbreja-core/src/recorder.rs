//! The [`Recorder`]: engagement writes, catalog administration and ranking
//! reads on top of any [`BrejaStore`].
//!
//! Every write that can move a counter re-ranks the catalog inside the same
//! store transaction, so the persisted leaderboard always reflects the last
//! committed write and a failed re-rank rolls the write back.
//! Role checks happen at the HTTP boundary, not here.

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
  Error, Result,
  beer::{Beer, BeerQuery, NewBeer},
  engagement::{
    Comment, EngagementKind, EngagementState, EngagementSummary, NewRating, Rating,
    validate_comment,
  },
  ranking::{BadgeTier, RankedBeer, Ranking, RankingWeights, pick_battle_pair},
  store::BrejaStore,
  user::User,
};

fn store_err<E: Into<Error>>(e: E) -> Error { e.into() }

pub struct Recorder<S> {
  store:   Arc<S>,
  weights: RankingWeights,
}

impl<S> Clone for Recorder<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store), weights: self.weights } }
}

impl<S: BrejaStore> Recorder<S> {
  pub fn new(store: Arc<S>, weights: RankingWeights) -> Self { Self { store, weights } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn weights(&self) -> &RankingWeights { &self.weights }

  /// The beer, provided it exists and is active.
  pub async fn active_beer(&self, beer_id: Uuid) -> Result<Beer> {
    self
      .store
      .get_beer(beer_id)
      .await
      .map_err(store_err)?
      .filter(|b| b.active)
      .ok_or_else(|| Error::not_found(format!("beer {beer_id}")))
  }

  // ── Votes & favorites ─────────────────────────────────────────────────

  pub async fn toggle_vote(&self, user: &User, beer_id: Uuid) -> Result<EngagementState> {
    self.toggle(user, beer_id, EngagementKind::Vote).await
  }

  pub async fn toggle_favorite(&self, user: &User, beer_id: Uuid) -> Result<EngagementState> {
    self.toggle(user, beer_id, EngagementKind::Favorite).await
  }

  async fn toggle(
    &self,
    user: &User,
    beer_id: Uuid,
    kind: EngagementKind,
  ) -> Result<EngagementState> {
    self.active_beer(beer_id).await?;
    let state = self
      .store
      .toggle_engagement(user.user_id, beer_id, kind, self.weights)
      .await
      .map_err(store_err)?;
    tracing::debug!(user = %user.user_id, beer = %beer_id, kind = kind.as_ref(), ?state, "toggled");
    Ok(state)
  }

  /// Record the outcome of a battle as an active vote for `winner`.
  pub async fn battle_vote(
    &self,
    user: &User,
    winner: Uuid,
    loser: Uuid,
  ) -> Result<EngagementState> {
    if winner == loser {
      return Err(Error::validation("a battle needs two different beers"));
    }
    self.active_beer(winner).await?;
    self.active_beer(loser).await?;

    self
      .store
      .activate_engagement(user.user_id, winner, EngagementKind::Vote, self.weights)
      .await
      .map_err(store_err)
  }

  /// Current vote and favorite state of `user` for an active beer.
  pub async fn engagement(&self, user: &User, beer_id: Uuid) -> Result<EngagementSummary> {
    self.active_beer(beer_id).await?;
    self
      .store
      .engagement_summary(user.user_id, beer_id)
      .await
      .map_err(store_err)
  }

  /// Active beers `user` has favorited, most recent first.
  pub async fn favorites(&self, user: &User) -> Result<Vec<Beer>> {
    self.store.list_favorites(user.user_id).await.map_err(store_err)
  }

  // ── Ratings & comments ────────────────────────────────────────────────

  pub async fn submit_rating(
    &self,
    user: &User,
    beer_id: Uuid,
    input: NewRating,
  ) -> Result<Rating> {
    let input = input.normalized()?;
    self.active_beer(beer_id).await?;
    self
      .store
      .upsert_rating(user.user_id, beer_id, input, self.weights)
      .await
      .map_err(store_err)
  }

  pub async fn rating(&self, user: &User, beer_id: Uuid) -> Result<Option<Rating>> {
    self.store.get_rating(user.user_id, beer_id).await.map_err(store_err)
  }

  pub async fn add_comment(&self, user: &User, beer_id: Uuid, body: &str) -> Result<Comment> {
    let body = validate_comment(body)?;
    self.active_beer(beer_id).await?;
    self
      .store
      .add_comment(user.user_id, beer_id, body, self.weights)
      .await
      .map_err(store_err)
  }

  /// Soft-delete a comment. Only its author or an admin may do so.
  pub async fn delete_comment(&self, user: &User, comment_id: Uuid) -> Result<()> {
    let comment = self
      .store
      .get_comment(comment_id)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::not_found(format!("comment {comment_id}")))?;

    if comment.user_id != user.user_id && !user.is_admin() {
      return Err(Error::NotAuthorized);
    }

    self
      .store
      .delete_comment(comment_id, self.weights)
      .await
      .map_err(store_err)
  }

  pub async fn list_comments(&self, beer_id: Uuid) -> Result<Vec<Comment>> {
    self.active_beer(beer_id).await?;
    self.store.list_comments(beer_id).await.map_err(store_err)
  }

  // ── Profile ───────────────────────────────────────────────────────────

  pub async fn rename(&self, user: &User, display_name: &str) -> Result<User> {
    let user = self
      .store
      .update_display_name(user.user_id, display_name.to_owned())
      .await
      .map_err(store_err)?;
    tracing::debug!(user = %user.user_id, "display name changed");
    Ok(user)
  }

  // ── Catalog ───────────────────────────────────────────────────────────

  /// A beer regardless of its status.
  pub async fn beer(&self, beer_id: Uuid) -> Result<Option<Beer>> {
    self.store.get_beer(beer_id).await.map_err(store_err)
  }

  pub async fn beers(&self, query: &BeerQuery) -> Result<Vec<Beer>> {
    self.store.list_beers(query).await.map_err(store_err)
  }

  /// Counters and badge of each listed beer, keyed by beer id.
  pub async fn rankings(
    &self,
    beer_ids: &[Uuid],
  ) -> Result<HashMap<Uuid, (Ranking, Option<BadgeTier>)>> {
    if beer_ids.is_empty() {
      return Ok(HashMap::new());
    }
    let rows = self.store.rankings_for(beer_ids).await.map_err(store_err)?;
    Ok(rows.into_iter().map(|row| (row.0.beer_id, row)).collect())
  }

  pub async fn create_beer(&self, input: NewBeer) -> Result<Beer> {
    let input = input.normalized()?;
    let beer = self.store.add_beer(input, self.weights).await.map_err(store_err)?;
    tracing::info!(beer = %beer.beer_id, name = %beer.name, "beer created");
    Ok(beer)
  }

  pub async fn update_beer(&self, beer_id: Uuid, input: NewBeer) -> Result<Beer> {
    let input = input.normalized()?;
    let beer = self.store.update_beer(beer_id, input).await.map_err(store_err)?;
    tracing::info!(beer = %beer.beer_id, "beer updated");
    Ok(beer)
  }

  pub async fn set_beer_active(&self, beer_id: Uuid, active: bool) -> Result<Beer> {
    let beer = self
      .store
      .set_beer_active(beer_id, active, self.weights)
      .await
      .map_err(store_err)?;
    tracing::info!(beer = %beer.beer_id, active, "beer status changed");
    Ok(beer)
  }

  // ── Ranking & battle ──────────────────────────────────────────────────

  /// Re-rank the catalog now and return the leaderboard.
  pub async fn compute_ranking(&self) -> Result<Vec<RankedBeer>> {
    self.store.refresh_ranking(&self.weights).await.map_err(store_err)?;
    self.leaderboard().await
  }

  /// The persisted leaderboard, as of the last write.
  pub async fn leaderboard(&self) -> Result<Vec<RankedBeer>> {
    self.store.leaderboard().await.map_err(store_err)
  }

  /// Two distinct active beers, chosen uniformly at random.
  pub async fn pick_battle_pair(&self) -> Result<(Beer, Beer)> {
    let beers = self
      .store
      .list_beers(&BeerQuery::default())
      .await
      .map_err(store_err)?;
    pick_battle_pair(&beers, &mut rand::thread_rng())
      .ok_or_else(|| Error::not_found("two active beers to battle"))
  }
}
