//! Handlers for the leaderboard and beer battles.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/ranking` | public; ordered beer cards |
//! | `POST` | `/ranking/refresh` | admin; re-rank now |
//! | `GET`  | `/battle` | public; `{"left": card, "right": card}` |
//! | `POST` | `/battle` | body `{"winner": id, "loser": id}` |

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use topbreja_core::{Error as CoreError, dto::BeerCard, ranking::RankedBeer};
use uuid::Uuid;

use crate::{
  AppState, Backend,
  auth::{AdminUser, CurrentUser},
  beers::cards,
  engagement::StateBody,
  error::ApiError,
};

fn leaderboard_cards<S>(state: &AppState<S>, ranked: Vec<RankedBeer>) -> Vec<BeerCard> {
  ranked
    .into_iter()
    .map(|r| BeerCard::from_ranked(r, state.images.as_ref()))
    .collect()
}

/// `GET /ranking`
pub async fn leaderboard<S: Backend>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<BeerCard>>, ApiError> {
  let ranked = state.recorder.leaderboard().await?;
  Ok(Json(leaderboard_cards(&state, ranked)))
}

/// `POST /ranking/refresh`
pub async fn refresh<S: Backend>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
) -> Result<Json<Vec<BeerCard>>, ApiError> {
  let ranked = state.recorder.compute_ranking().await?;
  tracing::info!(admin = %admin.user_id, beers = ranked.len(), "ranking recomputed");
  Ok(Json(leaderboard_cards(&state, ranked)))
}

// ─── Battle ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BattlePair {
  pub left:  BeerCard,
  pub right: BeerCard,
}

/// `GET /battle`
pub async fn battle_pair<S: Backend>(
  State(state): State<AppState<S>>,
) -> Result<Json<BattlePair>, ApiError> {
  let (left, right) = state.recorder.pick_battle_pair().await?;
  let mut pair = cards(&state, vec![left, right]).await?.into_iter();
  match (pair.next(), pair.next()) {
    (Some(left), Some(right)) => Ok(Json(BattlePair { left, right })),
    _ => Err(CoreError::not_found("two active beers to battle").into()),
  }
}

#[derive(Debug, Deserialize)]
pub struct BattleVote {
  pub winner: Uuid,
  pub loser:  Uuid,
}

/// `POST /battle`
pub async fn battle_vote<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<BattleVote>,
) -> Result<Json<StateBody>, ApiError> {
  let engagement = state.recorder.battle_vote(&user, body.winner, body.loser).await?;
  Ok(Json(StateBody { state: engagement }))
}
