//! Handlers for the caller's profile and session.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/me` | resolved user and admin flag |
//! | `PATCH` | `/me` | body `{"display_name": "..."}` |
//! | `GET`   | `/me/favorites` | most recently favorited first |
//! | `POST`  | `/auth/refresh` | drop the cached session and resolve again |
//! | `POST`  | `/auth/sign-out` | end the session |

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use topbreja_core::{dto::BeerCard, session::AuthState, user::User};

use crate::{
  AppState, Backend,
  auth::{Bearer, CurrentUser},
  beers::cards,
  error::ApiError,
};

/// `GET /me`
pub async fn show<S: Backend>(CurrentUser(user): CurrentUser) -> Json<AuthState> {
  Json(AuthState::for_user(user))
}

#[derive(Debug, Deserialize)]
pub struct ProfileBody {
  pub display_name: String,
}

/// `PATCH /me`
pub async fn rename<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Bearer(token): Bearer,
  Json(body): Json<ProfileBody>,
) -> Result<Json<User>, ApiError> {
  let user = state.recorder.rename(&user, &body.display_name).await?;
  // The cached resolution still carries the old name.
  state.sessions.refresh(&token).await;
  Ok(Json(user))
}

/// `GET /me/favorites`
pub async fn favorites<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<BeerCard>>, ApiError> {
  let beers = state.recorder.favorites(&user).await?;
  Ok(Json(cards(&state, beers).await?))
}

/// `POST /auth/refresh`
pub async fn refresh<S: Backend>(
  State(state): State<AppState<S>>,
  Bearer(token): Bearer,
) -> Json<AuthState> {
  Json(state.sessions.refresh(&token).await)
}

/// `POST /auth/sign-out`
pub async fn sign_out<S: Backend>(
  State(state): State<AppState<S>>,
  Bearer(token): Bearer,
) -> Result<StatusCode, ApiError> {
  state.sessions.sign_out(&token).await?;
  Ok(StatusCode::NO_CONTENT)
}
