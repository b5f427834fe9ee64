//! Bearer-token extractors.
//!
//! Handlers state what they need by the extractor they take: [`MaybeUser`]
//! for public pages, [`CurrentUser`] for engagement, [`AdminUser`] for catalog
//! administration. Role checks never reach the recorder.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use topbreja_core::{Error as CoreError, session::AuthState, user::User};

use crate::{AppState, Backend, error::ApiError};

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// The raw bearer token; rejects requests without one.
pub struct Bearer(pub String);

/// Whoever is calling, possibly nobody.
pub struct MaybeUser(pub AuthState);

/// A signed-in user.
pub struct CurrentUser(pub User);

/// A signed-in user with the admin role.
pub struct AdminUser(pub User);

impl<S: Backend> FromRequestParts<AppState<S>> for Bearer {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    bearer_token(&parts.headers)
      .map(|t| Bearer(t.to_owned()))
      .ok_or(ApiError::Core(CoreError::NotAuthenticated))
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for MaybeUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let auth = match bearer_token(&parts.headers) {
      Some(token) => state.sessions.resolve(token).await,
      None => AuthState::anonymous(),
    };
    Ok(MaybeUser(auth))
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let MaybeUser(auth) = MaybeUser::from_request_parts(parts, state).await?;
    auth
      .user
      .map(CurrentUser)
      .ok_or(ApiError::Core(CoreError::NotAuthenticated))
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for AdminUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
    if !user.is_admin() {
      return Err(ApiError::Core(CoreError::NotAuthorized));
    }
    Ok(AdminUser(user))
  }
}
