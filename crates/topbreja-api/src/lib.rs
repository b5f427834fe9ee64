//! JSON REST API for TopBreja.
//!
//! Exposes an axum [`Router`] backed by any store that implements both
//! [`BrejaStore`] and [`AuthProvider`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", topbreja_api::api_router(state))
//! ```

pub mod auth;
pub mod beers;
pub mod engagement;
pub mod error;
pub mod me;
pub mod ranking;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use topbreja_core::{
  image::ImageResolver,
  ranking::RankingWeights,
  recorder::Recorder,
  session::{AuthProvider, SessionCache, SessionResolver},
  store::BrejaStore,
};

pub use error::ApiError;

/// A backend the API can serve from: data plus session lookups.
pub trait Backend: BrejaStore + AuthProvider + 'static {}

impl<T: BrejaStore + AuthProvider + 'static> Backend for T {}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub recorder: Recorder<S>,
  pub sessions: SessionResolver<S, S>,
  pub images:   Arc<dyn ImageResolver>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      recorder: self.recorder.clone(),
      sessions: self.sessions.clone(),
      images:   Arc::clone(&self.images),
    }
  }
}

impl<S: Backend> AppState<S> {
  pub fn new(
    store: Arc<S>,
    weights: RankingWeights,
    cache: Arc<dyn SessionCache>,
    images: Arc<dyn ImageResolver>,
  ) -> Self {
    Self {
      recorder: Recorder::new(Arc::clone(&store), weights),
      sessions: SessionResolver::new(Arc::clone(&store), store, cache),
      images,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Backend>(state: AppState<S>) -> Router<()> {
  Router::new()
    // Catalog
    .route("/beers", get(beers::list::<S>).post(beers::create::<S>))
    .route("/beers/{id}", get(beers::get_one::<S>).put(beers::update::<S>))
    .route("/beers/{id}/active", post(beers::set_active::<S>))
    // Engagement
    .route("/beers/{id}/vote", post(engagement::vote::<S>))
    .route("/beers/{id}/favorite", post(engagement::favorite::<S>))
    .route("/beers/{id}/engagement", get(engagement::summary::<S>))
    .route(
      "/beers/{id}/rating",
      get(engagement::my_rating::<S>).post(engagement::rate::<S>),
    )
    .route(
      "/beers/{id}/comments",
      get(engagement::comments::<S>).post(engagement::comment::<S>),
    )
    .route("/comments/{id}", delete(engagement::delete_comment::<S>))
    // Ranking & battle
    .route("/ranking", get(ranking::leaderboard::<S>))
    .route("/ranking/refresh", post(ranking::refresh::<S>))
    .route("/battle", get(ranking::battle_pair::<S>).post(ranking::battle_vote::<S>))
    // Profile & session
    .route("/me", get(me::show::<S>).patch(me::rename::<S>))
    .route("/me/favorites", get(me::favorites::<S>))
    .route("/auth/refresh", post(me::refresh::<S>))
    .route("/auth/sign-out", post(me::sign_out::<S>))
    .with_state(state)
}
