//! Session and role resolution.
//!
//! The authentication provider owns sessions; TopBreja only asks it which
//! user a token belongs to and then loads that user's role from the store.
//! Resolutions are cached for a short TTL in an injected [`SessionCache`].

use std::{
  collections::HashMap,
  future::Future,
  sync::{Arc, Mutex},
  time::Duration,
};

use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{store::BrejaStore, user::User};

/// How long a resolution stays fresh unless configured otherwise.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30);

// ─── Provider ────────────────────────────────────────────────────────────────

/// The slice of the external authentication provider TopBreja consumes.
pub trait AuthProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The user owning `token`, or `None` for unknown, expired or revoked
  /// sessions.
  fn session_user<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + 'a;

  /// End the session behind `token`. Ending an unknown session is not an
  /// error.
  fn end_session<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Resolved state ──────────────────────────────────────────────────────────

/// Who is making the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthState {
  pub user:     Option<User>,
  pub is_admin: bool,
}

impl AuthState {
  pub fn anonymous() -> Self { Self::default() }

  pub fn for_user(user: User) -> Self {
    let is_admin = user.is_admin();
    Self { user: Some(user), is_admin }
  }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Storage for resolved sessions.
pub trait SessionCache: Send + Sync {
  /// A fresh entry for `key`, if any.
  fn get(&self, key: &str) -> Option<AuthState>;
  fn put(&self, key: &str, state: AuthState);
  fn invalidate(&self, key: &str);
}

/// In-memory [`SessionCache`] whose entries expire after a fixed TTL.
///
/// Expired entries are swept on insert, at most once per TTL, so the map
/// never holds more than two TTLs' worth of tokens. Uses
/// [`tokio::time::Instant`] so a paused test clock controls expiry.
pub struct TtlCache {
  ttl:   Duration,
  inner: Mutex<Entries>,
}

struct Entries {
  map:      HashMap<String, (Instant, AuthState)>,
  swept_at: Instant,
}

impl TtlCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      inner: Mutex::new(Entries { map: HashMap::new(), swept_at: Instant::now() }),
    }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  /// Number of stored entries, fresh or not yet swept.
  pub fn len(&self) -> usize { self.lock().map.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
    // A poisoned map only ever holds complete entries; keep using it.
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl Default for TtlCache {
  fn default() -> Self { Self::new(DEFAULT_SESSION_TTL) }
}

impl SessionCache for TtlCache {
  fn get(&self, key: &str) -> Option<AuthState> {
    let mut entries = self.lock();
    match entries.map.get(key) {
      Some((stored_at, state)) if stored_at.elapsed() < self.ttl => Some(state.clone()),
      Some(_) => {
        entries.map.remove(key);
        None
      }
      None => None,
    }
  }

  fn put(&self, key: &str, state: AuthState) {
    let now = Instant::now();
    let mut entries = self.lock();
    if now.duration_since(entries.swept_at) >= self.ttl {
      let ttl = self.ttl;
      entries.map.retain(|_, (stored_at, _)| now.duration_since(*stored_at) < ttl);
      entries.swept_at = now;
    }
    entries.map.insert(key.to_owned(), (now, state));
  }

  fn invalidate(&self, key: &str) { self.lock().map.remove(key); }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Resolves bearer tokens to an [`AuthState`].
///
/// Never fails: lookup errors yield the anonymous state. Only resolutions to
/// a known user are cached, so unrecognised tokens cannot fill the cache.
pub struct SessionResolver<A, S> {
  auth:  Arc<A>,
  store: Arc<S>,
  cache: Arc<dyn SessionCache>,
}

impl<A, S> Clone for SessionResolver<A, S> {
  fn clone(&self) -> Self {
    Self {
      auth:  Arc::clone(&self.auth),
      store: Arc::clone(&self.store),
      cache: Arc::clone(&self.cache),
    }
  }
}

impl<A, S> SessionResolver<A, S>
where
  A: AuthProvider,
  S: BrejaStore,
{
  pub fn new(auth: Arc<A>, store: Arc<S>, cache: Arc<dyn SessionCache>) -> Self {
    Self { auth, store, cache }
  }

  pub async fn resolve(&self, token: &str) -> AuthState {
    if let Some(state) = self.cache.get(token) {
      tracing::debug!("session cache hit");
      return state;
    }

    match self.lookup(token).await {
      Ok(state) => {
        if state.user.is_some() {
          self.cache.put(token, state.clone());
        }
        state
      }
      Err(e) => {
        tracing::warn!(error = %e, "session lookup failed; treating as anonymous");
        AuthState::anonymous()
      }
    }
  }

  /// Drop any cached state for `token` and resolve it again.
  pub async fn refresh(&self, token: &str) -> AuthState {
    self.cache.invalidate(token);
    self.resolve(token).await
  }

  /// Forget `token` locally and end it at the provider.
  pub async fn sign_out(&self, token: &str) -> crate::Result<()> {
    self.cache.invalidate(token);
    self
      .auth
      .end_session(token)
      .await
      .map_err(|e| crate::Error::ConflictOrTransient(e.to_string()))
  }

  async fn lookup(&self, token: &str) -> Result<AuthState, String> {
    let Some(user_id) = self.auth.session_user(token).await.map_err(|e| e.to_string())? else {
      return Ok(AuthState::anonymous());
    };

    let user = self.store.get_user(user_id).await.map_err(|e| e.to_string())?;
    Ok(user.map(AuthState::for_user).unwrap_or_default())
  }
}
