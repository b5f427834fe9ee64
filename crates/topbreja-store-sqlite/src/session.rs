//! Session lookups against the `sessao` table.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use topbreja_core::session::AuthProvider;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{decode_dt, decode_uuid, encode_dt, encode_uuid, hash_token},
};

impl SqliteStore {
  /// Record a session for `user_id`, valid until `expires_at`.
  ///
  /// Re-registering a token replaces its owner and expiry and clears any
  /// revocation.
  pub async fn register_session(
    &self,
    token: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    let hash     = hash_token(token);
    let user_str = encode_uuid(user_id);
    let exp_str  = encode_dt(expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessao (token_hash, usuario_id, expira_em, revogada)
           VALUES (?1, ?2, ?3, 0)
           ON CONFLICT (token_hash) DO UPDATE SET
             usuario_id = excluded.usuario_id,
             expira_em  = excluded.expira_em,
             revogada   = 0",
          rusqlite::params![hash, user_str, exp_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl AuthProvider for SqliteStore {
  type Error = Error;

  async fn session_user<'a>(&'a self, token: &'a str) -> Result<Option<Uuid>> {
    let hash = hash_token(token);

    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT usuario_id, expira_em FROM sessao
               WHERE token_hash = ?1 AND revogada = 0",
              rusqlite::params![hash],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let Some((user_id, expires_at)) = row else {
      return Ok(None);
    };
    if decode_dt(&expires_at)? <= Utc::now() {
      return Ok(None);
    }
    Ok(Some(decode_uuid(&user_id)?))
  }

  async fn end_session<'a>(&'a self, token: &'a str) -> Result<()> {
    let hash = hash_token(token);
    self
      .conn
      .call(move |conn| {
        conn.execute("UPDATE sessao SET revogada = 1 WHERE token_hash = ?1", rusqlite::params![hash])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
