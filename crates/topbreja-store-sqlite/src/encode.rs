//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so they sort lexically. UUIDs are stored as
//! hyphenated lowercase strings, which also sort like the UUIDs themselves.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use sha2::{Digest, Sha256};
use topbreja_core::{
  beer::Beer,
  engagement::{Comment, EngagementKind, Rating},
  ranking::{BadgeTier, Ranking},
  user::{Role, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

pub fn decode_role(s: &str) -> Result<Role> { decode_enum("role", s) }

pub fn decode_tier(s: &str) -> Result<BadgeTier> { decode_enum("badge tier", s) }

fn count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

/// Sessions are looked up by the SHA-256 of the bearer token.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// Table and id column holding one toggle kind.
pub fn engagement_table(kind: EngagementKind) -> (&'static str, &'static str) {
  match kind {
    EngagementKind::Vote => ("voto", "voto_id"),
    EngagementKind::Favorite => ("favorito", "favorito_id"),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "usuario_id, email, nome, papel, criado_em";

/// Raw strings read directly from a `usuario` row.
pub struct RawUser {
  pub user_id:      String,
  pub email:        String,
  pub display_name: String,
  pub role:         String,
  pub created_at:   String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      email:        row.get(1)?,
      display_name: row.get(2)?,
      role:         row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      email:        self.email,
      display_name: self.display_name,
      role:         decode_role(&self.role)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Columns of `cerveja` aliased as `c`, in [`RawBeer::from_row`] order.
pub const BEER_COLUMNS: &str = "c.cerveja_id, c.nome, c.marca, c.estilo, c.teor_alcoolico, \
                                c.descricao, c.imagem, c.status, c.criado_em, c.atualizado_em";

pub const BEER_COLUMN_COUNT: usize = 10;

pub struct RawBeer {
  pub beer_id:     String,
  pub name:        String,
  pub brand:       String,
  pub style:       String,
  pub abv:         f64,
  pub description: String,
  pub image_path:  Option<String>,
  pub active:      bool,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawBeer {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      beer_id:     row.get(0)?,
      name:        row.get(1)?,
      brand:       row.get(2)?,
      style:       row.get(3)?,
      abv:         row.get(4)?,
      description: row.get(5)?,
      image_path:  row.get(6)?,
      active:      row.get(7)?,
      created_at:  row.get(8)?,
      updated_at:  row.get(9)?,
    })
  }

  pub fn into_beer(self) -> Result<Beer> {
    Ok(Beer {
      beer_id:     decode_uuid(&self.beer_id)?,
      name:        self.name,
      brand:       self.brand,
      style:       self.style,
      abv:         self.abv,
      description: self.description,
      image_path:  self.image_path,
      active:      self.active,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Columns of `ranking` aliased as `r`, in [`RawRanking::from_row_at`] order.
pub const RANKING_COLUMNS: &str = "r.cerveja_id, r.total_votos, r.media_estrelas, r.media_nota, \
                                   r.total_avaliacoes, r.total_favoritos, r.total_comentarios, \
                                   r.pontuacao, r.posicao, r.atualizado_em";

pub const RANKING_COLUMN_COUNT: usize = 10;

pub struct RawRanking {
  pub beer_id:          String,
  pub total_votes:      i64,
  pub avg_stars:        f64,
  pub avg_review_score: f64,
  pub total_ratings:    i64,
  pub total_favorites:  i64,
  pub total_comments:   i64,
  pub composite_score:  f64,
  pub position:         Option<i64>,
  pub updated_at:       String,
}

impl RawRanking {
  /// Read the ranking columns starting at column `at`.
  pub fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      beer_id:          row.get(at)?,
      total_votes:      row.get(at + 1)?,
      avg_stars:        row.get(at + 2)?,
      avg_review_score: row.get(at + 3)?,
      total_ratings:    row.get(at + 4)?,
      total_favorites:  row.get(at + 5)?,
      total_comments:   row.get(at + 6)?,
      composite_score:  row.get(at + 7)?,
      position:         row.get(at + 8)?,
      updated_at:       row.get(at + 9)?,
    })
  }

  pub fn into_ranking(self) -> Result<Ranking> {
    Ok(Ranking {
      beer_id:          decode_uuid(&self.beer_id)?,
      total_votes:      count(self.total_votes),
      avg_stars:        self.avg_stars,
      avg_review_score: self.avg_review_score,
      total_ratings:    count(self.total_ratings),
      total_favorites:  count(self.total_favorites),
      total_comments:   count(self.total_comments),
      composite_score:  self.composite_score,
      position:         self.position.and_then(|p| u32::try_from(p).ok()),
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawRating {
  pub user_id:      String,
  pub beer_id:      String,
  pub stars:        i64,
  pub review_score: Option<i64>,
  pub review:       Option<String>,
  pub updated_at:   String,
}

impl RawRating {
  pub fn into_rating(self) -> Result<Rating> {
    let stars = u8::try_from(self.stars)
      .map_err(|_| Error::Decode(format!("stars out of range: {}", self.stars)))?;
    let review_score = self
      .review_score
      .map(|s| u8::try_from(s).map_err(|_| Error::Decode(format!("review score out of range: {s}"))))
      .transpose()?;
    Ok(Rating {
      user_id: decode_uuid(&self.user_id)?,
      beer_id: decode_uuid(&self.beer_id)?,
      stars,
      review_score,
      review: self.review,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str = "comentario_id, usuario_id, cerveja_id, texto, criado_em";

pub struct RawComment {
  pub comment_id: String,
  pub user_id:    String,
  pub beer_id:    String,
  pub body:       String,
  pub created_at: String,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      user_id:    row.get(1)?,
      beer_id:    row.get(2)?,
      body:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      beer_id:    decode_uuid(&self.beer_id)?,
      body:       self.body,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
