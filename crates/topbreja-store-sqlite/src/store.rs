//! [`SqliteStore`]: the SQLite implementation of [`BrejaStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use topbreja_core::{
  beer::{Beer, BeerQuery, NewBeer},
  engagement::{Comment, EngagementKind, EngagementState, EngagementSummary, NewRating, Rating},
  ranking::{
    Badge, BadgeTier, RankedBeer, RankedEntry, Ranking, RankingWeights, assign_badges, rank,
  },
  store::BrejaStore,
  user::{NewUser, User},
};

use crate::{
  encode::{
    BEER_COLUMN_COUNT, BEER_COLUMNS, COMMENT_COLUMNS, RANKING_COLUMN_COUNT, RANKING_COLUMNS,
    RawBeer, RawComment, RawRanking, RawRating, RawUser, USER_COLUMNS, decode_tier, decode_uuid,
    encode_dt, encode_uuid, engagement_table,
  },
  schema::SCHEMA,
  Error, Result,
};

/// Wrap a domain error so it can leave a `Connection::call` closure.
fn in_call(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

/// Recompute every counter of one beer's `ranking` row from the join tables.
///
/// Must run inside the transaction that changed the join table, so the row
/// never reflects a half-applied write.
fn recompute_counters(conn: &rusqlite::Connection, beer_id: &str, now: &str) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE ranking SET
       total_votos       = (SELECT COUNT(*) FROM voto
                             WHERE cerveja_id = ?1 AND deletado = 0),
       total_favoritos   = (SELECT COUNT(*) FROM favorito
                             WHERE cerveja_id = ?1 AND deletado = 0),
       total_comentarios = (SELECT COUNT(*) FROM comentario
                             WHERE cerveja_id = ?1 AND deletado = 0),
       total_avaliacoes  = (SELECT COUNT(*) FROM avaliacao
                             WHERE cerveja_id = ?1 AND deletado = 0),
       media_estrelas    = COALESCE((SELECT AVG(estrelas) FROM avaliacao
                             WHERE cerveja_id = ?1 AND deletado = 0), 0),
       media_nota        = COALESCE((SELECT AVG(nota) FROM avaliacao
                             WHERE cerveja_id = ?1 AND deletado = 0 AND nota IS NOT NULL), 0),
       atualizado_em     = ?2
     WHERE cerveja_id = ?1",
    rusqlite::params![beer_id, now],
  )?;
  Ok(())
}

/// Re-rank every active beer with `weights`: persist scores and positions,
/// clear them for inactive beers and rewrite the badges.
///
/// Runs on the caller's transaction; an error here must abort the caller's
/// write as well.
fn rerank(
  conn: &rusqlite::Connection,
  weights: &RankingWeights,
  now: &str,
) -> tokio_rusqlite::Result<Vec<RankedEntry>> {
  let select = format!(
    "SELECT {RANKING_COLUMNS}
     FROM ranking r
     JOIN cerveja c ON c.cerveja_id = r.cerveja_id
     WHERE c.status = 1"
  );
  let raws = {
    let mut stmt = conn.prepare(&select)?;
    stmt
      .query_map([], |row| RawRanking::from_row_at(row, 0))?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };
  let rankings = raws
    .into_iter()
    .map(RawRanking::into_ranking)
    .collect::<Result<Vec<Ranking>>>()
    .map_err(in_call)?;

  let ranked = rank(&rankings, weights);
  let badges = assign_badges(&ranked);

  conn.execute(
    "UPDATE ranking SET pontuacao = 0, posicao = NULL
     WHERE cerveja_id IN (SELECT cerveja_id FROM cerveja WHERE status = 0)",
    [],
  )?;
  {
    let mut update =
      conn.prepare("UPDATE ranking SET pontuacao = ?2, posicao = ?3 WHERE cerveja_id = ?1")?;
    for entry in &ranked {
      update.execute(rusqlite::params![
        encode_uuid(entry.beer_id),
        entry.composite_score,
        entry.position,
      ])?;
    }
  }

  conn.execute("DELETE FROM selo", [])?;
  {
    let mut insert = conn.prepare(
      "INSERT INTO selo (cerveja_id, tier, posicao, atribuido_em) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for badge in &badges {
      insert.execute(rusqlite::params![
        encode_uuid(badge.beer_id),
        badge.tier.as_ref(),
        badge.position,
        now,
      ])?;
    }
  }

  Ok(ranked)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A TopBreja store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Conditional upsert shared by toggling and activation.
  async fn upsert_engagement(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    kind: EngagementKind,
    toggle: bool,
    weights: RankingWeights,
  ) -> Result<EngagementState> {
    let (table, id_col) = engagement_table(kind);
    let on_conflict = if toggle {
      format!("deletado = NOT {table}.deletado")
    } else {
      "deletado = 0".to_owned()
    };
    let sql = format!(
      "INSERT INTO {table} ({id_col}, usuario_id, cerveja_id, criado_em, atualizado_em, deletado)
       VALUES (?1, ?2, ?3, ?4, ?4, 0)
       ON CONFLICT (usuario_id, cerveja_id) DO UPDATE
         SET {on_conflict}, atualizado_em = excluded.atualizado_em
       RETURNING deletado"
    );

    let id_str   = encode_uuid(Uuid::new_v4());
    let user_str = encode_uuid(user_id);
    let beer_str = encode_uuid(beer_id);
    let now_str  = encode_dt(Utc::now());

    let deleted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let deleted: bool = tx.query_row(
          &sql,
          rusqlite::params![id_str, user_str, beer_str, now_str],
          |r| r.get(0),
        )?;
        recompute_counters(&tx, &beer_str, &now_str)?;
        rerank(&tx, &weights, &now_str)?;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    Ok(EngagementState::from_deleted_flag(Some(deleted)))
  }

  /// Number of rows (active or not) for one `(user, beer, kind)` triple.
  #[cfg(test)]
  pub(crate) async fn engagement_rows(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    kind: EngagementKind,
  ) -> Result<i64> {
    let (table, _) = engagement_table(kind);
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE usuario_id = ?1 AND cerveja_id = ?2");
    let (u, b) = (encode_uuid(user_id), encode_uuid(beer_id));
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(&sql, rusqlite::params![u, b], |r| r.get(0))?))
        .await?,
    )
  }
}

// ─── BrejaStore impl ─────────────────────────────────────────────────────────

impl BrejaStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    input.validate()?;
    let user = User {
      user_id:      input.user_id,
      email:        input.email,
      display_name: input.display_name.trim().to_owned(),
      role:         input.role,
      created_at:   Utc::now(),
    };

    let id_str    = encode_uuid(user.user_id);
    let email     = user.email.clone();
    let name      = user.display_name.clone();
    let role_str  = user.role.as_ref().to_owned();
    let at_str    = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO usuario (usuario_id, email, nome, papel, criado_em)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email, name, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let sql = format!("SELECT {USER_COLUMNS} FROM usuario WHERE usuario_id = ?1");

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawUser::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn update_display_name(&self, id: Uuid, display_name: String) -> Result<User> {
    let name   = topbreja_core::user::validate_display_name(&display_name)?;
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE usuario SET nome = ?2 WHERE usuario_id = ?1",
          rusqlite::params![id_str, name],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::UserNotFound(id));
    }
    self.get_user(id).await?.ok_or(Error::UserNotFound(id))
  }

  // ── Beers ─────────────────────────────────────────────────────────────────

  async fn add_beer(&self, input: NewBeer, weights: RankingWeights) -> Result<Beer> {
    let now = Utc::now();
    let beer = Beer {
      beer_id:     Uuid::new_v4(),
      name:        input.name,
      brand:       input.brand,
      style:       input.style,
      abv:         input.abv,
      description: input.description,
      image_path:  input.image_path,
      active:      true,
      created_at:  now,
      updated_at:  now,
    };

    let id_str      = encode_uuid(beer.beer_id);
    let name        = beer.name.clone();
    let brand       = beer.brand.clone();
    let style       = beer.style.clone();
    let abv         = beer.abv;
    let description = beer.description.clone();
    let image       = beer.image_path.clone();
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO cerveja (
             cerveja_id, nome, marca, estilo, teor_alcoolico,
             descricao, imagem, status, criado_em, atualizado_em
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)",
          rusqlite::params![id_str, name, brand, style, abv, description, image, at_str],
        )?;
        tx.execute(
          "INSERT INTO ranking (cerveja_id, atualizado_em) VALUES (?1, ?2)",
          rusqlite::params![id_str, at_str],
        )?;
        rerank(&tx, &weights, &at_str)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(beer)
  }

  async fn update_beer(&self, id: Uuid, input: NewBeer) -> Result<Beer> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE cerveja SET
             nome = ?2, marca = ?3, estilo = ?4, teor_alcoolico = ?5,
             descricao = ?6, imagem = ?7, atualizado_em = ?8
           WHERE cerveja_id = ?1",
          rusqlite::params![
            id_str,
            input.name,
            input.brand,
            input.style,
            input.abv,
            input.description,
            input.image_path,
            at_str,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::BeerNotFound(id));
    }
    self.get_beer(id).await?.ok_or(Error::BeerNotFound(id))
  }

  async fn set_beer_active(&self, id: Uuid, active: bool, weights: RankingWeights) -> Result<Beer> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE cerveja SET status = ?2, atualizado_em = ?3 WHERE cerveja_id = ?1",
          rusqlite::params![id_str, active, at_str],
        )?;
        if changed > 0 {
          rerank(&tx, &weights, &at_str)?;
          tx.commit()?;
        }
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Err(Error::BeerNotFound(id));
    }
    self.get_beer(id).await?.ok_or(Error::BeerNotFound(id))
  }

  async fn get_beer(&self, id: Uuid) -> Result<Option<Beer>> {
    let id_str = encode_uuid(id);
    let sql = format!("SELECT {BEER_COLUMNS} FROM cerveja c WHERE c.cerveja_id = ?1");

    let raw: Option<RawBeer> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawBeer::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBeer::into_beer).transpose()
  }

  async fn list_beers<'a>(&'a self, query: &'a BeerQuery) -> Result<Vec<Beer>> {
    let text_pattern = query
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(|t| format!("%{}%", t.to_lowercase()));
    let style = query
      .style
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_lowercase);
    let include_inactive = query.include_inactive;
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val  = query.limit.map(|l| l as i64).unwrap_or(-1);
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawBeer> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically.
        let mut conds: Vec<&'static str> = vec![];
        if !include_inactive {
          conds.push("c.status = 1");
        }
        if text_pattern.is_some() {
          conds.push(
            "(lower(c.nome) LIKE ?1 OR lower(c.marca) LIKE ?1 OR lower(c.estilo) LIKE ?1)",
          );
        }
        if style.is_some() {
          conds.push("lower(c.estilo) = ?2");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {BEER_COLUMNS}
           FROM cerveja c
           {where_clause}
           ORDER BY c.nome COLLATE NOCASE, c.cerveja_id
           LIMIT ?3 OFFSET ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![text_pattern.as_deref(), style.as_deref(), limit_val, offset_val],
            RawBeer::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBeer::into_beer).collect()
  }

  // ── Votes & favorites ─────────────────────────────────────────────────────

  async fn toggle_engagement(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    kind: EngagementKind,
    weights: RankingWeights,
  ) -> Result<EngagementState> {
    self.upsert_engagement(user_id, beer_id, kind, true, weights).await
  }

  async fn activate_engagement(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    kind: EngagementKind,
    weights: RankingWeights,
  ) -> Result<EngagementState> {
    self.upsert_engagement(user_id, beer_id, kind, false, weights).await
  }

  async fn engagement_summary(&self, user_id: Uuid, beer_id: Uuid) -> Result<EngagementSummary> {
    let user_str = encode_uuid(user_id);
    let beer_str = encode_uuid(beer_id);

    let (vote, favorite): (Option<bool>, Option<bool>) = self
      .conn
      .call(move |conn| {
        let vote = conn
          .query_row(
            "SELECT deletado FROM voto WHERE usuario_id = ?1 AND cerveja_id = ?2",
            rusqlite::params![user_str, beer_str],
            |r| r.get(0),
          )
          .optional()?;
        let favorite = conn
          .query_row(
            "SELECT deletado FROM favorito WHERE usuario_id = ?1 AND cerveja_id = ?2",
            rusqlite::params![user_str, beer_str],
            |r| r.get(0),
          )
          .optional()?;
        Ok((vote, favorite))
      })
      .await?;

    Ok(EngagementSummary {
      vote:     EngagementState::from_deleted_flag(vote),
      favorite: EngagementState::from_deleted_flag(favorite),
    })
  }

  async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Beer>> {
    let user_str = encode_uuid(user_id);
    let sql = format!(
      "SELECT {BEER_COLUMNS}
       FROM favorito f
       JOIN cerveja c ON c.cerveja_id = f.cerveja_id
       WHERE f.usuario_id = ?1 AND f.deletado = 0 AND c.status = 1
       ORDER BY f.atualizado_em DESC, c.cerveja_id"
    );

    let raws: Vec<RawBeer> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawBeer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBeer::into_beer).collect()
  }

  // ── Ratings & comments ────────────────────────────────────────────────────

  async fn upsert_rating(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    input: NewRating,
    weights: RankingWeights,
  ) -> Result<Rating> {
    let rating = Rating {
      user_id,
      beer_id,
      stars:        input.stars,
      review_score: input.review_score,
      review:       input.review,
      updated_at:   Utc::now(),
    };

    let id_str   = encode_uuid(Uuid::new_v4());
    let user_str = encode_uuid(user_id);
    let beer_str = encode_uuid(beer_id);
    let stars    = rating.stars;
    let score    = rating.review_score;
    let review   = rating.review.clone();
    let at_str   = encode_dt(rating.updated_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO avaliacao (
             avaliacao_id, usuario_id, cerveja_id, estrelas, nota, resenha,
             criado_em, atualizado_em, deletado
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, 0)
           ON CONFLICT (usuario_id, cerveja_id) DO UPDATE SET
             estrelas      = excluded.estrelas,
             nota          = excluded.nota,
             resenha       = excluded.resenha,
             atualizado_em = excluded.atualizado_em,
             deletado      = 0",
          rusqlite::params![id_str, user_str, beer_str, stars, score, review, at_str],
        )?;
        recompute_counters(&tx, &beer_str, &at_str)?;
        rerank(&tx, &weights, &at_str)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(rating)
  }

  async fn get_rating(&self, user_id: Uuid, beer_id: Uuid) -> Result<Option<Rating>> {
    let user_str = encode_uuid(user_id);
    let beer_str = encode_uuid(beer_id);

    let raw: Option<RawRating> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT usuario_id, cerveja_id, estrelas, nota, resenha, atualizado_em
               FROM avaliacao
               WHERE usuario_id = ?1 AND cerveja_id = ?2 AND deletado = 0",
              rusqlite::params![user_str, beer_str],
              |row| {
                Ok(RawRating {
                  user_id:      row.get(0)?,
                  beer_id:      row.get(1)?,
                  stars:        row.get(2)?,
                  review_score: row.get(3)?,
                  review:       row.get(4)?,
                  updated_at:   row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRating::into_rating).transpose()
  }

  async fn add_comment(
    &self,
    user_id: Uuid,
    beer_id: Uuid,
    body: String,
    weights: RankingWeights,
  ) -> Result<Comment> {
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      user_id,
      beer_id,
      body,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(comment.comment_id);
    let user_str = encode_uuid(user_id);
    let beer_str = encode_uuid(beer_id);
    let body     = comment.body.clone();
    let at_str   = encode_dt(comment.created_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO comentario (comentario_id, usuario_id, cerveja_id, texto, criado_em)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, user_str, beer_str, body, at_str],
        )?;
        recompute_counters(&tx, &beer_str, &at_str)?;
        rerank(&tx, &weights, &at_str)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);
    let sql = format!(
      "SELECT {COMMENT_COLUMNS} FROM comentario WHERE comentario_id = ?1 AND deletado = 0"
    );

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawComment::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn delete_comment(&self, id: Uuid, weights: RankingWeights) -> Result<()> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let beer: Option<String> = tx
          .query_row(
            "UPDATE comentario SET deletado = 1
             WHERE comentario_id = ?1 AND deletado = 0
             RETURNING cerveja_id",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        if let Some(beer_str) = &beer {
          recompute_counters(&tx, beer_str, &at_str)?;
          rerank(&tx, &weights, &at_str)?;
        }
        tx.commit()?;
        Ok(beer.is_some())
      })
      .await?;

    if !deleted {
      return Err(Error::CommentNotFound(id));
    }
    Ok(())
  }

  async fn list_comments(&self, beer_id: Uuid) -> Result<Vec<Comment>> {
    let beer_str = encode_uuid(beer_id);
    let sql = format!(
      "SELECT {COMMENT_COLUMNS} FROM comentario
       WHERE cerveja_id = ?1 AND deletado = 0
       ORDER BY criado_em DESC, rowid DESC"
    );

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![beer_str], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  // ── Ranking ───────────────────────────────────────────────────────────────

  async fn refresh_ranking<'a>(&'a self, weights: &'a RankingWeights) -> Result<Vec<RankedEntry>> {
    let weights = *weights;
    let now_str = encode_dt(Utc::now());

    let ranked = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let ranked = rerank(&tx, &weights, &now_str)?;
        tx.commit()?;
        Ok(ranked)
      })
      .await?;

    tracing::debug!(beers = ranked.len(), "ranking refreshed");
    Ok(ranked)
  }

  async fn get_ranking(&self, beer_id: Uuid) -> Result<Option<Ranking>> {
    let beer_str = encode_uuid(beer_id);
    let sql = format!("SELECT {RANKING_COLUMNS} FROM ranking r WHERE r.cerveja_id = ?1");

    let raw: Option<RawRanking> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![beer_str], |row| RawRanking::from_row_at(row, 0))
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRanking::into_ranking).transpose()
  }

  async fn rankings_for<'a>(
    &'a self,
    beer_ids: &'a [Uuid],
  ) -> Result<Vec<(Ranking, Option<BadgeTier>)>> {
    if beer_ids.is_empty() {
      return Ok(Vec::new());
    }
    let placeholders = (1..=beer_ids.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "SELECT {RANKING_COLUMNS}, s.tier
       FROM ranking r
       LEFT JOIN selo s ON s.cerveja_id = r.cerveja_id
       WHERE r.cerveja_id IN ({placeholders})"
    );
    let ids: Vec<String> = beer_ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<(RawRanking, Option<String>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok((RawRanking::from_row_at(row, 0)?, row.get(RANKING_COLUMN_COUNT)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(ranking, tier)| {
        Ok((ranking.into_ranking()?, tier.as_deref().map(decode_tier).transpose()?))
      })
      .collect()
  }

  async fn leaderboard(&self) -> Result<Vec<RankedBeer>> {
    let sql = format!(
      "SELECT {BEER_COLUMNS}, {RANKING_COLUMNS}, s.tier
       FROM cerveja c
       JOIN ranking r ON r.cerveja_id = c.cerveja_id
       LEFT JOIN selo s ON s.cerveja_id = c.cerveja_id
       WHERE c.status = 1
       ORDER BY r.posicao IS NULL, r.posicao, c.cerveja_id"
    );

    let raws: Vec<(RawBeer, RawRanking, Option<String>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| {
            Ok((
              RawBeer::from_row(row)?,
              RawRanking::from_row_at(row, BEER_COLUMN_COUNT)?,
              row.get(BEER_COLUMN_COUNT + RANKING_COLUMN_COUNT)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(beer, ranking, tier)| {
        Ok(RankedBeer {
          beer:    beer.into_beer()?,
          ranking: ranking.into_ranking()?,
          badge:   tier.as_deref().map(decode_tier).transpose()?,
        })
      })
      .collect()
  }

  async fn badges(&self) -> Result<Vec<Badge>> {
    let raws: Vec<(String, String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT cerveja_id, tier, posicao FROM selo ORDER BY posicao")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(beer, tier, position)| {
        Ok(Badge {
          beer_id:  decode_uuid(&beer)?,
          tier:     decode_tier(&tier)?,
          position: u32::try_from(position)
            .map_err(|_| Error::Decode(format!("badge position {position}")))?,
        })
      })
      .collect()
  }
}
