//! Handlers for `/beers` catalog endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/beers` | `?text=&style=&include_inactive=&limit=&offset=` |
//! | `POST` | `/beers` | admin; body is a [`NewBeer`] |
//! | `GET`  | `/beers/{id}` | 404 if missing, or inactive for non-admins |
//! | `PUT`  | `/beers/{id}` | admin; body is a [`NewBeer`] |
//! | `POST` | `/beers/{id}/active` | admin; body `{"active": bool}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use topbreja_core::{
  Error as CoreError,
  beer::{Beer, BeerQuery, NewBeer},
  dto::BeerCard,
};
use uuid::Uuid;

use crate::{
  AppState, Backend,
  auth::{AdminUser, MaybeUser},
  error::ApiError,
};

/// Attach ranking, badges and image URLs to `beers`, with one ranking query
/// for the whole batch.
pub(crate) async fn cards<S: Backend>(
  state: &AppState<S>,
  beers: Vec<Beer>,
) -> Result<Vec<BeerCard>, ApiError> {
  let ids: Vec<Uuid> = beers.iter().map(|b| b.beer_id).collect();
  let mut rankings = state.recorder.rankings(&ids).await?;
  let images = state.images.as_ref();
  Ok(
    beers
      .into_iter()
      .map(|beer| match rankings.remove(&beer.beer_id) {
        Some((ranking, badge)) => {
          BeerCard::new(beer, Some(ranking), badge.into_iter().collect(), images)
        }
        None => BeerCard::new(beer, None, vec![], images),
      })
      .collect(),
  )
}

async fn card<S: Backend>(state: &AppState<S>, beer: Beer) -> Result<BeerCard, ApiError> {
  let id = beer.beer_id;
  cards(state, vec![beer])
    .await?
    .pop()
    .ok_or_else(|| CoreError::not_found(format!("beer {id}")).into())
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub text:             Option<String>,
  pub style:            Option<String>,
  /// Admins only.
  #[serde(default)]
  pub include_inactive: bool,
  pub limit:            Option<usize>,
  pub offset:           Option<usize>,
}

/// `GET /beers`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  MaybeUser(auth): MaybeUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<BeerCard>>, ApiError> {
  if params.include_inactive && !auth.is_admin {
    return Err(CoreError::NotAuthorized.into());
  }

  let query = BeerQuery {
    text:             params.text,
    style:            params.style,
    include_inactive: params.include_inactive,
    limit:            params.limit,
    offset:           params.offset,
  };
  let beers = state.recorder.beers(&query).await?;
  Ok(Json(cards(&state, beers).await?))
}

// ─── Single beer ─────────────────────────────────────────────────────────────

/// `GET /beers/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<AppState<S>>,
  MaybeUser(auth): MaybeUser,
  Path(id): Path<Uuid>,
) -> Result<Json<BeerCard>, ApiError> {
  let beer = state
    .recorder
    .beer(id)
    .await?
    .filter(|b| b.active || auth.is_admin)
    .ok_or_else(|| CoreError::not_found(format!("beer {id}")))?;
  Ok(Json(card(&state, beer).await?))
}

// ─── Administration ──────────────────────────────────────────────────────────

/// `POST /beers`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  AdminUser(_): AdminUser,
  Json(body): Json<NewBeer>,
) -> Result<impl IntoResponse, ApiError> {
  let beer = state.recorder.create_beer(body).await?;
  Ok((StatusCode::CREATED, Json(card(&state, beer).await?)))
}

/// `PUT /beers/{id}`
pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  AdminUser(_): AdminUser,
  Path(id): Path<Uuid>,
  Json(body): Json<NewBeer>,
) -> Result<Json<BeerCard>, ApiError> {
  let beer = state.recorder.update_beer(id, body).await?;
  Ok(Json(card(&state, beer).await?))
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub active: bool,
}

/// `POST /beers/{id}/active`
pub async fn set_active<S: Backend>(
  State(state): State<AppState<S>>,
  AdminUser(_): AdminUser,
  Path(id): Path<Uuid>,
  Json(body): Json<ActiveBody>,
) -> Result<Json<BeerCard>, ApiError> {
  let beer = state.recorder.set_beer_active(id, body.active).await?;
  Ok(Json(card(&state, beer).await?))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;
  use serde_json::json;

  use crate::testing::{ADMIN, Harness, MEMBER, json};

  fn form(name: &str) -> serde_json::Value {
    json!({ "name": name, "brand": "Dogma", "style": "Session IPA", "abv": 4.5 })
  }

  #[tokio::test]
  async fn admin_creates_and_members_cannot() {
    let h = Harness::new().await;

    let res = h.call("POST", "/beers", Some(MEMBER), Some(form("Rizoma"))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = h.call("POST", "/beers", None, Some(form("Rizoma"))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = h.call("POST", "/beers", Some(ADMIN), Some(form("Rizoma"))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let card = json(res).await;
    assert_eq!(card["name"], "Rizoma");
    assert_eq!(card["badges"], json!([]));
    assert_eq!(card["ranking"]["total_votes"], 0);
  }

  #[tokio::test]
  async fn invalid_form_is_unprocessable() {
    let h = Harness::new().await;
    let mut body = form("Rizoma");
    body["abv"] = json!(150.0);
    let res = h.call("POST", "/beers", Some(ADMIN), Some(body)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json(res).await["error"].as_str().unwrap().contains("abv"));
  }

  #[tokio::test]
  async fn list_search_and_image_urls() {
    let h = Harness::new().await;
    h.beer("Alpha").await;
    h.beer("Beta").await;

    let res = h.call("GET", "/beers?text=alp", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cards = json(res).await;
    assert_eq!(cards.as_array().unwrap().len(), 1);
    assert_eq!(cards[0]["image_url"], "https://img.topbreja.test/alpha.png");
  }

  #[tokio::test]
  async fn inactive_beers_are_hidden_from_members() {
    let h = Harness::new().await;
    let id = h.beer("Alpha").await;

    let res = h
      .call("POST", &format!("/beers/{id}/active"), Some(ADMIN), Some(json!({ "active": false })))
      .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res).await["active"], false);

    let res = h.call("GET", &format!("/beers/{id}"), Some(MEMBER), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = h.call("GET", &format!("/beers/{id}"), Some(ADMIN), None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = h.call("GET", "/beers?include_inactive=true", Some(MEMBER), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = h.call("GET", "/beers?include_inactive=true", Some(ADMIN), None).await;
    assert_eq!(json(res).await.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn update_replaces_fields() {
    let h = Harness::new().await;
    let id = h.beer("Alpha").await;

    let res = h.call("PUT", &format!("/beers/{id}"), Some(ADMIN), Some(form("Alpha Dry Hopped"))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let card = json(res).await;
    assert_eq!(card["name"], "Alpha Dry Hopped");
    assert_eq!(card["image_url"], serde_json::Value::Null);

    let missing = uuid::Uuid::new_v4();
    let res = h.call("PUT", &format!("/beers/{missing}"), Some(ADMIN), Some(form("X"))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }
}
