//! Handlers for votes, favorites, ratings and comments.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/beers/{id}/vote` | toggle; returns `{"state": ...}` |
//! | `POST`   | `/beers/{id}/favorite` | toggle; returns `{"state": ...}` |
//! | `GET`    | `/beers/{id}/engagement` | caller's vote and favorite state |
//! | `GET`    | `/beers/{id}/rating` | caller's rating, 404 if none |
//! | `POST`   | `/beers/{id}/rating` | body is a [`NewRating`] |
//! | `GET`    | `/beers/{id}/comments` | public, newest first |
//! | `POST`   | `/beers/{id}/comments` | body `{"body": "..."}` |
//! | `DELETE` | `/comments/{id}` | author or admin |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use topbreja_core::{
  Error as CoreError,
  engagement::{Comment, EngagementState, EngagementSummary, NewRating, Rating},
};
use uuid::Uuid;

use crate::{AppState, Backend, auth::CurrentUser, error::ApiError};

/// Result of a toggle.
#[derive(Debug, Serialize)]
pub struct StateBody {
  pub state: EngagementState,
}

// ─── Toggles ─────────────────────────────────────────────────────────────────

/// `POST /beers/{id}/vote`
pub async fn vote<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<StateBody>, ApiError> {
  let engagement = state.recorder.toggle_vote(&user, id).await?;
  Ok(Json(StateBody { state: engagement }))
}

/// `POST /beers/{id}/favorite`
pub async fn favorite<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<StateBody>, ApiError> {
  let engagement = state.recorder.toggle_favorite(&user, id).await?;
  Ok(Json(StateBody { state: engagement }))
}

/// `GET /beers/{id}/engagement`
pub async fn summary<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<EngagementSummary>, ApiError> {
  Ok(Json(state.recorder.engagement(&user, id).await?))
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// `GET /beers/{id}/rating`
pub async fn my_rating<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Rating>, ApiError> {
  let rating = state
    .recorder
    .rating(&user, id)
    .await?
    .ok_or_else(|| CoreError::not_found(format!("rating for beer {id}")))?;
  Ok(Json(rating))
}

/// `POST /beers/{id}/rating`
pub async fn rate<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<NewRating>,
) -> Result<Json<Rating>, ApiError> {
  Ok(Json(state.recorder.submit_rating(&user, id, body).await?))
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body: String,
}

/// `GET /beers/{id}/comments`
pub async fn comments<S: Backend>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  Ok(Json(state.recorder.list_comments(id).await?))
}

/// `POST /beers/{id}/comments`
pub async fn comment<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let comment = state.recorder.add_comment(&user, id, &body.body).await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /comments/{id}`
pub async fn delete_comment<S: Backend>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.recorder.delete_comment(&user, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;
  use serde_json::json;

  use crate::testing::{ADMIN, Harness, MEMBER, json};

  #[tokio::test]
  async fn vote_toggles_and_moves_the_badge() {
    let h = Harness::new().await;
    let id = h.beer("Alpha").await;

    let res = h.call("POST", &format!("/beers/{id}/vote"), None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = h.call("POST", &format!("/beers/{id}/vote"), Some(MEMBER), None).await;
    assert_eq!(json(res).await, json!({ "state": "active" }));

    let card = json(h.call("GET", &format!("/beers/{id}"), None, None).await).await;
    assert_eq!(card["badges"], json!(["gold"]));
    assert_eq!(card["ranking"]["total_votes"], 1);

    let res = h.call("POST", &format!("/beers/{id}/vote"), Some(MEMBER), None).await;
    assert_eq!(json(res).await, json!({ "state": "inactive" }));

    let card = json(h.call("GET", &format!("/beers/{id}"), None, None).await).await;
    assert_eq!(card["badges"], json!([]));
  }

  #[tokio::test]
  async fn engagement_reports_both_toggles() {
    let h = Harness::new().await;
    let id = h.beer("Alpha").await;

    let res = h.call("GET", &format!("/beers/{id}/engagement"), Some(MEMBER), None).await;
    assert_eq!(json(res).await, json!({ "vote": "absent", "favorite": "absent" }));

    h.call("POST", &format!("/beers/{id}/favorite"), Some(MEMBER), None).await;
    let res = h.call("GET", &format!("/beers/{id}/engagement"), Some(MEMBER), None).await;
    assert_eq!(json(res).await, json!({ "vote": "absent", "favorite": "active" }));
  }

  #[tokio::test]
  async fn unknown_beer_is_not_found() {
    let h = Harness::new().await;
    let id = uuid::Uuid::new_v4();
    let res = h.call("POST", &format!("/beers/{id}/favorite"), Some(MEMBER), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn rating_validates_and_round_trips() {
    let h = Harness::new().await;
    let id = h.beer("Alpha").await;
    let uri = format!("/beers/{id}/rating");

    let res = h.call("GET", &uri, Some(MEMBER), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = h.call("POST", &uri, Some(MEMBER), Some(json!({ "stars": 6 }))).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = h
      .call("POST", &uri, Some(MEMBER), Some(json!({ "stars": 4, "review_score": 9 })))
      .await;
    assert_eq!(res.status(), StatusCode::OK);

    let rating = json(h.call("GET", &uri, Some(MEMBER), None).await).await;
    assert_eq!(rating["stars"], 4);
    assert_eq!(rating["review_score"], 9);
  }

  #[tokio::test]
  async fn comments_lifecycle() {
    let h = Harness::new().await;
    let id = h.beer("Alpha").await;
    let uri = format!("/beers/{id}/comments");

    let res = h.call("POST", &uri, Some(MEMBER), Some(json!({ "body": "  Muito boa!  " }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let comment = json(res).await;
    assert_eq!(comment["body"], "Muito boa!");

    let res = h.call("POST", &uri, Some(MEMBER), Some(json!({ "body": "   " }))).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let list = json(h.call("GET", &uri, None, None).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let comment_id = comment["comment_id"].as_str().unwrap();
    let res = h.call("DELETE", &format!("/comments/{comment_id}"), Some(ADMIN), None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let list = json(h.call("GET", &uri, None, None).await).await;
    assert!(list.as_array().unwrap().is_empty());
  }
}
