//! Integration tests for `SqliteStore` against an in-memory database.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use topbreja_core::{
  beer::{BeerQuery, NewBeer},
  engagement::{EngagementKind, EngagementState, NewRating},
  ranking::{BadgeTier, RankingWeights},
  recorder::Recorder,
  session::AuthProvider,
  store::BrejaStore,
  user::{NewUser, Role, User},
};
use uuid::Uuid;

use crate::{
  SqliteStore,
  encode::{encode_dt, encode_uuid},
};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn w() -> RankingWeights { RankingWeights::default() }

fn beer_form(name: &str, style: &str) -> NewBeer {
  NewBeer {
    name:        name.into(),
    brand:       "Cervejaria Teste".into(),
    style:       style.into(),
    abv:         5.0,
    description: String::new(),
    image_path:  None,
  }
}

async fn member(s: &SqliteStore, email: &str) -> User {
  s.add_user(NewUser::member(Uuid::new_v4(), email, "Ana")).await.unwrap()
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;
  let mut input = NewUser::member(Uuid::new_v4(), "admin@example.com", "  Bia  ");
  input.role = Role::Admin;
  let user = s.add_user(input).await.unwrap();
  assert_eq!(user.display_name, "Bia");

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.email, "admin@example.com");
  assert!(fetched.is_admin());

  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
  let s = store().await;
  member(&s, "ana@example.com").await;
  let err = s
    .add_user(NewUser::member(Uuid::new_v4(), "ana@example.com", "Ana 2"))
    .await
    .unwrap_err();
  let core: topbreja_core::Error = err.into();
  assert!(matches!(core, topbreja_core::Error::ConflictOrTransient(_)));
}

#[tokio::test]
async fn update_display_name_validates_and_persists() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;

  let updated = s.update_display_name(user.user_id, " Ana Clara ".into()).await.unwrap();
  assert_eq!(updated.display_name, "Ana Clara");

  assert!(s.update_display_name(user.user_id, "   ".into()).await.is_err());
  assert!(matches!(
    s.update_display_name(Uuid::new_v4(), "X".into()).await,
    Err(crate::Error::UserNotFound(_))
  ));
}

// ─── Beers ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_beer_creates_empty_ranking_row() {
  let s = store().await;
  let beer = s.add_beer(beer_form("Colorado Appia", "Wheat"), w()).await.unwrap();
  assert!(beer.active);

  let ranking = s.get_ranking(beer.beer_id).await.unwrap().unwrap();
  assert_eq!(ranking.total_votes, 0);
  assert_eq!(ranking.composite_score, 0.0);
  assert_eq!(ranking.position, None);
}

#[tokio::test]
async fn update_and_deactivate_beer() {
  let s = store().await;
  let beer = s.add_beer(beer_form("Bohemia", "Pilsen"), w()).await.unwrap();

  let mut form = beer_form("Bohemia Puro Malte", "Pilsen");
  form.image_path = Some("bohemia.png".into());
  let updated = s.update_beer(beer.beer_id, form).await.unwrap();
  assert_eq!(updated.name, "Bohemia Puro Malte");
  assert_eq!(updated.image_path.as_deref(), Some("bohemia.png"));
  assert_eq!(updated.created_at, beer.created_at);

  let hidden = s.set_beer_active(beer.beer_id, false, w()).await.unwrap();
  assert!(!hidden.active);

  assert!(matches!(
    s.set_beer_active(Uuid::new_v4(), true, w()).await,
    Err(crate::Error::BeerNotFound(_))
  ));
}

#[tokio::test]
async fn list_beers_filters_and_pages() {
  let s = store().await;
  s.add_beer(beer_form("Way Amburana Lager", "Lager"), w()).await.unwrap();
  s.add_beer(beer_form("Colorado Indica", "IPA"), w()).await.unwrap();
  let hidden = s.add_beer(beer_form("Bodebrown Wee Heavy", "Scotch Ale"), w()).await.unwrap();
  s.set_beer_active(hidden.beer_id, false, w()).await.unwrap();

  let active = s.list_beers(&BeerQuery::default()).await.unwrap();
  let names: Vec<_> = active.iter().map(|b| b.name.as_str()).collect();
  assert_eq!(names, ["Colorado Indica", "Way Amburana Lager"]);

  let all = s
    .list_beers(&BeerQuery { include_inactive: true, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(all.len(), 3);

  let search = s
    .list_beers(&BeerQuery { text: Some("AMBURANA".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(search.len(), 1);

  let by_style = s
    .list_beers(&BeerQuery { style: Some("ipa".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_style.len(), 1);
  assert_eq!(by_style[0].name, "Colorado Indica");

  let page = s
    .list_beers(&BeerQuery { limit: Some(1), offset: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].name, "Way Amburana Lager");
}

// ─── Votes & favorites ───────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_cycles_active_and_inactive() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let beer = s.add_beer(beer_form("Original", "Lager"), w()).await.unwrap();
  let kind = EngagementKind::Vote;

  let summary = s.engagement_summary(user.user_id, beer.beer_id).await.unwrap();
  assert_eq!(summary.vote, EngagementState::Absent);

  let first = s.toggle_engagement(user.user_id, beer.beer_id, kind, w()).await.unwrap();
  assert_eq!(first, EngagementState::Active);
  assert_eq!(s.get_ranking(beer.beer_id).await.unwrap().unwrap().total_votes, 1);

  let second = s.toggle_engagement(user.user_id, beer.beer_id, kind, w()).await.unwrap();
  assert_eq!(second, EngagementState::Inactive);
  assert_eq!(s.get_ranking(beer.beer_id).await.unwrap().unwrap().total_votes, 0);

  let third = s.toggle_engagement(user.user_id, beer.beer_id, kind, w()).await.unwrap();
  assert_eq!(third, EngagementState::Active);

  // Reactivation reuses the row.
  assert_eq!(s.engagement_rows(user.user_id, beer.beer_id, kind).await.unwrap(), 1);

  let summary = s.engagement_summary(user.user_id, beer.beer_id).await.unwrap();
  assert_eq!(summary.vote, EngagementState::Active);
  assert_eq!(summary.favorite, EngagementState::Absent);
}

#[tokio::test]
async fn concurrent_toggles_keep_one_row_per_pair() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let beer = s.add_beer(beer_form("Heineken", "Lager"), w()).await.unwrap();

  let mut set = tokio::task::JoinSet::new();
  for _ in 0..10 {
    let s = s.clone();
    let (u, b) = (user.user_id, beer.beer_id);
    set.spawn(async move { s.toggle_engagement(u, b, EngagementKind::Favorite, w()).await });
  }
  while let Some(res) = set.join_next().await {
    res.unwrap().unwrap();
  }

  assert_eq!(
    s.engagement_rows(user.user_id, beer.beer_id, EngagementKind::Favorite).await.unwrap(),
    1
  );
  // Ten flips from absent end inactive.
  let summary = s.engagement_summary(user.user_id, beer.beer_id).await.unwrap();
  assert_eq!(summary.favorite, EngagementState::Inactive);
  assert_eq!(s.get_ranking(beer.beer_id).await.unwrap().unwrap().total_favorites, 0);
}

#[tokio::test]
async fn activate_is_idempotent() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let beer = s.add_beer(beer_form("Serramalte", "Malzbier"), w()).await.unwrap();

  for _ in 0..3 {
    let state = s
      .activate_engagement(user.user_id, beer.beer_id, EngagementKind::Vote, w())
      .await
      .unwrap();
    assert_eq!(state, EngagementState::Active);
  }
  assert_eq!(s.get_ranking(beer.beer_id).await.unwrap().unwrap().total_votes, 1);
}

#[tokio::test]
async fn favorites_are_listed_most_recent_first() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let a = s.add_beer(beer_form("Alpha", "IPA"), w()).await.unwrap();
  let b = s.add_beer(beer_form("Beta", "IPA"), w()).await.unwrap();
  let c = s.add_beer(beer_form("Gamma", "IPA"), w()).await.unwrap();

  for beer in [&a, &b, &c] {
    s.toggle_engagement(user.user_id, beer.beer_id, EngagementKind::Favorite, w()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
  }
  // Un-favorite one and hide another.
  s.toggle_engagement(user.user_id, b.beer_id, EngagementKind::Favorite, w()).await.unwrap();
  s.set_beer_active(c.beer_id, false, w()).await.unwrap();

  let favorites = s.list_favorites(user.user_id).await.unwrap();
  let ids: Vec<_> = favorites.iter().map(|f| f.beer_id).collect();
  assert_eq!(ids, [a.beer_id]);
}

// ─── Ratings & comments ──────────────────────────────────────────────────────

#[tokio::test]
async fn rating_upsert_replaces_and_recomputes_averages() {
  let s = store().await;
  let ana = member(&s, "ana@example.com").await;
  let bia = member(&s, "bia@example.com").await;
  let beer = s.add_beer(beer_form("Eisenbahn Dunkel", "Dunkel"), w()).await.unwrap();

  s.upsert_rating(ana.user_id, beer.beer_id, NewRating::stars(2), w()).await.unwrap();
  s.upsert_rating(ana.user_id, beer.beer_id, NewRating {
    stars:        4,
    review_score: Some(8),
    review:       Some("Tostada".into()),
  }, w())
  .await
  .unwrap();
  s.upsert_rating(bia.user_id, beer.beer_id, NewRating::stars(5), w()).await.unwrap();

  let rating = s.get_rating(ana.user_id, beer.beer_id).await.unwrap().unwrap();
  assert_eq!(rating.stars, 4);
  assert_eq!(rating.review_score, Some(8));
  assert_eq!(rating.review.as_deref(), Some("Tostada"));

  let ranking = s.get_ranking(beer.beer_id).await.unwrap().unwrap();
  assert_eq!(ranking.total_ratings, 2);
  assert!((ranking.avg_stars - 4.5).abs() < 1e-9);
  // Only one rating carries a review score.
  assert!((ranking.avg_review_score - 8.0).abs() < 1e-9);
}

#[tokio::test]
async fn comments_list_newest_first_and_soft_delete() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let beer = s.add_beer(beer_form("Wäls Trippel", "Tripel"), w()).await.unwrap();

  let first = s.add_comment(user.user_id, beer.beer_id, "primeira".into(), w()).await.unwrap();
  let second = s.add_comment(user.user_id, beer.beer_id, "segunda".into(), w()).await.unwrap();

  let comments = s.list_comments(beer.beer_id).await.unwrap();
  let ids: Vec<_> = comments.iter().map(|c| c.comment_id).collect();
  assert_eq!(ids, [second.comment_id, first.comment_id]);
  assert_eq!(s.get_ranking(beer.beer_id).await.unwrap().unwrap().total_comments, 2);

  s.delete_comment(first.comment_id, w()).await.unwrap();
  assert!(s.get_comment(first.comment_id).await.unwrap().is_none());
  assert_eq!(s.list_comments(beer.beer_id).await.unwrap().len(), 1);
  assert_eq!(s.get_ranking(beer.beer_id).await.unwrap().unwrap().total_comments, 1);

  assert!(matches!(
    s.delete_comment(first.comment_id, w()).await,
    Err(crate::Error::CommentNotFound(_))
  ));
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_vote_earns_gold_and_losing_it_drops_the_badge() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let a = s.add_beer(beer_form("Alpha", "IPA"), w()).await.unwrap();
  let b = s.add_beer(beer_form("Beta", "IPA"), w()).await.unwrap();
  let weights = RankingWeights::default();

  s.toggle_engagement(user.user_id, a.beer_id, EngagementKind::Vote, w()).await.unwrap();
  let ranked = s.refresh_ranking(&weights).await.unwrap();
  assert_eq!(ranked[0].beer_id, a.beer_id);
  assert_eq!(ranked[0].position, 1);

  let board = s.leaderboard().await.unwrap();
  assert_eq!(board.len(), 2);
  assert_eq!(board[0].beer.beer_id, a.beer_id);
  assert_eq!(board[0].badge, Some(BadgeTier::Gold));
  assert_eq!(board[1].beer.beer_id, b.beer_id);
  assert_eq!(board[1].badge, None);

  let badges = s.badges().await.unwrap();
  assert_eq!(badges.len(), 1);
  assert_eq!(badges[0].tier, BadgeTier::Gold);

  s.toggle_engagement(user.user_id, a.beer_id, EngagementKind::Vote, w()).await.unwrap();
  s.refresh_ranking(&weights).await.unwrap();
  assert!(s.badges().await.unwrap().is_empty());
  assert!(s.leaderboard().await.unwrap().iter().all(|r| r.badge.is_none()));
}

#[tokio::test]
async fn inactive_beers_leave_the_leaderboard() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let a = s.add_beer(beer_form("Alpha", "IPA"), w()).await.unwrap();
  let b = s.add_beer(beer_form("Beta", "IPA"), w()).await.unwrap();
  let weights = RankingWeights::default();

  s.toggle_engagement(user.user_id, a.beer_id, EngagementKind::Vote, w()).await.unwrap();
  s.toggle_engagement(user.user_id, b.beer_id, EngagementKind::Favorite, w()).await.unwrap();
  s.refresh_ranking(&weights).await.unwrap();

  s.set_beer_active(a.beer_id, false, w()).await.unwrap();
  s.refresh_ranking(&weights).await.unwrap();

  let board = s.leaderboard().await.unwrap();
  assert_eq!(board.len(), 1);
  assert_eq!(board[0].beer.beer_id, b.beer_id);
  assert_eq!(board[0].ranking.position, Some(1));
  assert_eq!(board[0].badge, Some(BadgeTier::Gold));

  let hidden = s.get_ranking(a.beer_id).await.unwrap().unwrap();
  assert_eq!(hidden.position, None);
  assert_eq!(hidden.total_votes, 1);
}

#[tokio::test]
async fn writes_rerank_in_the_same_transaction() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let a = s.add_beer(beer_form("Alpha", "IPA"), w()).await.unwrap();
  let b = s.add_beer(beer_form("Beta", "IPA"), w()).await.unwrap();

  s.toggle_engagement(user.user_id, a.beer_id, EngagementKind::Vote, w()).await.unwrap();

  let mut rows = s.rankings_for(&[a.beer_id, b.beer_id, Uuid::new_v4()]).await.unwrap();
  assert_eq!(rows.len(), 2);
  rows.sort_by_key(|(ranking, _)| ranking.position);
  assert_eq!(rows[0].0.beer_id, a.beer_id);
  assert_eq!(rows[0].0.position, Some(1));
  assert_eq!(rows[0].1, Some(BadgeTier::Gold));
  assert_eq!(rows[1].0.beer_id, b.beer_id);
  assert_eq!(rows[1].0.position, Some(2));
  assert_eq!(rows[1].1, None);

  assert!(s.rankings_for(&[]).await.unwrap().is_empty());
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sessions_expire_and_can_be_revoked() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let hour = chrono::Duration::hours(1);

  s.register_session("live", user.user_id, Utc::now() + hour).await.unwrap();
  s.register_session("stale", user.user_id, Utc::now() - hour).await.unwrap();

  assert_eq!(s.session_user("live").await.unwrap(), Some(user.user_id));
  assert_eq!(s.session_user("stale").await.unwrap(), None);
  assert_eq!(s.session_user("unknown").await.unwrap(), None);

  s.end_session("live").await.unwrap();
  assert_eq!(s.session_user("live").await.unwrap(), None);
  // Ending an unknown session is fine.
  s.end_session("unknown").await.unwrap();
}

// ─── Recorder over SQLite ────────────────────────────────────────────────────

async fn recorder() -> (Recorder<SqliteStore>, User) {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  (Recorder::new(Arc::new(s), RankingWeights::default()), user)
}

#[tokio::test]
async fn recorder_rejects_inactive_beers() {
  let (rec, user) = recorder().await;
  let beer = rec.create_beer(beer_form("Sazonal", "Witbier")).await.unwrap();
  rec.set_beer_active(beer.beer_id, false).await.unwrap();

  let err = rec.toggle_vote(&user, beer.beer_id).await.unwrap_err();
  assert!(matches!(err, topbreja_core::Error::NotFound(_)));
  assert_eq!(
    rec.store().engagement_rows(user.user_id, beer.beer_id, EngagementKind::Vote).await.unwrap(),
    0
  );
}

#[tokio::test]
async fn recorder_toggle_refreshes_ranking() {
  let (rec, user) = recorder().await;
  let beer = rec.create_beer(beer_form("Alpha", "IPA")).await.unwrap();

  assert_eq!(rec.toggle_vote(&user, beer.beer_id).await.unwrap(), EngagementState::Active);
  let board = rec.leaderboard().await.unwrap();
  assert_eq!(board[0].badge, Some(BadgeTier::Gold));

  assert_eq!(rec.toggle_vote(&user, beer.beer_id).await.unwrap(), EngagementState::Inactive);
  let board = rec.leaderboard().await.unwrap();
  assert_eq!(board[0].badge, None);
}

#[tokio::test]
async fn battle_vote_activates_without_toggling() {
  let (rec, user) = recorder().await;
  let winner = rec.create_beer(beer_form("Alpha", "IPA")).await.unwrap();
  let loser = rec.create_beer(beer_form("Beta", "IPA")).await.unwrap();

  rec.battle_vote(&user, winner.beer_id, loser.beer_id).await.unwrap();
  rec.battle_vote(&user, winner.beer_id, loser.beer_id).await.unwrap();

  let ranking = rec.store().get_ranking(winner.beer_id).await.unwrap().unwrap();
  assert_eq!(ranking.total_votes, 1);
  assert_eq!(rec.store().get_ranking(loser.beer_id).await.unwrap().unwrap().total_votes, 0);

  let same = rec.battle_vote(&user, winner.beer_id, winner.beer_id).await.unwrap_err();
  assert!(matches!(same, topbreja_core::Error::Validation(_)));
}

#[tokio::test]
async fn battle_pair_needs_two_active_beers() {
  let (rec, _) = recorder().await;
  let only = rec.create_beer(beer_form("Alpha", "IPA")).await.unwrap();
  assert!(matches!(
    rec.pick_battle_pair().await,
    Err(topbreja_core::Error::NotFound(_))
  ));

  rec.create_beer(beer_form("Beta", "IPA")).await.unwrap();
  let (x, y) = rec.pick_battle_pair().await.unwrap();
  assert_ne!(x.beer_id, y.beer_id);
  assert!(x.beer_id == only.beer_id || y.beer_id == only.beer_id);
}

#[tokio::test]
async fn only_author_or_admin_deletes_comments() {
  let (rec, author) = recorder().await;
  let other = member(rec.store(), "bia@example.com").await;
  let mut admin_input = NewUser::member(Uuid::new_v4(), "adm@example.com", "Adm");
  admin_input.role = Role::Admin;
  let admin = rec.store().add_user(admin_input).await.unwrap();
  let beer = rec.create_beer(beer_form("Alpha", "IPA")).await.unwrap();

  let c1 = rec.add_comment(&author, beer.beer_id, "boa").await.unwrap();
  let c2 = rec.add_comment(&author, beer.beer_id, "ótima").await.unwrap();

  assert!(matches!(
    rec.delete_comment(&other, c1.comment_id).await,
    Err(topbreja_core::Error::NotAuthorized)
  ));
  rec.delete_comment(&author, c1.comment_id).await.unwrap();
  rec.delete_comment(&admin, c2.comment_id).await.unwrap();
  assert!(rec.list_comments(beer.beer_id).await.unwrap().is_empty());
}

// ─── Failed writes ───────────────────────────────────────────────────────────

/// Overwrite the `atualizado_em` of `beer_id`'s ranking row with `value`.
async fn set_ranking_timestamp(s: &SqliteStore, beer_id: Uuid, value: String) {
  let id = encode_uuid(beer_id);
  s.conn
    .call(move |conn| {
      conn.execute(
        "UPDATE ranking SET atualizado_em = ?2 WHERE cerveja_id = ?1",
        rusqlite::params![id, value],
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn failed_rerank_rolls_back_the_toggle() {
  let s = store().await;
  let user = member(&s, "ana@example.com").await;
  let target = s.add_beer(beer_form("Alpha", "IPA"), w()).await.unwrap();
  let broken = s.add_beer(beer_form("Beta", "IPA"), w()).await.unwrap();
  set_ranking_timestamp(&s, broken.beer_id, "not a timestamp".into()).await;

  assert!(
    s.toggle_engagement(user.user_id, target.beer_id, EngagementKind::Vote, w())
      .await
      .is_err()
  );
  assert_eq!(
    s.engagement_rows(user.user_id, target.beer_id, EngagementKind::Vote).await.unwrap(),
    0
  );
  assert_eq!(s.get_ranking(target.beer_id).await.unwrap().unwrap().total_votes, 0);
}

#[tokio::test]
async fn recorder_failure_leaves_prior_state_unchanged() {
  let (rec, user) = recorder().await;
  let target = rec.create_beer(beer_form("Alpha", "IPA")).await.unwrap();
  let broken = rec.create_beer(beer_form("Beta", "IPA")).await.unwrap();

  assert_eq!(rec.toggle_vote(&user, target.beer_id).await.unwrap(), EngagementState::Active);
  set_ranking_timestamp(rec.store(), broken.beer_id, "not a timestamp".into()).await;

  // Each write fails as a whole: state, counters and badges stay as they were.
  assert!(rec.toggle_vote(&user, target.beer_id).await.is_err());
  assert!(rec.toggle_favorite(&user, target.beer_id).await.is_err());
  assert!(rec.submit_rating(&user, target.beer_id, NewRating::stars(4)).await.is_err());
  assert!(rec.add_comment(&user, target.beer_id, "boa").await.is_err());

  let summary = rec.store().engagement_summary(user.user_id, target.beer_id).await.unwrap();
  assert_eq!(summary.vote, EngagementState::Active);
  assert_eq!(summary.favorite, EngagementState::Absent);
  assert!(rec.rating(&user, target.beer_id).await.unwrap().is_none());
  assert!(rec.list_comments(target.beer_id).await.unwrap().is_empty());

  let ranking = rec.store().get_ranking(target.beer_id).await.unwrap().unwrap();
  assert_eq!(ranking.total_votes, 1);
  assert_eq!(ranking.total_favorites, 0);
  assert_eq!(ranking.total_comments, 0);
  let rankings = rec.rankings(&[target.beer_id]).await.unwrap();
  assert_eq!(rankings[&target.beer_id].1, Some(BadgeTier::Gold));

  // Once the store is healthy again, the next press flips from the kept state.
  set_ranking_timestamp(rec.store(), broken.beer_id, encode_dt(Utc::now())).await;
  assert_eq!(rec.toggle_vote(&user, target.beer_id).await.unwrap(), EngagementState::Inactive);
}
