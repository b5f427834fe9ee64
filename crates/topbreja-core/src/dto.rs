//! Response shapes and the joined-relation boundary.
//!
//! Relational backends return a joined relation as `null`, a single object or
//! an array depending on the join. [`Joined`] accepts all three and always
//! hands out an ordered `Vec`, so consumers never guess the shape.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{
  beer::Beer,
  image::ImageResolver,
  ranking::{BadgeTier, RankedBeer, Ranking},
};

/// A joined relation in any of its wire shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Joined<T> {
  Many(Vec<T>),
  One(T),
}

impl<T> Joined<T> {
  pub fn into_vec(self) -> Vec<T> {
    match self {
      Self::Many(items) => items,
      Self::One(item) => vec![item],
    }
  }
}

/// `deserialize_with` helper: zero-or-more related rows.
pub fn joined<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(
    Option::<Joined<T>>::deserialize(deserializer)?
      .map(Joined::into_vec)
      .unwrap_or_default(),
  )
}

/// `deserialize_with` helper: zero-or-one related row. More than one row is
/// an error rather than silently taking the first.
pub fn joined_optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  let mut rows = joined(deserializer)?;
  match rows.len() {
    0 | 1 => Ok(rows.pop()),
    n => Err(serde::de::Error::custom(format!(
      "expected at most one related row, found {n}"
    ))),
  }
}

/// A beer as shown in the catalog, the leaderboard and battles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeerCard {
  pub beer_id:     Uuid,
  pub name:        String,
  pub brand:       String,
  pub style:       String,
  pub abv:         f64,
  pub description: String,
  pub image_url:   Option<String>,
  pub active:      bool,
  #[serde(default, deserialize_with = "joined_optional")]
  pub ranking:     Option<Ranking>,
  #[serde(default, deserialize_with = "joined")]
  pub badges:      Vec<BadgeTier>,
}

impl BeerCard {
  pub fn new(
    beer: Beer,
    ranking: Option<Ranking>,
    badges: Vec<BadgeTier>,
    images: &dyn ImageResolver,
  ) -> Self {
    Self {
      image_url: beer.image_path.as_deref().map(|p| images.resolve(p)),
      beer_id: beer.beer_id,
      name: beer.name,
      brand: beer.brand,
      style: beer.style,
      abv: beer.abv,
      description: beer.description,
      active: beer.active,
      ranking,
      badges,
    }
  }

  pub fn from_ranked(ranked: RankedBeer, images: &dyn ImageResolver) -> Self {
    let badges = ranked.badge.into_iter().collect();
    Self::new(ranked.beer, Some(ranked.ranking), badges, images)
  }
}
