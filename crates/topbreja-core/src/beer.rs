//! Catalog items (`cerveja` rows) and the admin form input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

const MAX_NAME: usize = 120;
const MAX_DESCRIPTION: usize = 4000;

/// A beer in the catalog. Inactive beers are soft-deleted: hidden from the
/// public catalog, the ranking and battles, but never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beer {
  pub beer_id:     Uuid,
  pub name:        String,
  pub brand:       String,
  pub style:       String,
  /// Alcohol by volume, in percent.
  pub abv:         f64,
  pub description: String,
  /// Object-storage path; see [`crate::image::ImageResolver`].
  pub image_path:  Option<String>,
  pub active:      bool,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Admin form input for creating or editing a beer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBeer {
  pub name:        String,
  pub brand:       String,
  pub style:       String,
  pub abv:         f64,
  #[serde(default)]
  pub description: String,
  pub image_path:  Option<String>,
}

impl NewBeer {
  /// Validate the form and return a copy with whitespace trimmed.
  pub fn normalized(&self) -> Result<Self> {
    let name = required("name", &self.name, MAX_NAME)?;
    let brand = required("brand", &self.brand, MAX_NAME)?;
    let style = required("style", &self.style, MAX_NAME)?;

    if !self.abv.is_finite() || !(0.0..=100.0).contains(&self.abv) {
      return Err(Error::validation("abv must be between 0 and 100"));
    }

    let description = self.description.trim().to_owned();
    if description.chars().count() > MAX_DESCRIPTION {
      return Err(Error::validation(format!(
        "description must be at most {MAX_DESCRIPTION} characters"
      )));
    }

    let image_path = self
      .image_path
      .as_deref()
      .map(str::trim)
      .filter(|p| !p.is_empty())
      .map(str::to_owned);

    Ok(Self { name, brand, style, abv: self.abv, description, image_path })
  }
}

fn required(field: &str, value: &str, max: usize) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::validation(format!("{field} must not be empty")));
  }
  if trimmed.chars().count() > max {
    return Err(Error::validation(format!(
      "{field} must be at most {max} characters"
    )));
  }
  Ok(trimmed.to_owned())
}

/// Parameters for [`crate::store::BrejaStore::list_beers`].
#[derive(Debug, Clone, Default)]
pub struct BeerQuery {
  /// Case-insensitive substring over name, brand and style.
  pub text:             Option<String>,
  /// Exact (case-insensitive) style filter.
  pub style:            Option<String>,
  pub include_inactive: bool,
  pub limit:            Option<usize>,
  pub offset:           Option<usize>,
}
