//! Users as stored in the `usuario` table.
//!
//! Sign-up happens in the external authentication provider; TopBreja only
//! reads user records, provisions the matching row, and edits the display
//! name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

const MAX_DISPLAY_NAME: usize = 60;

/// The role flag on a user record.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  pub email:        String,
  pub display_name: String,
  pub role:         Role,
  pub created_at:   DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Input to [`crate::store::BrejaStore::add_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  /// The id issued by the authentication provider.
  pub user_id:      Uuid,
  pub email:        String,
  pub display_name: String,
  pub role:         Role,
}

impl NewUser {
  pub fn member(user_id: Uuid, email: &str, display_name: &str) -> Self {
    Self {
      user_id,
      email: email.to_owned(),
      display_name: display_name.to_owned(),
      role: Role::Member,
    }
  }

  pub fn validate(&self) -> Result<()> {
    if !self.email.contains('@') {
      return Err(Error::validation("email must contain '@'"));
    }
    validate_display_name(&self.display_name)?;
    Ok(())
  }
}

/// Trim a display name and check its length.
pub fn validate_display_name(name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(Error::validation("display name must not be empty"));
  }
  if trimmed.chars().count() > MAX_DISPLAY_NAME {
    return Err(Error::validation(format!(
      "display name must be at most {MAX_DISPLAY_NAME} characters"
    )));
  }
  Ok(trimmed.to_owned())
}
