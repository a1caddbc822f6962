use std::fmt;

use chrono::{
  DateTime,
  Utc
};
use serde::{
  Deserialize,
  Serialize
};

/// Seconds before `expires_at` at which a session is already treated
/// as expired, so a refresh happens before requests start failing.
pub const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct User {
  pub id:    String,
  #[serde(default)]
  pub email: Option<String>
}

/// Authenticated identity as handed out by the auth backend.
///
/// The field names follow the backend's token response so the same
/// shape is used on the wire and in extension storage.
#[derive(
  Clone, Serialize, Deserialize, PartialEq, Eq,
)]
pub struct Session {
  pub access_token:  String,
  #[serde(default)]
  pub refresh_token: String,
  #[serde(default)]
  pub expires_at:    Option<i64>,
  pub user:          User
}

impl Session {
  pub fn user_id(&self) -> &str {
    &self.user.id
  }

  pub fn email(&self) -> &str {
    self
      .user
      .email
      .as_deref()
      .unwrap_or("")
  }

  pub fn is_expired_at(
    &self,
    now: DateTime<Utc>
  ) -> bool {
    self.expires_at.is_some_and(
      |expires_at| {
        expires_at
          <= now.timestamp()
            + EXPIRY_MARGIN_SECS
      }
    )
  }
}

impl fmt::Debug for Session {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Session")
      .field("user", &self.user)
      .field(
        "expires_at",
        &self.expires_at
      )
      .finish_non_exhaustive()
  }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub email:    String,
  pub password: String
}

impl fmt::Debug for Credentials {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .finish()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
  SignedIn(Session),
  /// The account exists but the email address must be confirmed
  /// before a session is issued.
  PendingVerification
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum AuthEvent {
  SignedIn,
  SignedOut,
  TokenRefreshed
}
