//! Request bodies and response decoding for the hosted auth backend
//! (GoTrue REST API). Paths are relative to `{auth.url}/auth/v1/`.

use chrono::{
  DateTime,
  Utc
};
use serde::{
  Deserialize,
  Serialize
};
use serde_json::Value;
use tracing::debug;

use crate::error::AuthError;
use crate::session::{
  Credentials,
  Session,
  SignUpOutcome,
  User
};

pub const PASSWORD_GRANT_PATH: &str =
  "token?grant_type=password";
pub const REFRESH_GRANT_PATH: &str =
  "token?grant_type=refresh_token";
pub const SIGN_UP_PATH: &str = "signup";
pub const LOGOUT_PATH: &str = "logout";
pub const RECOVER_PATH: &str = "recover";
pub const USER_PATH: &str = "user";

#[derive(Debug, Serialize)]
pub struct PasswordGrant<'a> {
  pub email:    &'a str,
  pub password: &'a str
}

impl<'a> From<&'a Credentials>
  for PasswordGrant<'a>
{
  fn from(
    credentials: &'a Credentials
  ) -> Self {
    Self {
      email:    &credentials.email,
      password: &credentials.password
    }
  }
}

#[derive(Debug, Serialize)]
pub struct RefreshGrant<'a> {
  pub refresh_token: &'a str
}

#[derive(Debug, Serialize)]
pub struct RecoverRequest<'a> {
  pub email: &'a str
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token:  String,
  #[serde(default)]
  refresh_token: String,
  #[serde(default)]
  expires_at:    Option<i64>,
  #[serde(default)]
  expires_in:    Option<i64>,
  user:          User
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  error:             Option<String>,
  #[serde(default)]
  error_description: Option<String>,
  #[serde(default)]
  error_code:        Option<String>,
  #[serde(default)]
  msg:               Option<String>,
  #[serde(default)]
  message:           Option<String>
}

impl ErrorBody {
  fn text(&self) -> Option<&str> {
    [
      &self.error_description,
      &self.msg,
      &self.message,
      &self.error
    ]
    .into_iter()
    .flatten()
    .map(String::as_str)
    .find(|text| !text.trim().is_empty())
  }
}

/// Decodes a token response, deriving `expires_at` from `expires_in`
/// when the backend omits it.
pub fn parse_session(
  body: &str,
  now: DateTime<Utc>
) -> Result<Session, AuthError> {
  let token: TokenResponse =
    serde_json::from_str(body).map_err(
      |error| {
        AuthError::Rejected(format!(
          "unexpected auth response: \
           {error}"
        ))
      }
    )?;

  let expires_at =
    token.expires_at.or_else(|| {
      token.expires_in.map(|secs| {
        now.timestamp() + secs
      })
    });

  Ok(Session {
    access_token: token.access_token,
    refresh_token: token.refresh_token,
    expires_at,
    user: token.user
  })
}

/// Sign-up answers with a token when accounts are auto-confirmed and
/// with the bare user record when email verification is required.
pub fn parse_sign_up(
  body: &str,
  now: DateTime<Utc>
) -> Result<SignUpOutcome, AuthError> {
  let value: Value =
    serde_json::from_str(body).map_err(
      |error| {
        AuthError::Rejected(format!(
          "unexpected sign-up response: \
           {error}"
        ))
      }
    )?;

  if value.get("access_token").is_some() {
    return parse_session(body, now)
      .map(SignUpOutcome::SignedIn);
  }
  debug!(
    "sign-up pending email verification"
  );
  Ok(SignUpOutcome::PendingVerification)
}

pub fn parse_user(
  body: &str
) -> Result<User, AuthError> {
  serde_json::from_str(body).map_err(
    |error| {
      AuthError::Rejected(format!(
        "unexpected user response: \
         {error}"
      ))
    }
  )
}

/// The backend refused the access token itself.
pub fn is_session_rejected(
  status: u16
) -> bool {
  matches!(status, 401 | 403)
}

/// Maps a non-success response onto the error taxonomy.
pub fn classify_error(
  status: u16,
  body: &str
) -> AuthError {
  let parsed: ErrorBody =
    serde_json::from_str(body)
      .unwrap_or_default();
  let text = parsed
    .text()
    .map(str::to_string)
    .unwrap_or_else(|| {
      format!(
        "auth request failed with \
         status {status}"
      )
    });
  let code = parsed
    .error_code
    .as_deref()
    .unwrap_or_default();
  let lowered = text.to_ascii_lowercase();

  if code == "invalid_credentials"
    || lowered
      .contains("invalid login credentials")
  {
    AuthError::InvalidCredentials
  } else if code == "weak_password"
    || lowered.starts_with("password should")
  {
    AuthError::WeakPassword(text)
  } else if code == "email_not_confirmed"
    || lowered.contains("email not confirmed")
  {
    AuthError::EmailNotConfirmed
  } else if status >= 500 {
    AuthError::Transport(text)
  } else {
    AuthError::Rejected(text)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> {
    Utc
      .timestamp_opt(1_700_000_000, 0)
      .single()
      .expect("valid timestamp")
  }

  #[test]
  fn expires_at_falls_back_to_expires_in()
  {
    let session = parse_session(
      r#"{"access_token":"at","refresh_token":"rt","expires_in":3600,"user":{"id":"u-1","email":"a@example.com"}}"#,
      now()
    )
    .expect("session");
    assert_eq!(
      session.expires_at,
      Some(1_700_003_600)
    );
  }

  #[test]
  fn sign_up_without_token_needs_verification()
  {
    let outcome = parse_sign_up(
      r#"{"id":"u-1","email":"a@example.com","confirmation_sent_at":"2024-01-01T00:00:00Z"}"#,
      now()
    )
    .expect("outcome");
    assert_eq!(
      outcome,
      SignUpOutcome::PendingVerification
    );

    let outcome = parse_sign_up(
      r#"{"access_token":"at","expires_at":1,"user":{"id":"u-1"}}"#,
      now()
    )
    .expect("outcome");
    assert!(matches!(
      outcome,
      SignUpOutcome::SignedIn(_)
    ));
  }

  #[test]
  fn classifies_backend_errors() {
    assert_eq!(
      classify_error(
        400,
        r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
      ),
      AuthError::InvalidCredentials
    );
    assert_eq!(
      classify_error(
        400,
        r#"{"code":400,"error_code":"email_not_confirmed","msg":"Email not confirmed"}"#
      ),
      AuthError::EmailNotConfirmed
    );
    assert!(matches!(
      classify_error(
        422,
        r#"{"code":422,"error_code":"weak_password","msg":"Password should be at least 6 characters."}"#
      ),
      AuthError::WeakPassword(message)
        if message.contains("6 characters")
    ));
    assert_eq!(
      classify_error(
        429,
        r#"{"msg":"Email rate limit exceeded"}"#
      ),
      AuthError::Rejected(
        "Email rate limit exceeded"
          .to_string()
      )
    );
    assert!(matches!(
      classify_error(502, "<html>"),
      AuthError::Transport(_)
    ));
  }

  #[test]
  fn password_grant_serializes_credentials()
  {
    let credentials = Credentials {
      email:    "a@example.com"
        .to_string(),
      password: "pw".to_string()
    };
    let body = serde_json::to_value(
      PasswordGrant::from(&credentials)
    )
    .expect("json");
    assert_eq!(
      body,
      serde_json::json!({"email": "a@example.com", "password": "pw"})
    );
  }
}
