use thiserror::Error;

/// Failures reported by the authentication backend.
///
/// None of these are fatal: the login form renders
/// [`AuthError::user_message`] inline and the user retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
  #[error("invalid login credentials")]
  InvalidCredentials,
  #[error("password rejected as too weak: {0}")]
  WeakPassword(String),
  #[error("email address has not been confirmed")]
  EmailNotConfirmed,
  #[error(
    "stored session was rejected by the \
     auth backend"
  )]
  StaleSession,
  #[error("auth request rejected: {0}")]
  Rejected(String),
  #[error("auth backend unreachable: {0}")]
  Transport(String)
}

impl AuthError {
  pub fn user_message(&self) -> String {
    match self {
      | AuthError::InvalidCredentials => {
        "Invalid email or password."
          .to_string()
      }
      | AuthError::WeakPassword(
        message
      ) => {
        if message.trim().is_empty() {
          "Please use a stronger \
           password."
            .to_string()
        } else {
          message.clone()
        }
      }
      | AuthError::EmailNotConfirmed => {
        "Please confirm your email \
         address before signing in."
          .to_string()
      }
      | AuthError::StaleSession => {
        "Your session has expired. \
         Please sign in again."
          .to_string()
      }
      | AuthError::Rejected(message) => {
        message.clone()
      }
      | AuthError::Transport(_) => {
        "Could not reach the sign-in \
         service. Please try again."
          .to_string()
      }
    }
  }
}

/// Failures while listing the caller's organization memberships.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  #[error(
    "organization directory unreachable: \
     {0}"
  )]
  Transport(String),
  #[error(
    "organization directory returned \
     status {status}: {message}"
  )]
  Status {
    status:  u16,
    message: String
  },
  #[error(
    "organization directory rejected the \
     session"
  )]
  Unauthorized,
  #[error(
    "failed to decode organization \
     directory response: {0}"
  )]
  Decode(String)
}

/// Failures of the extension key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
  #[error("storage unavailable: {0}")]
  Unavailable(String),
  #[error("storage operation failed: {0}")]
  Backend(String),
  #[error(
    "stored value could not be decoded: \
     {0}"
  )]
  Decode(String)
}
