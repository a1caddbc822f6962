use thiserror::Error;

use crate::session::Credentials;

pub const PENDING_VERIFICATION_NOTICE:
  &str = "Please check your email to \
          confirm your account.";
pub const RESET_SENT_NOTICE: &str =
  "If an account exists for that address, \
   a password reset link is on its way.";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum AuthMode {
  #[default]
  SignIn,
  SignUp
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
  #[error(
    "Please enter both email and password"
  )]
  MissingFields,
  #[error(
    "Please agree to the Terms of Service \
     and Privacy Policy"
  )]
  TermsNotAccepted,
  #[error(
    "Enter your email address to reset \
     your password"
  )]
  MissingEmail
}

/// Contents of the login form, validated before any backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginDraft {
  pub mode:            AuthMode,
  pub email:           String,
  pub password:        String,
  pub agreed_to_terms: bool
}

impl LoginDraft {
  pub fn credentials(
    &self
  ) -> Result<Credentials, FormError> {
    let email = self.email.trim();
    if email.is_empty()
      || self.password.is_empty()
    {
      return Err(FormError::MissingFields);
    }
    if self.mode == AuthMode::SignUp
      && !self.agreed_to_terms
    {
      return Err(
        FormError::TermsNotAccepted
      );
    }
    Ok(Credentials {
      email:    email.to_string(),
      password: self.password.clone()
    })
  }

  pub fn reset_email(
    &self
  ) -> Result<String, FormError> {
    let email = self.email.trim();
    if email.is_empty() {
      return Err(FormError::MissingEmail);
    }
    Ok(email.to_string())
  }

  /// Switching modes keeps the email but drops the password and the
  /// terms checkbox.
  pub fn switch_mode(
    &mut self,
    mode: AuthMode
  ) {
    if self.mode != mode {
      self.mode = mode;
      self.password.clear();
      self.agreed_to_terms = false;
    }
  }

  pub fn submit_label(
    &self,
    busy: bool
  ) -> &'static str {
    match (self.mode, busy) {
      | (AuthMode::SignIn, false) => {
        "Sign In"
      }
      | (AuthMode::SignIn, true) => {
        "Signing in..."
      }
      | (AuthMode::SignUp, false) => {
        "Create Account"
      }
      | (AuthMode::SignUp, true) => {
        "Creating account..."
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(
    mode: AuthMode,
    email: &str,
    password: &str
  ) -> LoginDraft {
    LoginDraft {
      mode,
      email: email.to_string(),
      password: password.to_string(),
      agreed_to_terms: false
    }
  }

  #[test]
  fn sign_in_needs_email_and_password()
  {
    assert_eq!(
      draft(AuthMode::SignIn, " ", "pw")
        .credentials(),
      Err(FormError::MissingFields)
    );
    assert_eq!(
      draft(
        AuthMode::SignIn,
        "a@example.com",
        ""
      )
      .credentials(),
      Err(FormError::MissingFields)
    );

    let credentials = draft(
      AuthMode::SignIn,
      "  a@example.com ",
      "pw"
    )
    .credentials()
    .expect("valid");
    assert_eq!(
      credentials.email,
      "a@example.com"
    );
  }

  #[test]
  fn sign_up_needs_terms() {
    let mut form = draft(
      AuthMode::SignUp,
      "a@example.com",
      "Str0ng!pw"
    );
    assert_eq!(
      form.credentials(),
      Err(FormError::TermsNotAccepted)
    );
    form.agreed_to_terms = true;
    assert!(form.credentials().is_ok());
  }

  #[test]
  fn switching_mode_resets_secrets() {
    let mut form = draft(
      AuthMode::SignUp,
      "a@example.com",
      "pw"
    );
    form.agreed_to_terms = true;
    form.switch_mode(AuthMode::SignIn);

    assert_eq!(form.email, "a@example.com");
    assert!(form.password.is_empty());
    assert!(!form.agreed_to_terms);
    assert_eq!(
      form.submit_label(true),
      "Signing in..."
    );
  }

  #[test]
  fn reset_needs_email() {
    assert_eq!(
      LoginDraft::default().reset_email(),
      Err(FormError::MissingEmail)
    );
  }
}
