//! Auth backend and organization directory over the Supabase REST API.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::Utc;
use gloo::net::http::{
  Request,
  RequestBuilder
};
use tether_core::auth::{
  AuthEvents,
  AuthListener,
  AuthProvider,
  AuthSubscription
};
use tether_core::config::PopupConfig;
use tether_core::directory::{
  MembershipRow,
  OrganizationDirectory,
  membership_query_path,
  parse_membership_rows,
  status_error
};
use tether_core::kv::KvStore;
use tether_core::session::{
  AuthEvent,
  Credentials,
  Session,
  SignUpOutcome
};
use tether_core::wire::{
  LOGOUT_PATH,
  PASSWORD_GRANT_PATH,
  PasswordGrant,
  RECOVER_PATH,
  REFRESH_GRANT_PATH,
  RecoverRequest,
  RefreshGrant,
  SIGN_UP_PATH,
  USER_PATH,
  classify_error,
  is_session_rejected,
  parse_session,
  parse_sign_up,
  parse_user
};
use tether_core::{
  AuthError,
  FetchError
};
use tracing::{
  debug,
  info,
  warn
};

use crate::api::{
  Reply,
  send
};

pub struct SupabaseClient {
  config:  Rc<PopupConfig>,
  kv:      Rc<dyn KvStore>,
  current: RefCell<Option<Session>>,
  events:  AuthEvents
}

impl SupabaseClient {
  pub fn new(
    config: Rc<PopupConfig>,
    kv: Rc<dyn KvStore>
  ) -> Self {
    Self {
      config,
      kv,
      current: RefCell::new(None),
      events: AuthEvents::new()
    }
  }

  fn with_api_key(
    &self,
    builder: RequestBuilder
  ) -> RequestBuilder {
    builder
      .header(
        "apikey",
        &self.config.auth.anon_key
      )
      .header(
        "Content-Type",
        "application/json"
      )
  }

  fn auth_post(
    &self,
    path: &str
  ) -> RequestBuilder {
    self.with_api_key(Request::post(
      &self.config.auth_endpoint(path)
    ))
  }

  async fn load_stored(
    &self
  ) -> Option<Session> {
    let key =
      &self.config.storage.session_key;
    match self.kv.get(key).await {
      | Ok(Some(value)) => {
        match serde_json::from_value(value)
        {
          | Ok(session) => Some(session),
          | Err(error) => {
            warn!(
              %error,
              "discarding undecodable \
               stored session"
            );
            None
          }
        }
      }
      | Ok(None) => None,
      | Err(error) => {
        warn!(
          %error,
          "failed to read stored session"
        );
        None
      }
    }
  }

  /// Makes `session` current and persists it. Storage failures only
  /// cost the session surviving a popup reload.
  async fn adopt(
    &self,
    session: &Session,
    event: AuthEvent
  ) {
    *self.current.borrow_mut() =
      Some(session.clone());
    let key =
      &self.config.storage.session_key;
    match serde_json::to_value(session) {
      | Ok(value) => {
        if let Err(error) =
          self.kv.set(key, value).await
        {
          warn!(
            %error,
            "failed to persist session"
          );
        }
      }
      | Err(error) => {
        warn!(
          %error,
          "failed to encode session"
        );
      }
    }
    self.events.emit(event, Some(session));
  }

  async fn forget(&self) -> Option<Session> {
    let previous =
      self.current.borrow_mut().take();
    if let Err(error) = self
      .kv
      .remove(
        &self.config.storage.session_key
      )
      .await
    {
      warn!(
        %error,
        "failed to clear stored session"
      );
    }
    previous
  }

  async fn post_auth<B>(
    &self,
    path: &str,
    body: &B
  ) -> Result<Reply, AuthError>
  where
    B: serde::Serialize,
  {
    let reply =
      send(self.auth_post(path), Some(body))
        .await
        .map_err(AuthError::Transport)?;
    if reply.is_success() {
      Ok(reply)
    } else {
      Err(classify_error(
        reply.status,
        &reply.body
      ))
    }
  }

  #[tracing::instrument(skip_all)]
  async fn refresh(
    &self,
    session: &Session
  ) -> Result<Session, AuthError> {
    if session.refresh_token.is_empty() {
      return Err(AuthError::StaleSession);
    }
    let grant = RefreshGrant {
      refresh_token: &session.refresh_token
    };
    let reply = match self
      .post_auth(REFRESH_GRANT_PATH, &grant)
      .await
    {
      | Ok(reply) => reply,
      | Err(AuthError::Transport(message)) => {
        return Err(AuthError::Transport(
          message
        ));
      }
      | Err(error) => {
        debug!(
          %error,
          "refresh token refused"
        );
        return Err(AuthError::StaleSession);
      }
    };
    let refreshed =
      parse_session(&reply.body, Utc::now())?;
    self
      .adopt(
        &refreshed,
        AuthEvent::TokenRefreshed
      )
      .await;
    info!(
      user = %refreshed.user_id(),
      "session refreshed"
    );
    Ok(refreshed)
  }

  /// Confirms the access token is still accepted. Only an explicit
  /// rejection counts against the session.
  async fn verify(
    &self,
    session: &Session
  ) -> Result<(), AuthError> {
    let builder = self
      .with_api_key(Request::get(
        &self
          .config
          .auth_endpoint(USER_PATH)
      ))
      .header(
        "Authorization",
        &format!(
          "Bearer {}",
          session.access_token
        )
      );
    match send(builder, None::<&()>).await {
      | Ok(reply) if reply.is_success() => {
        let user = parse_user(&reply.body)?;
        if user.id != session.user_id() {
          return Err(AuthError::StaleSession);
        }
        Ok(())
      }
      | Ok(reply)
        if is_session_rejected(
          reply.status
        ) =>
      {
        Err(AuthError::StaleSession)
      }
      | Ok(reply) => {
        warn!(
          status = reply.status,
          "could not verify session; \
           keeping it"
        );
        Ok(())
      }
      | Err(message) => {
        warn!(
          %message,
          "could not verify session; \
           keeping it"
        );
        Ok(())
      }
    }
  }

  /// Bearer value for directory calls, refreshing an expired session
  /// first. A refresh the backend refuses ends up as `Unauthorized`.
  async fn directory_bearer(
    &self
  ) -> Result<String, FetchError> {
    let current = self.current.borrow().clone();
    let Some(session) = current else {
      return Ok(format!(
        "Bearer {}",
        self.config.auth.anon_key
      ));
    };
    if !session.is_expired_at(Utc::now()) {
      return Ok(format!(
        "Bearer {}",
        session.access_token
      ));
    }

    match self.refresh(&session).await {
      | Ok(refreshed) => {
        Ok(format!(
          "Bearer {}",
          refreshed.access_token
        ))
      }
      | Err(AuthError::StaleSession) => {
        Err(FetchError::Unauthorized)
      }
      | Err(error) => {
        warn!(
          %error,
          "token refresh failed; trying \
           the current token"
        );
        Ok(format!(
          "Bearer {}",
          session.access_token
        ))
      }
    }
  }
}

#[async_trait(?Send)]
impl AuthProvider for SupabaseClient {
  #[tracing::instrument(skip_all)]
  async fn get_session(
    &self
  ) -> Result<Option<Session>, AuthError> {
    let cached = self.current.borrow().clone();
    let session = match cached {
      | Some(session) => session,
      | None => {
        match self.load_stored().await {
          | Some(session) => session,
          | None => return Ok(None)
        }
      }
    };

    let session =
      if session.is_expired_at(Utc::now()) {
        self.refresh(&session).await?
      } else {
        session
      };
    self.verify(&session).await?;
    *self.current.borrow_mut() =
      Some(session.clone());
    Ok(Some(session))
  }

  #[tracing::instrument(skip_all)]
  async fn sign_in(
    &self,
    credentials: &Credentials
  ) -> Result<Session, AuthError> {
    let reply = self
      .post_auth(
        PASSWORD_GRANT_PATH,
        &PasswordGrant::from(credentials)
      )
      .await?;
    let session =
      parse_session(&reply.body, Utc::now())?;
    info!(
      user = %session.user_id(),
      "signed in"
    );
    self
      .adopt(&session, AuthEvent::SignedIn)
      .await;
    Ok(session)
  }

  #[tracing::instrument(skip_all)]
  async fn sign_up(
    &self,
    credentials: &Credentials
  ) -> Result<SignUpOutcome, AuthError> {
    let reply = self
      .post_auth(
        SIGN_UP_PATH,
        &PasswordGrant::from(credentials)
      )
      .await?;
    let outcome = parse_sign_up(
      &reply.body,
      Utc::now()
    )?;
    if let SignUpOutcome::SignedIn(session) =
      &outcome
    {
      self
        .adopt(session, AuthEvent::SignedIn)
        .await;
    }
    Ok(outcome)
  }

  /// Local state is cleared and listeners notified before the backend
  /// is told; a failed logout call is still reported.
  #[tracing::instrument(skip_all)]
  async fn sign_out(
    &self
  ) -> Result<(), AuthError> {
    let previous = self.forget().await;
    self.events.emit(AuthEvent::SignedOut, None);

    let Some(previous) = previous else {
      return Ok(());
    };
    let builder = self
      .auth_post(LOGOUT_PATH)
      .header(
        "Authorization",
        &format!(
          "Bearer {}",
          previous.access_token
        )
      );
    let reply = send(builder, None::<&()>)
      .await
      .map_err(AuthError::Transport)?;
    if reply.is_success()
      || is_session_rejected(reply.status)
    {
      Ok(())
    } else {
      Err(classify_error(
        reply.status,
        &reply.body
      ))
    }
  }

  #[tracing::instrument(skip_all)]
  async fn reset_password_for_email(
    &self,
    email: &str
  ) -> Result<(), AuthError> {
    self
      .post_auth(
        RECOVER_PATH,
        &RecoverRequest { email }
      )
      .await
      .map(|_| ())
  }

  fn on_auth_state_change(
    &self,
    listener: AuthListener
  ) -> AuthSubscription {
    self.events.subscribe(listener)
  }
}

#[async_trait(?Send)]
impl OrganizationDirectory for SupabaseClient {
  #[tracing::instrument(skip(self))]
  async fn memberships(
    &self,
    user_id: &str
  ) -> Result<Vec<MembershipRow>, FetchError>
  {
    let url = self.config.rest_endpoint(
      &membership_query_path(user_id)
    );
    let bearer =
      self.directory_bearer().await?;
    let builder = self
      .with_api_key(Request::get(&url))
      .header("Authorization", &bearer);
    let reply = send(builder, None::<&()>)
      .await
      .map_err(FetchError::Transport)?;
    if !reply.is_success() {
      return Err(status_error(
        reply.status,
        &reply.body
      ));
    }
    parse_membership_rows(&reply.body)
  }
}
