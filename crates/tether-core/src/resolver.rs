use std::rc::Rc;

use tracing::{
  debug,
  error,
  info,
  warn
};

use crate::auth::{
  AuthProvider,
  AuthSubscription
};
use crate::directory::{
  OrganizationDirectory,
  organizations_from_rows
};
use crate::error::{
  AuthError,
  FetchError,
  StorageError
};
use crate::organization::Organization;
use crate::persistence::OrganizationStore;
use crate::session::Session;

/// Outcome of looking up the session at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
  Active(Session),
  /// Nobody is signed in, or the backend could not be asked.
  Absent,
  /// A stored session was rejected and has been signed out.
  Invalidated
}

/// Answers "who is signed in" and forwards session changes.
#[derive(Clone)]
pub struct SessionResolver {
  auth: Rc<dyn AuthProvider>
}

impl SessionResolver {
  pub fn new(
    auth: Rc<dyn AuthProvider>
  ) -> Self {
    Self { auth }
  }

  /// Never fails: backend errors are logged and read as "no session".
  /// A stored session the backend rejects is signed out first and
  /// reported as [`SessionLookup::Invalidated`].
  #[tracing::instrument(skip(self))]
  pub async fn current_session(
    &self
  ) -> SessionLookup {
    match self.auth.get_session().await {
      | Ok(Some(session)) => {
        info!(
          user = %session.user_id(),
          "resolved existing session"
        );
        SessionLookup::Active(session)
      }
      | Ok(None) => {
        debug!("no existing session");
        SessionLookup::Absent
      }
      | Err(AuthError::StaleSession) => {
        warn!(
          "stored session rejected; \
           forcing sign out"
        );
        if let Err(error) =
          self.auth.sign_out().await
        {
          warn!(
            %error,
            "sign out after stale \
             session failed"
          );
        }
        SessionLookup::Invalidated
      }
      | Err(error) => {
        error!(
          %error,
          "failed to resolve current \
           session"
        );
        SessionLookup::Absent
      }
    }
  }

  /// Calls `on_change` with the new session after every sign-in,
  /// sign-out or token refresh until the returned guard is dropped.
  pub fn subscribe(
    &self,
    on_change: impl Fn(Option<Session>)
    + 'static
  ) -> AuthSubscription {
    self.auth.on_auth_state_change(
      Rc::new(move |event, session| {
        debug!(
          ?event,
          signed_in = session.is_some(),
          "auth state changed"
        );
        on_change(session);
      })
    )
  }
}

/// Fetches memberships and manages the persisted selection.
///
/// The in-memory selection lives in
/// [`PopupState`](crate::reducer::PopupState); this type only performs
/// the I/O behind it.
#[derive(Clone)]
pub struct OrganizationResolver {
  directory: Rc<dyn OrganizationDirectory>,
  store:     OrganizationStore
}

impl OrganizationResolver {
  pub fn new(
    directory: Rc<
      dyn OrganizationDirectory
    >,
    store: OrganizationStore
  ) -> Self {
    Self { directory, store }
  }

  #[tracing::instrument(skip(self))]
  pub async fn fetch_memberships(
    &self,
    user_id: &str
  ) -> Result<Vec<Organization>, FetchError>
  {
    let rows = self
      .directory
      .memberships(user_id)
      .await?;
    let organizations =
      organizations_from_rows(rows);
    info!(
      count = organizations.len(),
      "fetched organizations"
    );
    Ok(organizations)
  }

  pub async fn restore_selection(
    &self
  ) -> Option<Organization> {
    self.store.load().await
  }

  pub async fn select(
    &self,
    organization: &Organization
  ) -> Result<(), StorageError> {
    self.store.save(organization).await
  }

  pub async fn clear(
    &self
  ) -> Result<(), StorageError> {
    self.store.clear().await
  }
}

/// Keeps `restored` only when its id is among `memberships`, returning
/// the freshly fetched record so updated credentials take effect.
pub fn reconcile(
  memberships: &[Organization],
  restored: Option<&Organization>
) -> Option<Organization> {
  let restored = restored?;
  let kept = memberships
    .iter()
    .find(|organization| {
      organization.id == restored.id
    })
    .cloned();

  if kept.is_none() {
    debug!(
      organization = %restored.id,
      "stored organization is no \
       longer a membership"
    );
  }
  kept
}
