use std::rc::Rc;

use tracing::{
  error,
  warn
};

use crate::auth::AuthProvider;
use crate::directory::OrganizationDirectory;
use crate::error::FetchError;
use crate::kv::KvStore;
use crate::persistence::OrganizationStore;
use crate::reducer::{
  Action,
  Effect
};
use crate::resolver::{
  OrganizationResolver,
  SessionLookup,
  SessionResolver
};

/// Collaborator handles the popup runs effects against.
#[derive(Clone)]
pub struct Services {
  pub auth:          Rc<dyn AuthProvider>,
  pub sessions:      SessionResolver,
  pub organizations: OrganizationResolver
}

impl Services {
  pub fn new(
    auth: Rc<dyn AuthProvider>,
    directory: Rc<
      dyn OrganizationDirectory
    >,
    kv: Rc<dyn KvStore>,
    selection_key: &str
  ) -> Self {
    let store = OrganizationStore::new(
      kv,
      selection_key
    );
    Self {
      sessions: SessionResolver::new(
        auth.clone()
      ),
      organizations:
        OrganizationResolver::new(
          directory, store
        ),
      auth
    }
  }

  /// Runs one effect; the returned action, if any, goes back through
  /// the reducer.
  #[tracing::instrument(skip_all)]
  pub async fn perform(
    &self,
    effect: Effect
  ) -> Option<Action> {
    match effect {
      | Effect::ResolveSession => {
        let action = match self
          .sessions
          .current_session()
          .await
        {
          | SessionLookup::Active(
            session
          ) => Action::SessionChanged(Some(
            session
          )),
          | SessionLookup::Absent => {
            Action::SessionChanged(None)
          }
          | SessionLookup::Invalidated => {
            Action::SessionInvalidated
          }
        };
        Some(action)
      }
      | Effect::LoadMemberships {
        generation,
        user_id
      } => {
        match self
          .organizations
          .fetch_memberships(&user_id)
          .await
        {
          | Ok(organizations) => {
            let restored = self
              .organizations
              .restore_selection()
              .await;
            Some(Action::MembershipsLoaded {
              generation,
              organizations,
              restored
            })
          }
          | Err(FetchError::Unauthorized) => {
            warn!(
              generation,
              "organization directory \
               refused the session"
            );
            Some(Action::MembershipsRejected {
              generation
            })
          }
          | Err(fetch_error) => {
            error!(
              error = %fetch_error,
              generation,
              "error fetching \
               organizations"
            );
            Some(Action::MembershipsFailed {
              generation,
              message: fetch_error
                .to_string()
            })
          }
        }
      }
      | Effect::PersistSelection(
        organization
      ) => {
        if let Err(storage_error) = self
          .organizations
          .select(&organization)
          .await
        {
          warn!(
            error = %storage_error,
            "failed to persist selected \
             organization"
          );
        }
        None
      }
      | Effect::ClearPersistedSelection => {
        if let Err(storage_error) =
          self.organizations.clear().await
        {
          warn!(
            error = %storage_error,
            "failed to clear stored \
             organization"
          );
        }
        None
      }
      | Effect::SignOut => {
        if let Err(auth_error) =
          self.auth.sign_out().await
        {
          warn!(
            error = %auth_error,
            "sign out request failed; \
             local state already cleared"
          );
        }
        None
      }
    }
  }
}
