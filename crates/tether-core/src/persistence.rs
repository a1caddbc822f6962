use std::rc::Rc;

use tracing::{
  debug,
  warn
};

use crate::error::StorageError;
use crate::kv::KvStore;
use crate::organization::Organization;

pub const DEFAULT_SELECTION_KEY: &str =
  "organization";

/// Selected organization kept in the key-value store under one key.
///
/// A value that cannot be read or decoded is reported as "nothing
/// stored"; it never blocks the login or logout flow.
#[derive(Clone)]
pub struct OrganizationStore {
  kv:  Rc<dyn KvStore>,
  key: String
}

impl OrganizationStore {
  pub fn new(
    kv: Rc<dyn KvStore>,
    key: impl Into<String>
  ) -> Self {
    Self {
      kv,
      key: key.into()
    }
  }

  #[tracing::instrument(skip(self), fields(key = %self.key))]
  pub async fn load(
    &self
  ) -> Option<Organization> {
    let raw = match self
      .kv
      .get(&self.key)
      .await
    {
      | Ok(Some(raw)) => raw,
      | Ok(None) => return None,
      | Err(error) => {
        warn!(
          %error,
          "failed reading stored \
           organization; treating as \
           unset"
        );
        return None;
      }
    };

    match serde_json::from_value::<
      Organization
    >(raw)
    {
      | Ok(organization) => {
        debug!(
          organization = %organization.id,
          "loaded stored organization"
        );
        Some(organization)
      }
      | Err(error) => {
        warn!(
          %error,
          "stored organization is \
           malformed; treating as unset"
        );
        None
      }
    }
  }

  #[tracing::instrument(skip(self, organization), fields(key = %self.key, organization = %organization.id))]
  pub async fn save(
    &self,
    organization: &Organization
  ) -> Result<(), StorageError> {
    let value =
      serde_json::to_value(organization)
        .map_err(|error| {
          StorageError::Decode(
            error.to_string()
          )
        })?;
    self.kv.set(&self.key, value).await?;
    debug!("stored selected organization");
    Ok(())
  }

  #[tracing::instrument(skip(self), fields(key = %self.key))]
  pub async fn clear(
    &self
  ) -> Result<(), StorageError> {
    self.kv.remove(&self.key).await?;
    debug!("cleared stored organization");
    Ok(())
  }
}
