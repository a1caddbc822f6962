use thiserror::Error;

use crate::organization::Organization;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickError {
  #[error("Please select an organization")]
  NothingSelected,
  #[error(
    "Selected organization does not have \
     chat configured"
  )]
  NotConfigured
}

/// Organization list as shown by the picker: configured entries can be
/// chosen, unconfigured ones are listed but disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationPicker {
  pub configured:   Vec<Organization>,
  pub unconfigured: Vec<Organization>
}

impl OrganizationPicker {
  pub fn new(
    organizations: &[Organization]
  ) -> Self {
    let (configured, unconfigured) =
      organizations
        .iter()
        .cloned()
        .partition(
          Organization::is_configured
        );
    Self {
      configured,
      unconfigured
    }
  }

  pub fn is_empty(&self) -> bool {
    self.configured.is_empty()
      && self.unconfigured.is_empty()
  }

  /// Group headings only make sense when both groups are present.
  pub fn show_group_labels(&self) -> bool {
    !self.configured.is_empty()
      && !self.unconfigured.is_empty()
  }

  pub fn status_line(&self) -> String {
    match self.configured.len() {
      | _ if self.is_empty() => {
        "No organizations found. Please \
         contact your administrator."
          .to_string()
      }
      | 0 => {
        "No configured organizations \
         available. Please contact your \
         administrator."
          .to_string()
      }
      | 1 => {
        "1 organization available"
          .to_string()
      }
      | count => {
        format!(
          "{count} organizations \
           available"
        )
      }
    }
  }

  pub fn choose(
    &self,
    id: &str
  ) -> Result<Organization, PickError> {
    if let Some(organization) = self
      .configured
      .iter()
      .find(|org| org.id == id)
    {
      return Ok(organization.clone());
    }
    if self
      .unconfigured
      .iter()
      .any(|org| org.id == id)
    {
      return Err(PickError::NotConfigured);
    }
    Err(PickError::NothingSelected)
  }
}
