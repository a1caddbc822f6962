use serde::{
  Deserialize,
  Serialize
};

/// Tenant carrying the chat integration credentials.
///
/// This is also the shape persisted as the selected organization.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Organization {
  pub id:              String,
  pub name:            String,
  #[serde(default)]
  pub chat_api_key:    Option<String>,
  #[serde(default)]
  pub chat_project_id: Option<String>,
  /// Serialized JSON object merged into the chat request config.
  #[serde(default)]
  pub chat_config:     Option<String>
}

impl Organization {
  /// Both chat credentials are present and non-blank.
  pub fn is_configured(&self) -> bool {
    has_value(&self.chat_api_key)
      && has_value(
        &self.chat_project_id
      )
  }
}

fn has_value(
  value: &Option<String>
) -> bool {
  value
    .as_deref()
    .is_some_and(|raw| {
      !raw.trim().is_empty()
    })
}

pub fn contains_id(
  organizations: &[Organization],
  id: &str
) -> bool {
  organizations
    .iter()
    .any(|organization| {
      organization.id == id
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn org(
    key: Option<&str>,
    project: Option<&str>
  ) -> Organization {
    Organization {
      id:              "org".to_string(),
      name:            "Org".to_string(),
      chat_api_key:    key
        .map(str::to_string),
      chat_project_id: project
        .map(str::to_string),
      chat_config:     None
    }
  }

  #[test]
  fn configured_requires_both_credentials()
  {
    assert!(
      org(Some("k"), Some("p"))
        .is_configured()
    );
    assert!(
      !org(None, Some("p"))
        .is_configured()
    );
    assert!(
      !org(Some("k"), None)
        .is_configured()
    );
    assert!(
      !org(Some(""), Some("p"))
        .is_configured()
    );
    assert!(
      !org(Some("k"), Some("   "))
        .is_configured()
    );
  }

  #[test]
  fn stored_selection_without_chat_fields_still_decodes()
  {
    let parsed: Organization =
      serde_json::from_str(
        r#"{"id":"A","name":"Acme"}"#
      )
      .expect("decode");
    assert_eq!(parsed.id, "A");
    assert!(!parsed.is_configured());
  }
}
