use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;
use crate::organization::Organization;

/// Columns requested from the membership table, with the joined
/// organization configuration.
pub const MEMBERSHIP_SELECT: &str =
  "is_active,organizations(id,name,\
   voiceflow_api_key,\
   voiceflow_project_id,\
   voiceflow_config,is_active)";

/// Lookup of the organizations a user belongs to.
#[async_trait(?Send)]
pub trait OrganizationDirectory {
  async fn memberships(
    &self,
    user_id: &str
  ) -> Result<Vec<MembershipRow>, FetchError>;
}

#[derive(
  Debug, Clone, Deserialize, PartialEq,
)]
pub struct MembershipRow {
  #[serde(default)]
  pub is_active:     Option<bool>,
  #[serde(default)]
  pub organizations: Option<OrganizationRow>
}

#[derive(
  Debug, Clone, Deserialize, PartialEq,
)]
pub struct OrganizationRow {
  pub id:              String,
  pub name:            String,
  #[serde(
    default,
    rename = "voiceflow_api_key",
    alias = "chat_api_key"
  )]
  pub chat_api_key:    Option<String>,
  #[serde(
    default,
    rename = "voiceflow_project_id",
    alias = "chat_project_id"
  )]
  pub chat_project_id: Option<String>,
  #[serde(
    default,
    rename = "voiceflow_config",
    alias = "chat_config"
  )]
  pub chat_config:     Option<String>,
  #[serde(default)]
  pub is_active:       Option<bool>
}

impl From<OrganizationRow> for Organization {
  fn from(row: OrganizationRow) -> Self {
    Organization {
      id:              row.id,
      name:            row.name,
      chat_api_key:    row.chat_api_key,
      chat_project_id: row
        .chat_project_id,
      chat_config:     row.chat_config
    }
  }
}

/// PostgREST path (relative to `/rest/v1/`) listing the memberships of
/// `user_id`.
pub fn membership_query_path(
  user_id: &str
) -> String {
  format!(
    "organization_members?select=\
     {MEMBERSHIP_SELECT}&user_id=eq.\
     {user_id}"
  )
}

/// Flattens membership rows into the organizations they grant.
///
/// Rows without a joined organization, inactive memberships and inactive
/// organizations are dropped; duplicates keep their first occurrence.
pub fn organizations_from_rows(
  rows: Vec<MembershipRow>
) -> Vec<Organization> {
  let total = rows.len();
  let mut seen = BTreeSet::new();
  let organizations: Vec<Organization> =
    rows
      .into_iter()
      .filter(|row| {
        row.is_active != Some(false)
      })
      .filter_map(|row| row.organizations)
      .filter(|org| {
        org.is_active != Some(false)
      })
      .filter(|org| {
        seen.insert(org.id.clone())
      })
      .map(Organization::from)
      .collect();

  debug!(
    rows = total,
    organizations = organizations.len(),
    "flattened membership rows"
  );
  organizations
}

/// Maps a non-success membership response; a refused token is told
/// apart so the caller can end the session.
pub fn status_error(
  status: u16,
  body: &str
) -> FetchError {
  if matches!(status, 401 | 403) {
    return FetchError::Unauthorized;
  }
  FetchError::Status {
    status,
    message: body.trim().to_string()
  }
}

/// Decodes a PostgREST membership response body.
pub fn parse_membership_rows(
  body: &str
) -> Result<Vec<MembershipRow>, FetchError>
{
  serde_json::from_str(body).map_err(
    |error| {
      FetchError::Decode(
        error.to_string()
      )
    }
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flattens_and_filters_rows() {
    let body = r#"[
      {"is_active": true, "organizations": {"id": "A", "name": "Acme", "voiceflow_api_key": "k", "voiceflow_project_id": "p", "voiceflow_config": null, "is_active": true}},
      {"is_active": true, "organizations": null},
      {"is_active": false, "organizations": {"id": "B", "name": "Beta"}},
      {"organizations": {"id": "C", "name": "Gamma", "is_active": false}},
      {"organizations": {"id": "A", "name": "Acme duplicate"}},
      {"organizations": {"id": "D", "name": "Delta"}}
    ]"#;

    let rows = parse_membership_rows(body)
      .expect("rows");
    let organizations =
      organizations_from_rows(rows);
    let ids: Vec<&str> = organizations
      .iter()
      .map(|org| org.id.as_str())
      .collect();

    assert_eq!(ids, vec!["A", "D"]);
    assert!(organizations[0].is_configured());
    assert_eq!(
      organizations[0].name,
      "Acme"
    );
    assert!(
      !organizations[1].is_configured()
    );
  }

  #[test]
  fn refused_token_is_unauthorized() {
    assert_eq!(
      status_error(401, "{}"),
      FetchError::Unauthorized
    );
    assert_eq!(
      status_error(403, ""),
      FetchError::Unauthorized
    );
    assert_eq!(
      status_error(503, " busy \n"),
      FetchError::Status {
        status:  503,
        message: "busy".to_string()
      }
    );
  }

  #[test]
  fn garbage_body_is_a_decode_error() {
    assert!(matches!(
      parse_membership_rows("<html>"),
      Err(FetchError::Decode(_))
    ));
  }

  #[test]
  fn query_path_filters_by_user() {
    let path =
      membership_query_path("u-1");
    assert!(path.starts_with(
      "organization_members?select="
    ));
    assert!(
      path.ends_with("&user_id=eq.u-1")
    );
    assert!(
      path.contains("voiceflow_api_key")
    );
  }
}
