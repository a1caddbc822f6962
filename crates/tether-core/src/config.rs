use anyhow::{
  Context,
  bail
};
use serde::Deserialize;
use tracing::debug;

use crate::persistence::DEFAULT_SELECTION_KEY;

pub const DEFAULT_RUNTIME_URL: &str =
  "https://general-runtime.voiceflow.com";
pub const DEFAULT_VERSION_ID: &str =
  "production";
pub const DEFAULT_SESSION_KEY: &str =
  "supabaseSession";

/// Popup settings, read from the TOML file bundled with the extension.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PopupConfig {
  pub auth:    AuthSettings,
  #[serde(default)]
  pub chat:    ChatSettings,
  #[serde(default)]
  pub storage: StorageSettings
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AuthSettings {
  pub url:      String,
  pub anon_key: String
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatSettings {
  #[serde(default = "default_runtime_url")]
  pub runtime_url: String,
  #[serde(default = "default_version_id")]
  pub version_id:  String
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageSettings {
  #[serde(default = "default_selection_key")]
  pub selection_key: String,
  #[serde(default = "default_session_key")]
  pub session_key:   String
}

impl Default for ChatSettings {
  fn default() -> Self {
    Self {
      runtime_url: default_runtime_url(),
      version_id:  default_version_id()
    }
  }
}

impl Default for StorageSettings {
  fn default() -> Self {
    Self {
      selection_key:
        default_selection_key(),
      session_key: default_session_key()
    }
  }
}

fn default_runtime_url() -> String {
  DEFAULT_RUNTIME_URL.to_string()
}

fn default_version_id() -> String {
  DEFAULT_VERSION_ID.to_string()
}

fn default_selection_key() -> String {
  DEFAULT_SELECTION_KEY.to_string()
}

fn default_session_key() -> String {
  DEFAULT_SESSION_KEY.to_string()
}

impl PopupConfig {
  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let cfg: PopupConfig =
      toml::from_str(text).context(
        "failed to parse popup config"
      )?;
    cfg.validate()?;
    debug!(
      auth_url = %cfg.auth.url,
      runtime_url = %cfg.chat.runtime_url,
      "loaded popup config"
    );
    Ok(cfg)
  }

  fn validate(&self) -> anyhow::Result<()> {
    require_http_url(
      "auth.url",
      &self.auth.url
    )?;
    require_http_url(
      "chat.runtime_url",
      &self.chat.runtime_url
    )?;
    if self.auth.anon_key.trim().is_empty()
    {
      bail!(
        "auth.anon_key must not be empty"
      );
    }
    if self
      .storage
      .selection_key
      .trim()
      .is_empty()
      || self
        .storage
        .session_key
        .trim()
        .is_empty()
    {
      bail!(
        "storage keys must not be empty"
      );
    }
    if self.storage.selection_key
      == self.storage.session_key
    {
      bail!(
        "storage.selection_key and \
         storage.session_key must differ"
      );
    }
    Ok(())
  }

  /// `{auth.url}/auth/v1/{path}`
  pub fn auth_endpoint(
    &self,
    path: &str
  ) -> String {
    join_url(
      &self.auth.url,
      "auth/v1",
      path
    )
  }

  /// `{auth.url}/rest/v1/{path}`
  pub fn rest_endpoint(
    &self,
    path: &str
  ) -> String {
    join_url(
      &self.auth.url,
      "rest/v1",
      path
    )
  }
}

fn require_http_url(
  field: &str,
  value: &str
) -> anyhow::Result<()> {
  let value = value.trim();
  if value.starts_with("https://")
    || value.starts_with("http://")
  {
    Ok(())
  } else {
    bail!(
      "{field} must be an http(s) URL, \
       got {value:?}"
    )
  }
}

fn join_url(
  base: &str,
  prefix: &str,
  path: &str
) -> String {
  format!(
    "{}/{}/{}",
    base.trim().trim_end_matches('/'),
    prefix,
    path.trim_start_matches('/')
  )
}
