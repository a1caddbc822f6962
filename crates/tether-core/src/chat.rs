use chrono::{
  DateTime,
  Utc
};
use serde::Deserialize;
use serde_json::{
  Map,
  Value,
  json
};
use tracing::warn;

use crate::config::ChatSettings;
use crate::organization::Organization;

pub const CHAT_ERROR_REPLY: &str =
  "Sorry, there was an error processing \
   your message.";

/// Everything the chat surface needs for the selected organization.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatLaunch {
  pub organization_id:   String,
  pub organization_name: String,
  pub api_key:           String,
  pub project_id:        String,
  pub config:            Option<Map<String, Value>>,
  pub user_id:           String
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
  Launch,
  Text(String)
}

/// A fully described runtime HTTP call; the popup only has to send it.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractRequest {
  pub url:     String,
  pub headers: Vec<(&'static str, String)>,
  pub body:    Value
}

impl ChatLaunch {
  /// `None` unless the organization is configured.
  pub fn for_organization(
    organization: &Organization,
    user_id: &str
  ) -> Option<Self> {
    if !organization.is_configured() {
      return None;
    }
    let api_key = organization
      .chat_api_key
      .clone()?;
    let project_id = organization
      .chat_project_id
      .clone()?;

    Some(Self {
      organization_id: organization
        .id
        .clone(),
      organization_name: organization
        .name
        .clone(),
      api_key: api_key.trim().to_string(),
      project_id: project_id
        .trim()
        .to_string(),
      config: parse_chat_config(
        organization.chat_config.as_deref()
      ),
      user_id: user_id.to_string()
    })
  }

  pub fn interact_request(
    &self,
    settings: &ChatSettings,
    action: &ChatAction
  ) -> InteractRequest {
    let action = match action {
      | ChatAction::Launch => {
        json!({ "type": "launch" })
      }
      | ChatAction::Text(text) => {
        json!({
          "type": "text",
          "payload": text.trim()
        })
      }
    };

    let mut body = Map::new();
    body.insert("action".to_string(), action);
    if let Some(config) = &self.config {
      body.insert(
        "config".to_string(),
        Value::Object(config.clone())
      );
    }

    InteractRequest {
      url:     format!(
        "{}/state/user/{}/interact",
        settings
          .runtime_url
          .trim_end_matches('/'),
        self.user_id
      ),
      headers: vec![
        (
          "Authorization",
          self.api_key.clone()
        ),
        (
          "vf-project-id",
          self.project_id.clone()
        ),
        (
          "versionID",
          settings.version_id.clone()
        ),
        (
          "Content-Type",
          "application/json".to_string()
        ),
      ],
      body:    Value::Object(body)
    }
  }
}

/// Parses the organization's chat config; anything but a JSON object
/// is logged and ignored.
pub fn parse_chat_config(
  raw: Option<&str>
) -> Option<Map<String, Value>> {
  let raw = raw?.trim();
  if raw.is_empty() {
    return None;
  }
  match serde_json::from_str::<Value>(raw) {
    | Ok(Value::Object(map)) => Some(map),
    | Ok(other) => {
      warn!(
        kind = json_kind(&other),
        "chat config is not a JSON \
         object; ignoring"
      );
      None
    }
    | Err(error) => {
      warn!(
        %error,
        "chat config is not valid JSON; \
         ignoring"
      );
      None
    }
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    | Value::Null => "null",
    | Value::Bool(_) => "bool",
    | Value::Number(_) => "number",
    | Value::String(_) => "string",
    | Value::Array(_) => "array",
    | Value::Object(_) => "object"
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Trace {
  #[serde(rename = "type")]
  pub kind:    String,
  #[serde(default)]
  pub payload: Value
}

/// Assistant messages carried by a runtime response, in order.
pub fn reply_messages(
  traces: &[Trace]
) -> Vec<String> {
  traces
    .iter()
    .filter(|trace| {
      matches!(
        trace.kind.as_str(),
        "text" | "speak"
      )
    })
    .filter_map(|trace| {
      trace
        .payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
    })
    .collect()
}

pub fn parse_traces(
  body: &str
) -> Result<Vec<Trace>, serde_json::Error> {
  serde_json::from_str(body)
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ChatRole {
  User,
  Assistant
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
  pub role:    ChatRole,
  pub content: String,
  pub at:      DateTime<Utc>
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
  messages: Vec<ChatMessage>
}

impl Transcript {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn messages(&self) -> &[ChatMessage] {
    &self.messages
  }

  /// Records the user's message; blank input is ignored and yields
  /// `None`.
  pub fn push_user(
    &mut self,
    text: &str,
    at: DateTime<Utc>
  ) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
      return None;
    }
    self.messages.push(ChatMessage {
      role: ChatRole::User,
      content: text.to_string(),
      at
    });
    Some(text.to_string())
  }

  pub fn push_replies(
    &mut self,
    replies: Vec<String>,
    at: DateTime<Utc>
  ) {
    self.messages.extend(
      replies.into_iter().map(|content| {
        ChatMessage {
          role: ChatRole::Assistant,
          content,
          at
        }
      })
    );
  }

  pub fn push_error(
    &mut self,
    at: DateTime<Utc>
  ) {
    self.messages.push(ChatMessage {
      role: ChatRole::Assistant,
      content: CHAT_ERROR_REPLY
        .to_string(),
      at
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn configured(
    config: Option<&str>
  ) -> Organization {
    Organization {
      id:              "A".to_string(),
      name:            "Acme".to_string(),
      chat_api_key:    Some(
        "VF.DM.key".to_string()
      ),
      chat_project_id: Some(
        "proj-1".to_string()
      ),
      chat_config:     config
        .map(str::to_string)
    }
  }

  #[test]
  fn launch_requires_configuration() {
    let mut org = configured(None);
    org.chat_project_id = None;
    assert!(
      ChatLaunch::for_organization(
        &org, "u-1"
      )
      .is_none()
    );
  }

  #[test]
  fn interact_request_carries_credentials_and_config()
  {
    let launch =
      ChatLaunch::for_organization(
        &configured(Some(
          r#"{"tts": false}"#
        )),
        "u-1"
      )
      .expect("configured");
    let request = launch
      .interact_request(
        &ChatSettings::default(),
        &ChatAction::Text(
          "  hello ".to_string()
        )
      );

    assert_eq!(
      request.url,
      "https://general-runtime.voiceflow.com/state/user/u-1/interact"
    );
    assert!(request.headers.contains(&(
      "Authorization",
      "VF.DM.key".to_string()
    )));
    assert!(request.headers.contains(&(
      "vf-project-id",
      "proj-1".to_string()
    )));
    assert_eq!(
      request.body,
      json!({
        "action": {"type": "text", "payload": "hello"},
        "config": {"tts": false}
      })
    );
  }

  #[test]
  fn invalid_chat_config_is_ignored() {
    assert_eq!(
      parse_chat_config(Some("{oops")),
      None
    );
    assert_eq!(
      parse_chat_config(Some("[1, 2]")),
      None
    );
    assert_eq!(
      parse_chat_config(Some("  ")),
      None
    );

    let launch =
      ChatLaunch::for_organization(
        &configured(Some("{oops")),
        "u-1"
      )
      .expect("still configured");
    let request = launch.interact_request(
      &ChatSettings::default(),
      &ChatAction::Launch
    );
    assert_eq!(
      request.body,
      json!({"action": {"type": "launch"}})
    );
  }

  #[test]
  fn replies_come_from_text_and_speak_traces()
  {
    let traces = parse_traces(
      r#"[
        {"type": "speak", "payload": {"message": "Hi there"}},
        {"type": "choice", "payload": {"buttons": []}},
        {"type": "text", "payload": {"message": "  How can I help?  "}},
        {"type": "text", "payload": {}},
        {"type": "end"}
      ]"#
    )
    .expect("traces");
    assert_eq!(
      reply_messages(&traces),
      vec![
        "Hi there".to_string(),
        "How can I help?".to_string()
      ]
    );
  }

  #[test]
  fn transcript_ignores_blank_input() {
    let now = Utc::now();
    let mut transcript = Transcript::new();
    assert_eq!(
      transcript.push_user("   ", now),
      None
    );
    assert_eq!(
      transcript.push_user(" hi ", now),
      Some("hi".to_string())
    );
    transcript.push_error(now);

    let messages = transcript.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(
      messages[1].content,
      CHAT_ERROR_REPLY
    );
    assert_eq!(
      messages[1].role,
      ChatRole::Assistant
    );
  }
}
