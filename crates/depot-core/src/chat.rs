//! Conversation turns exchanged with the chat widget and the completion
//! provider.

use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
///
/// Incoming roles are translated leniently: `"user"` stays a user turn and
/// every other value becomes an assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ChatRole {
  User,
  Assistant,
}

impl From<String> for ChatRole {
  fn from(role: String) -> Self { Self::from(role.as_str()) }
}

impl From<&str> for ChatRole {
  fn from(role: &str) -> Self {
    if role == "user" { Self::User } else { Self::Assistant }
  }
}

/// One turn of the widget's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
  pub role: ChatRole,
  #[serde(alias = "content")]
  pub text: String,
}

impl ChatTurn {
  pub fn user(text: impl Into<String>) -> Self {
    Self { role: ChatRole::User, text: text.into() }
  }

  pub fn assistant(text: impl Into<String>) -> Self {
    Self { role: ChatRole::Assistant, text: text.into() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_roles_become_assistant() {
    let turns: Vec<ChatTurn> = serde_json::from_str(
      r#"[
        {"role": "user", "text": "привет"},
        {"role": "assistant", "text": "здравствуйте"},
        {"role": "bot", "text": "ещё"},
        {"role": "model", "content": "через content"}
      ]"#,
    )
    .unwrap();

    let roles: Vec<_> = turns.iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![
      ChatRole::User,
      ChatRole::Assistant,
      ChatRole::Assistant,
      ChatRole::Assistant,
    ]);
    assert_eq!(turns[3].text, "через content");
  }

  #[test]
  fn roles_serialise_lowercase() {
    let json = serde_json::to_string(&ChatTurn::assistant("ok")).unwrap();
    assert_eq!(json, r#"{"role":"assistant","text":"ok"}"#);
  }
}
