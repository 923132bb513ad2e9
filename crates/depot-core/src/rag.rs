//! Prompt assembly for retrieval-augmented chat.

use crate::{
  chat::ChatTurn,
  document::MatchedPassage,
  llm::CompletionRequest,
};

/// Minimum similarity for a passage to count as a match.
pub const MATCH_THRESHOLD: f32 = 0.25;

/// Maximum number of passages injected into the prompt.
pub const MATCH_COUNT: usize = 5;

/// Placed between passages in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Included in every system prompt, whether or not any context was found.
pub const REFUSAL_INSTRUCTION: &str = "Если в контексте нет ответа на вопрос, \
  честно скажи, что у тебя нет информации по этому вопросу, и ничего не \
  придумывай.";

const ASSISTANT_INSTRUCTIONS: &str = "Ты — ассистент службы поддержки \
  фулфилмент-сервиса. Отвечай на вопросы клиентов вежливо и по делу, \
  опираясь только на приведённый ниже контекст из базы знаний.";

/// Join passage contents in search order. Empty when nothing matched.
pub fn assemble_context(passages: &[MatchedPassage]) -> String {
  passages
    .iter()
    .map(|m| m.passage.content.as_str())
    .collect::<Vec<_>>()
    .join(CONTEXT_SEPARATOR)
}

/// The system turn: instructions, the refusal rule, then the context block.
pub fn system_prompt(context: &str) -> String {
  format!("{ASSISTANT_INSTRUCTIONS}\n{REFUSAL_INSTRUCTION}\n\nКонтекст:\n{context}")
}

/// Build the completion request for `message` given prior `history` and the
/// retrieved passages.
pub fn build_request(
  passages: &[MatchedPassage],
  history: Vec<ChatTurn>,
  message: &str,
) -> CompletionRequest {
  let context = assemble_context(passages);
  let mut turns = history;
  turns.push(ChatTurn::user(message));
  CompletionRequest { system: system_prompt(&context), turns }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::document::{Passage, PassageMetadata};

  fn matched(content: &str, similarity: f32) -> MatchedPassage {
    MatchedPassage {
      passage: Passage {
        passage_id:   Uuid::new_v4(),
        content:      content.into(),
        metadata:     PassageMetadata::default(),
        content_hash: String::new(),
        created_at:   Utc::now(),
      },
      similarity,
    }
  }

  #[test]
  fn context_joins_in_search_order() {
    let passages = [matched("первый", 0.9), matched("второй", 0.5), matched("третий", 0.3)];
    assert_eq!(
      assemble_context(&passages),
      "первый\n\n---\n\nвторой\n\n---\n\nтретий"
    );
  }

  #[test]
  fn single_passage_has_no_separator() {
    assert_eq!(assemble_context(&[matched("только один", 0.4)]), "только один");
  }

  #[test]
  fn empty_context_keeps_refusal_instruction() {
    let context = assemble_context(&[]);
    assert_eq!(context, "");
    let prompt = system_prompt(&context);
    assert!(prompt.contains(REFUSAL_INSTRUCTION));
    assert!(prompt.ends_with("Контекст:\n"));
  }

  #[test]
  fn request_appends_message_after_history() {
    let history = vec![ChatTurn::user("Здравствуйте"), ChatTurn::assistant("Добрый день!")];
    let request = build_request(&[matched("Приемка: 15 рублей", 0.8)], history, "Сколько стоит?");

    assert!(request.system.contains("Приемка: 15 рублей"));
    assert_eq!(request.turns.len(), 3);
    assert_eq!(request.turns[2], ChatTurn::user("Сколько стоит?"));
  }
}
