//! Paragraph-boundary text chunker.
//!
//! Paragraphs (separated by a blank line) are packed into chunks of at most
//! `max_chars` characters. A paragraph longer than that on its own is cut at
//! the last whitespace before the limit, or at the limit itself when there
//! is none. Lengths count characters, not bytes, so Cyrillic text gets the
//! same budget as Latin.

/// Split `text` into chunks of at most `max_chars` characters. Blank input
/// yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
  let max_chars = max_chars.max(1);
  let mut chunks = Vec::new();
  let mut buf = String::new();
  let mut buf_chars = 0;

  for para in text.split("\n\n") {
    let para = para.trim();
    if para.is_empty() {
      continue;
    }
    let para_chars = para.chars().count();

    if buf_chars > 0 && buf_chars + 2 + para_chars > max_chars {
      chunks.push(std::mem::take(&mut buf));
      buf_chars = 0;
    }

    if para_chars > max_chars {
      chunks.extend(split_long(para, max_chars).into_iter().map(str::to_owned));
      continue;
    }

    if buf_chars > 0 {
      buf.push_str("\n\n");
      buf_chars += 2;
    }
    buf.push_str(para);
    buf_chars += para_chars;
  }

  if buf_chars > 0 {
    chunks.push(buf);
  }
  chunks
}

/// Hard-split one oversized paragraph.
fn split_long(paragraph: &str, max_chars: usize) -> Vec<&str> {
  let mut pieces = Vec::new();
  let mut rest = paragraph;

  while rest.chars().count() > max_chars {
    // Byte offset of the first character past the limit.
    let limit = rest
      .char_indices()
      .nth(max_chars)
      .map_or(rest.len(), |(i, _)| i);
    let cut = rest[..limit]
      .rfind(char::is_whitespace)
      .filter(|&i| i > 0)
      .unwrap_or(limit);

    let piece = rest[..cut].trim_end();
    if !piece.is_empty() {
      pieces.push(piece);
    }
    rest = rest[cut..].trim_start();
  }

  if !rest.is_empty() {
    pieces.push(rest);
  }
  pieces
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_text_is_one_chunk() {
    assert_eq!(chunk_text("Привет, мир!", 1000), vec!["Привет, мир!"]);
  }

  #[test]
  fn blank_text_has_no_chunks() {
    assert!(chunk_text("", 1000).is_empty());
    assert!(chunk_text("\n\n  \n\n", 1000).is_empty());
  }

  #[test]
  fn paragraphs_are_packed_until_full() {
    let text = "aaaa\n\nbbbb\n\ncccc";
    assert_eq!(chunk_text(text, 10), vec!["aaaa\n\nbbbb", "cccc"]);
    assert_eq!(chunk_text(text, 16), vec![text]);
  }

  #[test]
  fn long_paragraph_splits_on_whitespace() {
    let chunks = chunk_text("один два три четыре", 9);
    assert_eq!(chunks, vec!["один два", "три", "четыре"]);
    assert!(chunks.iter().all(|c| c.chars().count() <= 9));
  }

  #[test]
  fn unbroken_run_splits_at_the_limit() {
    let word = "я".repeat(25);
    let chunks = chunk_text(&word, 10);
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].chars().count(), 10);
    assert_eq!(chunks[2].chars().count(), 5);
  }

  #[test]
  fn buffer_is_flushed_before_an_oversized_paragraph() {
    let text = format!("вступление\n\n{}", "слово ".repeat(5).trim());
    let chunks = chunk_text(&text, 12);
    assert_eq!(chunks[0], "вступление");
    assert!(chunks[1..].iter().all(|c| c.starts_with("слово")));
  }

  #[test]
  fn chunks_never_exceed_the_limit() {
    let text = "Фулфилмент включает приёмку, хранение, упаковку и отгрузку товара. "
      .repeat(40);
    for chunk in chunk_text(&text, 1000) {
      assert!(chunk.chars().count() <= 1000);
    }
  }
}
