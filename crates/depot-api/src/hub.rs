//! In-process fan-out of newly posted order messages.
//!
//! Every message written through the API is published here; long-poll
//! requests subscribe before reading the store so nothing posted in between
//! is missed.

use depot_core::market::Message;
use tokio::sync::broadcast;

/// Messages buffered per subscriber before it starts lagging.
const CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct MessageHub {
  tx: broadcast::Sender<Message>,
}

impl MessageHub {
  pub fn new() -> Self {
    let (tx, _) = broadcast::channel(CAPACITY);
    Self { tx }
  }

  /// Deliver `message` to current subscribers. Nobody listening is fine.
  pub fn publish(&self, message: Message) {
    let delivered = self.tx.send(message).unwrap_or(0);
    tracing::trace!(delivered, "published order message");
  }

  pub fn subscribe(&self) -> broadcast::Receiver<Message> { self.tx.subscribe() }
}

impl Default for MessageHub {
  fn default() -> Self { Self::new() }
}
