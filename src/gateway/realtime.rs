use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::Message;

/// Live message subscription for one chat.
///
/// A feed owns a forwarding task and the receiving end of a channel;
/// `recv().await` yields messages as they arrive. Dropping the feed (or
/// calling `unsubscribe`) stops the forwarder, so events arriving after a
/// screen tears down are discarded instead of acting on disposed state.
pub struct MessageFeed {
    rx: mpsc::UnboundedReceiver<Message>,
    forwarder: JoinHandle<()>,
}

impl MessageFeed {
    pub fn new(rx: mpsc::UnboundedReceiver<Message>, forwarder: JoinHandle<()>) -> Self {
        Self { rx, forwarder }
    }

    /// Build a feed from a broadcast stream carrying messages for all chats,
    /// keeping only those addressed to `chat_id`. Lagged gaps are skipped.
    pub fn from_broadcast(mut events: broadcast::Receiver<Message>, chat_id: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let forwarder = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(message) => {
                        if message.chat_id == chat_id && tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Message feed for chat {} lagged by {}", chat_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self::new(rx, forwarder)
    }

    /// Next message, or `None` once the subscription has ended
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Tear the subscription down explicitly
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for MessageFeed {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}
