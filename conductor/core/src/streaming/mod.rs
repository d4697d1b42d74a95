//! Response Streaming
//!
//! Relays generated fragments to the display surface while collecting the
//! final reply.
//!
//! ```text
//!   backend ──StreamingToken──▶ stream_response ──fragment──▶ FragmentSink
//!                                     │                       (surface)
//!                                     ▼
//!                            trimmed final text
//! ```
//!
//! Fragments are forwarded one at a time, in arrival order, with no
//! buffering. The call returns only when the backend signals completion or
//! the stream ends; there is no timeout and no cancellation.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::backend::StreamingToken;
use crate::error::ChatError;
use crate::messages::{ConductorMessage, MessageId};

/// Receives fragments as they are produced
#[async_trait]
pub trait FragmentSink: Send {
    /// Render one fragment
    async fn on_fragment(&mut self, fragment: &str);
}

/// Collects fragments in memory
#[async_trait]
impl FragmentSink for Vec<String> {
    async fn on_fragment(&mut self, fragment: &str) {
        self.push(fragment.to_string());
    }
}

/// Forwards fragments to a surface as [`ConductorMessage::Token`]
pub struct ChannelSink {
    tx: mpsc::Sender<ConductorMessage>,
    message_id: MessageId,
    delivered: usize,
}

impl ChannelSink {
    /// Sink tagging every fragment with `message_id`
    pub fn new(tx: mpsc::Sender<ConductorMessage>, message_id: MessageId) -> Self {
        Self {
            tx,
            message_id,
            delivered: 0,
        }
    }

    /// Fragments delivered so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

#[async_trait]
impl FragmentSink for ChannelSink {
    async fn on_fragment(&mut self, fragment: &str) {
        let message = ConductorMessage::Token {
            message_id: self.message_id.clone(),
            text: fragment.to_string(),
        };
        if self.tx.send(message).await.is_ok() {
            self.delivered += 1;
        } else {
            tracing::trace!("Surface gone, dropping fragment");
        }
    }
}

/// Stream a response into `sink`, returning the trimmed concatenation
///
/// Text from a `Complete` item is not re-sent; it only repeats fragments
/// already delivered. An `Error` item ends the stream with
/// [`ChatError::Generation`] carrying whatever arrived before it.
pub async fn stream_response<S, K>(mut fragments: S, sink: &mut K) -> Result<String, ChatError>
where
    S: Stream<Item = StreamingToken> + Unpin + Send,
    K: FragmentSink + ?Sized,
{
    let mut response = String::new();
    let mut count = 0usize;

    while let Some(token) = fragments.next().await {
        match token {
            StreamingToken::Token(text) => {
                count += 1;
                sink.on_fragment(&text).await;
                response.push_str(&text);
            }
            StreamingToken::Complete { .. } => break,
            StreamingToken::Error(reason) => {
                tracing::warn!(fragments = count, error = %reason, "Generation stream failed");
                return Err(ChatError::Generation {
                    reason,
                    partial: response.trim().to_string(),
                });
            }
        }
    }

    tracing::debug!(fragments = count, bytes = response.len(), "Generation stream finished");
    Ok(response.trim().to_string())
}
