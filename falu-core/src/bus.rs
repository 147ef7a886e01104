//! Message-bus boundary: the publisher port and the consumer loop.
//!
//! The real transport (broker consumer/producer wiring) lives outside this
//! crate. Here the bus is a pair of bounded channels; swapping in another
//! transport means implementing [`MessagePublisher`] and feeding the
//! consumer loop's receiver from it.

use std::sync::Arc;

use async_trait::async_trait;
use kanau::processor::Processor;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::event_handler::AccountLookUpEventHandler;
use crate::events::{AccountLookUpMessageReceiver, ReplyMessage, ReplyMessageSender};

/// Failure to hand a reply to the outbound transport.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("reply channel closed")]
    ChannelClosed,
}

/// Outbound port for reply events.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: ReplyMessage) -> Result<(), PublishError>;
}

/// Publisher over an in-process reply channel.
pub struct ChannelMessagePublisher {
    sender: ReplyMessageSender,
}

impl ChannelMessagePublisher {
    pub fn new(sender: ReplyMessageSender) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl MessagePublisher for ChannelMessagePublisher {
    async fn publish(&self, message: ReplyMessage) -> Result<(), PublishError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| PublishError::ChannelClosed)
    }
}

/// Drive the event handler with every message arriving on `rx` until
/// shutdown.
///
/// One message is processed at a time; the handler is infallible, so a bad
/// message can never tear the loop down. Returns when the shutdown signal
/// fires or all senders are dropped.
pub async fn run_consumer(
    mut rx: AccountLookUpMessageReceiver,
    handler: Arc<AccountLookUpEventHandler>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("account-lookup consumer started");

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("account-lookup consumer received shutdown signal");
                    break;
                }
            }

            maybe_message = rx.recv() => {
                match maybe_message {
                    Some(message) => {
                        debug!(key = %message.key, topic = %message.topic, "received lookup message");
                        let _ = handler.process(message).await;
                    }
                    None => {
                        info!("account-lookup request channel closed");
                        break;
                    }
                }
            }
        }
    }

    info!("account-lookup consumer stopped");
}
