//! Event channel factories and handles.
//!
//! The message-bus transport itself is an external collaborator; inside the
//! process it is represented by bounded mpsc channels, so the consumer loop
//! and the publisher can be wired to any transport at the edges.

use super::types::{AccountLookUpMessage, ReplyMessage};
use tokio::sync::mpsc;

/// Default buffer size for event channels.
///
/// Enough to absorb bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for inbound lookup request messages.
pub type AccountLookUpMessageSender = mpsc::Sender<AccountLookUpMessage>;
/// Receiver handle for inbound lookup request messages.
pub type AccountLookUpMessageReceiver = mpsc::Receiver<AccountLookUpMessage>;

/// Sender handle for outbound reply messages.
pub type ReplyMessageSender = mpsc::Sender<ReplyMessage>;
/// Receiver handle for outbound reply messages.
pub type ReplyMessageReceiver = mpsc::Receiver<ReplyMessage>;

/// Create a new inbound request channel.
///
/// Multiple senders can be cloned from the returned sender; the single
/// receiver feeds the consumer loop.
pub fn account_lookup_message_channel()
-> (AccountLookUpMessageSender, AccountLookUpMessageReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new reply channel.
pub fn reply_channel() -> (ReplyMessageSender, ReplyMessageReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
