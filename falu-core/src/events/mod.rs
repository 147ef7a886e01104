//! Event types and channel infrastructure for the lookup pipeline.
//!
//! # Event flow
//!
//! 1. An inbound [`AccountLookUpMessage`] arrives on the request channel.
//! 2. The consumer loop feeds it to the `AccountLookUpEventHandler`, which
//!    validates the envelope and dispatches to the aggregate.
//! 3. The aggregate publishes a [`AccountLookUpReply`] on the reply channel
//!    (the handler publishes `OperationFailed` replies itself).
//!
//! Events are self-contained: they carry the identifier tuple rather than
//! references into shared state, so redelivery after a crash is safe.

pub mod channels;
pub mod types;

pub use channels::{
    AccountLookUpMessageReceiver, AccountLookUpMessageSender, DEFAULT_CHANNEL_BUFFER,
    ReplyMessageReceiver, ReplyMessageSender, account_lookup_message_channel, reply_channel,
};

pub use types::{
    ACCOUNT_LOOKUP_REPLY_TOPIC, ACCOUNT_LOOKUP_TOPIC, AccountLookUpEvent, AccountLookUpEventType,
    AccountLookUpMessage, AccountLookUpReply, ReplyMessage,
};
