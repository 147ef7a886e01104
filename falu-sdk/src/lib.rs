//! Shared types for the Falu account-lookup service.
//!
//! `objects` holds the wire-level data model (party identifiers, oracle
//! descriptors, associations) used by both the service and its clients.
//! The HTTP client lives behind the `client` cargo feature so type-only
//! consumers do not pull in `reqwest`.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;
