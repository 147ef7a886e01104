pub mod association;
pub mod oracle;
pub mod party;

pub use association::Association;
pub use oracle::{Oracle, OracleType};
pub use party::ParticipantLookup;
