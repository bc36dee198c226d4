//! Token kinds, the access/refresh pair, and the redacting secret wrapper.

pub mod kind;
pub mod pair;
pub mod secret;
