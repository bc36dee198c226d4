//! Auth-domain token models and claims decoding.

pub mod claims;
pub mod token;

pub use claims::*;
pub use token::{kind::*, pair::*, secret::*};
