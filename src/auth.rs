//! Identity primitives shared by the webhook, exchange, and persistence layers.

pub mod id;
pub mod secret;

pub use id::*;
pub use secret::*;
