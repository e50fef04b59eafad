//! Authorization-code exchange against a provider token endpoint.
//!
//! [`TokenExchangeClient`] validates a [`TokenExchangeRequest`] locally, issues exactly one
//! POST to the descriptor's token endpoint, and classifies the outcome into a
//! [`TokenExchangeResult`]. Nothing is retried: authorization codes are single use, so a
//! second attempt with the same code would be rejected by the provider anyway.
//! [`AuthorizationSession`] covers the redirect leg that precedes the exchange.

pub mod client;
pub mod request;
pub mod result;
pub mod session;

pub use client::*;
pub use request::*;
pub use result::*;
pub use session::*;
