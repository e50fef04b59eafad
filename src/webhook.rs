//! Inbound webhook authentication.
//!
//! Providers sign `"{message_id}.{timestamp}.{body}"` with HMAC-SHA256 and send one or more
//! `version,hex_signature` tokens in a header. [`WebhookVerifier`] recomputes the digest,
//! compares every candidate in constant time, and rejects timestamps outside a configurable
//! replay window.

/// Wire envelope and header extraction.
pub mod envelope;
/// Typed payloads carried by verified webhooks.
pub mod event;
/// Signature header parsing.
pub mod signature;
/// HMAC verification and signing.
pub mod verifier;

pub use envelope::*;
pub use event::*;
pub use signature::*;
pub use verifier::*;
