//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! endpoints, client authentication preferences, token request encoding, required headers,
//! and extra authorize parameters. `strategy` defines [`ProviderStrategy`], an
//! HTTP-client-agnostic hook used to decorate token requests and to turn provider error
//! payloads into an error code + description pair.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
