//! Provider strategy hooks that customize token exchanges.
//!
//! Implementations decorate outgoing token requests and describe provider error payloads
//! without tying the exchange client to any particular HTTP client.

// self
use crate::_prelude::*;

/// Strategy hook that allows providers to decorate requests and describe errors.
///
/// Implementors are required to be `Send + Sync`, and the hooks use crate-owned data types
/// so downstream crates never depend on reqwest-specific structures. Override only what you
/// need; `augment_token_request` has a default no-op implementation.
pub trait ProviderStrategy: Send + Sync {
	/// Turns a non-success token response into an error code + description pair.
	fn describe_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorDetails;

	/// Gives providers a chance to add custom body fields before dispatching.
	///
	/// The map already holds `grant_type`, `code`, and `redirect_uri`. Implementations work on
	/// a plain `BTreeMap` so they remain HTTP client agnostic.
	fn augment_token_request(&self, _body: &mut BTreeMap<String, String>) {}
}

/// Error code + description surfaced through
/// [`ExchangeError::ProviderRejected`](crate::error::ExchangeError::ProviderRejected).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorDetails {
	/// Machine-readable error code.
	pub code: String,
	/// Human-readable description.
	pub description: String,
}

/// Context passed to provider strategies when describing token errors.
///
/// The struct keeps only primitive data (status code, well-known error fields, body
/// preview) so strategies stay decoupled from any HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// HTTP status code returned by the provider.
	pub http_status: u16,
	/// RFC 6749 `error` field.
	pub oauth_error: Option<String>,
	/// RFC 6749 `error_description` field.
	pub error_description: Option<String>,
	/// Non-standard `code` field (Notion API style errors).
	pub provider_code: Option<String>,
	/// Non-standard `message` field.
	pub message: Option<String>,
	/// Preview of the response body.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context for the provided status.
	pub fn new(http_status: u16) -> Self {
		Self {
			http_status,
			oauth_error: None,
			error_description: None,
			provider_code: None,
			message: None,
			body_preview: None,
		}
	}

	/// Populates the well-known fields from a parsed JSON error body.
	pub fn from_payload(http_status: u16, payload: &Value) -> Self {
		let field = |key: &str| {
			payload.get(key).and_then(Value::as_str).filter(|v| !v.is_empty()).map(str::to_owned)
		};

		Self {
			http_status,
			oauth_error: field("error"),
			error_description: field("error_description"),
			provider_code: field("code"),
			message: field("message"),
			body_preview: Some(truncate_preview(payload.to_string())),
		}
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a body preview.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Default strategy: prefers the RFC 6749 `error`/`error_description` fields, then the
/// `code`/`message` pair used by Notion's API errors, and finally generic values derived
/// from the HTTP status.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn describe_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorDetails {
		let code = ctx
			.oauth_error
			.clone()
			.or_else(|| ctx.provider_code.clone())
			.unwrap_or_else(|| generic_code(ctx.http_status).to_owned());
		let description = ctx
			.error_description
			.clone()
			.or_else(|| ctx.message.clone())
			.unwrap_or_else(|| format!("Token endpoint returned HTTP {}.", ctx.http_status));

		ProviderErrorDetails { code, description }
	}
}

fn generic_code(status: u16) -> &'static str {
	match status {
		401 => "unauthorized",
		403 => "forbidden",
		429 => "rate_limited",
		code if code >= 500 => "server_error",
		_ => "provider_error",
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= ProviderErrorContext::BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn prefers_oauth_fields_then_notion_fields() {
		let strategy = DefaultProviderStrategy;
		let payload = serde_json::json!({
			"error": "invalid_grant",
			"error_description": "code expired",
			"code": "ignored",
		});
		let details = strategy.describe_token_error(&ProviderErrorContext::from_payload(400, &payload));

		assert_eq!(details.code, "invalid_grant");
		assert_eq!(details.description, "code expired");

		let payload = serde_json::json!({
			"object": "error",
			"status": 401,
			"code": "unauthorized",
			"message": "API token is invalid.",
		});
		let details = strategy.describe_token_error(&ProviderErrorContext::from_payload(401, &payload));

		assert_eq!(details.code, "unauthorized");
		assert_eq!(details.description, "API token is invalid.");
	}

	#[test]
	fn falls_back_to_status_derived_values() {
		let details = DefaultProviderStrategy
			.describe_token_error(&ProviderErrorContext::from_payload(503, &Value::Null));

		assert_eq!(details.code, "server_error");
		assert_eq!(details.description, "Token endpoint returned HTTP 503.");
		assert_eq!(
			DefaultProviderStrategy.describe_token_error(&ProviderErrorContext::new(404)).code,
			"provider_error"
		);
	}

	#[test]
	fn body_preview_is_truncated() {
		let ctx = ProviderErrorContext::new(500).with_body_preview("x".repeat(300));
		let preview = ctx.body_preview.expect("Preview should be recorded.");

		assert_eq!(preview.chars().count(), ProviderErrorContext::BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}
}
