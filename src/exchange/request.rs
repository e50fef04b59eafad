//! Inputs accepted by the token exchange client.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ExchangeError};

/// Parameters of one authorization-code exchange.
///
/// `redirect_uri` is kept as the exact text presented to the authorization endpoint;
/// providers compare it byte-for-byte, so it is never normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenExchangeRequest {
	/// Single-use code returned on the redirect.
	pub authorization_code: String,
	/// Redirect URI used when the code was issued.
	pub redirect_uri: String,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
}
impl TokenExchangeRequest {
	/// Creates a request from its four parts.
	pub fn new(
		authorization_code: impl Into<String>,
		redirect_uri: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
	) -> Self {
		Self {
			authorization_code: authorization_code.into(),
			redirect_uri: redirect_uri.into(),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
		}
	}

	/// Checks that every field is present and, when a registered redirect URI is known, that
	/// the request repeats it exactly.
	pub fn validate(&self, registered_redirect_uri: Option<&str>) -> Result<(), ExchangeError> {
		require("authorization_code", &self.authorization_code)?;
		require("redirect_uri", &self.redirect_uri)?;
		require("client_id", &self.client_id)?;

		if self.client_secret.is_blank() {
			return Err(ExchangeError::invalid_request("client_secret is empty"));
		}
		if registered_redirect_uri.is_some_and(|registered| registered != self.redirect_uri) {
			return Err(ExchangeError::invalid_request(
				"redirect_uri does not match the registered redirect URI",
			));
		}

		Ok(())
	}
}

fn require(field: &str, value: &str) -> Result<(), ExchangeError> {
	if value.trim().is_empty() {
		Err(ExchangeError::invalid_request(format!("{field} is empty")))
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn request() -> TokenExchangeRequest {
		TokenExchangeRequest::new(
			"code-1",
			"https://assistant.example.com/notion/callback",
			"client-1",
			"secret-1",
		)
	}

	#[test]
	fn complete_request_passes() {
		request().validate(None).expect("Complete request should validate.");
		request()
			.validate(Some("https://assistant.example.com/notion/callback"))
			.expect("Matching redirect URI should validate.");
	}

	#[test]
	fn blank_fields_are_rejected() {
		let mut missing_code = request();

		missing_code.authorization_code = " ".into();

		let err = missing_code.validate(None).expect_err("Blank code should be rejected.");

		assert_eq!(err.error_code(), ExchangeError::INVALID_REQUEST);
		assert!(err.error_description().contains("authorization_code"));

		let mut missing_secret = request();

		missing_secret.client_secret = TokenSecret::default();

		assert!(missing_secret.validate(None).is_err());
	}

	#[test]
	fn redirect_uri_must_match_exactly() {
		let err = request()
			.validate(Some("https://assistant.example.com/notion/callback/"))
			.expect_err("Trailing slash must not be treated as equal.");

		assert!(matches!(err, ExchangeError::InvalidRequest { .. }));
	}
}
