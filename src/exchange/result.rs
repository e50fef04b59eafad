//! Outcome of a token exchange.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ExchangeError};

/// Either the issued grant or the classified failure.
#[derive(Debug)]
pub enum TokenExchangeResult {
	/// Provider answered with HTTP 200 and a usable token payload.
	Success(TokenGrant),
	/// Exchange failed locally, in transit, or at the provider.
	Failure(ExchangeError),
}
impl TokenExchangeResult {
	/// Returns true for [`TokenExchangeResult::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	/// Borrow the grant, if the exchange succeeded.
	pub fn grant(&self) -> Option<&TokenGrant> {
		match self {
			Self::Success(grant) => Some(grant),
			Self::Failure(_) => None,
		}
	}

	/// Borrow the failure, if the exchange failed.
	pub fn error(&self) -> Option<&ExchangeError> {
		match self {
			Self::Success(_) => None,
			Self::Failure(err) => Some(err),
		}
	}

	/// HTTP status observed at the token endpoint, when one was received.
	pub fn http_status(&self) -> Option<u16> {
		match self {
			Self::Success(_) => Some(200),
			Self::Failure(err) => err.http_status(),
		}
	}

	/// Failure code (`timeout`, `invalid_response`, provider `error`, ...).
	pub fn error_code(&self) -> Option<&str> {
		self.error().map(ExchangeError::error_code)
	}

	/// Failure description.
	pub fn error_description(&self) -> Option<String> {
		self.error().map(ExchangeError::error_description)
	}

	/// Converts into a standard [`Result`] so callers can use `?`.
	pub fn into_result(self) -> Result<TokenGrant, ExchangeError> {
		match self {
			Self::Success(grant) => Ok(grant),
			Self::Failure(err) => Err(err),
		}
	}
}
impl From<Result<TokenGrant, ExchangeError>> for TokenExchangeResult {
	fn from(result: Result<TokenGrant, ExchangeError>) -> Self {
		match result {
			Ok(grant) => Self::Success(grant),
			Err(err) => Self::Failure(err),
		}
	}
}

/// Tokens issued by a successful exchange.
///
/// `raw_payload` keeps the complete JSON body; provider-specific fields such as Notion's
/// `workspace_id` and `bot_id` are read from it.
#[derive(Clone, Debug)]
pub struct TokenGrant {
	/// Access token.
	pub access_token: TokenSecret,
	/// Refresh token, when the provider issues one.
	pub refresh_token: Option<TokenSecret>,
	/// Access token lifetime.
	pub expires_in: Option<Duration>,
	/// Granted scope string.
	pub scope: Option<String>,
	/// Token type, usually `bearer`.
	pub token_type: Option<String>,
	/// Full response body.
	pub raw_payload: Value,
}
impl TokenGrant {
	/// Builds a grant from a successful response payload. `body` is the raw response text,
	/// kept on the error when the payload lacks a usable access token.
	pub(crate) fn from_payload(payload: Value, body: String) -> Result<Self, ExchangeError> {
		let fields: TokenFields = match serde_path_to_error::deserialize(&payload) {
			Ok(fields) => fields,
			Err(e) =>
				return Err(ExchangeError::InvalidResponse {
					status: Some(200),
					body,
					source: Some(e),
				}),
		};

		if fields.access_token.trim().is_empty() {
			return Err(ExchangeError::InvalidResponse { status: Some(200), body, source: None });
		}

		Ok(Self {
			access_token: fields.access_token.into(),
			refresh_token: fields.refresh_token.filter(|t| !t.is_empty()).map(TokenSecret::from),
			expires_in: fields.expires_in.filter(|secs| *secs >= 0).map(Duration::seconds),
			scope: fields.scope,
			token_type: fields.token_type,
			raw_payload: payload,
		})
	}

	/// Reads a string field from the raw payload.
	pub fn payload_str(&self, key: &str) -> Option<&str> {
		self.raw_payload.get(key).and_then(Value::as_str)
	}

	/// Notion workspace identifier.
	pub fn workspace_id(&self) -> Option<&str> {
		self.payload_str("workspace_id")
	}

	/// Notion bot identifier.
	pub fn bot_id(&self) -> Option<&str> {
		self.payload_str("bot_id")
	}

	/// Absolute expiry computed from `issued_at`, when the provider sent `expires_in`.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> Option<OffsetDateTime> {
		self.expires_in.and_then(|ttl| issued_at.checked_add(ttl))
	}
}

#[derive(Deserialize)]
struct TokenFields {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
	#[serde(default)]
	scope: Option<String>,
	#[serde(default)]
	token_type: Option<String>,
}
