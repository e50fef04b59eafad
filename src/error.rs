//! Bridge-level error types shared by the webhook verifier, token exchange, and stores.

// self
use crate::_prelude::*;

/// Bridge-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical bridge error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Inbound webhook failed authentication.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// Authorization-code exchange failed.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
}

/// Configuration and validation failures raised by the bridge.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Redirect URI cannot be parsed as an absolute URL.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Provider descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Reasons an inbound webhook is rejected.
///
/// [`AuthenticationError::MissingSecret`] is a server-side misconfiguration and must not be
/// reported to the sender as a signature problem.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthenticationError {
	/// No signing secret is configured.
	#[error("Webhook signing secret is not configured.")]
	MissingSecret,
	/// A required envelope field is empty.
	#[error("Webhook envelope is missing the {field} field.")]
	MissingField {
		/// Envelope field name.
		field: &'static str,
	},
	/// The signature header holds no parsable `version,signature` token.
	#[error("Webhook signature header contains no parsable signatures.")]
	MalformedHeader,
	/// The timestamp is not a decimal Unix timestamp.
	#[error("Webhook timestamp `{value}` is not a decimal Unix timestamp.")]
	MalformedTimestamp {
		/// Raw timestamp text.
		value: String,
	},
	/// The timestamp is further from the local clock than the tolerance allows.
	#[error("Webhook timestamp is {skew_secs}s away from the local clock (tolerance {tolerance_secs}s).")]
	TimestampOutsideTolerance {
		/// Absolute distance between the timestamp and now.
		skew_secs: i64,
		/// Configured tolerance.
		tolerance_secs: i64,
	},
	/// Signatures parsed but none matched.
	#[error("No webhook signature matched the expected value.")]
	SignatureMismatch,
}
impl AuthenticationError {
	/// Suggested HTTP status for the route that surfaces this error.
	pub fn status_hint(&self) -> u16 {
		match self {
			Self::MissingSecret => 500,
			Self::MissingField { .. } | Self::MalformedHeader | Self::MalformedTimestamp { .. } =>
				400,
			Self::TimestampOutsideTolerance { .. } | Self::SignatureMismatch => 401,
		}
	}
}

/// Failure taxonomy for the authorization-code exchange.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// The request was rejected locally before any network call.
	#[error("Token exchange request is invalid: {reason}.")]
	InvalidRequest {
		/// Which validation failed.
		reason: String,
	},
	/// The token endpoint did not answer within the configured timeout.
	#[error("Token endpoint timed out.")]
	Timeout,
	/// The token endpoint answered with a body that is not a usable JSON token payload.
	#[error("Token endpoint returned an unusable response.")]
	InvalidResponse {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Raw response text kept for diagnostics.
		body: String,
		/// Structured parsing failure.
		#[source]
		source: Option<serde_path_to_error::Error<serde_json::Error>>,
	},
	/// The provider answered with a non-success status.
	#[error("Provider rejected the exchange with {status} {code}: {description}.")]
	ProviderRejected {
		/// HTTP status code.
		status: u16,
		/// Provider error code (`error` field or equivalent).
		code: String,
		/// Provider error description.
		description: String,
	},
	/// DNS, TCP, TLS, or other transport failure.
	#[error("Network error occurred while calling the token endpoint.")]
	NetworkFailure {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl ExchangeError {
	/// Error code used when the request fails local validation.
	pub const INVALID_REQUEST: &'static str = "invalid_request";
	/// Error code used when the token endpoint times out.
	pub const TIMEOUT: &'static str = "timeout";
	/// Error code used when the response body cannot be parsed.
	pub const INVALID_RESPONSE: &'static str = "invalid_response";
	/// Error code used for transport failures.
	pub const NETWORK_FAILURE: &'static str = "network_failure";

	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::NetworkFailure { source: Box::new(src) }
	}

	pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
		Self::InvalidRequest { reason: reason.into() }
	}

	/// HTTP status returned by the provider, when one was received.
	pub fn http_status(&self) -> Option<u16> {
		match self {
			Self::InvalidResponse { status, .. } => *status,
			Self::ProviderRejected { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Stable error code (`timeout`, `invalid_response`, provider `error`, ...).
	pub fn error_code(&self) -> &str {
		match self {
			Self::InvalidRequest { .. } => Self::INVALID_REQUEST,
			Self::Timeout => Self::TIMEOUT,
			Self::InvalidResponse { .. } => Self::INVALID_RESPONSE,
			Self::ProviderRejected { code, .. } => code,
			Self::NetworkFailure { .. } => Self::NETWORK_FAILURE,
		}
	}

	/// Human-readable description of the failure.
	pub fn error_description(&self) -> String {
		match self {
			Self::InvalidRequest { reason } => reason.clone(),
			Self::ProviderRejected { description, .. } => description.clone(),
			Self::InvalidResponse { body, .. } =>
				format!("Token endpoint returned a non-JSON or incomplete body: {body}"),
			other => other.to_string(),
		}
	}

	/// Suggested HTTP status for the route that surfaces this error.
	pub fn status_hint(&self) -> u16 {
		match self {
			Self::InvalidRequest { .. } => 400,
			Self::ProviderRejected { status, .. } if (400..500).contains(status) => 400,
			Self::Timeout => 504,
			_ => 502,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn exchange_error_exposes_failure_fields() {
		let err = ExchangeError::ProviderRejected {
			status: 400,
			code: "invalid_grant".into(),
			description: "code expired".into(),
		};

		assert_eq!(err.http_status(), Some(400));
		assert_eq!(err.error_code(), "invalid_grant");
		assert_eq!(err.error_description(), "code expired");
		assert_eq!(err.status_hint(), 400);
		assert_eq!(ExchangeError::Timeout.error_code(), "timeout");
		assert_eq!(ExchangeError::Timeout.status_hint(), 504);
	}

	#[test]
	fn authentication_errors_split_server_and_client_faults() {
		assert_eq!(AuthenticationError::MissingSecret.status_hint(), 500);
		assert_eq!(AuthenticationError::MalformedHeader.status_hint(), 400);
		assert_eq!(AuthenticationError::SignatureMismatch.status_hint(), 401);

		let err: Error = AuthenticationError::SignatureMismatch.into();

		assert!(matches!(err, Error::Authentication(AuthenticationError::SignatureMismatch)));
	}
}
