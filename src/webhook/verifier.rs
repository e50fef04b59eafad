// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::AuthenticationError,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	webhook::{SignatureSet, WebhookEnvelope, WebhookHeaders, envelope},
};

type HmacSha256 = Hmac<Sha256>;

/// Version tag emitted by [`WebhookVerifier::sign`].
pub const SIGNATURE_VERSION: &str = "v1";

/// Deserializable verifier settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierSettings {
	/// Maximum distance, in seconds, between the webhook timestamp and the local clock.
	pub tolerance_secs: i64,
	/// Header names used by [`WebhookEnvelope::from_headers`].
	pub headers: WebhookHeaders,
}
impl Default for VerifierSettings {
	fn default() -> Self {
		Self {
			tolerance_secs: WebhookVerifier::DEFAULT_TOLERANCE.whole_seconds(),
			headers: WebhookHeaders::default(),
		}
	}
}

/// Authenticates inbound webhooks against a shared HMAC-SHA256 secret.
///
/// The verifier holds no mutable state and can be shared across requests.
#[derive(Clone)]
pub struct WebhookVerifier {
	secret: Option<TokenSecret>,
	tolerance: Duration,
	headers: WebhookHeaders,
}
impl WebhookVerifier {
	/// Default replay window.
	pub const DEFAULT_TOLERANCE: Duration = Duration::seconds(300);

	/// Creates a verifier for the provided secret with the default tolerance.
	pub fn new(secret: impl Into<TokenSecret>) -> Self {
		Self::with_optional_secret(Some(secret.into()))
	}

	/// Creates a verifier whose secret may be absent (e.g. an unset environment variable);
	/// every verification then fails with [`AuthenticationError::MissingSecret`].
	pub fn with_optional_secret(secret: Option<TokenSecret>) -> Self {
		Self { secret, tolerance: Self::DEFAULT_TOLERANCE, headers: WebhookHeaders::default() }
	}

	/// Builds a verifier from deserialized settings.
	pub fn from_settings(secret: Option<TokenSecret>, settings: &VerifierSettings) -> Self {
		Self::with_optional_secret(secret)
			.with_tolerance(Duration::seconds(settings.tolerance_secs))
			.with_headers(settings.headers.clone())
	}

	/// Overrides the replay window; negative values clamp to zero.
	pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
		self.tolerance = if tolerance.is_negative() { Duration::ZERO } else { tolerance };

		self
	}

	/// Overrides the header names used for envelope extraction.
	pub fn with_headers(mut self, headers: WebhookHeaders) -> Self {
		self.headers = headers;

		self
	}

	/// Configured replay window.
	pub fn tolerance(&self) -> Duration {
		self.tolerance
	}

	/// Configured header names.
	pub fn headers(&self) -> &WebhookHeaders {
		&self.headers
	}

	/// Verifies the envelope against the current UTC clock.
	pub fn verify(&self, envelope: &WebhookEnvelope) -> Result<(), AuthenticationError> {
		const KIND: OperationKind = OperationKind::WebhookVerification;

		let _span = OperationSpan::new(KIND, "verify").entered();

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = self.verify_at(envelope, OffsetDateTime::now_utc());

		match &result {
			Ok(()) => obs::record_outcome(KIND, OperationOutcome::Success),
			Err(e) => {
				obs::record_failure(KIND, e);
				obs::record_outcome(KIND, OperationOutcome::Failure);
			},
		}

		result
	}

	/// Verifies the envelope as if the local clock read `now`.
	pub fn verify_at(
		&self,
		envelope: &WebhookEnvelope,
		now: OffsetDateTime,
	) -> Result<(), AuthenticationError> {
		let signatures = SignatureSet::parse(&envelope.signature_header);

		if signatures.is_empty() {
			return Err(AuthenticationError::MalformedHeader);
		}

		envelope.ensure_fields()?;

		let mac = self.keyed_mac()?;

		self.check_timestamp(&envelope.timestamp, now)?;

		let expected = {
			let mut mac = mac;

			mac.update(&envelope.signed_content());

			mac.finalize().into_bytes()
		};
		let matched = signatures.iter().any(|entry| match hex::decode(&entry.signature) {
			Ok(candidate) => bool::from(candidate.as_slice().ct_eq(expected.as_slice())),
			Err(_) => false,
		});

		if matched { Ok(()) } else { Err(AuthenticationError::SignatureMismatch) }
	}

	/// Returns true when [`WebhookVerifier::verify`] accepts the envelope.
	pub fn is_authentic(&self, envelope: &WebhookEnvelope) -> bool {
		self.verify(envelope).is_ok()
	}

	/// Produces a `v1,<hex>` signature token for the given message parts.
	pub fn sign(
		&self,
		message_id: &str,
		timestamp: &str,
		body: &[u8],
	) -> Result<String, AuthenticationError> {
		let mut mac = self.keyed_mac()?;

		mac.update(&envelope::signed_content(message_id, timestamp, body));

		Ok(format!("{SIGNATURE_VERSION},{}", hex::encode(mac.finalize().into_bytes())))
	}

	fn keyed_mac(&self) -> Result<HmacSha256, AuthenticationError> {
		let secret = self
			.secret
			.as_ref()
			.filter(|secret| !secret.is_blank())
			.ok_or(AuthenticationError::MissingSecret)?;

		HmacSha256::new_from_slice(secret.expose().as_bytes())
			.map_err(|_| AuthenticationError::MissingSecret)
	}

	fn check_timestamp(&self, raw: &str, now: OffsetDateTime) -> Result<(), AuthenticationError> {
		let malformed = || AuthenticationError::MalformedTimestamp { value: raw.to_owned() };

		if !raw.bytes().all(|b| b.is_ascii_digit()) {
			return Err(malformed());
		}

		let sent = raw.parse::<i64>().map_err(|_| malformed())?;
		let skew = now.unix_timestamp().saturating_sub(sent).saturating_abs();
		let tolerance = self.tolerance.whole_seconds();

		if skew > tolerance {
			return Err(AuthenticationError::TimestampOutsideTolerance {
				skew_secs: skew,
				tolerance_secs: tolerance,
			});
		}

		Ok(())
	}
}
impl Debug for WebhookVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebhookVerifier")
			.field("secret_set", &self.secret.is_some())
			.field("tolerance", &self.tolerance)
			.field("headers", &self.headers)
			.finish()
	}
}
