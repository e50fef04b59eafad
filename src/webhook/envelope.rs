// crates.io
use oauth2::http::HeaderMap;
// self
use crate::{_prelude::*, error::AuthenticationError};

/// Header names carrying the envelope metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookHeaders {
	/// Header carrying the message identifier.
	pub message_id: String,
	/// Header carrying the decimal Unix timestamp.
	pub timestamp: String,
	/// Header carrying the space-separated signature tokens.
	pub signature: String,
}
impl Default for WebhookHeaders {
	fn default() -> Self {
		Self {
			message_id: "webhook-id".into(),
			timestamp: "webhook-timestamp".into(),
			signature: "webhook-signature".into(),
		}
	}
}

/// One inbound webhook call as received on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookEnvelope {
	/// Sender-assigned message identifier.
	pub message_id: String,
	/// Decimal Unix timestamp (seconds) as sent.
	pub timestamp: String,
	/// Exact request body bytes.
	pub raw_body: Vec<u8>,
	/// Raw signature header value.
	pub signature_header: String,
}
impl WebhookEnvelope {
	/// Creates an envelope from already-extracted parts.
	pub fn new(
		message_id: impl Into<String>,
		timestamp: impl Into<String>,
		raw_body: impl Into<Vec<u8>>,
		signature_header: impl Into<String>,
	) -> Self {
		Self {
			message_id: message_id.into(),
			timestamp: timestamp.into(),
			raw_body: raw_body.into(),
			signature_header: signature_header.into(),
		}
	}

	/// Extracts an envelope from request headers; absent or non-ASCII headers become empty
	/// fields, which verification then rejects.
	pub fn from_headers(
		names: &WebhookHeaders,
		headers: &HeaderMap,
		raw_body: impl Into<Vec<u8>>,
	) -> Self {
		let read = |name: &str| {
			headers
				.get(name)
				.and_then(|value| value.to_str().ok())
				.map(|value| value.trim().to_owned())
				.unwrap_or_default()
		};

		Self::new(read(&names.message_id), read(&names.timestamp), raw_body, read(&names.signature))
	}

	/// Bytes covered by the signature: `"{message_id}.{timestamp}.{raw_body}"`.
	pub fn signed_content(&self) -> Vec<u8> {
		signed_content(&self.message_id, &self.timestamp, &self.raw_body)
	}

	/// Decodes the body as JSON. Only call this after the envelope has been verified.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.raw_body);

		serde_path_to_error::deserialize(&mut de)
	}

	pub(crate) fn ensure_fields(&self) -> Result<(), AuthenticationError> {
		if self.message_id.is_empty() {
			return Err(AuthenticationError::MissingField { field: "message_id" });
		}
		if self.timestamp.is_empty() {
			return Err(AuthenticationError::MissingField { field: "timestamp" });
		}
		if self.raw_body.is_empty() {
			return Err(AuthenticationError::MissingField { field: "raw_body" });
		}

		Ok(())
	}
}
impl Debug for WebhookEnvelope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebhookEnvelope")
			.field("message_id", &self.message_id)
			.field("timestamp", &self.timestamp)
			.field("raw_body_len", &self.raw_body.len())
			.field("signature_header", &self.signature_header)
			.finish()
	}
}

pub(crate) fn signed_content(message_id: &str, timestamp: &str, body: &[u8]) -> Vec<u8> {
	let mut buf = Vec::with_capacity(message_id.len() + timestamp.len() + body.len() + 2);

	buf.extend_from_slice(message_id.as_bytes());
	buf.push(b'.');
	buf.extend_from_slice(timestamp.as_bytes());
	buf.push(b'.');
	buf.extend_from_slice(body);

	buf
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::HeaderValue;
	// self
	use super::*;

	#[test]
	fn extracts_envelope_from_default_headers() {
		let mut headers = HeaderMap::new();

		headers.insert("webhook-id", HeaderValue::from_static("msg_1"));
		headers.insert("webhook-timestamp", HeaderValue::from_static(" 1700000000 "));
		headers.insert("webhook-signature", HeaderValue::from_static("v1,abcd"));

		let envelope =
			WebhookEnvelope::from_headers(&WebhookHeaders::default(), &headers, b"{}".to_vec());

		assert_eq!(envelope.message_id, "msg_1");
		assert_eq!(envelope.timestamp, "1700000000");
		assert_eq!(envelope.signature_header, "v1,abcd");
		assert_eq!(envelope.signed_content(), b"msg_1.1700000000.{}".to_vec());
	}

	#[test]
	fn missing_headers_become_empty_fields() {
		let envelope =
			WebhookEnvelope::from_headers(&WebhookHeaders::default(), &HeaderMap::new(), "{}");

		assert_eq!(
			envelope.ensure_fields(),
			Err(AuthenticationError::MissingField { field: "message_id" })
		);
	}
}
