// crates.io
use time::{Duration, OffsetDateTime};
// self
use convo_bridge::{
	error::AuthenticationError,
	oauth::oauth2::http::{HeaderMap, HeaderValue},
	webhook::{ConversationEvent, WebhookEnvelope, WebhookHeaders, WebhookVerifier},
};

const SECRET: &str = "wsec_test_signing_key";
const BODY: &str = r#"{"type":"post_call_transcription","event_timestamp":1700000000,"data":{"conversation_id":"conv_42","agent_id":"agent_1"}}"#;

fn now() -> OffsetDateTime {
	OffsetDateTime::now_utc()
}

fn signed(verifier: &WebhookVerifier, message_id: &str, timestamp: &str, body: &[u8]) -> WebhookEnvelope {
	let signature =
		verifier.sign(message_id, timestamp, body).expect("Configured verifier should sign.");

	WebhookEnvelope::new(message_id, timestamp, body.to_vec(), signature)
}

fn fresh_timestamp() -> String {
	now().unix_timestamp().to_string()
}

#[test]
fn sign_then_verify_accepts() {
	let verifier = WebhookVerifier::new(SECRET);
	let envelope = signed(&verifier, "msg_1", &fresh_timestamp(), BODY.as_bytes());

	verifier.verify(&envelope).expect("Signed envelope should verify.");
	assert!(verifier.is_authentic(&envelope));
}

#[test]
fn any_single_byte_mutation_is_rejected() {
	let verifier = WebhookVerifier::new(SECRET);
	let timestamp = fresh_timestamp();
	let envelope = signed(&verifier, "msg_1", &timestamp, BODY.as_bytes());

	for idx in 0..envelope.raw_body.len() {
		let mut tampered = envelope.clone();

		tampered.raw_body[idx] ^= 0x01;

		assert_eq!(
			verifier.verify(&tampered),
			Err(AuthenticationError::SignatureMismatch),
			"Body mutation at byte {idx} must be rejected."
		);
	}

	let mut tampered = envelope.clone();

	tampered.message_id = "msg_2".into();

	assert_eq!(verifier.verify(&tampered), Err(AuthenticationError::SignatureMismatch));

	// Still fresh, different digits.
	let mut tampered = envelope.clone();
	let shifted = timestamp.parse::<i64>().expect("Timestamp should be numeric.") - 1;

	tampered.timestamp = shifted.to_string();

	assert_eq!(verifier.verify(&tampered), Err(AuthenticationError::SignatureMismatch));
}

#[test]
fn one_matching_signature_among_garbage_is_enough() {
	let verifier = WebhookVerifier::new(SECRET);
	let timestamp = fresh_timestamp();
	let valid = verifier
		.sign("msg_1", &timestamp, BODY.as_bytes())
		.expect("Configured verifier should sign.");
	let header = format!("v1,zzzz v0,deadbeef garbage {valid} v1,{}", "00".repeat(32));
	let envelope = WebhookEnvelope::new("msg_1", timestamp, BODY, header);

	verifier.verify(&envelope).expect("One valid signature should be enough.");
}

#[test]
fn headers_without_parsable_tokens_are_malformed() {
	let verifier = WebhookVerifier::new(SECRET);

	for header in ["", "   ", "v1", "v1,", ",abc", "no-comma-here"] {
		let envelope = WebhookEnvelope::new("msg_1", fresh_timestamp(), BODY, header);

		assert_eq!(
			verifier.verify(&envelope),
			Err(AuthenticationError::MalformedHeader),
			"Header `{header}` must be malformed."
		);
	}
}

#[test]
fn missing_secret_is_not_a_signature_mismatch() {
	let signer = WebhookVerifier::new(SECRET);
	let envelope = signed(&signer, "msg_1", &fresh_timestamp(), BODY.as_bytes());
	let unconfigured = WebhookVerifier::with_optional_secret(None);
	let err = unconfigured.verify(&envelope).expect_err("Missing secret must fail.");

	assert_eq!(err, AuthenticationError::MissingSecret);
	assert_eq!(err.status_hint(), 500);
	assert_eq!(unconfigured.sign("msg_1", "1", b"{}"), Err(AuthenticationError::MissingSecret));
}

#[test]
fn wrong_secret_is_rejected() {
	let signer = WebhookVerifier::new(SECRET);
	let envelope = signed(&signer, "msg_1", &fresh_timestamp(), BODY.as_bytes());
	let err = WebhookVerifier::new("another-secret")
		.verify(&envelope)
		.expect_err("Foreign signature must fail.");

	assert_eq!(err, AuthenticationError::SignatureMismatch);
	assert_eq!(err.status_hint(), 401);
}

#[test]
fn replayed_envelopes_fall_outside_tolerance() {
	let verifier = WebhookVerifier::new(SECRET).with_tolerance(Duration::seconds(60));
	let sent_at = now() - Duration::minutes(10);
	let envelope = signed(&verifier, "msg_1", &sent_at.unix_timestamp().to_string(), BODY.as_bytes());

	assert!(matches!(
		verifier.verify(&envelope),
		Err(AuthenticationError::TimestampOutsideTolerance { tolerance_secs: 60, .. })
	));
	verifier
		.verify_at(&envelope, sent_at + Duration::seconds(30))
		.expect("Envelope should verify inside the tolerance window.");
}

#[test]
fn envelope_from_headers_then_decode_event() {
	let verifier = WebhookVerifier::new(SECRET);
	let timestamp = fresh_timestamp();
	let signature = verifier
		.sign("msg_7", &timestamp, BODY.as_bytes())
		.expect("Configured verifier should sign.");
	let mut headers = HeaderMap::new();

	headers.insert("webhook-id", HeaderValue::from_static("msg_7"));
	headers.insert(
		"webhook-timestamp",
		HeaderValue::from_str(&timestamp).expect("Timestamp header should be valid."),
	);
	headers.insert(
		"webhook-signature",
		HeaderValue::from_str(&format!(" {signature} ")).expect("Signature header should be valid."),
	);

	let envelope = WebhookEnvelope::from_headers(verifier.headers(), &headers, BODY);

	verifier.verify(&envelope).expect("Envelope extracted from headers should verify.");

	let event = envelope.json::<ConversationEvent>().expect("Verified body should decode.");

	assert!(event.is_transcript_ready());
	assert_eq!(event.data.conversation_id.as_ref(), "conv_42");
}

#[test]
fn custom_header_names_are_honored() {
	let names = WebhookHeaders {
		message_id: "x-message-id".into(),
		timestamp: "x-timestamp".into(),
		signature: "x-signature".into(),
	};
	let verifier = WebhookVerifier::new(SECRET).with_headers(names.clone());
	let timestamp = fresh_timestamp();
	let signature = verifier.sign("m", &timestamp, b"{}").expect("Configured verifier should sign.");
	let mut headers = HeaderMap::new();

	headers.insert("x-message-id", HeaderValue::from_static("m"));
	headers.insert(
		"x-timestamp",
		HeaderValue::from_str(&timestamp).expect("Timestamp header should be valid."),
	);
	headers.insert(
		"x-signature",
		HeaderValue::from_str(&signature).expect("Signature header should be valid."),
	);

	let envelope = WebhookEnvelope::from_headers(&names, &headers, b"{}".to_vec());

	assert!(verifier.is_authentic(&envelope));

	let default_envelope = WebhookEnvelope::from_headers(&WebhookHeaders::default(), &headers, b"{}".to_vec());

	assert_eq!(verifier.verify(&default_envelope), Err(AuthenticationError::MalformedHeader));
}
