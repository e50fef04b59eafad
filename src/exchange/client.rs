//! Token endpoint client for the authorization-code grant.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	error::ExchangeError,
	exchange::{TokenExchangeRequest, TokenExchangeResult, TokenGrant},
	http::{ResponseMetadataSlot, TokenHttpClient},
	oauth::TransportErrorMapper,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	provider::{
		ClientAuthMethod, ProviderDescriptor, ProviderErrorContext, ProviderStrategy,
		TokenRequestFormat,
	},
};
#[cfg(feature = "reqwest")]
use crate::{
	error::ConfigError, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper,
	provider::DefaultProviderStrategy,
};

#[cfg(feature = "reqwest")]
/// Exchange client specialized for the crate's default reqwest transport stack.
pub type ReqwestExchangeClient = TokenExchangeClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Exchanges authorization codes at a single provider's token endpoint.
///
/// The client owns shared references to the HTTP transport and strategy; it carries no
/// per-call state, so one instance serves any number of concurrent exchanges.
#[derive(Clone)]
pub struct TokenExchangeClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every token request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors.
	pub transport_mapper: Arc<M>,
	/// Provider descriptor that defines endpoints and request quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy that decorates requests and describes provider errors.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Upper bound for the whole token request.
	pub timeout: Duration,
	/// Redirect URI registered with the provider; requests must repeat it exactly.
	pub registered_redirect_uri: Option<String>,
}
impl<C, M> TokenExchangeClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Default request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(10);

	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			strategy,
			timeout: Self::DEFAULT_TIMEOUT,
			registered_redirect_uri: None,
		}
	}

	/// Overrides the request timeout. Negative values clamp to zero.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = if timeout.is_negative() { Duration::ZERO } else { timeout };

		self
	}

	/// Pins the redirect URI every exchange must repeat byte-for-byte.
	pub fn with_registered_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
		self.registered_redirect_uri = Some(redirect_uri.into());

		self
	}

	/// Exchanges an authorization code for tokens.
	///
	/// Local validation failures return before any network I/O. Otherwise exactly one POST
	/// is sent; dropping the returned future aborts it.
	pub async fn exchange(&self, request: &TokenExchangeRequest) -> TokenExchangeResult {
		const KIND: OperationKind = OperationKind::TokenExchange;

		let span = OperationSpan::new(KIND, "exchange_authorization_code");

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = span.instrument(self.exchange_inner(request)).await;

		match &result {
			Ok(_) => obs::record_outcome(KIND, OperationOutcome::Success),
			Err(e) => {
				obs::record_failure(KIND, e);
				obs::record_outcome(KIND, OperationOutcome::Failure);
			},
		}

		result.into()
	}

	async fn exchange_inner(
		&self,
		request: &TokenExchangeRequest,
	) -> Result<TokenGrant, ExchangeError> {
		request.validate(self.registered_redirect_uri.as_deref())?;

		let http_request = self.build_http_request(request)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone(), self.timeout.unsigned_abs());
		let response = match handle.call(http_request).await {
			Ok(response) => response,
			Err(e) => {
				let meta = slot.take();

				return Err(self.transport_mapper.map_transport_error(meta.as_ref(), e));
			},
		};

		classify_response(self.strategy.as_ref(), response)
	}

	fn build_http_request(
		&self,
		request: &TokenExchangeRequest,
	) -> Result<HttpRequest, ExchangeError> {
		let format = self.descriptor.quirks.token_request_format;
		let body = encode_body(format, &self.token_request_body(request))?;
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(self.descriptor.endpoints.token.as_str())
			.header(ACCEPT, "application/json")
			.header(CONTENT_TYPE, format.content_type());

		if self.descriptor.preferred_client_auth_method == ClientAuthMethod::ClientSecretBasic {
			builder = builder.header(
				AUTHORIZATION,
				basic_credentials(&request.client_id, request.client_secret.expose()),
			);
		}
		for (name, value) in &self.descriptor.token_request_headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		builder
			.body(body)
			.map_err(|e| ExchangeError::invalid_request(format!("token request is malformed: {e}")))
	}

	fn token_request_body(&self, request: &TokenExchangeRequest) -> BTreeMap<String, String> {
		let mut body = BTreeMap::new();

		body.insert("grant_type".into(), "authorization_code".into());
		body.insert("code".into(), request.authorization_code.clone());
		body.insert("redirect_uri".into(), request.redirect_uri.clone());

		self.strategy.augment_token_request(&mut body);

		if self.descriptor.preferred_client_auth_method == ClientAuthMethod::ClientSecretPost {
			body.insert("client_id".into(), request.client_id.clone());
			body.insert("client_secret".into(), request.client_secret.expose().to_owned());
		}

		body
	}
}
#[cfg(feature = "reqwest")]
impl TokenExchangeClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client with its own reqwest transport and the default provider strategy.
	pub fn new(descriptor: ProviderDescriptor) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			descriptor,
			Arc::new(DefaultProviderStrategy),
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Debug for TokenExchangeClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchangeClient")
			.field("descriptor", &self.descriptor.id)
			.field("token_endpoint", &self.descriptor.endpoints.token.as_str())
			.field("timeout", &self.timeout)
			.field("registered_redirect_uri", &self.registered_redirect_uri)
			.finish()
	}
}

fn encode_body(
	format: TokenRequestFormat,
	body: &BTreeMap<String, String>,
) -> Result<Vec<u8>, ExchangeError> {
	match format {
		TokenRequestFormat::Json => serde_json::to_vec(body).map_err(|e| {
			ExchangeError::invalid_request(format!("token request body is not encodable: {e}"))
		}),
		TokenRequestFormat::Form => Ok(url::form_urlencoded::Serializer::new(String::new())
			.extend_pairs(body)
			.finish()
			.into_bytes()),
	}
}

fn basic_credentials(client_id: &str, client_secret: &str) -> String {
	format!("Basic {}", STANDARD.encode(format!("{client_id}:{client_secret}")))
}

/// Maps a token endpoint response onto a grant or a classified failure.
///
/// The body must be JSON regardless of status; only HTTP 200 counts as success.
fn classify_response(
	strategy: &dyn ProviderStrategy,
	response: HttpResponse,
) -> Result<TokenGrant, ExchangeError> {
	let status = response.status().as_u16();
	let raw = response.into_body();
	let body = String::from_utf8_lossy(&raw).into_owned();
	let payload = match parse_json(&raw) {
		Ok(payload) => payload,
		Err(source) => return Err(ExchangeError::InvalidResponse { status: Some(status), body, source }),
	};

	if status != 200 {
		let details = strategy.describe_token_error(&ProviderErrorContext::from_payload(status, &payload));

		return Err(ExchangeError::ProviderRejected {
			status,
			code: details.code,
			description: details.description,
		});
	}

	TokenGrant::from_payload(payload, body)
}

fn parse_json(raw: &[u8]) -> Result<Value, Option<serde_path_to_error::Error<serde_json::Error>>> {
	let mut de = serde_json::Deserializer::from_slice(raw);
	let value = serde_path_to_error::deserialize(&mut de).map_err(Some)?;

	// Trailing garbage after a complete document.
	de.end().map_err(|_| None)?;

	Ok(value)
}
