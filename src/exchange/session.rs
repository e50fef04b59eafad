//! Redirect leg of the authorization-code flow.

// crates.io
use rand::{Rng, distr::Alphanumeric};
use subtle::ConstantTimeEq;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, ExchangeError},
	exchange::{TokenExchangeClient, TokenExchangeRequest},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	provider::ProviderDescriptor,
};

const STATE_LEN: usize = 32;

/// Handshake metadata returned by [`TokenExchangeClient::start_authorization`].
///
/// Persist the session (or at least `state` and `redirect_uri`) until the provider
/// redirects back, then turn it into a [`TokenExchangeRequest`] with
/// [`AuthorizationSession::exchange_request`].
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// OAuth client identifier placed on the authorize URL.
	pub client_id: String,
	/// Scopes requested, in caller order.
	pub scopes: Vec<String>,
	/// Opaque value that must round-trip through the redirect.
	pub state: String,
	/// Redirect URI text exactly as sent to the authorize endpoint.
	pub redirect_uri: String,
	/// Authorize URL end users are sent to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Builds a session with a fresh random `state`.
	pub fn start<I, S>(
		descriptor: &ProviderDescriptor,
		client_id: impl Into<String>,
		redirect_uri: impl Into<String>,
		scopes: I,
	) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let client_id = client_id.into();
		let redirect_uri = redirect_uri.into();

		if client_id.trim().is_empty() {
			return Err(ExchangeError::invalid_request("client_id is empty").into());
		}

		Url::parse(&redirect_uri).map_err(|source| ConfigError::InvalidRedirect { source })?;

		let scopes = scopes
			.into_iter()
			.map(Into::into)
			.filter(|scope: &String| !scope.trim().is_empty())
			.collect::<Vec<_>>();
		let state = random_state();
		let authorize_url = build_authorize_url(descriptor, &client_id, &redirect_uri, &scopes, &state);

		Ok(Self { client_id, scopes, state, redirect_uri, authorize_url })
	}

	/// Validates the `state` parameter returned on the redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<(), ExchangeError> {
		if bool::from(self.state.as_bytes().ct_eq(returned_state.as_bytes())) {
			Ok(())
		} else {
			Err(ExchangeError::invalid_request("authorization state mismatch"))
		}
	}

	/// Checks `returned_state` and assembles the exchange request for `code`.
	pub fn exchange_request(
		&self,
		returned_state: &str,
		code: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
	) -> Result<TokenExchangeRequest, ExchangeError> {
		self.validate_state(returned_state)?;

		Ok(TokenExchangeRequest::new(
			code,
			self.redirect_uri.clone(),
			self.client_id.clone(),
			client_secret,
		))
	}
}

impl<C, M> TokenExchangeClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts an authorization-code handshake against this client's provider.
	///
	/// When a registered redirect URI is configured, `redirect_uri` must equal it.
	pub fn start_authorization<I, S>(
		&self,
		client_id: impl Into<String>,
		redirect_uri: impl Into<String>,
		scopes: I,
	) -> Result<AuthorizationSession>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let redirect_uri = redirect_uri.into();

		if self
			.registered_redirect_uri
			.as_deref()
			.is_some_and(|registered| registered != redirect_uri)
		{
			return Err(ExchangeError::invalid_request(
				"redirect_uri does not match the registered redirect URI",
			)
			.into());
		}

		AuthorizationSession::start(&self.descriptor, client_id, redirect_uri, scopes)
	}
}

fn build_authorize_url(
	descriptor: &ProviderDescriptor,
	client_id: &str,
	redirect_uri: &str,
	scopes: &[String],
	state: &str,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri);

	if let Some(scope) = format_scope(scopes, descriptor.quirks.scope_delimiter) {
		pairs.append_pair("scope", &scope);
	}

	pairs.append_pair("state", state);

	for (name, value) in &descriptor.authorize_params {
		pairs.append_pair(name, value);
	}

	drop(pairs);

	url
}

/// Joins scopes with the provider's delimiter.
fn format_scope(scopes: &[String], delimiter: char) -> Option<String> {
	if scopes.is_empty() {
		return None;
	}

	let mut buf = String::new();

	for (idx, value) in scopes.iter().enumerate() {
		if idx > 0 {
			buf.push(delimiter);
		}

		buf.push_str(value);
	}

	Some(buf)
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}
