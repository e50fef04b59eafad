//! Provider descriptor data structures and the presets used by the assistant.
//!
//! The module exposes validated metadata, supporting builder utilities, and request quirks
//! so providers can describe their token endpoints in a transport-agnostic way.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// Notion's public integration endpoints.
pub const NOTION_AUTHORIZE_URL: &str = "https://api.notion.com/v1/oauth/authorize";
/// Notion token endpoint.
pub const NOTION_TOKEN_URL: &str = "https://api.notion.com/v1/oauth/token";
/// API version pinned through the `Notion-Version` header.
pub const NOTION_API_VERSION: &str = "2022-06-28";
/// Google's OAuth 2.0 authorize endpoint.
pub const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Calendar scopes requested for the Google integration.
pub const GOOGLE_CALENDAR_SCOPES: [&str; 2] = [
	"https://www.googleapis.com/auth/calendar.readonly",
	"https://www.googleapis.com/auth/calendar.events",
];

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// `client_id`/`client_secret` carried in the request body.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for code exchanges.
	pub token: Url,
}

/// Immutable provider descriptor consumed by the exchange client.
///
/// Deserialization runs the same validation as [`ProviderDescriptorBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProviderDescriptorConfig")]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Headers attached to every token request (e.g. `Notion-Version`).
	pub token_request_headers: BTreeMap<String, String>,
	/// Extra query parameters appended to the authorize URL.
	pub authorize_params: BTreeMap<String, String>,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Notion public integration: JSON body, Basic auth, pinned `Notion-Version`, and
	/// `owner=user` on the authorize URL.
	pub fn notion() -> Result<Self, ProviderDescriptorError> {
		Self::builder(preset_id("notion")?)
			.authorization_endpoint(preset_url(NOTION_AUTHORIZE_URL)?)
			.token_endpoint(preset_url(NOTION_TOKEN_URL)?)
			.token_request_header("Notion-Version", NOTION_API_VERSION)
			.authorize_param("owner", "user")
			.build()
	}

	/// Google Calendar: form-encoded body, Basic auth, and offline access so a refresh token
	/// is issued.
	pub fn google() -> Result<Self, ProviderDescriptorError> {
		Self::builder(preset_id("google")?)
			.authorization_endpoint(preset_url(GOOGLE_AUTHORIZE_URL)?)
			.token_endpoint(preset_url(GOOGLE_TOKEN_URL)?)
			.quirks(ProviderQuirks {
				token_request_format: TokenRequestFormat::Form,
				..ProviderQuirks::default()
			})
			.authorize_param("access_type", "offline")
			.authorize_param("include_granted_scopes", "true")
			.authorize_param("prompt", "consent")
			.build()
	}
}

/// Unvalidated descriptor shape read from configuration.
#[derive(Deserialize)]
struct ProviderDescriptorConfig {
	id: ProviderId,
	endpoints: ProviderEndpoints,
	#[serde(default)]
	preferred_client_auth_method: ClientAuthMethod,
	#[serde(default)]
	token_request_headers: BTreeMap<String, String>,
	#[serde(default)]
	authorize_params: BTreeMap<String, String>,
	#[serde(default)]
	quirks: ProviderQuirks,
}
impl TryFrom<ProviderDescriptorConfig> for ProviderDescriptor {
	type Error = ProviderDescriptorError;

	fn try_from(config: ProviderDescriptorConfig) -> Result<Self, Self::Error> {
		ProviderDescriptorBuilder {
			id: config.id,
			authorization_endpoint: Some(config.endpoints.authorization),
			token_endpoint: Some(config.endpoints.token),
			preferred_client_auth_method: config.preferred_client_auth_method,
			token_request_headers: config.token_request_headers,
			authorize_params: config.authorize_params,
			quirks: config.quirks,
		}
		.build()
	}
}

fn preset_id(value: &str) -> Result<ProviderId, ProviderDescriptorError> {
	ProviderId::new(value)
		.map_err(|e| ProviderDescriptorError::InvalidIdentifier { reason: e.to_string() })
}

fn preset_url(value: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(value).map_err(|e| ProviderDescriptorError::InvalidUrl {
		url: value.to_owned(),
		reason: e.to_string(),
	})
}
