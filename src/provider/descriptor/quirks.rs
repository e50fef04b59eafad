// self
use crate::_prelude::*;

/// Encoding used for the token request body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenRequestFormat {
	#[default]
	/// `application/json` object body.
	Json,
	/// `application/x-www-form-urlencoded` body.
	Form,
}
impl TokenRequestFormat {
	/// Content type sent with the request body.
	pub fn content_type(self) -> &'static str {
		match self {
			TokenRequestFormat::Json => "application/json",
			TokenRequestFormat::Form => "application/x-www-form-urlencoded",
		}
	}
}

/// Provider-specific quirks that influence request construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Token request body encoding.
	pub token_request_format: TokenRequestFormat,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { scope_delimiter: ' ', token_request_format: TokenRequestFormat::Json }
	}
}
