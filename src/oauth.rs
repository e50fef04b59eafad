//! Transport error classification for token endpoint calls.

pub use oauth2;

// crates.io
use oauth2::HttpClientError;
// self
use crate::{_prelude::*, error::ExchangeError, http::ResponseMetadata};

/// Maps HTTP transport failures into [`ExchangeError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an exchange error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> ExchangeError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> ExchangeError {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			other => map_generic_transport_error(other),
		}
	}
}

/// Fallback classification shared by transport mappers: I/O and HTTP construction failures
/// become [`ExchangeError::NetworkFailure`].
pub fn map_generic_transport_error<E>(err: HttpClientError<E>) -> ExchangeError
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => ExchangeError::NetworkFailure { source: inner },
		HttpClientError::Http(inner) => ExchangeError::network(inner),
		HttpClientError::Io(inner) => ExchangeError::network(inner),
		HttpClientError::Other(message) => ExchangeError::network(OtherTransportError(message)),
		_ => ExchangeError::network(OtherTransportError("unknown transport failure".into())),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> ExchangeError {
	if err.is_timeout() {
		return ExchangeError::Timeout;
	}

	ExchangeError::network(err)
}

/// Transport failure described only by a message.
#[derive(Debug, ThisError)]
#[error("{0}")]
pub struct OtherTransportError(pub String);

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn io_failures_become_network_failures() {
		let err = map_generic_transport_error::<std::io::Error>(HttpClientError::Io(
			std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
		));

		assert!(matches!(err, ExchangeError::NetworkFailure { .. }));
		assert_eq!(err.error_code(), ExchangeError::NETWORK_FAILURE);
	}

	#[test]
	fn other_failures_keep_their_message() {
		let err = map_generic_transport_error::<std::io::Error>(HttpClientError::Other(
			"socket closed".into(),
		));
		let source = StdError::source(&err).expect("Network failures expose their source.");

		assert_eq!(source.to_string(), "socket closed");
	}
}
