//! Broker-level error types shared across signing, flows, and stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// No variant is fatal to the process; every failed operation reports its outcome and
/// leaves the stored token state unchanged.
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
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Upstream reported a bad signature.
	///
	/// The exact base string and signature are preserved because byte-level drift in the
	/// canonicalization is the dominant failure mode when integrating against the partner
	/// API. Never retried, apart from the documented hex/raw code fallback.
	#[error("Upstream rejected signature `{signature}` over base string `{base_string}`: {reason}.")]
	SignatureRejected {
		/// Canonical base string the signature was computed over.
		base_string: String,
		/// Lowercase hex signature sent upstream.
		signature: String,
		/// Upstream-supplied rejection reason.
		reason: String,
	},
	/// A required credential was absent; raised before any network call.
	#[error("No {field} is available for this operation.")]
	MissingCredential {
		/// Name of the missing input (`code`, `token`, `shop_id`, ...).
		field: &'static str,
	},
	/// Upstream returned JSON missing the fields this operation requires.
	#[error("Upstream response is missing expected fields.")]
	MalformedResponse {
		/// Structured parsing failure pointing at the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Upstream rejected the operation for a non-signature reason.
	#[error("Upstream rejected the request: {payload}.")]
	Upstream {
		/// Raw upstream error payload, preserved verbatim for the caller.
		payload: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint path could not be joined onto the descriptor host.
	#[error("Endpoint path cannot be joined onto the configured host.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The clock produced a timestamp outside the upstream's 32-bit field.
	#[error("Timestamp {timestamp} does not fit the upstream's 32-bit timestamp field.")]
	TimestampOutOfRange {
		/// Seconds since epoch that overflowed the field.
		timestamp: i64,
	},
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

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the partner API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
