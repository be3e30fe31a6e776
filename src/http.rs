//! Transport primitives for signed partner-API calls.
//!
//! [`ApiTransport`] is the broker's only dependency on an HTTP stack. Callers provide an
//! implementation (typically behind `Arc<T>` where `T: ApiTransport`) and flows hand it
//! fully signed URLs with JSON bodies. The default [`ReqwestTransport`] carries a bounded
//! per-request timeout and fails outright on expiry; nothing in the crate retries.

// std
#[cfg(feature = "reqwest")] use std::{ops::Deref, time::Duration as StdDuration};
// self
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing signed JSON calls.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared across broker
/// instances behind `Arc<T>`, and the futures they return must be `Send` for the lifetime
/// of the in-flight call so flow futures stay `Send` as well.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes one JSON POST against the signed URL, returning status and raw body.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Outbound call: the fully signed URL and its JSON body.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// Signed URL carrying the `partner_id`, `timestamp`, and `sign` query parameters.
	pub url: Url,
	/// JSON request body.
	pub body: serde_json::Value,
}

/// Raw transport response; interpretation happens in the flow layer.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body bytes.
	pub body: Vec<u8>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Requests never follow redirects; the partner API returns results directly rather than
/// delegating to another URI.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Bounded per-request timeout applied by [`ReqwestTransport::new`].
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Builds a transport with the default timeout and redirects disabled.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(Self::DEFAULT_TIMEOUT)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`]. Configure the client with a bounded
	/// timeout; the broker never retries an expired call.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client
				.post(request.url)
				.json(&request.body)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(RawResponse { status, body })
		})
	}
}
