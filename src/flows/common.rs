//! Shared helpers for flow implementations (signed URLs, envelope handling).

// self
use crate::{
	_prelude::*,
	auth::ShopId,
	error::ConfigError,
	flows::Broker,
	http::{ApiRequest, ApiTransport, RawResponse},
	sign::{Operation, SignContext, SignedRequest, Signer},
};

/// Query parameters appended to token-bearing calls alongside the signature triple.
pub(crate) struct BearerParams<'a> {
	/// Access token bound to the call.
	pub access_token: &'a str,
	/// Shop the call is scoped to.
	pub shop_id: ShopId,
}

impl<C> Broker<C>
where
	C: ?Sized + ApiTransport,
{
	/// Signs `operation` and executes one JSON call, returning the HTTP status, parsed
	/// body, and the signing material used.
	pub(crate) async fn signed_call(
		&self,
		operation: Operation,
		context: SignContext<'_>,
		bearer: Option<BearerParams<'_>>,
		body: serde_json::Value,
	) -> Result<(u16, serde_json::Value, SignedRequest)> {
		let timestamp = self.clock.unix_timestamp()?;
		let signed = Signer::new(&self.credentials).sign(
			operation,
			self.descriptor.path(operation),
			timestamp,
			context,
		)?;
		let url = self.signed_url(&signed, bearer)?;
		let RawResponse { status, body } =
			self.transport.execute(ApiRequest { url, body }).await?;
		let value = parse_json::<serde_json::Value>(&body, Some(status))?;

		Ok((status, value, signed))
	}

	fn signed_url(
		&self,
		signed: &SignedRequest,
		bearer: Option<BearerParams<'_>>,
	) -> Result<Url> {
		let mut url = self
			.descriptor
			.host
			.join(&signed.path)
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;

		{
			let mut pairs = url.query_pairs_mut();

			pairs
				.append_pair("partner_id", &self.credentials.partner_id.to_string())
				.append_pair("timestamp", &signed.timestamp.to_string())
				.append_pair("sign", &signed.signature);

			if let Some(bearer) = bearer {
				pairs
					.append_pair("access_token", bearer.access_token)
					.append_pair("shop_id", &bearer.shop_id.to_string());
			}
		}

		Ok(url)
	}
}

/// Deserializes `bytes` tracking the failing path for malformed-response errors.
pub(crate) fn parse_json<T>(bytes: &[u8], status: Option<u16>) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::MalformedResponse { source, status })
}

/// Token pair issued by the code-exchange and refresh endpoints.
///
/// Both tokens always arrive together; a body carrying only one of them is malformed.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenPairResponse {
	pub access_token: String,
	pub refresh_token: String,
}

/// Interprets a token-endpoint body: a pair on success, a classified rejection otherwise.
pub(crate) fn token_pair_or_rejection(
	status: u16,
	value: &serde_json::Value,
	signed: &SignedRequest,
) -> Result<TokenPairResponse> {
	if value.get("access_token").is_some() {
		return serde_path_to_error::deserialize(value.clone())
			.map_err(|source| Error::MalformedResponse { source, status: Some(status) });
	}

	Err(upstream_rejection(status, value, signed))
}

/// Classifies an upstream error payload, preserving the signing material for
/// signature-class rejections.
pub(crate) fn upstream_rejection(
	status: u16,
	value: &serde_json::Value,
	signed: &SignedRequest,
) -> Error {
	let error = value.get("error").and_then(serde_json::Value::as_str).unwrap_or_default();
	let message = value.get("message").and_then(serde_json::Value::as_str).unwrap_or_default();

	if is_signature_class(error, message) {
		return Error::SignatureRejected {
			base_string: signed.base_string.clone(),
			signature: signed.signature.clone(),
			reason: if message.is_empty() { error.to_owned() } else { message.to_owned() },
		};
	}

	Error::Upstream { payload: value.to_string(), status: Some(status) }
}

// Upstream reports signature mismatches as `error_sign` with free-form messages; match on
// the substring rather than an exact code.
fn is_signature_class(error: &str, message: &str) -> bool {
	error.to_ascii_lowercase().contains("sign") || message.to_ascii_lowercase().contains("sign")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn signed_fixture() -> SignedRequest {
		SignedRequest {
			path: "/api/v2/auth/token/get".into(),
			timestamp: 1000,
			base_string: "123/api/v2/auth/token/get1000abc".into(),
			signature: "deadbeef".into(),
		}
	}

	#[test]
	fn signature_rejections_preserve_the_signing_material() {
		let payload = serde_json::json!({ "error": "error_sign", "message": "wrong sign" });
		let err = upstream_rejection(403, &payload, &signed_fixture());

		match err {
			Error::SignatureRejected { base_string, signature, reason } => {
				assert_eq!(base_string, "123/api/v2/auth/token/get1000abc");
				assert_eq!(signature, "deadbeef");
				assert_eq!(reason, "wrong sign");
			},
			other => panic!("Expected a signature rejection, got {other:?}."),
		}
	}

	#[test]
	fn non_signature_errors_surface_the_raw_payload() {
		let payload = serde_json::json!({ "error": "error_auth", "message": "invalid code" });
		let err = upstream_rejection(400, &payload, &signed_fixture());

		match err {
			Error::Upstream { payload, status } => {
				assert!(payload.contains("invalid code"));
				assert_eq!(status, Some(400));
			},
			other => panic!("Expected an upstream rejection, got {other:?}."),
		}
	}

	#[test]
	fn token_pair_with_missing_refresh_token_is_malformed() {
		let payload = serde_json::json!({ "access_token": "a" });
		let err = token_pair_or_rejection(200, &payload, &signed_fixture())
			.expect_err("A lone access token should be treated as malformed.");

		assert!(matches!(err, Error::MalformedResponse { .. }));
	}

	#[test]
	fn parse_json_reports_malformed_bodies() {
		let err = parse_json::<serde_json::Value>(b"not-json", Some(200))
			.expect_err("Invalid JSON should be rejected.");

		assert!(matches!(err, Error::MalformedResponse { status: Some(200), .. }));
	}
}
