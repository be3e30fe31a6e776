//! Authorization-code exchange with the documented raw-then-hex fallback shim.
//!
//! Codes arrive through the shop-authorization redirect and are single-use and
//! short-lived, so nothing here retries automatically. The only second attempt is the
//! hex-decoded variant after a signature-class rejection: some integrations deliver the
//! code hex-encoded, and the raw form is always tried first.

// self
use crate::{
	_prelude::*,
	auth::{ShopId, TokenState},
	flows::{Broker, common},
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::CodeDecodePolicy,
	sign::{Operation, SignContext},
};

impl<C> Broker<C>
where
	C: ?Sized + ApiTransport,
{
	/// Exchanges an authorization code for the shop's initial token pair.
	///
	/// On success the new state is persisted and returned. On failure the raw upstream
	/// payload is surfaced and the stored state is left untouched; codes are single-use,
	/// so the caller must restart authorization rather than retry.
	pub async fn exchange_code(&self, code: &str, shop_id: ShopId) -> Result<TokenState> {
		const KIND: FlowKind = FlowKind::CodeExchange;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if code.is_empty() {
					return Err(Error::MissingCredential { field: "code" });
				}

				let _state_guard = self.state_guard.lock().await;
				let state = match self.exchange_attempt(code, shop_id).await {
					Ok(state) => state,
					Err(rejection @ Error::SignatureRejected { .. })
						if self.descriptor.quirks.code_decode_policy
							== CodeDecodePolicy::RawThenHex =>
						match decode_hex_code(code) {
							Some(decoded) => self.exchange_attempt(&decoded, shop_id).await?,
							None => return Err(rejection),
						},
					Err(e) => return Err(e),
				};

				self.store.save(state.clone()).await?;

				Ok(state)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn exchange_attempt(&self, code: &str, shop_id: ShopId) -> Result<TokenState> {
		let context =
			SignContext { code: Some(code), shop_id: Some(shop_id), ..Default::default() };
		let body = serde_json::json!({
			"code": code,
			"partner_id": self.credentials.partner_id,
			"shop_id": shop_id,
		});
		let (status, value, signed) =
			self.signed_call(Operation::CodeExchange, context, None, body).await?;
		let pair = common::token_pair_or_rejection(status, &value, &signed)?;

		Ok(TokenState::new(
			shop_id,
			pair.access_token,
			pair.refresh_token,
			OffsetDateTime::now_utc(),
		))
	}
}

// Redirect handlers occasionally hand the code over hex-encoded; only a decode that
// yields valid UTF-8 is worth a second attempt.
fn decode_hex_code(code: &str) -> Option<String> {
	hex::decode(code).ok().and_then(|bytes| String::from_utf8(bytes).ok())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn hex_decode_requires_valid_utf8() {
		assert_eq!(decode_hex_code("68656c6c6f").as_deref(), Some("hello"));
		assert_eq!(decode_hex_code("zz"), None);
		assert_eq!(decode_hex_code("ff"), None);
	}
}
