//! Refresh rotation: atomic pair replacement, serialized state access, and metrics.
//!
//! [`Broker::refresh`] performs one `refresh_token` call under the broker's state guard,
//! replaces both tokens together on success, and persists before returning. A failed call
//! leaves the stored state byte-for-byte unchanged; whether to force re-authorization is
//! the caller's decision. [`Broker::run_refresh_daemon`] wraps the same call in a
//! fixed-interval loop sharing the guard with the request path.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::TokenState,
	flows::{Broker, common},
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	sign::{Operation, SignContext},
};

impl<C> Broker<C>
where
	C: ?Sized + ApiTransport,
{
	/// Rotates the stored token pair through the refresh endpoint.
	pub async fn refresh(&self) -> Result<TokenState> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let _state_guard = self.state_guard.lock().await;
				let current = self
					.store
					.load()
					.await
					.map_err(|e| {
						self.refresh_metrics.record_failure();

						Error::from(e)
					})?
					.ok_or_else(|| {
						self.refresh_metrics.record_failure();

						Error::MissingCredential { field: "refresh_token" }
					})?;
				let rotated = match self.refresh_attempt(&current).await {
					Ok(state) => state,
					Err(e) => {
						self.refresh_metrics.record_failure();

						return Err(e);
					},
				};

				if let Err(e) = self.store.save(rotated.clone()).await {
					self.refresh_metrics.record_failure();

					return Err(e.into());
				}

				self.refresh_metrics.record_success();

				Ok(rotated)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn refresh_attempt(&self, current: &TokenState) -> Result<TokenState> {
		let context = SignContext {
			token: Some(current.refresh_token.expose()),
			shop_id: Some(current.shop_id),
			..Default::default()
		};
		let body = serde_json::json!({
			"partner_id": self.credentials.partner_id,
			"shop_id": current.shop_id,
			"refresh_token": current.refresh_token.expose(),
		});
		let (status, value, signed) =
			self.signed_call(Operation::TokenRefresh, context, None, body).await?;
		let pair = common::token_pair_or_rejection(status, &value, &signed)?;

		Ok(current.rotated(pair.access_token, pair.refresh_token, OffsetDateTime::now_utc()))
	}

	/// Runs the optional periodic refresh loop.
	///
	/// Wakes on `every`, refreshes only when a stored state (and thus a refresh token) is
	/// present, and shares the state guard with the request path. Failures surface through
	/// metrics and tracing; the loop itself never stops.
	pub async fn run_refresh_daemon(&self, every: StdDuration) {
		loop {
			tokio::time::sleep(every).await;

			match self.store.load().await {
				Ok(Some(_)) =>
					if let Err(_e) = self.refresh().await {
						#[cfg(feature = "tracing")]
						tracing::warn!(error = %_e, "Scheduled token refresh failed.");
					},
				Ok(None) => {},
				Err(_e) => {
					#[cfg(feature = "tracing")]
					tracing::warn!(error = %_e, "Token store read failed in the refresh daemon.");
				},
			}
		}
	}
}
