//! Cursor-paginated listing walks with partial-result tolerance.
//!
//! The upstream listing endpoints wrap their records in an envelope
//! `{"response": {<records>, "more", "next_cursor"}}`. The walk keeps collecting while
//! `more` holds and a continuation cursor is present; an envelope missing the `response`
//! field (or a cursor while `more` is set) ends the walk with whatever has been
//! accumulated instead of failing the caller. Transport and signing failures stay fatal.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	flows::{Broker, common::BearerParams},
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	sign::{Operation, SignContext},
};

/// Time window field selectors accepted by the order-list endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeRangeField {
	/// Filter by order creation time.
	#[default]
	CreateTime,
	/// Filter by order update time.
	UpdateTime,
}
impl TimeRangeField {
	/// Returns the wire name of the field.
	pub const fn as_str(self) -> &'static str {
		match self {
			TimeRangeField::CreateTime => "create_time",
			TimeRangeField::UpdateTime => "update_time",
		}
	}
}

/// Query for walking the order-list endpoint.
#[derive(Clone, Debug)]
pub struct OrderListQuery {
	/// Window start, seconds since epoch.
	pub time_from: i64,
	/// Window end, seconds since epoch.
	pub time_to: i64,
	/// Which order timestamp the window filters on.
	pub time_range_field: TimeRangeField,
	/// Optional upstream status filter.
	pub order_status: Option<String>,
}
impl OrderListQuery {
	/// Creates a query over the provided window, filtering on creation time.
	pub fn new(time_from: i64, time_to: i64) -> Self {
		Self {
			time_from,
			time_to,
			time_range_field: TimeRangeField::default(),
			order_status: None,
		}
	}

	/// Switches the timestamp field the window filters on.
	pub fn with_time_range_field(mut self, field: TimeRangeField) -> Self {
		self.time_range_field = field;

		self
	}

	/// Restricts results to a single upstream order status.
	pub fn with_order_status(mut self, status: impl Into<String>) -> Self {
		self.order_status = Some(status.into());

		self
	}

	fn body(&self, page_size: u32) -> Map<String, Value> {
		let mut body = Map::new();

		body.insert("time_range_field".into(), self.time_range_field.as_str().into());
		body.insert("time_from".into(), self.time_from.into());
		body.insert("time_to".into(), self.time_to.into());
		body.insert("page_size".into(), page_size.into());

		if let Some(status) = &self.order_status {
			body.insert("order_status".into(), status.as_str().into());
		}

		body
	}
}

impl<C> Broker<C>
where
	C: ?Sized + ApiTransport,
{
	/// Collects every order across all pages of the listing endpoint, in page order.
	pub async fn fetch_all(&self, query: &OrderListQuery) -> Result<Vec<Value>> {
		const KIND: FlowKind = FlowKind::FetchAll;

		let span = FlowSpan::new(KIND, "fetch_all");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(self.fetch_all_pages(
				Operation::OrderList,
				query.body(self.descriptor.quirks.page_size),
				"order_list",
			))
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	pub(crate) async fn fetch_all_pages(
		&self,
		operation: Operation,
		base_body: Map<String, Value>,
		listing_field: &str,
	) -> Result<Vec<Value>> {
		let state = self.require_state().await?;
		let mut collected = Vec::new();
		let mut cursor: Option<String> = None;

		loop {
			let mut body = base_body.clone();

			if let Some(cursor) = &cursor {
				body.insert("cursor".into(), cursor.as_str().into());
			}

			let context = SignContext {
				token: Some(state.access_token.expose()),
				shop_id: Some(state.shop_id),
				..Default::default()
			};
			let bearer = BearerParams {
				access_token: state.access_token.expose(),
				shop_id: state.shop_id,
			};
			let (_status, value, _signed) =
				self.signed_call(operation, context, Some(bearer), Value::Object(body)).await?;
			let Some(envelope) = value.get("response") else {
				// Partial results beat a failed pull; the caller sees what arrived.
				break;
			};

			if let Some(records) = envelope.get(listing_field).and_then(Value::as_array) {
				collected.extend(records.iter().cloned());
			}
			if !envelope.get("more").and_then(Value::as_bool).unwrap_or(false) {
				break;
			}

			cursor = match envelope.get("next_cursor").and_then(Value::as_str) {
				Some(next) => Some(next.to_owned()),
				None => break,
			};

			if !self.descriptor.quirks.page_delay.is_zero() {
				tokio::time::sleep(self.descriptor.quirks.page_delay).await;
			}
		}

		Ok(collected)
	}

	/// Executes one signed detail call and returns its `response` envelope, if present.
	pub(crate) async fn fetch_envelope(
		&self,
		operation: Operation,
		body: Value,
	) -> Result<Option<Value>> {
		let state = self.require_state().await?;
		let context = SignContext {
			token: Some(state.access_token.expose()),
			shop_id: Some(state.shop_id),
			..Default::default()
		};
		let bearer = BearerParams {
			access_token: state.access_token.expose(),
			shop_id: state.shop_id,
		};
		let (_status, value, _signed) =
			self.signed_call(operation, context, Some(bearer), body).await?;

		Ok(value.get("response").cloned())
	}
}
