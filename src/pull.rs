//! Typed pull operations flattening upstream order data into report rows.
//!
//! Row shapes mirror the downstream reporting files: order headers, item-level lines, and
//! escrow settlement amounts, all keyed by order serial number. Upstream fields are read
//! leniently; absent values flatten to defaults rather than failing a whole pull.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::state::HUMAN_TIME_FORMAT,
	flows::{Broker, OrderListQuery},
	http::ApiTransport,
	report::TabularRecord,
	sign::Operation,
};

/// Flattened order header row.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OrderRow {
	/// Order serial number.
	pub order_sn: String,
	/// Marketplace region code.
	pub region: String,
	/// Upstream order status.
	pub status: String,
	/// Buyer-paid total.
	pub total_amount: f64,
	/// Creation time, human readable UTC.
	pub create_time: String,
	/// Last update time, human readable UTC.
	pub update_time: String,
}
impl OrderRow {
	fn from_value(value: &Value) -> Self {
		Self {
			order_sn: text(value, "order_sn"),
			region: text(value, "region"),
			status: text(value, "order_status"),
			total_amount: number(value, "total_amount"),
			create_time: human_time(integer(value, "create_time")),
			update_time: human_time(integer(value, "update_time")),
		}
	}
}
impl TabularRecord for OrderRow {
	const HEADER: &'static [&'static str] =
		&["order_sn", "region", "status", "total_amount", "create_time", "update_time"];

	fn fields(&self) -> Vec<String> {
		vec![
			self.order_sn.clone(),
			self.region.clone(),
			self.status.clone(),
			self.total_amount.to_string(),
			self.create_time.clone(),
			self.update_time.clone(),
		]
	}
}

/// Flattened item-level row from the order detail endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OrderItemRow {
	/// Order serial number the item belongs to.
	pub order_sn: String,
	/// Upstream item identifier.
	pub item_id: i64,
	/// Model SKU, when assigned.
	pub sku: String,
	/// Item display name.
	pub name: String,
	/// Purchased quantity.
	pub qty: i64,
	/// Discounted unit price.
	pub price: f64,
	/// Quantity times discounted price.
	pub subtotal: f64,
	/// Upstream order status.
	pub status: String,
	/// Order creation time, human readable UTC.
	pub create_time: String,
}
impl OrderItemRow {
	fn from_values(order: &Value, item: &Value) -> Self {
		let qty = integer(item, "model_quantity_purchased");
		let price = number(item, "model_discounted_price");

		Self {
			order_sn: text(order, "order_sn"),
			item_id: integer(item, "item_id"),
			sku: text(item, "model_sku"),
			name: text(item, "item_name"),
			qty,
			price,
			subtotal: price * qty as f64,
			status: text(order, "order_status"),
			create_time: human_time(integer(order, "create_time")),
		}
	}
}
impl TabularRecord for OrderItemRow {
	const HEADER: &'static [&'static str] = &[
		"order_sn",
		"item_id",
		"sku",
		"name",
		"qty",
		"price",
		"subtotal",
		"status",
		"create_time",
	];

	fn fields(&self) -> Vec<String> {
		vec![
			self.order_sn.clone(),
			self.item_id.to_string(),
			self.sku.clone(),
			self.name.clone(),
			self.qty.to_string(),
			self.price.to_string(),
			self.subtotal.to_string(),
			self.status.clone(),
			self.create_time.clone(),
		]
	}
}

/// Flattened escrow/settlement row from the payment endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EscrowRow {
	/// Order serial number the settlement belongs to.
	pub order_sn: String,
	/// Buyer payment amount.
	pub total_amount: f64,
	/// Marketplace service fee.
	pub service_fee: f64,
	/// Marketplace commission fee.
	pub commission_fee: f64,
	/// Amount released from escrow to the seller.
	pub escrow_amount: f64,
}
impl EscrowRow {
	fn from_envelope(order_sn: &str, envelope: &Value) -> Self {
		let income = envelope.get("order_income_detail").unwrap_or(&Value::Null);

		Self {
			order_sn: order_sn.to_owned(),
			total_amount: number(income, "buyer_payment_amount"),
			service_fee: number(income, "service_fee"),
			commission_fee: number(income, "commission_fee"),
			escrow_amount: number(income, "escrow_amount"),
		}
	}
}
impl TabularRecord for EscrowRow {
	const HEADER: &'static [&'static str] =
		&["order_sn", "total_amount", "service_fee", "commission_fee", "escrow_amount"];

	fn fields(&self) -> Vec<String> {
		vec![
			self.order_sn.clone(),
			self.total_amount.to_string(),
			self.service_fee.to_string(),
			self.commission_fee.to_string(),
			self.escrow_amount.to_string(),
		]
	}
}

impl<C> Broker<C>
where
	C: ?Sized + ApiTransport,
{
	/// Pulls and flattens every order header in the query window.
	pub async fn pull_orders(&self, query: &OrderListQuery) -> Result<Vec<OrderRow>> {
		Ok(self.fetch_all(query).await?.iter().map(OrderRow::from_value).collect())
	}

	/// Pulls item-level rows for the provided orders.
	///
	/// A failing order is skipped rather than failing the pull; the fixed inter-call
	/// pause from the descriptor quirks is applied between orders.
	pub async fn pull_order_items(&self, order_sns: &[String]) -> Result<Vec<OrderItemRow>> {
		let mut rows = Vec::new();

		for (index, order_sn) in order_sns.iter().enumerate() {
			self.detail_pause(index).await;

			let body = serde_json::json!({ "order_sn_list": [order_sn] });
			let envelope = match self.fetch_envelope(Operation::OrderDetail, body).await {
				Ok(Some(envelope)) => envelope,
				Ok(None) => continue,
				Err(_e) => {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						order_sn = %order_sn,
						error = %_e,
						"Order detail pull failed; skipping.",
					);

					continue;
				},
			};

			for order in envelope.get("order_list").and_then(Value::as_array).into_iter().flatten()
			{
				for item in order.get("item_list").and_then(Value::as_array).into_iter().flatten()
				{
					rows.push(OrderItemRow::from_values(order, item));
				}
			}
		}

		Ok(rows)
	}

	/// Pulls escrow settlement rows for the provided orders.
	///
	/// Orders without settlement data (or whose calls fail) are skipped rather than
	/// failing the pull.
	pub async fn pull_escrow(&self, order_sns: &[String]) -> Result<Vec<EscrowRow>> {
		let mut rows = Vec::new();

		for (index, order_sn) in order_sns.iter().enumerate() {
			self.detail_pause(index).await;

			let body = serde_json::json!({ "order_sn": order_sn });

			match self.fetch_envelope(Operation::EscrowDetail, body).await {
				Ok(Some(envelope)) => rows.push(EscrowRow::from_envelope(order_sn, &envelope)),
				Ok(None) => {},
				Err(_e) => {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						order_sn = %order_sn,
						error = %_e,
						"Escrow detail pull failed; skipping.",
					);
				},
			}
		}

		Ok(rows)
	}

	async fn detail_pause(&self, index: usize) {
		if index > 0 && !self.descriptor.quirks.detail_delay.is_zero() {
			tokio::time::sleep(self.descriptor.quirks.detail_delay).await;
		}
	}
}

fn text(value: &Value, key: &str) -> String {
	value.get(key).and_then(Value::as_str).unwrap_or_default().to_owned()
}

fn number(value: &Value, key: &str) -> f64 {
	value.get(key).and_then(Value::as_f64).unwrap_or_default()
}

fn integer(value: &Value, key: &str) -> i64 {
	value.get(key).and_then(Value::as_i64).unwrap_or_default()
}

fn human_time(seconds: i64) -> String {
	OffsetDateTime::from_unix_timestamp(seconds)
		.ok()
		.and_then(|instant| instant.format(HUMAN_TIME_FORMAT).ok())
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn order_rows_flatten_with_lenient_defaults() {
		let value = serde_json::json!({
			"order_sn": "2601159XYZ",
			"region": "SG",
			"order_status": "COMPLETED",
			"total_amount": 128.5,
			"create_time": 1_767_312_000,
		});
		let row = OrderRow::from_value(&value);

		assert_eq!(row.order_sn, "2601159XYZ");
		assert_eq!(row.region, "SG");
		assert_eq!(row.status, "COMPLETED");
		assert_eq!(row.total_amount, 128.5);
		assert_eq!(row.create_time, "2026-01-02 00:00:00");
		// `update_time` was absent upstream; the row renders the epoch default.
		assert_eq!(row.update_time, "1970-01-01 00:00:00");
	}

	#[test]
	fn item_rows_compute_the_subtotal() {
		let order = serde_json::json!({
			"order_sn": "2601159XYZ",
			"order_status": "READY_TO_SHIP",
			"create_time": 1_767_312_000,
		});
		let item = serde_json::json!({
			"item_id": 900_100,
			"model_sku": "SKU-1",
			"item_name": "Widget",
			"model_quantity_purchased": 3,
			"model_discounted_price": 19.9,
		});
		let row = OrderItemRow::from_values(&order, &item);

		assert_eq!(row.order_sn, "2601159XYZ");
		assert_eq!(row.item_id, 900_100);
		assert_eq!(row.qty, 3);
		assert_eq!(row.subtotal, 19.9 * 3.0);
	}

	#[test]
	fn escrow_rows_read_the_income_detail_envelope() {
		let envelope = serde_json::json!({
			"order_income_detail": {
				"buyer_payment_amount": 100.0,
				"service_fee": 2.5,
				"commission_fee": 5.0,
				"escrow_amount": 92.5,
			},
		});
		let row = EscrowRow::from_envelope("2601159XYZ", &envelope);

		assert_eq!(row.order_sn, "2601159XYZ");
		assert_eq!(row.total_amount, 100.0);
		assert_eq!(row.service_fee, 2.5);
		assert_eq!(row.commission_fee, 5.0);
		assert_eq!(row.escrow_amount, 92.5);

		let empty = EscrowRow::from_envelope("2601159XYZ", &serde_json::json!({}));

		assert_eq!(empty.escrow_amount, 0.0);
	}
}
