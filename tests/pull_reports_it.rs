#![cfg(feature = "reqwest")]

// std
use std::{env, fs, process};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use partner_broker::{
	_preludet::*,
	auth::{ShopId, TokenState},
	flows::OrderListQuery,
	report::CsvFile,
	store::TokenStore,
};

const SHOP_ID: u64 = 77001122;

async fn seed_state(store: &impl TokenStore) {
	let state = TokenState::new(
		ShopId::new(SHOP_ID),
		"access-current",
		"refresh-current",
		OffsetDateTime::now_utc(),
	);

	store.save(state).await.expect("Failed to seed token state into the store.");
}

#[tokio::test]
async fn pulled_orders_flatten_and_write_to_csv() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_reqwest_test_broker(test_descriptor(&server.base_url()));

	seed_state(store.as_ref()).await;

	let _orders = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v2/order/get_order_list");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"response": {
					"order_list": [
						{
							"order_sn": "SN-00001",
							"region": "SG",
							"order_status": "COMPLETED",
							"total_amount": 128.5,
							"create_time": 1_767_312_000,
							"update_time": 1_767_312_000,
						},
						{
							"order_sn": "SN-00002",
							"region": "MY",
							"order_status": "READY_TO_SHIP",
							"total_amount": 42.0,
							"create_time": 1_767_312_000,
							"update_time": 1_767_312_000,
						},
					],
					"more": false,
				},
			}));
		})
		.await;
	let rows = broker
		.pull_orders(&OrderListQuery::new(0, 2_000_000_000))
		.await
		.expect("Order pull should succeed.");

	assert_eq!(rows.len(), 2);
	assert_eq!(rows[0].order_sn, "SN-00001");
	assert_eq!(rows[0].create_time, "2026-01-02 00:00:00");
	assert_eq!(rows[1].status, "READY_TO_SHIP");

	let path = env::temp_dir().join(format!(
		"partner_broker_orders_{}_{}.csv",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	));
	let sink = CsvFile::new(&path);

	sink.write_records(&rows).expect("Report write should succeed.");

	let contents = fs::read_to_string(&path).expect("Report file should be readable.");
	let mut lines = contents.lines();

	assert_eq!(
		lines.next(),
		Some("order_sn,region,status,total_amount,create_time,update_time"),
	);
	assert_eq!(
		lines.next(),
		Some("SN-00001,SG,COMPLETED,128.5,2026-01-02 00:00:00,2026-01-02 00:00:00"),
	);

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary report file {}: {e}", path.display())
	});
}

#[tokio::test]
async fn pulled_items_expand_every_item_list_entry() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_reqwest_test_broker(test_descriptor(&server.base_url()));

	seed_state(store.as_ref()).await;

	let detail = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v2/order/get_order_detail")
				.json_body_includes("{\"order_sn_list\": [\"SN-00001\"]}");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"response": {
					"order_list": [{
						"order_sn": "SN-00001",
						"order_status": "COMPLETED",
						"create_time": 1_767_312_000,
						"item_list": [
							{
								"item_id": 900_100,
								"model_sku": "SKU-1",
								"item_name": "Widget",
								"model_quantity_purchased": 3,
								"model_discounted_price": 19.9,
							},
							{
								"item_id": 900_101,
								"model_sku": "SKU-2",
								"item_name": "Bolt",
								"model_quantity_purchased": 10,
								"model_discounted_price": 0.5,
							},
						],
					}],
				},
			}));
		})
		.await;
	let rows = broker
		.pull_order_items(&["SN-00001".to_owned()])
		.await
		.expect("Item pull should succeed.");

	assert_eq!(detail.hits_async().await, 1);
	assert_eq!(rows.len(), 2);
	assert_eq!(rows[0].sku, "SKU-1");
	assert_eq!(rows[0].subtotal, 19.9 * 3.0);
	assert_eq!(rows[1].qty, 10);
}

#[tokio::test]
async fn escrow_pull_skips_orders_without_settlement_data() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_reqwest_test_broker(test_descriptor(&server.base_url()));

	seed_state(store.as_ref()).await;

	let settled = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v2/payment/get_escrow_detail")
				.json_body_includes("{\"order_sn\": \"SN-00001\"}");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"response": {
					"order_income_detail": {
						"buyer_payment_amount": 100.0,
						"service_fee": 2.5,
						"commission_fee": 5.0,
						"escrow_amount": 92.5,
					},
				},
			}));
		})
		.await;
	let pending = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v2/payment/get_escrow_detail")
				.json_body_includes("{\"order_sn\": \"SN-00002\"}");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "error": "error_not_found", "message": "no escrow yet" }));
		})
		.await;
	let rows = broker
		.pull_escrow(&["SN-00001".to_owned(), "SN-00002".to_owned()])
		.await
		.expect("Escrow pull should succeed.");

	assert_eq!(settled.hits_async().await, 1);
	assert_eq!(pending.hits_async().await, 1);
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].order_sn, "SN-00001");
	assert_eq!(rows[0].escrow_amount, 92.5);
}
