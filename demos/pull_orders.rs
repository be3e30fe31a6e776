//! Demonstrates a cursor-paginated order pull against a mock marketplace, flattening the
//! records and writing the flat-file report.

// std
use std::{env, sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use time::OffsetDateTime;
use url::Url;
// self
use partner_broker::{
	auth::{Credentials, PartnerId, ShopId, TokenState},
	flows::{Broker, OrderListQuery},
	http::ReqwestTransport,
	provider::{MarketplaceDescriptor, MarketplaceQuirks},
	report::CsvFile,
	reqwest::Client,
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());

	store
		.save(TokenState::new(
			ShopId::new(77001122),
			"demo-access",
			"demo-refresh",
			OffsetDateTime::now_utc(),
		))
		.await?;

	let server = MockServer::start_async().await;
	let first_page = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v2/order/get_order_list").json_body(json!({
				"time_range_field": "create_time",
				"time_from": 0,
				"time_to": 2_000_000_000,
				"page_size": 100,
			}));
			then.status(200).header("content-type", "application/json").json_body(json!({
				"response": {
					"order_list": [
						{
							"order_sn": "SN-00001",
							"region": "SG",
							"order_status": "COMPLETED",
							"total_amount": 128.5,
							"create_time": 1_767_312_000,
							"update_time": 1_767_398_400,
						},
					],
					"more": true,
					"next_cursor": "cursor-1",
				},
			}));
		})
		.await;
	let last_page = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v2/order/get_order_list")
				.json_body_includes("{\"cursor\": \"cursor-1\"}");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"response": {
					"order_list": [
						{
							"order_sn": "SN-00002",
							"region": "MY",
							"order_status": "READY_TO_SHIP",
							"total_amount": 42.0,
							"create_time": 1_767_312_000,
							"update_time": 1_767_398_400,
						},
					],
					"more": false,
				},
			}));
		})
		.await;
	let quirks = MarketplaceQuirks { page_delay: Duration::from_millis(50), ..Default::default() };
	let descriptor = MarketplaceDescriptor::builder(Url::parse(&server.base_url())?)
		.quirks(quirks)
		.build()?;
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let credentials = Credentials::new(PartnerId::new(123456), "demo-partner-key");
	let broker = Broker::with_transport(store, descriptor, credentials, transport);
	let rows = broker.pull_orders(&OrderListQuery::new(0, 2_000_000_000)).await?;
	let report_path = env::temp_dir().join("partner_broker_demo_orders.csv");

	CsvFile::new(&report_path).write_records(&rows)?;

	println!("Wrote {} order rows to {}.", rows.len(), report_path.display());

	first_page.assert_async().await;
	last_page.assert_async().await;

	Ok(())
}
