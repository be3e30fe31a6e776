//! Demonstrates the periodic refresh loop rotating a stored token pair against a mock
//! marketplace, sharing the broker's state guard with the request path.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::OffsetDateTime;
use url::Url;
// self
use partner_broker::{
	auth::{Credentials, PartnerId, ShopId, TokenState},
	flows::Broker,
	http::ReqwestTransport,
	provider::MarketplaceDescriptor,
	reqwest::Client,
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn TokenStore> = store_backend.clone();

	store
		.save(TokenState::new(
			ShopId::new(77001122),
			"demo-access",
			"demo-refresh",
			OffsetDateTime::now_utc(),
		))
		.await?;

	let server = MockServer::start_async().await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v2/auth/access_token/get");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"rotated-access\",\"refresh_token\":\"rotated-refresh\",\"expire_in\":14400}",
			);
		})
		.await;
	let descriptor = MarketplaceDescriptor::builder(Url::parse(&server.base_url())?).build()?;
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let credentials = Credentials::new(PartnerId::new(123456), "demo-partner-key");
	let broker = Broker::with_transport(store, descriptor, credentials, transport);
	let daemon = {
		let broker = broker.clone();

		tokio::spawn(async move { broker.run_refresh_daemon(Duration::from_secs(1)).await })
	};

	tokio::time::sleep(Duration::from_millis(2_500)).await;
	daemon.abort();

	println!(
		"Refresh daemon performed {} rotations ({} failures).",
		broker.refresh_metrics.successes(),
		broker.refresh_metrics.failures(),
	);

	let state = store_backend.load().await?.expect("Seeded state should still be present.");

	println!("Current access token rotated: {}.", state.access_token.expose() == "rotated-access");

	assert!(refresh_mock.hits_async().await >= 1);

	Ok(())
}
