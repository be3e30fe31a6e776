//! Demonstrates exchanging a shop-authorization code for the initial token pair against a
//! mock marketplace, persisting the pair through the in-memory token store.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use partner_broker::{
	auth::{Credentials, PartnerId, ShopId},
	flows::Broker,
	http::ReqwestTransport,
	provider::MarketplaceDescriptor,
	reqwest::Client,
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v2/auth/token/get");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"expire_in\":14400}",
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
	let state = broker.exchange_code("demo-authorization-code", ShopId::new(77001122)).await?;

	println!("Authorized shop {} at {}.", state.shop_id, state.last_refresh);

	token_mock.assert_async().await;

	Ok(())
}
