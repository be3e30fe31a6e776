//! Rust’s turnkey marketplace partner-API broker—HMAC-signed requests, durable shop token
//! lifecycles, and cursor-paginated data pulls in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod pull;
pub mod report;
pub mod sign;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::time::Duration as StdDuration;
	// self
	use crate::{
		auth::{Credentials, PartnerId},
		flows::Broker,
		http::ReqwestTransport,
		provider::{MarketplaceDescriptor, MarketplaceQuirks},
		store::{MemoryStore, TokenStore},
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestTransport>;

	/// Partner identifier shared by test fixtures.
	pub const TEST_PARTNER_ID: u64 = 123456;
	/// Partner signing key shared by test fixtures.
	pub const TEST_PARTNER_KEY: &str = "test-partner-key";

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Builds a descriptor for a mock server, with the inter-page and inter-call pauses
	/// disabled so paginated tests run instantly.
	pub fn test_descriptor(base_url: &str) -> MarketplaceDescriptor {
		let host = Url::parse(base_url).expect("Mock server URL should parse successfully.");
		let quirks = MarketplaceQuirks {
			page_delay: StdDuration::ZERO,
			detail_delay: StdDuration::ZERO,
			..Default::default()
		};

		MarketplaceDescriptor::builder(host)
			.quirks(quirks)
			.build()
			.expect("Test descriptor should build successfully.")
	}

	/// Constructs a [`Broker`] backed by an in-memory store, fixture credentials, and the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_broker(
		descriptor: MarketplaceDescriptor,
	) -> (ReqwestTestBroker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let credentials = Credentials::new(PartnerId::new(TEST_PARTNER_ID), TEST_PARTNER_KEY);
		let broker =
			Broker::with_transport(store, descriptor, credentials, test_reqwest_transport());

		(broker, store_backend)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use partner_broker as _;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
