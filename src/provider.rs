//! Marketplace descriptor: host, endpoint path table, and provider quirks.
//!
//! The descriptor is validated once at construction and consumed immutably by every flow,
//! so endpoint-specific details (paths, pauses, the code-decode shim) are configuration
//! rather than call-site string formatting.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, sign::Operation};

/// Validated description of the upstream marketplace deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketplaceDescriptor {
	/// HTTPS base the partner API is served from.
	pub host: Url,
	/// Endpoint paths keyed by operation.
	pub endpoints: EndpointTable,
	/// Provider-specific behavior toggles.
	pub quirks: MarketplaceQuirks,
}
impl MarketplaceDescriptor {
	/// Creates a new builder for the provided host.
	pub fn builder(host: Url) -> MarketplaceDescriptorBuilder {
		MarketplaceDescriptorBuilder::new(host)
	}

	/// Returns the path signed and called for `operation`.
	pub fn path(&self, operation: Operation) -> &str {
		self.endpoints.path(operation)
	}
}

/// Endpoint paths for each signed operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointTable {
	/// Browser-facing shop authorization entry point.
	pub shop_authorize: String,
	/// Authorization-code exchange endpoint.
	pub code_exchange: String,
	/// Refresh-token rotation endpoint.
	pub token_refresh: String,
	/// Order listing endpoint.
	pub order_list: String,
	/// Order detail endpoint.
	pub order_detail: String,
	/// Escrow detail endpoint.
	pub escrow_detail: String,
}
impl EndpointTable {
	/// Returns the path for `operation`.
	pub fn path(&self, operation: Operation) -> &str {
		match operation {
			Operation::ShopAuthorize => &self.shop_authorize,
			Operation::CodeExchange => &self.code_exchange,
			Operation::TokenRefresh => &self.token_refresh,
			Operation::OrderList => &self.order_list,
			Operation::OrderDetail => &self.order_detail,
			Operation::EscrowDetail => &self.escrow_detail,
		}
	}
}
impl Default for EndpointTable {
	fn default() -> Self {
		Self {
			shop_authorize: "/api/v2/shop/auth_partner".into(),
			code_exchange: "/api/v2/auth/token/get".into(),
			token_refresh: "/api/v2/auth/access_token/get".into(),
			order_list: "/api/v2/order/get_order_list".into(),
			order_detail: "/api/v2/order/get_order_detail".into(),
			escrow_detail: "/api/v2/payment/get_escrow_detail".into(),
		}
	}
}

/// Fallback policy for authorization codes that may arrive hex-encoded.
///
/// Upstream redirect behavior has been inconsistent across integrations, so the default
/// is a compatibility shim pending clarification from the provider, not settled behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CodeDecodePolicy {
	/// Attempt the code exactly as received, then retry a hex-decoded variant once after
	/// a signature-class rejection.
	#[default]
	RawThenHex,
	/// Only ever attempt the code exactly as received.
	RawOnly,
}

/// Provider-specific behavior toggles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketplaceQuirks {
	/// Hex fallback policy for authorization codes.
	pub code_decode_policy: CodeDecodePolicy,
	/// Records requested per listing page.
	pub page_size: u32,
	/// Fixed pause between listing pages; rate-limit respect, not a retry policy.
	pub page_delay: StdDuration,
	/// Fixed pause between per-order detail calls.
	pub detail_delay: StdDuration,
}
impl Default for MarketplaceQuirks {
	fn default() -> Self {
		Self {
			code_decode_policy: CodeDecodePolicy::default(),
			page_size: 100,
			page_delay: StdDuration::from_millis(500),
			detail_delay: StdDuration::from_millis(500),
		}
	}
}

/// Error raised while validating a descriptor.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum MarketplaceDescriptorError {
	/// The host must be served over HTTPS.
	#[error("Descriptor host must use https, got `{scheme}`.")]
	InsecureHost {
		/// Scheme found on the provided host URL.
		scheme: String,
	},
	/// Endpoint paths must begin with `/` so they join onto the host cleanly.
	#[error("Endpoint path `{path}` must begin with `/`.")]
	RelativePath {
		/// Offending path value.
		path: String,
	},
}

/// Builder API for assembling marketplace descriptors.
#[derive(Clone, Debug)]
pub struct MarketplaceDescriptorBuilder {
	host: Url,
	endpoints: EndpointTable,
	quirks: MarketplaceQuirks,
}
impl MarketplaceDescriptorBuilder {
	const OPERATIONS: [Operation; 6] = [
		Operation::ShopAuthorize,
		Operation::CodeExchange,
		Operation::TokenRefresh,
		Operation::OrderList,
		Operation::OrderDetail,
		Operation::EscrowDetail,
	];

	fn new(host: Url) -> Self {
		Self { host, endpoints: EndpointTable::default(), quirks: MarketplaceQuirks::default() }
	}

	/// Replaces the endpoint path table.
	pub fn endpoints(mut self, endpoints: EndpointTable) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Replaces the quirk toggles.
	pub fn quirks(mut self, quirks: MarketplaceQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Validates and produces the descriptor.
	pub fn build(self) -> Result<MarketplaceDescriptor, MarketplaceDescriptorError> {
		if self.host.scheme() != "https" {
			return Err(MarketplaceDescriptorError::InsecureHost {
				scheme: self.host.scheme().to_owned(),
			});
		}

		for operation in Self::OPERATIONS {
			let path = self.endpoints.path(operation);

			if !path.starts_with('/') {
				return Err(MarketplaceDescriptorError::RelativePath { path: path.to_owned() });
			}
		}

		Ok(MarketplaceDescriptor {
			host: self.host,
			endpoints: self.endpoints,
			quirks: self.quirks,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn host(value: &str) -> Url {
		Url::parse(value).expect("Host fixture should parse successfully.")
	}

	#[test]
	fn builder_rejects_insecure_hosts() {
		let err = MarketplaceDescriptor::builder(host("http://partner.example.com"))
			.build()
			.expect_err("Plain HTTP hosts should be rejected.");

		assert!(matches!(err, MarketplaceDescriptorError::InsecureHost { .. }));
	}

	#[test]
	fn builder_rejects_relative_endpoint_paths() {
		let endpoints = EndpointTable {
			order_list: "api/v2/order/get_order_list".into(),
			..Default::default()
		};
		let err = MarketplaceDescriptor::builder(host("https://partner.example.com"))
			.endpoints(endpoints)
			.build()
			.expect_err("Relative endpoint paths should be rejected.");

		assert!(matches!(err, MarketplaceDescriptorError::RelativePath { .. }));
	}

	#[test]
	fn default_table_covers_every_operation() {
		let descriptor = MarketplaceDescriptor::builder(host("https://partner.example.com"))
			.build()
			.expect("Default descriptor should build successfully.");

		assert_eq!(descriptor.path(Operation::CodeExchange), "/api/v2/auth/token/get");
		assert_eq!(descriptor.path(Operation::TokenRefresh), "/api/v2/auth/access_token/get");
		assert_eq!(descriptor.path(Operation::OrderList), "/api/v2/order/get_order_list");
		assert_eq!(descriptor.path(Operation::OrderDetail), "/api/v2/order/get_order_detail");
		assert_eq!(descriptor.path(Operation::EscrowDetail), "/api/v2/payment/get_escrow_detail");
		assert_eq!(descriptor.path(Operation::ShopAuthorize), "/api/v2/shop/auth_partner");
		assert_eq!(descriptor.quirks.page_size, 100);
	}
}
