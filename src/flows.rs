//! High-level flow orchestrators built around the broker.

pub mod common;
pub mod exchange;
pub mod fetch;
pub mod refresh;

pub use fetch::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenState},
	http::ApiTransport,
	provider::MarketplaceDescriptor,
	sign::Clock,
	store::TokenStore,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport.
pub type ReqwestBroker = Broker<ReqwestTransport>;

/// Coordinates signed flows against a single marketplace descriptor.
///
/// The broker owns the transport, token store, descriptor, credentials, and clock so
/// individual flows can focus on endpoint semantics (code exchange, refresh rotation,
/// cursor walks). Every read-modify-persist of the token state is serialized through one
/// async guard shared by the request path and the refresh daemon, so a refresh in flight
/// can never interleave with another exchange or rotation.
#[derive(Clone)]
pub struct Broker<C>
where
	C: ?Sized + ApiTransport,
{
	/// Transport used for every outbound call.
	pub transport: Arc<C>,
	/// Store that persists the shop's token state.
	pub store: Arc<dyn TokenStore>,
	/// Marketplace host, endpoint table, and quirks.
	pub descriptor: MarketplaceDescriptor,
	/// Injected application credentials.
	pub credentials: Credentials,
	/// Clock used to stamp every signature.
	pub clock: Clock,
	/// Shared metrics recorder for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	pub(crate) state_guard: Arc<AsyncMutex<()>>,
}
impl<C> Broker<C>
where
	C: ?Sized + ApiTransport,
{
	/// Creates a broker that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn TokenStore>,
		descriptor: MarketplaceDescriptor,
		credentials: Credentials,
		transport: impl Into<Arc<C>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			descriptor,
			credentials,
			clock: Clock::system(),
			refresh_metrics: Default::default(),
			state_guard: Default::default(),
		}
	}

	/// Replaces the signing clock (skew offsets, fixed test clocks).
	pub fn with_clock(mut self, clock: Clock) -> Self {
		self.clock = clock;

		self
	}

	/// Loads the current token state, failing when the shop has not authorized yet.
	pub(crate) async fn require_state(&self) -> Result<TokenState> {
		self.store.load().await?.ok_or(Error::MissingCredential { field: "access_token" })
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestTransport> {
	/// Creates a broker provisioning its own reqwest transport with the default bounded
	/// timeout.
	pub fn new(
		store: Arc<dyn TokenStore>,
		descriptor: MarketplaceDescriptor,
		credentials: Credentials,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_transport(store, descriptor, credentials, ReqwestTransport::new()?))
	}
}
impl<C> Debug for Broker<C>
where
	C: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("credentials", &self.credentials)
			.finish()
	}
}
