//! Auth-domain identifiers, credentials, and durable token state.

pub mod id;
pub mod secret;
pub mod state;

pub use id::*;
pub use secret::*;
pub use state::*;

/// Immutable application credentials issued by the upstream marketplace.
///
/// Loaded once at startup and injected into the broker and signer explicitly; never a
/// process-wide mutable constant.
#[derive(Clone, Debug)]
pub struct Credentials {
	/// Partner identifier of the calling application.
	pub partner_id: PartnerId,
	/// Partner signing key; redacted from all formatter output.
	pub partner_key: PartnerKey,
}
impl Credentials {
	/// Builds a credentials value from a partner identifier and signing key.
	pub fn new(partner_id: PartnerId, partner_key: impl Into<String>) -> Self {
		Self { partner_id, partner_key: PartnerKey::new(partner_key) }
	}
}
