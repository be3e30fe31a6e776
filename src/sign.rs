//! Request signing: canonical base-string templates and HMAC-SHA256 digests.
//!
//! Every upstream call authenticates through a keyed hash over an endpoint-specific
//! concatenation of fields. The field orders live in one declarative table
//! ([`SignatureTemplate::fields`]) consumed by a single entry point ([`Signer::sign`]), so
//! each endpoint's construction rule is defined once and testable in isolation. A single
//! byte of drift in the base string invalidates the signature upstream.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, ShopId},
	error::ConfigError,
};

type HmacSha256 = Hmac<Sha256>;

/// Computes the lowercase hex HMAC-SHA256 digest of `message` under `key`.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
	let mut mac =
		HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts keys of any length.");

	mac.update(message);

	hex::encode(mac.finalize().into_bytes())
}

/// Upstream operations the broker signs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Browser-facing shop authorization entry point.
	ShopAuthorize,
	/// Authorization-code exchange at the token endpoint.
	CodeExchange,
	/// Refresh-token rotation at the access-token endpoint.
	TokenRefresh,
	/// Cursor-paginated order listing.
	OrderList,
	/// Order detail lookup.
	OrderDetail,
	/// Escrow/settlement detail lookup.
	EscrowDetail,
}
impl Operation {
	/// Returns the base-string template this operation signs with.
	///
	/// Code exchange signs without the shop identifier even though the caller knows it;
	/// appending it is rejected upstream.
	pub const fn template(self) -> SignatureTemplate {
		match self {
			Operation::ShopAuthorize => SignatureTemplate::Public,
			Operation::CodeExchange => SignatureTemplate::CodeExchange,
			Operation::TokenRefresh
			| Operation::OrderList
			| Operation::OrderDetail
			| Operation::EscrowDetail => SignatureTemplate::ShopToken,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::ShopAuthorize => "shop_authorize",
			Operation::CodeExchange => "code_exchange",
			Operation::TokenRefresh => "token_refresh",
			Operation::OrderList => "order_list",
			Operation::OrderDetail => "order_detail",
			Operation::EscrowDetail => "escrow_detail",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical field orders for each endpoint class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureTemplate {
	/// `partner_id + path + timestamp` for unauthenticated calls.
	Public,
	/// `partner_id + path + timestamp + code`; the shop identifier is never appended.
	CodeExchange,
	/// `partner_id + path + timestamp + token + shop_id` for token-bearing calls.
	ShopToken,
}
impl SignatureTemplate {
	/// Returns the exact field order concatenated into the base string.
	pub const fn fields(self) -> &'static [BaseField] {
		match self {
			SignatureTemplate::Public =>
				&[BaseField::PartnerId, BaseField::Path, BaseField::Timestamp],
			SignatureTemplate::CodeExchange =>
				&[BaseField::PartnerId, BaseField::Path, BaseField::Timestamp, BaseField::Code],
			SignatureTemplate::ShopToken => &[
				BaseField::PartnerId,
				BaseField::Path,
				BaseField::Timestamp,
				BaseField::Token,
				BaseField::ShopId,
			],
		}
	}
}

/// Individual fields a [`SignatureTemplate`] may reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseField {
	/// Partner identifier from the injected credentials.
	PartnerId,
	/// Endpoint path exactly as requested.
	Path,
	/// Whole-second timestamp.
	Timestamp,
	/// Authorization code, exactly as received.
	Code,
	/// Access or refresh token bound to the call.
	Token,
	/// Shop identifier bound to the call.
	ShopId,
}

/// Per-request values referenced by template fields.
///
/// Supplying a field the template does not reference is harmless; the template decides
/// what enters the base string.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignContext<'a> {
	/// Authorization code for code-exchange calls.
	pub code: Option<&'a str>,
	/// Access or refresh token for token-bearing calls.
	pub token: Option<&'a str>,
	/// Shop identifier for token-bearing calls.
	pub shop_id: Option<ShopId>,
}

/// Signing material for a single call; constructed fresh every time, never cached.
///
/// A signature is only valid for its exact timestamp + path + credential combination.
#[derive(Clone, Debug)]
pub struct SignedRequest {
	/// Endpoint path the signature covers.
	pub path: String,
	/// Whole-second timestamp the signature covers.
	pub timestamp: u32,
	/// Canonical base string that was signed.
	pub base_string: String,
	/// Lowercase hex HMAC-SHA256 signature.
	pub signature: String,
}

/// Borrow-only signing entry point over injected [`Credentials`].
#[derive(Clone, Copy, Debug)]
pub struct Signer<'a> {
	credentials: &'a Credentials,
}
impl<'a> Signer<'a> {
	/// Creates a signer over the provided credentials.
	pub fn new(credentials: &'a Credentials) -> Self {
		Self { credentials }
	}

	/// Builds and signs the canonical base string for `operation`.
	///
	/// Fields the operation's template requires but the context does not supply are
	/// rejected here, before any network traffic.
	pub fn sign(
		&self,
		operation: Operation,
		path: &str,
		timestamp: u32,
		context: SignContext<'_>,
	) -> Result<SignedRequest> {
		let base_string = self.base_string(operation, path, timestamp, context)?;
		let signature =
			hmac_sha256_hex(self.credentials.partner_key.expose(), base_string.as_bytes());

		Ok(SignedRequest { path: path.to_owned(), timestamp, base_string, signature })
	}

	fn base_string(
		&self,
		operation: Operation,
		path: &str,
		timestamp: u32,
		context: SignContext<'_>,
	) -> Result<String> {
		let mut base = String::new();

		for field in operation.template().fields() {
			match field {
				BaseField::PartnerId => base.push_str(&self.credentials.partner_id.to_string()),
				BaseField::Path => base.push_str(path),
				BaseField::Timestamp => base.push_str(&timestamp.to_string()),
				BaseField::Code => base
					.push_str(context.code.ok_or(Error::MissingCredential { field: "code" })?),
				BaseField::Token => base
					.push_str(context.token.ok_or(Error::MissingCredential { field: "token" })?),
				BaseField::ShopId => base.push_str(
					&context
						.shop_id
						.ok_or(Error::MissingCredential { field: "shop_id" })?
						.to_string(),
				),
			}
		}

		Ok(base)
	}
}

/// Second-resolution clock with an injectable skew offset.
///
/// Upstream accepts timestamps only inside its clock-skew window; drift is an operational
/// concern, so the offset is configuration rather than code.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
	offset: Duration,
	fixed: Option<i64>,
}
impl Clock {
	/// System clock without skew adjustment.
	pub const fn system() -> Self {
		Self { offset: Duration::ZERO, fixed: None }
	}

	/// Clock pinned to a fixed instant, for tests and replay.
	pub const fn fixed(unix_seconds: i64) -> Self {
		Self { offset: Duration::ZERO, fixed: Some(unix_seconds) }
	}

	/// Applies a skew offset added to every reading.
	pub const fn with_offset(mut self, offset: Duration) -> Self {
		self.offset = offset;

		self
	}

	/// Returns the current whole-second timestamp, checked against the upstream's 32-bit
	/// field.
	pub fn unix_timestamp(&self) -> Result<u32, ConfigError> {
		let raw = match self.fixed {
			Some(seconds) => seconds,
			None => OffsetDateTime::now_utc().unix_timestamp(),
		} + self.offset.whole_seconds();

		u32::try_from(raw).map_err(|_| ConfigError::TimestampOutOfRange { timestamp: raw })
	}
}
impl Default for Clock {
	fn default() -> Self {
		Self::system()
	}
}
