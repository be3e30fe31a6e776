//! Durable token state for an authorized shop.

// crates.io
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{
	_prelude::*,
	auth::{ShopId, TokenSecret},
};

/// Human-readable UTC timestamp layout shared by the token file and report rows.
pub(crate) const HUMAN_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Durable access/refresh token pair for a single shop.
///
/// The upstream issues both tokens together, so the pair is only ever replaced as a unit:
/// [`TokenState::rotated`] is the sole way to derive a successor state. The serde layout
/// is the operator-facing token file contract (`shop_id`, `access_token`, `refresh_token`,
/// `last_refresh`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
	/// Shop the pair was issued for.
	pub shop_id: ShopId,
	/// Current access token.
	pub access_token: TokenSecret,
	/// Current refresh token.
	pub refresh_token: TokenSecret,
	/// Instant the pair was last issued or rotated.
	#[serde(with = "last_refresh")]
	pub last_refresh: OffsetDateTime,
}
impl TokenState {
	/// Builds the initial state from a freshly exchanged token pair.
	pub fn new(
		shop_id: ShopId,
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		last_refresh: OffsetDateTime,
	) -> Self {
		Self {
			shop_id,
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			last_refresh: truncate(last_refresh),
		}
	}

	/// Replaces both tokens with a freshly issued pair.
	pub fn rotated(
		&self,
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		at: OffsetDateTime,
	) -> Self {
		Self::new(self.shop_id, access_token, refresh_token, at)
	}
}

// The persisted layout keeps `last_refresh` whole-second so the token file stays readable
// and round-trips exactly.
fn truncate(instant: OffsetDateTime) -> OffsetDateTime {
	instant.replace_nanosecond(0).unwrap_or(instant)
}

mod last_refresh {
	// crates.io
	use serde::{
		Deserialize, Deserializer, Serializer, de::Error as DeError, ser::Error as SerError,
	};
	use time::{OffsetDateTime, PrimitiveDateTime};
	// self
	use super::HUMAN_TIME_FORMAT;

	pub(super) fn serialize<S>(instant: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let rendered = instant.format(HUMAN_TIME_FORMAT).map_err(S::Error::custom)?;

		serializer.serialize_str(&rendered)
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		PrimitiveDateTime::parse(&raw, HUMAN_TIME_FORMAT)
			.map(PrimitiveDateTime::assume_utc)
			.map_err(D::Error::custom)
	}
}
