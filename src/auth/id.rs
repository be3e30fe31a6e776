//! Strongly typed numeric identifiers enforced across the broker domain.

// std
use std::num::ParseIntError;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(u64);
		impl $name {
			/// Wraps a raw numeric identifier.
			pub const fn new(value: u64) -> Self {
				Self(value)
			}

			/// Returns the raw numeric value.
			pub const fn get(self) -> u64 {
				self.0
			}
		}
		impl From<u64> for $name {
			fn from(value: u64) -> Self {
				Self(value)
			}
		}
		impl From<$name> for u64 {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				Display::fmt(&self.0, f)
			}
		}
		impl FromStr for $name {
			type Err = ParseIntError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				s.parse::<u64>().map(Self)
			}
		}
	};
}

def_id! { PartnerId, "Long-lived identifier issued by the upstream marketplace to the calling application." }
def_id! { ShopId, "Identifier of a shop that authorized the calling application." }

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_parse_and_format() {
		let partner: PartnerId = "123456".parse().expect("Numeric identifier should parse.");

		assert_eq!(partner, PartnerId::new(123456));
		assert_eq!(partner.to_string(), "123456");
		assert_eq!(partner.get(), 123456);
		assert!("12ab".parse::<ShopId>().is_err());
		assert!("-7".parse::<ShopId>().is_err());
	}

	#[test]
	fn serde_uses_the_transparent_numeric_form() {
		let shop = ShopId::new(77001122);
		let payload = serde_json::to_string(&shop).expect("Shop identifier should serialize.");

		assert_eq!(payload, "77001122");

		let round_trip: ShopId =
			serde_json::from_str(&payload).expect("Shop identifier should deserialize.");

		assert_eq!(round_trip, shop);
	}
}
