//! Validated six-octet hardware addresses.
//!
//! Addresses are accepted as colon- or hyphen-delimited hex strings
//! (`aa:bb:cc:dd:ee:ff`, `AA-BB-CC-DD-EE-FF`) or as exactly six raw bytes.
//! Malformed input is rejected, never coerced.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Number of octets in an IEEE 802 MAC-48 address.
pub const MAC_LEN: usize = 6;

/// An IEEE 802 hardware address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; MAC_LEN]);

impl MacAddress {
    pub const fn new(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }

    /// Parse a colon- or hyphen-delimited hex address.
    ///
    /// Each of the six components must be one or two hex digits and a single
    /// delimiter kind must be used throughout.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidAddressFormat(input.to_owned());

        let delimiter = match (input.contains(':'), input.contains('-')) {
            (true, false) => ':',
            (false, true) => '-',
            _ => return Err(invalid()),
        };

        let mut octets = [0u8; MAC_LEN];
        let mut count = 0;
        for part in input.split(delimiter) {
            if count == MAC_LEN
                || part.is_empty()
                || part.len() > 2
                || !part.bytes().all(|b| b.is_ascii_hexdigit())
            {
                return Err(invalid());
            }
            octets[count] = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
            count += 1;
        }

        if count != MAC_LEN {
            return Err(invalid());
        }
        Ok(Self(octets))
    }

    /// Build an address from a raw byte field, which must be exactly six bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let octets: [u8; MAC_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidAddressFormat(format!(
                "expected {MAC_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(octets))
    }

    pub const fn octets(&self) -> [u8; MAC_LEN] {
        self.0
    }

    /// Organizationally unique identifier: the first three octets.
    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    /// Lower-case, colon-delimited form.
    pub fn to_canonical_string(&self) -> String {
        self.to_string()
    }

    /// Locally administered bit set, as used by randomised client addresses.
    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&[u8]> for MacAddress {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl From<[u8; MAC_LEN]> for MacAddress {
    fn from(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }
}
