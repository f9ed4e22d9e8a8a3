use std::fmt;
use std::str::FromStr;

use crate::protocol::ParseError;

/// 48-bit hardware address. The sole identity key for a client:
/// equality and ordering follow the integer value of the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn to_u64(self) -> u64 {
        self.0.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
    }
}

impl FromStr for MacAddr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');

        for octet in &mut octets {
            let part = parts
                .next()
                .ok_or_else(|| ParseError::BadMac(s.to_string()))?;
            *octet =
                u8::from_str_radix(part, 16).map_err(|_| ParseError::BadMac(s.to_string()))?;
        }

        if parts.next().is_some() {
            return Err(ParseError::BadMac(s.to_string()));
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}
