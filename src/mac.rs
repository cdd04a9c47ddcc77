use std::{fmt, str::FromStr};

use macaddr::MacAddr6;

use crate::ChangeMacError;

/// A six byte hardware address.
///
/// Always rendered as `xx:xx:xx:xx:xx:xx` in lowercase. Parsing accepts either
/// `:` or `-` as the group separator, in any letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(MacAddr6);

impl MacAddress {
    pub fn new(bytes: [u8; 6]) -> Self {
        MacAddress(MacAddr6::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn octets(&self) -> [u8; 6] {
        let mut octets = [0u8; 6];
        octets.copy_from_slice(self.0.as_bytes());
        octets
    }

    /// Second least significant bit of the first octet set.
    pub fn is_locally_administered(&self) -> bool {
        self.octets()[0] & 0b10 != 0
    }

    pub fn is_multicast(&self) -> bool {
        self.octets()[0] & 0b1 != 0
    }
}

pub fn parse_mac(text: &str) -> Result<MacAddress, ChangeMacError> {
    text.parse()
}

impl FromStr for MacAddress {
    type Err = ChangeMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChangeMacError::InvalidFormat(s.to_owned());

        let text = s.trim();
        let separator = if text.contains(':') { ':' } else { '-' };

        let mut bytes = [0u8; 6];
        let mut groups = text.split(separator);
        for byte in bytes.iter_mut() {
            let group = groups.next().ok_or_else(invalid)?;
            // from_str_radix alone would let "+a" or "a" through
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
        }
        if groups.next().is_some() {
            return Err(invalid());
        }

        Ok(MacAddress::new(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, byte) in self.as_bytes().iter().enumerate() {
            if index > 0 {
                write!(f, ":{byte:02x}")?;
            } else {
                write!(f, "{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress::new(bytes)
    }
}

impl From<MacAddr6> for MacAddress {
    fn from(value: MacAddr6) -> Self {
        MacAddress(value)
    }
}

impl From<MacAddress> for MacAddr6 {
    fn from(value: MacAddress) -> Self {
        value.0
    }
}
