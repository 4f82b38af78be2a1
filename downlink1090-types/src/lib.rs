//! Value types shared between the 1090 MHz downlink decoder and its
//! consumers: transponder addresses, Mode A codes and WGS84 positions.

use std::{
    fmt::{
        Debug,
        Display,
    },
    str::FromStr,
};

use serde::{
    Deserialize,
    Serialize,
};
use serde_with::{
    DeserializeFromStr,
    SerializeDisplay,
};

/// How the 24-bit address of a downlink frame is to be interpreted.
///
/// The 24 bits alone are not a unique aircraft key: DF18 frames with a code
/// format of 2 or above carry addresses assigned by TIS-B or ADS-R ground
/// services that may collide with ICAO-assigned ones. Per-aircraft state is
/// therefore keyed by address *and* qualifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressQualifier {
    #[default]
    Icao24,
    TisbIcao,
    TisbOther,
    AdsR,
}

impl AddressQualifier {
    /// Single-letter prefix used in the textual address form. ICAO24
    /// addresses carry no prefix.
    pub fn prefix(&self) -> Option<char> {
        match self {
            AddressQualifier::Icao24 => None,
            AddressQualifier::TisbIcao => Some('t'),
            AddressQualifier::TisbOther => Some('~'),
            AddressQualifier::AdsR => Some('r'),
        }
    }

    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            't' => Some(AddressQualifier::TisbIcao),
            '~' => Some(AddressQualifier::TisbOther),
            'r' => Some(AddressQualifier::AdsR),
            _ => None,
        }
    }
}

/// A qualified 24-bit transponder address.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Address {
    address: u32,
    qualifier: AddressQualifier,
}

impl Address {
    pub const fn from_u32_unchecked(address: u32) -> Self {
        Self {
            address,
            qualifier: AddressQualifier::Icao24,
        }
    }

    pub fn from_u32(address: u32) -> Option<Self> {
        (address < 0x1000000).then(|| Self::from_u32_unchecked(address))
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::from_u32_unchecked(
            ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32),
        )
    }

    pub const fn with_qualifier(self, qualifier: AddressQualifier) -> Self {
        Self {
            address: self.address,
            qualifier,
        }
    }

    pub fn qualifier(&self) -> AddressQualifier {
        self.qualifier
    }

    pub fn as_u32(&self) -> u32 {
        self.address
    }

    pub fn as_bytes(&self) -> [u8; 3] {
        let b = self.address.to_be_bytes();
        [b[1], b[2], b[3]]
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(prefix) = self.qualifier.prefix() {
            write!(f, "{prefix}")?;
        }
        write!(f, "{:06x}", self.address)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || {
            AddressFromStrError {
                input: s.to_owned(),
            }
        };

        let mut digits = s;
        let mut qualifier = AddressQualifier::Icao24;
        if let Some(first) = s.chars().next() {
            if let Some(q) = AddressQualifier::from_prefix(first) {
                qualifier = q;
                digits = &s[first.len_utf8()..];
            }
        }

        let address = u32::from_str_radix(digits, 16).map_err(|_| err())?;
        Ok(Self::from_u32(address).ok_or_else(err)?.with_qualifier(qualifier))
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("Invalid transponder address: {input}")]
pub struct AddressFromStrError {
    pub input: String,
}

impl From<Address> for u32 {
    fn from(value: Address) -> Self {
        value.address
    }
}

/// A 4-digit octal Mode A (squawk) code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Squawk {
    code: u16,
}

impl Squawk {
    pub const VFR_STANDARD: Self = Self::from_u16_unchecked(0o700);
    pub const AIRCRAFT_HIJACKING: Self = Self::from_u16_unchecked(0o7500);
    pub const RADIO_FAILURE: Self = Self::from_u16_unchecked(0o7600);
    pub const EMERGENCY: Self = Self::from_u16_unchecked(0o7700);

    pub const fn from_u16_unchecked(code: u16) -> Self {
        Self { code }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        (code < 0o10000).then(|| Self::from_u16_unchecked(code))
    }

    pub fn as_u16(&self) -> u16 {
        self.code
    }
}

impl Display for Squawk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04o}", self.code)
    }
}

impl Debug for Squawk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Squawk({:04o})", self.code)
    }
}

impl FromStr for Squawk {
    type Err = SquawkFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || {
            SquawkFromStrError {
                input: s.to_owned(),
            }
        };
        let code = u16::from_str_radix(s, 8).map_err(|_| err())?;
        Self::from_u16(code).ok_or_else(err)
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("Invalid squawk code: {input}")]
pub struct SquawkFromStrError {
    pub input: String,
}

impl From<Squawk> for u16 {
    fn from(value: Squawk) -> Self {
        value.code
    }
}

/// How the altitude of a [`Position`] is referenced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AltitudeType {
    BarometricAltitude,
    AboveWgs84Ellipsoid,
    AboveGroundLevel,
}

/// A WGS84 position with optional altitude in feet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub altitude_type: AltitudeType,
}

impl Position {
    /// A bare latitude/longitude pair, e.g. a receiver location.
    pub fn from_lat_lon(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            altitude_type: AltitudeType::AboveWgs84Ellipsoid,
        }
    }
}

/// Decode a hex string into bytes. Returns `None` for odd lengths or
/// non-hex characters.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }

    hex.as_bytes()
        .chunks(2)
        .map(|pair| Some(hex_digit(pair[0])? << 4 | hex_digit(pair[1])?))
        .collect()
}

pub fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Address,
        AddressQualifier,
        Squawk,
        hex_decode,
        hex_encode,
    };

    #[test]
    fn address_display_round_trip() {
        let address = Address::from_u32_unchecked(0x4840d6);
        assert_eq!(address.to_string(), "4840d6");
        assert_eq!("4840d6".parse::<Address>().unwrap(), address);

        let tisb = address.with_qualifier(AddressQualifier::TisbOther);
        assert_eq!(tisb.to_string(), "~4840d6");
        assert_eq!("~4840d6".parse::<Address>().unwrap(), tisb);
        assert_ne!(tisb, address);
    }

    #[test]
    fn address_rejects_out_of_range() {
        assert!(Address::from_u32(0x1000000).is_none());
        assert!("1000000".parse::<Address>().is_err());
        assert!("xyz".parse::<Address>().is_err());
    }

    #[test]
    fn squawk_is_octal() {
        assert_eq!(Squawk::EMERGENCY.to_string(), "7700");
        assert_eq!("7500".parse::<Squawk>().unwrap(), Squawk::AIRCRAFT_HIJACKING);
        assert!("7800".parse::<Squawk>().is_err());
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(hex_decode("4840D6"), Some(vec![0x48, 0x40, 0xd6]));
        assert_eq!(hex_decode("odd"), None);
        assert_eq!(hex_decode("zz"), None);
        assert_eq!(hex_encode(&[0x48, 0x40, 0xd6]), "4840d6");
    }
}
