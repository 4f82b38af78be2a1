//! Mode S downlink envelope and reply decoding
//!
//! - [ADS-B Reference][1] (page 39 ff) - defines the ADS-B messages and
//!   related Mode-S DFs
//! - [The 1090 Megahertz Riddle][2] - good overview
//!
//! Mode-S defines 2 frame lengths:
//! - short = 56 bits / 7 bytes
//! - long = 112 bits / 14 bytes
//!
//! [1]: http://www.anteni.net/adsb/Doc/1090-WP30-18-DRAFT_DO-260B-V42.pdf
//! [2]: https://mode-s.org/1090mhz/content/mode-s/1-basics.html

use std::fmt::Debug;

use downlink1090_types::{
    Address,
    AddressQualifier,
    Squawk,
    hex_decode,
};

use crate::util::{
    BufReadBytesExt,
    decode_air_air_surveillance_common_fields,
    decode_surveillance_reply_body,
    gillham::{
        decode_gillham_ac13,
        decode_gillham_id13,
    },
    mode_s_checksum,
};

/// Length of a short mode-s frame
pub const LENGTH_SHORT: usize = 7;

/// Length of a long mode-s frame
pub const LENGTH_LONG: usize = 14;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("expected {expected_length} bytes for the frame, but got {buffer_length}")]
    FrameTooShort {
        expected_length: usize,
        buffer_length: usize,
    },

    #[error("bad format: {reason}")]
    BadFormat { reason: String },

    #[error("DF {downlink_format} with first field {first_field} is not specified")]
    UnspecifiedFormat {
        downlink_format: u8,
        first_field: u8,
    },
}

impl DecodeError {
    pub(crate) fn bad_format(reason: impl Into<String>) -> Self {
        Self::BadFormat {
            reason: reason.into(),
        }
    }
}

/// The outer shell of a Mode S reply: downlink format, first field, qualified
/// address and the raw frame bytes.
///
/// The meaning of the first field depends on the DF: CA for DF17, CF for
/// DF18, AF for DF19, reserved otherwise.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    downlink_format: u8,
    first_field: u8,
    address: Address,
    raw: [u8; LENGTH_LONG],
    length: usize,
}

impl Envelope {
    /// Parse a frame of 7 or 14 bytes.
    ///
    /// `address_recovered` indicates that the trailing parity field already
    /// had the CRC subtracted, i.e. for frames that overlay the address onto
    /// the parity it contains the address directly. When false, the checksum
    /// over the frame body is XORed in to recover the address. Inputs of 4 or
    /// 11 bytes are accepted as frames with the parity trailer removed
    /// entirely.
    pub fn parse(bytes: &[u8], address_recovered: bool) -> Result<Self, DecodeError> {
        let (length, trailer_removed) = match bytes.len() {
            LENGTH_SHORT | LENGTH_LONG => (bytes.len(), false),
            4 => (LENGTH_SHORT, true),
            11 => (LENGTH_LONG, true),
            n => {
                return Err(DecodeError::FrameTooShort {
                    expected_length: if n > LENGTH_SHORT {
                        LENGTH_LONG
                    }
                    else {
                        LENGTH_SHORT
                    },
                    buffer_length: n,
                });
            }
        };

        let downlink_format = bytes[0] >> 3;
        let expected_length = if downlink_format < 16 {
            LENGTH_SHORT
        }
        else {
            LENGTH_LONG
        };
        if length != expected_length {
            return Err(DecodeError::FrameTooShort {
                expected_length,
                buffer_length: bytes.len(),
            });
        }

        let mut raw = [0; LENGTH_LONG];
        raw[..bytes.len()].copy_from_slice(bytes);

        let first_field = bytes[0] & 0b111;

        let address = match downlink_format {
            11 | 17..=19 => Address::from_bytes([raw[1], raw[2], raw[3]]),
            _ => {
                // the parity field is the XOR of the checksum and the address
                let ap = [
                    raw[expected_length - 3],
                    raw[expected_length - 2],
                    raw[expected_length - 1],
                ];
                if address_recovered || trailer_removed {
                    Address::from_bytes(ap)
                }
                else {
                    let checksum = mode_s_checksum(&raw[..expected_length - 3]);
                    Address::from_bytes([
                        ap[0] ^ checksum[0],
                        ap[1] ^ checksum[1],
                        ap[2] ^ checksum[2],
                    ])
                }
            }
        };

        let address = if downlink_format == 18 {
            address.with_qualifier(address_qualifier_for_code_format(first_field))
        }
        else {
            address
        };

        Ok(Self {
            downlink_format,
            first_field,
            address,
            raw,
            length: expected_length,
        })
    }

    /// Parse a frame from its hex representation (14 or 28 digits, or 8/22
    /// with the parity trailer removed).
    pub fn parse_hex(frame: &str, address_recovered: bool) -> Result<Self, DecodeError> {
        let bytes = hex_decode(frame.trim())
            .ok_or_else(|| DecodeError::bad_format("frame is not valid hex"))?;
        Self::parse(&bytes, address_recovered)
    }

    pub fn downlink_format(&self) -> u8 {
        self.downlink_format
    }

    pub fn first_field(&self) -> u8 {
        self.first_field
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw[..self.length]
    }

    pub fn frame_length(&self) -> usize {
        self.length
    }

    /// Everything between the header byte and the parity field.
    pub fn payload(&self) -> &[u8] {
        &self.raw[1..self.length - 3]
    }

    /// The 56-bit ME field of extended squitters (DF17/18/19).
    pub fn me(&self) -> &[u8] {
        debug_assert!(matches!(self.downlink_format, 17..=19));
        &self.raw[4..11]
    }

    /// The format type code of the ME field.
    pub fn format_type_code(&self) -> u8 {
        self.me()[0] >> 3
    }
}

impl Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("downlink_format", &self.downlink_format)
            .field("first_field", &self.first_field)
            .field("address", &self.address)
            .field("raw", &downlink1090_types::hex_encode(self.raw()))
            .finish()
    }
}

/// Address interpretation for the DF18 code format (CF) values. CF 0 and 1
/// announce regular ADS-B emitters, everything above comes from TIS-B or
/// ADS-R ground services.
fn address_qualifier_for_code_format(code_format: u8) -> AddressQualifier {
    match code_format {
        0 | 1 => AddressQualifier::Icao24,
        2 | 3 => AddressQualifier::TisbIcao,
        6 => AddressQualifier::AdsR,
        _ => AddressQualifier::TisbOther,
    }
}

/// 3 bit capability value
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capability(u8);

impl Capability {
    /// Signifies Level 1 transponder (surveillance only), and no ability to
    /// set "CA" code 7, and either on the ground or airborne
    pub const LEVEL1_GROUND_AIRBORNE: Self = Self(0b000);

    /// Signifies Level 2 or above transponder, and the ability to set "CA"
    /// code 7, and on the ground
    pub const LEVEL2_GROUND: Self = Self(0b100);

    /// Signifies Level 2 or above transponder, and the ability to set "CA"
    /// code 7, and airborne
    pub const LEVEL2_AIRBORNE: Self = Self(0b101);

    /// Signifies Level 2 or above transponder, and the ability to set "CA"
    /// code 7, and either on the ground or airborne
    pub const LEVEL2_GROUND_AIRBORNE: Self = Self(0b110);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::LEVEL1_GROUND_AIRBORNE => write!(f, "Capability::LEVEL1_GROUND_AIRBORNE"),
            Self::LEVEL2_GROUND => write!(f, "Capability::LEVEL2_GROUND"),
            Self::LEVEL2_AIRBORNE => write!(f, "Capability::LEVEL2_AIRBORNE"),
            Self::LEVEL2_GROUND_AIRBORNE => write!(f, "Capability::LEVEL2_GROUND_AIRBORNE"),
            _ => write!(f, "Capability(0b{:03b})", self.0),
        }
    }
}

/// 3-bit flight status
///
/// <https://mode-s.org/1090mhz/content/mode-s/3-surveillance.html>
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlightStatus(u8);

impl FlightStatus {
    pub const NO_ALERT_NO_SPI_AIRBORNE: Self = Self(0b000);
    pub const NO_ALERT_NO_SPI_GROUND: Self = Self(0b001);
    pub const ALERT_NO_SPI_AIRBORNE: Self = Self(0b010);
    pub const ALERT_NO_SPI_GROUND: Self = Self(0b011);
    pub const ALERT_SPI_AIRBORNE_GROUND: Self = Self(0b100);
    pub const NO_ALERT_SPI_AIRBORNE_GROUND: Self = Self(0b101);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn alert(&self) -> bool {
        matches!(self.0, 0b010 | 0b011 | 0b100)
    }

    pub fn spi(&self) -> bool {
        matches!(self.0, 0b100 | 0b101)
    }

    pub fn ground(&self) -> bool {
        matches!(self.0, 0b001 | 0b011)
    }
}

impl Debug for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FlightStatus(0b{:03b})", self.0)
    }
}

/// 5-bit downlink request
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DownlinkRequest(u8);

impl DownlinkRequest {
    pub const NO_DOWNLINK_REQUEST: Self = Self(0);
    pub const REQUEST_TO_SEND_COMMB_MESSAGE: Self = Self(1);
    pub const COMMB_BROADCAST_MESSAGE1_AVAILABLE: Self = Self(4);
    pub const COMMB_BROADCAST_MESSAGE2_AVAILABLE: Self = Self(5);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11100000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl Debug for DownlinkRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DownlinkRequest({})", self.0)
    }
}

/// 6-bit utility message: the 4-bit interrogator identifier subfield (IIS)
/// followed by the 2-bit reservation type (IDS).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtilityMessage(u8);

impl UtilityMessage {
    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11000000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn interrogator_identifier(&self) -> u8 {
        self.0 >> 2
    }

    /// 0 = no information, 1/2/3 = IIS contains a Comm-B/C/D reservation.
    pub fn reservation_type(&self) -> u8 {
        self.0 & 0b11
    }
}

/// 3-bit ACAS sensitivity level; 0 means ACAS inoperative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SensitivityLevel(u8);

impl SensitivityLevel {
    pub const INOPERATIVE: Self = Self(0);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

/// 4-bit reply information field of the air-air surveillance replies.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyInformation(u8);

impl ReplyInformation {
    pub const NO_OPERATING_ACAS: Self = Self(0b0000);
    pub const ACAS_RESOLUTION_CAPABILITY_INHIBITED: Self = Self(0b0010);
    pub const ACAS_VERTICAL_ONLY_CAPABILITY: Self = Self(0b0011);
    pub const ACAS_VERTICAL_AND_HORIZONTAL_CAPABILITY: Self = Self(0b0111);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11110000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl Debug for ReplyInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReplyInformation({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerticalStatus {
    Airborne,
    Ground,
}

/// 13-bit altitude / Mode C code
///
/// <https://mode-s.org/1090mhz/content/mode-s/3-surveillance.html>
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AltitudeCode(u16);

impl AltitudeCode {
    pub const fn from_u16_unchecked(word: u16) -> Self {
        Self(word)
    }

    pub const fn from_u16(word: u16) -> Option<Self> {
        if word & 0b1110000000000000 == 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn decode(&self) -> Option<Altitude> {
        // note: 11 bits altitude with 25 feet resolution and -1000 feet
        // offset gives a max value of 50175, so the decoded altitude is i32
        if self.0 == 0 || self.0 == 0b1_1111_1111_1111 {
            None
        }
        else {
            // bit  0 1234 5678 9abc
            //      a aaaa amaq aaaa
            let m_bit = self.0 & 0b0_0000_0100_0000 != 0;
            let q_bit = self.0 & 0b0_0000_0001_0000 != 0;

            if m_bit {
                Some(Altitude {
                    altitude: i32::from(
                        ((self.0 & 0b1_1111_1000_0000) >> 1) | (self.0 & 0b0_0000_0011_1111),
                    ),
                    unit: AltitudeUnit::Meter,
                })
            }
            else if q_bit {
                let altitude = i32::from(
                    ((self.0 & 0b1_1111_1000_0000) >> 2)
                        | ((self.0 & 0b0_0000_0010_0000) >> 1)
                        | (self.0 & 0b0_0000_0000_1111),
                );
                Some(Altitude {
                    altitude: 25 * altitude - 1000,
                    unit: AltitudeUnit::Feet,
                })
            }
            else {
                decode_gillham_ac13(self.0).map(|altitude| {
                    Altitude {
                        altitude,
                        unit: AltitudeUnit::Feet,
                    }
                })
            }
        }
    }
}

impl Debug for AltitudeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(decoded) = self.decode() {
            write!(f, "AltitudeCode({} {})", decoded.altitude, decoded.unit.unit_str())
        }
        else {
            write!(f, "AltitudeCode({})", self.0)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Altitude {
    pub altitude: i32,
    pub unit: AltitudeUnit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AltitudeUnit {
    Feet,
    Meter,
}

impl AltitudeUnit {
    pub fn unit_str(&self) -> &'static str {
        match self {
            AltitudeUnit::Feet => "ft",
            AltitudeUnit::Meter => "m",
        }
    }
}

/// 13-bit identity / Mode A code
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityCode(u16);

impl IdentityCode {
    pub const fn from_u16_unchecked(word: u16) -> Self {
        Self(word)
    }

    pub const fn from_u16(word: u16) -> Option<Self> {
        if word & 0b1110000000000000 == 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn squawk(&self) -> Squawk {
        Squawk::from_u16_unchecked(decode_gillham_id13(self.0))
    }
}

impl Debug for IdentityCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityCode({})", self.squawk())
    }
}

/// DF0: short air-air surveillance (ACAS)
///
/// <https://mode-s.org/1090mhz/content/mode-s/4-acas.html>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShortAcas {
    pub address: Address,
    pub vertical_status: VerticalStatus,
    pub cross_link_capability: bool,
    pub sensitivity_level: SensitivityLevel,
    pub reply_information: ReplyInformation,
    pub altitude_code: AltitudeCode,
}

impl ShortAcas {
    pub fn decode(envelope: &Envelope) -> Self {
        let mut payload = envelope.payload();
        let (vertical_status, sensitivity_level, reply_information, altitude_code) =
            decode_air_air_surveillance_common_fields(envelope.first_field(), payload.get_bytes());

        Self {
            address: envelope.address(),
            vertical_status,
            cross_link_capability: envelope.first_field() & 0b010 != 0,
            sensitivity_level,
            reply_information,
            altitude_code,
        }
    }

    pub fn altitude(&self) -> Option<Altitude> {
        self.altitude_code.decode()
    }
}

/// DF16: long air-air surveillance (ACAS), carrying a 56-bit MV field.
///
/// The MV field is exposed for dispatch only; interpreting its BDS register
/// content is up to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LongAcas {
    pub address: Address,
    pub vertical_status: VerticalStatus,
    pub sensitivity_level: SensitivityLevel,
    pub reply_information: ReplyInformation,
    pub altitude_code: AltitudeCode,
    pub message: [u8; 7],
}

impl LongAcas {
    pub fn decode(envelope: &Envelope) -> Self {
        let mut payload = envelope.payload();
        let (vertical_status, sensitivity_level, reply_information, altitude_code) =
            decode_air_air_surveillance_common_fields(envelope.first_field(), payload.get_bytes());

        Self {
            address: envelope.address(),
            vertical_status,
            sensitivity_level,
            reply_information,
            altitude_code,
            message: payload.get_bytes(),
        }
    }

    pub fn altitude(&self) -> Option<Altitude> {
        self.altitude_code.decode()
    }
}

/// DF4: surveillance altitude reply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AltitudeReply {
    pub address: Address,
    pub flight_status: FlightStatus,
    pub downlink_request: DownlinkRequest,
    pub utility_message: UtilityMessage,
    pub altitude_code: AltitudeCode,
}

impl AltitudeReply {
    pub fn decode(envelope: &Envelope) -> Self {
        let mut payload = envelope.payload();
        let (flight_status, downlink_request, utility_message, code) =
            decode_surveillance_reply_body(envelope.first_field(), payload.get_bytes());

        Self {
            address: envelope.address(),
            flight_status,
            downlink_request,
            utility_message,
            altitude_code: AltitudeCode::from_u16_unchecked(code),
        }
    }

    pub fn altitude(&self) -> Option<Altitude> {
        self.altitude_code.decode()
    }
}

/// DF5: surveillance identity reply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentifyReply {
    pub address: Address,
    pub flight_status: FlightStatus,
    pub downlink_request: DownlinkRequest,
    pub utility_message: UtilityMessage,
    pub identity_code: IdentityCode,
}

impl IdentifyReply {
    pub fn decode(envelope: &Envelope) -> Self {
        let mut payload = envelope.payload();
        let (flight_status, downlink_request, utility_message, code) =
            decode_surveillance_reply_body(envelope.first_field(), payload.get_bytes());

        Self {
            address: envelope.address(),
            flight_status,
            downlink_request,
            utility_message,
            identity_code: IdentityCode::from_u16_unchecked(code),
        }
    }

    pub fn squawk(&self) -> Squawk {
        self.identity_code.squawk()
    }
}

/// DF11: all-call reply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllCallReply {
    pub address: Address,
    pub capability: Capability,
}

impl AllCallReply {
    pub fn decode(envelope: &Envelope) -> Self {
        Self {
            address: envelope.address(),
            capability: Capability::from_u8_unchecked(envelope.first_field()),
        }
    }
}

/// DF20: Comm-B altitude reply, carrying a 56-bit MB field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommBAltitudeReply {
    pub address: Address,
    pub flight_status: FlightStatus,
    pub downlink_request: DownlinkRequest,
    pub utility_message: UtilityMessage,
    pub altitude_code: AltitudeCode,
    pub message: [u8; 7],
}

impl CommBAltitudeReply {
    pub fn decode(envelope: &Envelope) -> Self {
        let mut payload = envelope.payload();
        let (flight_status, downlink_request, utility_message, code) =
            decode_surveillance_reply_body(envelope.first_field(), payload.get_bytes());

        Self {
            address: envelope.address(),
            flight_status,
            downlink_request,
            utility_message,
            altitude_code: AltitudeCode::from_u16_unchecked(code),
            message: payload.get_bytes(),
        }
    }

    pub fn altitude(&self) -> Option<Altitude> {
        self.altitude_code.decode()
    }

    /// The BDS code convention: registers like 1,0 and 2,0 repeat their
    /// number in the first MB byte. Only meaningful for those registers.
    pub fn bds(&self) -> u8 {
        self.message[0]
    }
}

/// DF21: Comm-B identify reply, carrying a 56-bit MB field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommBIdentifyReply {
    pub address: Address,
    pub flight_status: FlightStatus,
    pub downlink_request: DownlinkRequest,
    pub utility_message: UtilityMessage,
    pub identity_code: IdentityCode,
    pub message: [u8; 7],
}

impl CommBIdentifyReply {
    pub fn decode(envelope: &Envelope) -> Self {
        let mut payload = envelope.payload();
        let (flight_status, downlink_request, utility_message, code) =
            decode_surveillance_reply_body(envelope.first_field(), payload.get_bytes());

        Self {
            address: envelope.address(),
            flight_status,
            downlink_request,
            utility_message,
            identity_code: IdentityCode::from_u16_unchecked(code),
            message: payload.get_bytes(),
        }
    }

    pub fn squawk(&self) -> Squawk {
        self.identity_code.squawk()
    }

    pub fn bds(&self) -> u8 {
        self.message[0]
    }
}

/// DF24 and above: Comm-D extended length message.
///
/// Only the first two bits select this format; the remaining header bits
/// carry the KE flag and the 4-bit ND segment number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommDExtendedLength {
    pub address: Address,
    pub keep_alive: bool,
    pub sequence_number: u8,
    pub message: [u8; 10],
}

impl CommDExtendedLength {
    pub fn decode(envelope: &Envelope) -> Self {
        let raw = envelope.raw();
        let mut payload = envelope.payload();

        Self {
            address: envelope.address(),
            keep_alive: raw[0] & 0b0001_0000 != 0,
            sequence_number: raw[0] & 0b0000_1111,
            message: payload.get_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use downlink1090_types::{
        Address,
        AddressQualifier,
    };

    use crate::{
        frame::{
            AltitudeReply,
            AltitudeUnit,
            CommBIdentifyReply,
            CommDExtendedLength,
            DecodeError,
            Envelope,
            IdentifyReply,
            ShortAcas,
            VerticalStatus,
        },
        util::mode_s_checksum,
    };

    #[test]
    fn it_parses_an_extended_squitter_envelope() {
        let envelope = Envelope::parse_hex("8D4840D6202CC371C32CE0576098", false).unwrap();

        assert_eq!(envelope.downlink_format(), 17);
        assert_eq!(envelope.first_field(), 5);
        assert_eq!(envelope.address(), Address::from_u32_unchecked(0x4840d6));
        assert_eq!(envelope.format_type_code(), 4);
        assert_eq!(envelope.me()[0], 0x20);
    }

    #[test]
    fn it_parses_a_frame_with_the_parity_trailer_removed() {
        let envelope = Envelope::parse_hex("8D4840D6202CC371C32CE0", false).unwrap();

        assert_eq!(envelope.downlink_format(), 17);
        assert_eq!(envelope.address(), Address::from_u32_unchecked(0x4840d6));
        assert_eq!(envelope.format_type_code(), 4);
    }

    #[test]
    fn it_rejects_length_mismatches() {
        assert!(matches!(
            Envelope::parse(&[0x8d, 0x48, 0x40, 0xd6, 0x20, 0x2c, 0xc3], false),
            Err(DecodeError::FrameTooShort {
                expected_length: 14,
                buffer_length: 7,
            })
        ));
        assert!(matches!(
            Envelope::parse(&[0x20; 5], false),
            Err(DecodeError::FrameTooShort { .. })
        ));
        assert!(Envelope::parse_hex("zz4840d6202cc371c32ce0576098", false).is_err());
    }

    #[test]
    fn it_recovers_the_overlaid_address() {
        // DF4, AC13 = 5776 (35000 ft, Q-bit set)
        let mut frame = [0x20, 0x00, 0x16, 0x90, 0, 0, 0];
        let address = [0x3c, 0x66, 0xb3];
        let checksum = mode_s_checksum(&frame[..4]);
        for i in 0..3 {
            frame[4 + i] = address[i] ^ checksum[i];
        }

        let envelope = Envelope::parse(&frame, false).unwrap();
        assert_eq!(envelope.address(), Address::from_bytes(address));

        // with the CRC already subtracted, the parity field is the address
        let mut stripped = frame;
        stripped[4..].copy_from_slice(&address);
        let envelope = Envelope::parse(&stripped, true).unwrap();
        assert_eq!(envelope.address(), Address::from_bytes(address));

        let reply = AltitudeReply::decode(&envelope);
        let altitude = reply.altitude().unwrap();
        assert_eq!(altitude.altitude, 35000);
        assert_eq!(altitude.unit, AltitudeUnit::Feet);
    }

    #[test]
    fn it_qualifies_df18_addresses() {
        // DF18 CF=2: TIS-B with ICAO address
        let envelope = Envelope::parse_hex("924840D6202CC371C32CE0576098", true).unwrap();
        assert_eq!(envelope.downlink_format(), 18);
        assert_eq!(envelope.first_field(), 2);
        assert_eq!(envelope.address().qualifier(), AddressQualifier::TisbIcao);

        // DF18 CF=6: ADS-R
        let envelope = Envelope::parse_hex("964840D6202CC371C32CE0576098", true).unwrap();
        assert_eq!(envelope.address().qualifier(), AddressQualifier::AdsR);
    }

    #[test]
    fn it_decodes_an_identify_reply() {
        // DF5, FS=0, ID13 = 2214 -> squawk 5502
        let frame = [0x28, 0x00, 0x08, 0xa6, 0x3c, 0x66, 0xb3];
        let envelope = Envelope::parse(&frame, true).unwrap();

        let reply = IdentifyReply::decode(&envelope);
        assert_eq!(reply.squawk().to_string(), "5502");
        assert_eq!(reply.address, Address::from_u32_unchecked(0x3c66b3));
    }

    #[test]
    fn it_decodes_a_short_acas_reply() {
        // DF0, VS=airborne, AC13 = 5776 (35000 ft)
        let frame = [0x00, 0x00, 0x16, 0x90, 0x3c, 0x66, 0xb3];
        let envelope = Envelope::parse(&frame, true).unwrap();

        let reply = ShortAcas::decode(&envelope);
        assert_eq!(reply.vertical_status, VerticalStatus::Airborne);
        assert_eq!(reply.altitude().unwrap().altitude, 35000);
    }

    #[test]
    fn it_decodes_a_comm_b_identify_reply() {
        // DF21 with BDS 2,0 in the MB field
        let mut frame = [0u8; 14];
        frame[0] = 21 << 3;
        frame[2] = 0x08;
        frame[3] = 0xa6;
        frame[4] = 0x20;
        let envelope = Envelope::parse(&frame, true).unwrap();

        let reply = CommBIdentifyReply::decode(&envelope);
        assert_eq!(reply.squawk().to_string(), "5502");
        assert_eq!(reply.bds(), 0x20);
        assert_eq!(reply.message[0], 0x20);
    }

    #[test]
    fn it_decodes_a_comm_d_message() {
        let mut frame = [0u8; 14];
        frame[0] = 0b1101_0101;
        frame[1] = 0xab;
        let envelope = Envelope::parse(&frame, true).unwrap();
        assert_eq!(envelope.downlink_format(), 26);

        let reply = CommDExtendedLength::decode(&envelope);
        assert!(reply.keep_alive);
        assert_eq!(reply.sequence_number, 5);
        assert_eq!(reply.message[0], 0xab);
    }
}
