//! ADS-B extended squitter messages
//!
//! Every message here is decoded from the 56-bit ME field of DF17/18/19
//! frames. The format type code (first 5 bits of the ME field) selects the
//! payload family, several families split further on a subtype.
//!
//! Reference: DO-260B, page 39 ff;
//! <https://mode-s.org/1090mhz/content/ads-b/1-basics.html>

pub mod cpr;

use std::{
    fmt::{
        Debug,
        Display,
    },
    str::FromStr,
};

use downlink1090_types::{
    Address,
    Squawk,
};

use crate::{
    frame::{
        AltitudeCode as AltitudeCode13,
        DecodeError,
        Envelope,
    },
    util::{
        BufReadBytesExt,
        bits::BitReader,
        decode_frame_aligned_altitude_or_identity_code,
        decode_frame_aligned_cpr,
        gillham::{
            decode_gillham_ac12,
            decode_gillham_id13,
        },
    },
};

use self::cpr::Cpr;

/// The generic ADS-B message: address, format type code and the raw ME
/// field. Unrecognized type code / subtype combinations are reported as
/// this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtendedSquitter {
    pub address: Address,
    /// CA for DF17, CF for DF18, AF for DF19.
    pub first_field: u8,
    pub format_type_code: u8,
    pub message: [u8; 7],
}

impl ExtendedSquitter {
    pub fn decode(envelope: &Envelope) -> Result<Self, DecodeError> {
        if !matches!(envelope.downlink_format(), 17..=19) {
            return Err(DecodeError::bad_format(
                "extended squitter requires DF 17, 18 or 19",
            ));
        }

        let mut me = envelope.me();
        Ok(Self {
            address: envelope.address(),
            first_field: envelope.first_field(),
            format_type_code: envelope.format_type_code(),
            message: me.get_bytes(),
        })
    }

    pub fn subtype(&self) -> u8 {
        self.message[0] & 0b111
    }
}

/// TFC 1-4: aircraft identification
///
/// <https://mode-s.org/1090mhz/content/ads-b/2-identification.html>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identification {
    pub address: Address,
    pub format_type_code: u8,
    pub emitter_category: u8,
    pub callsign: EncodedCallsign,
}

impl Identification {
    pub fn decode(es: &ExtendedSquitter) -> Result<Self, DecodeError> {
        if !(1..=4).contains(&es.format_type_code) {
            return Err(DecodeError::bad_format(
                "identification messages must have type code 1 to 4",
            ));
        }

        let mut bytes = &es.message[1..];
        Ok(Self {
            address: es.address,
            format_type_code: es.format_type_code,
            emitter_category: es.message[0] & 0b111,
            callsign: EncodedCallsign(bytes.get_bytes()),
        })
    }

    /// The emitter category set: type code 4 is set A, down to set D for
    /// type code 1.
    pub fn category_set(&self) -> char {
        match self.format_type_code {
            1 => 'D',
            2 => 'C',
            3 => 'B',
            _ => 'A',
        }
    }

    pub fn wake_vortex_category(&self) -> WakeVortexCategory {
        WakeVortexCategory::from_type_code_and_category_unchecked(
            self.format_type_code,
            self.emitter_category,
        )
    }
}

/// <https://mode-s.org/1090mhz/content/ads-b/2-identification.html>
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WakeVortexCategory {
    Reserved { type_code: u8, category: u8 },
    NoCategoryInformation { type_code: u8 },
    SurfaceEmergencyVehicle,
    SurfaceServiceVehicle,
    GroundObstruction { category: u8 },
    GliderSailplane,
    LighterThanAir,
    ParachutistSkydiver,
    UltralightHangGliderParaglider,
    UnmannedAerialVehicle,
    SpaceTransatmosphericVehicle,
    Light,
    Medium1,
    Medium2,
    HighVortexAircraft,
    Heavy,
    HighPerformance,
    Rotorcraft,
}

impl WakeVortexCategory {
    pub const fn from_type_code_and_category_unchecked(type_code: u8, category: u8) -> Self {
        match (type_code, category) {
            (_, 0) => Self::NoCategoryInformation { type_code },
            (2, 1) => Self::SurfaceEmergencyVehicle,
            (2, 3) => Self::SurfaceServiceVehicle,
            (2, 4..=7) => Self::GroundObstruction { category },
            (3, 1) => Self::GliderSailplane,
            (3, 2) => Self::LighterThanAir,
            (3, 3) => Self::ParachutistSkydiver,
            (3, 4) => Self::UltralightHangGliderParaglider,
            (3, 6) => Self::UnmannedAerialVehicle,
            (3, 7) => Self::SpaceTransatmosphericVehicle,
            (4, 1) => Self::Light,
            (4, 2) => Self::Medium1,
            (4, 3) => Self::Medium2,
            (4, 4) => Self::HighVortexAircraft,
            (4, 5) => Self::Heavy,
            (4, 6) => Self::HighPerformance,
            (4, 7) => Self::Rotorcraft,
            _ => {
                Self::Reserved {
                    type_code,
                    category,
                }
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodedCallsign(pub [u8; 6]);

impl EncodedCallsign {
    /// Expands the encoded callsign to 8 bits per character.
    pub fn expand(&self) -> [u8; 8] {
        // byte 0        1        2        3        4        5
        // bit  01234567 01234567 01234567 01234567 01234567 01234567
        // char 00000011 11112222 22333333 44444455 55556666 66777777

        let bytes = &self.0;
        [
            bytes[0] >> 2,
            ((bytes[0] & 0b11) << 4) | (bytes[1] >> 4),
            ((bytes[1] & 0b1111) << 2) | (bytes[2] >> 6),
            bytes[2] & 0b111111,
            bytes[3] >> 2,
            ((bytes[3] & 0b11) << 4) | (bytes[4] >> 4),
            ((bytes[4] & 0b1111) << 2) | (bytes[5] >> 6),
            bytes[5] & 0b111111,
        ]
    }

    /// Decodes the callsign, rejecting characters outside the MOPS charset.
    pub fn decode(&self) -> Result<Callsign, InvalidCallsign> {
        let expanded = self.expand();
        let mut characters = [0; 8];

        for (i, byte) in expanded.iter().enumerate() {
            characters[i] = CALLSIGN_ENCODING[*byte as usize];

            if characters[i] == b'#' {
                return Err(InvalidCallsign {
                    expanded,
                    position: i,
                    character: *byte,
                });
            }
        }

        Ok(Callsign { characters })
    }

    /// Decodes the callsign, mapping every character like readsb's AIS
    /// charset does.
    pub fn decode_permissive(&self) -> Callsign {
        let mut characters = self.expand();
        for byte in &mut characters {
            *byte = CALLSIGN_ENCODING_PERMISSIVE[*byte as usize];
        }
        Callsign { characters }
    }
}

/// The character set MOPS specifies; '#' marks invalid code points.
const CALLSIGN_ENCODING: &[u8] =
    b"#ABCDEFGHIJKLMNOPQRSTUVWXYZ##### ###############0123456789######";

const CALLSIGN_ENCODING_PERMISSIVE: &[u8] =
    b"@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_ !\"#$%&'()*+,-./0123456789:;<=>?";

impl Debug for EncodedCallsign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncodedCallsign(\"{}\")", self.decode_permissive())
    }
}

#[derive(Clone, Copy, Debug, thiserror::Error)]
#[error("Invalid character {character:02x} at position {position}")]
pub struct InvalidCallsign {
    pub expanded: [u8; 8],
    pub position: usize,
    pub character: u8,
}

/// A decoded callsign; a small string without heap allocation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Callsign {
    // note: only ever filled with valid ASCII
    characters: [u8; Self::LENGTH],
}

impl Callsign {
    const LENGTH: usize = 8;

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.characters).unwrap_or("????????")
    }
}

impl Debug for Callsign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callsign(\"{}\")", self.as_str())
    }
}

impl Display for Callsign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Callsign {
    type Err = CallsignFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s.len();
        if n > Self::LENGTH {
            return Err(CallsignFromStrError::InvalidLength(n));
        }

        let mut characters = [b' '; Self::LENGTH];
        for (i, c) in s.chars().enumerate() {
            if !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == ' ') {
                return Err(CallsignFromStrError::InvalidChar {
                    position: i,
                    character: c,
                });
            }
            characters[i] = c as u8;
        }

        Ok(Self { characters })
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum CallsignFromStrError {
    #[error("Invalid character in callsign: '{character}' at position {position}")]
    InvalidChar { position: usize, character: char },
    #[error("Invalid length for callsign: {0}")]
    InvalidLength(usize),
}

/// TFC 5-8: surface position
///
/// NIC supplements are not part of the frame; the versioned wrappers carry
/// them from decoder state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfacePosition {
    pub address: Address,
    pub format_type_code: u8,
    pub movement: Movement,
    pub ground_track: Option<GroundTrack>,
    pub time: bool,
    pub cpr: Cpr,
    /// Time of applicability in milliseconds, as supplied to the decoder.
    pub timestamp: u64,
}

impl SurfacePosition {
    pub fn decode(es: &ExtendedSquitter, timestamp: u64) -> Result<Self, DecodeError> {
        if !(5..=8).contains(&es.format_type_code) {
            return Err(DecodeError::bad_format(
                "surface position messages must have type code 5 to 8",
            ));
        }

        // byte        0        1        2
        // bit  01234567 01234567 01234567
        //      tttttmmm mmmmgccc ccccd...   rest of bits is cpr
        let m = &es.message;
        let movement = Movement::from_u8_unchecked(((m[0] & 0b111) << 4) | (m[1] >> 4));
        let track_valid = m[1] & 0b0000_1000 != 0;
        let track = ((m[1] & 0b111) << 4) | (m[2] >> 4);

        Ok(Self {
            address: es.address,
            format_type_code: es.format_type_code,
            movement,
            ground_track: track_valid.then(|| GroundTrack::from_u8_unchecked(track)),
            time: m[2] & 0b0000_1000 != 0,
            cpr: decode_frame_aligned_cpr(&m[2..7]),
            timestamp,
        })
    }
}

/// Surface position as seen by a version 1 transponder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfacePositionV1 {
    pub position: SurfacePosition,
    /// From decoder state, set by operational status messages.
    pub nic_supplement_a: bool,
}

/// Surface position as seen by a version 2 transponder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfacePositionV2 {
    pub position: SurfacePosition,
    pub nic_supplement_a: bool,
    pub nic_supplement_c: u8,
}

/// 7-bit encoded surface movement (ground speed)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Movement(u8);

impl Movement {
    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b10000000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Decode movement in 1/8 kt steps, following the quantization table of
    /// DO-260B 2.2.3.2.4.2.
    pub fn decode_as_eighth_knots(&self) -> Option<u32> {
        match self.0 {
            0 => None,
            1 => Some(0),
            2..=8 => Some(u32::from(self.0 - 2) + 1),
            9..=12 => Some(u32::from(self.0 - 9) * 2 + 8),
            13..=38 => Some(u32::from(self.0 - 13) * 4 + 16),
            39..=93 => Some(u32::from(self.0 - 39) * 8 + 120),
            94..=108 => Some(u32::from(self.0 - 94) * 16 + 560),
            109..=123 => Some(u32::from(self.0 - 109) * 40 + 800),
            124 => Some(1400),
            _ => None,
        }
    }

    /// Decode movement in knots.
    pub fn decode(&self) -> Option<f64> {
        self.decode_as_eighth_knots().map(|speed| speed as f64 * 0.125)
    }
}

impl Debug for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(kt) = self.decode() {
            write!(f, "Movement({kt} kt)")
        }
        else {
            write!(f, "Movement(None)")
        }
    }
}

/// 7-bit ground track, clockwise from geographic north in 360/128 degree
/// steps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroundTrack(u8);

impl GroundTrack {
    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b10000000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn as_degrees(&self) -> f64 {
        360.0 * f64::from(self.0) / 128.0
    }
}

impl Debug for GroundTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GroundTrack({:.1}°)", self.as_degrees())
    }
}

/// TFC 9-18 and 20-22: airborne position
///
/// 2.2.3.2.3
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AirbornePosition {
    pub address: Address,
    pub format_type_code: u8,
    pub surveillance_status: SurveillanceStatus,
    /// Single antenna flag for version 0 and 1 transponders, reinterpreted
    /// as NIC supplement B by version 2.
    pub single_antenna_flag: bool,
    pub altitude_code: Option<AltitudeCode>,
    pub time: bool,
    pub cpr: Cpr,
    /// Time of applicability in milliseconds, as supplied to the decoder.
    pub timestamp: u64,
}

impl AirbornePosition {
    pub fn decode(es: &ExtendedSquitter, timestamp: u64) -> Result<Self, DecodeError> {
        if !matches!(es.format_type_code, 9..=18 | 20..=22) {
            return Err(DecodeError::bad_format(
                "airborne position messages must have type code 9 to 18 or 20 to 22",
            ));
        }

        // byte        0        1        2
        // bit  01234567 01234567 01234567
        //      tttttssb cccccccc ccccdfaa   rest of bits is cpr
        let m = &es.message;
        let code = (u16::from(m[1]) << 4) | u16::from(m[2] >> 4);

        Ok(Self {
            address: es.address,
            format_type_code: es.format_type_code,
            surveillance_status: SurveillanceStatus::from_u8_unchecked((m[0] >> 1) & 0b11),
            single_antenna_flag: m[0] & 0b1 != 0,
            altitude_code: AltitudeCode::from_u16(code),
            time: m[2] & 0b0000_1000 != 0,
            cpr: decode_frame_aligned_cpr(&m[2..7]),
            timestamp,
        })
    }

    pub fn nic_supplement_b(&self) -> bool {
        self.single_antenna_flag
    }

    /// Type codes 9 to 18 carry barometric altitude, 20 to 22 GNSS height
    /// above the WGS84 ellipsoid.
    pub fn is_barometric_altitude(&self) -> bool {
        matches!(self.format_type_code, 9..=18)
    }

    pub fn has_altitude(&self) -> bool {
        self.altitude_code.is_some()
    }

    /// Altitude in feet.
    pub fn altitude(&self) -> Option<i32> {
        self.altitude_code.and_then(|code| code.decode())
    }
}

/// Airborne position as seen by a version 1 transponder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AirbornePositionV1 {
    pub position: AirbornePosition,
    /// From decoder state, set by operational status messages.
    pub nic_supplement_a: bool,
}

/// Airborne position as seen by a version 2 transponder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AirbornePositionV2 {
    pub position: AirbornePosition,
    pub nic_supplement_a: bool,
}

/// 2-bit surveillance status
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurveillanceStatus(u8);

impl SurveillanceStatus {
    pub const NO_CONDITION: Self = Self(0);
    pub const PERMANENT_ALERT: Self = Self(1);
    pub const TEMPORARY_ALERT: Self = Self(2);
    pub const SPI_CONDITION: Self = Self(3);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111100 == 0 {
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

impl Debug for SurveillanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::NO_CONDITION => write!(f, "SurveillanceStatus::NO_CONDITION"),
            Self::PERMANENT_ALERT => write!(f, "SurveillanceStatus::PERMANENT_ALERT"),
            Self::TEMPORARY_ALERT => write!(f, "SurveillanceStatus::TEMPORARY_ALERT"),
            Self::SPI_CONDITION => write!(f, "SurveillanceStatus::SPI_CONDITION"),
            _ => write!(f, "SurveillanceStatus({})", self.0),
        }
    }
}

/// 12-bit altitude code of airborne position messages
///
/// 2.2.3.2.3.4.3
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AltitudeCode(u16);

impl AltitudeCode {
    pub const fn from_u16_unchecked(word: u16) -> Self {
        Self(word)
    }

    pub const fn from_u16(word: u16) -> Option<Self> {
        if word & 0b1111000000000000 == 0 && word != 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Decodes the altitude into feet.
    pub fn decode(&self) -> Option<i32> {
        // 11 bits altitude with 25 feet resolution and -1000 feet offset
        // gives a max value of 50175, so the decoded altitude is i32

        // bit  0123456789ab
        //      aaaaaaaqaaaa
        let q_bit = self.0 & 0b0000_0001_0000 != 0;

        if q_bit {
            // 25 feet increments (this removes the Q bit)
            let value = i32::from(((self.0 & 0b1111_1110_0000) >> 1) | (self.0 & 0b1111));
            Some(value * 25 - 1000)
        }
        else {
            // gillham coded in 100 foot increments
            decode_gillham_ac12(self.0)
        }
    }
}

/// TFC 19, subtype 1-2: velocity over ground
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VelocityOverGround {
    pub address: Address,
    /// Subtype 2 encodes supersonic speeds in 4 kt steps.
    pub supersonic: bool,
    pub intent_change: bool,
    /// Only meaningful for version 0 and 1 transponders.
    pub ifr_capability: bool,
    pub nac_v: NacV,
    pub direction_east_west: DirectionEastWest,
    pub velocity_east_west: Option<Velocity>,
    pub direction_north_south: DirectionNorthSouth,
    pub velocity_north_south: Option<Velocity>,
    pub vertical_rate: VerticalRate,
    pub geo_minus_baro: GeoMinusBaro,
}

impl VelocityOverGround {
    pub fn decode(es: &ExtendedSquitter) -> Result<Self, DecodeError> {
        if es.format_type_code != 19 {
            return Err(DecodeError::bad_format(
                "velocity over ground messages must have type code 19",
            ));
        }
        let subtype = es.subtype();
        if !(1..=2).contains(&subtype) {
            return Err(DecodeError::bad_format(
                "velocity over ground messages have subtype 1 or 2",
            ));
        }

        // byte        1        2        3        4        5        6
        // bit  01234567 01234567 01234567 01234567 01234567 01234567
        //      abcccdee eeeeeeee fggggggg ggghijjj jjjjjjxx lmmmmmmm
        let m = &es.message;
        let e = (u16::from(m[1] & 0b11) << 8) | u16::from(m[2]);
        let g = (u16::from(m[3] & 0b0111_1111) << 3) | u16::from(m[4] >> 5);

        Ok(Self {
            address: es.address,
            supersonic: subtype == 2,
            intent_change: m[1] & 0b1000_0000 != 0,
            ifr_capability: m[1] & 0b0100_0000 != 0,
            nac_v: NacV::from_u8_unchecked((m[1] >> 3) & 0b111),
            direction_east_west: if m[1] & 0b100 != 0 {
                DirectionEastWest::EastToWest
            }
            else {
                DirectionEastWest::WestToEast
            },
            velocity_east_west: Velocity::from_u16(e),
            direction_north_south: if m[3] & 0b1000_0000 != 0 {
                DirectionNorthSouth::NorthToSouth
            }
            else {
                DirectionNorthSouth::SouthToNorth
            },
            velocity_north_south: Velocity::from_u16(g),
            vertical_rate: decode_vertical_rate(m),
            geo_minus_baro: decode_geo_minus_baro(m),
        })
    }

    fn components(&self) -> Option<[f64; 2]> {
        let v_ew = f64::from(self.velocity_east_west?.as_knots(self.supersonic));
        let v_ns = f64::from(self.velocity_north_south?.as_knots(self.supersonic));
        let vx = match self.direction_east_west {
            DirectionEastWest::WestToEast => v_ew,
            DirectionEastWest::EastToWest => -v_ew,
        };
        let vy = match self.direction_north_south {
            DirectionNorthSouth::SouthToNorth => v_ns,
            DirectionNorthSouth::NorthToSouth => -v_ns,
        };
        Some([vx, vy])
    }

    /// Ground speed in knots, if both components are available.
    pub fn ground_speed(&self) -> Option<f64> {
        let [vx, vy] = self.components()?;
        Some(vx.hypot(vy))
    }

    /// Track in degrees, clockwise from geographic north.
    pub fn track(&self) -> Option<f64> {
        let [vx, vy] = self.components()?;
        Some(vx.atan2(vy).to_degrees().rem_euclid(360.0))
    }

    pub fn has_vertical_rate_info(&self) -> bool {
        self.vertical_rate.value.is_some()
    }

    pub fn has_geo_minus_baro_info(&self) -> bool {
        self.geo_minus_baro.value.is_some()
    }
}

/// TFC 19, subtype 3-4: airspeed and heading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AirspeedHeading {
    pub address: Address,
    /// Subtype 4 encodes supersonic speeds in 4 kt steps.
    pub supersonic: bool,
    pub intent_change: bool,
    /// Only meaningful for version 0 and 1 transponders.
    pub ifr_capability: bool,
    pub nac_v: NacV,
    /// Version 0: heading is relative to magnetic (true) or true north
    /// (false). Version 1+: heading information is available.
    pub heading_status: bool,
    pub heading_value: MagneticHeading,
    pub true_airspeed: bool,
    pub airspeed: Option<Velocity>,
    pub vertical_rate: VerticalRate,
    pub geo_minus_baro: GeoMinusBaro,
}

impl AirspeedHeading {
    pub fn decode(es: &ExtendedSquitter) -> Result<Self, DecodeError> {
        if es.format_type_code != 19 {
            return Err(DecodeError::bad_format(
                "airspeed and heading messages must have type code 19",
            ));
        }
        let subtype = es.subtype();
        if !(3..=4).contains(&subtype) {
            return Err(DecodeError::bad_format(
                "airspeed and heading messages have subtype 3 or 4",
            ));
        }

        // byte        1        2        3        4        5        6
        // bit  01234567 01234567 01234567 01234567 01234567 01234567
        //      abcccdee eeeeeeee fggggggg ggghijjj jjjjjjxx lmmmmmmm
        let m = &es.message;
        let heading = (u16::from(m[1] & 0b11) << 8) | u16::from(m[2]);
        let airspeed = (u16::from(m[3] & 0b0111_1111) << 3) | u16::from(m[4] >> 5);

        Ok(Self {
            address: es.address,
            supersonic: subtype == 4,
            intent_change: m[1] & 0b1000_0000 != 0,
            ifr_capability: m[1] & 0b0100_0000 != 0,
            nac_v: NacV::from_u8_unchecked((m[1] >> 3) & 0b111),
            heading_status: m[1] & 0b100 != 0,
            heading_value: MagneticHeading::from_u16_unchecked(heading),
            true_airspeed: m[3] & 0b1000_0000 != 0,
            airspeed: Velocity::from_u16(airspeed),
            vertical_rate: decode_vertical_rate(m),
            geo_minus_baro: decode_geo_minus_baro(m),
        })
    }

    pub fn has_heading_status(&self) -> bool {
        self.heading_status
    }

    /// Heading in degrees, clockwise from north, gated on the heading
    /// status bit.
    pub fn heading(&self) -> Option<f64> {
        self.heading_status.then(|| self.heading_value.as_degrees())
    }

    pub fn has_airspeed_info(&self) -> bool {
        self.airspeed.is_some()
    }

    /// Airspeed in knots.
    pub fn airspeed_knots(&self) -> Option<u16> {
        self.airspeed.map(|v| v.as_knots(self.supersonic))
    }

    pub fn has_vertical_rate_info(&self) -> bool {
        self.vertical_rate.value.is_some()
    }

    pub fn has_geo_minus_baro_info(&self) -> bool {
        self.geo_minus_baro.value.is_some()
    }
}

/// Vertical rate and geo-minus-baro share the layout between velocity over
/// ground and airspeed messages.
fn decode_vertical_rate(m: &[u8; 7]) -> VerticalRate {
    let value = (u16::from(m[4] & 0b111) << 6) | u16::from(m[5] >> 2);

    VerticalRate {
        source: if m[4] & 0b0001_0000 != 0 {
            VerticalRateSource::Barometric
        }
        else {
            VerticalRateSource::Geometric
        },
        sign: if m[4] & 0b0000_1000 != 0 {
            VerticalRateSign::Down
        }
        else {
            VerticalRateSign::Up
        },
        value: VerticalRateValue::from_u16(value),
    }
}

fn decode_geo_minus_baro(m: &[u8; 7]) -> GeoMinusBaro {
    GeoMinusBaro {
        sign: if m[6] & 0b1000_0000 != 0 {
            GeoMinusBaroSign::GeometricBelowBarometric
        }
        else {
            GeoMinusBaroSign::GeometricAboveBarometric
        },
        value: GeoMinusBaroValue::from_u8(m[6] & 0b0111_1111),
    }
}

/// Navigation Accuracy Category for velocity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NacV(u8);

impl NacV {
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

    /// The 95% horizontal velocity accuracy bound in m/s per DO-260B Table
    /// 2-22; -1.0 means unknown or worse than 10 m/s.
    pub fn accuracy_bound(&self) -> f64 {
        match self.0 {
            1 => 10.0,
            2 => 3.0,
            3 => 1.0,
            4 => 0.3,
            _ => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectionEastWest {
    WestToEast,
    EastToWest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectionNorthSouth {
    SouthToNorth,
    NorthToSouth,
}

/// A 10-bit velocity value; zero on the wire means not available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Velocity(u16);

impl Velocity {
    pub const fn from_u16_unchecked(word: u16) -> Self {
        Self(word)
    }

    pub const fn from_u16(word: u16) -> Option<Self> {
        if word & 0b1111110000000000 == 0 && word != 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn as_knots(&self, supersonic: bool) -> u16 {
        let v = self.0 - 1;
        if supersonic { v * 4 } else { v }
    }
}

/// 10-bit magnetic heading in 360/1024 degree steps, clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MagneticHeading(u16);

impl MagneticHeading {
    pub const fn from_u16_unchecked(word: u16) -> Self {
        Self(word)
    }

    pub const fn from_u16(word: u16) -> Option<Self> {
        if word & 0b1111110000000000 == 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn as_degrees(&self) -> f64 {
        f64::from(self.0) * 360.0 / 1024.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerticalRate {
    pub source: VerticalRateSource,
    pub sign: VerticalRateSign,
    pub value: Option<VerticalRateValue>,
}

impl VerticalRate {
    /// Vertical rate in ft/min, negative when descending. The sign is
    /// applied on read so that an unavailable magnitude never turns
    /// negative.
    pub fn as_ft_per_min(&self) -> Option<i32> {
        let magnitude = i32::from(self.value?.as_u16() - 1) * 64;
        Some(match self.sign {
            VerticalRateSign::Up => magnitude,
            VerticalRateSign::Down => -magnitude,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerticalRateSource {
    Geometric,
    Barometric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerticalRateSign {
    Up,
    Down,
}

/// 9-bit vertical rate magnitude; zero on the wire means not available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerticalRateValue(u16);

impl VerticalRateValue {
    pub const fn from_u16_unchecked(word: u16) -> Self {
        Self(word)
    }

    pub const fn from_u16(word: u16) -> Option<Self> {
        if word & 0b1111111000000000 == 0 && word != 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

/// Difference between geometric and barometric altitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeoMinusBaro {
    pub sign: GeoMinusBaroSign,
    pub value: Option<GeoMinusBaroValue>,
}

impl GeoMinusBaro {
    /// Difference in feet, negative when the geometric altitude is below
    /// the barometric one. The sign is applied on read.
    pub fn as_ft(&self) -> Option<i32> {
        let ft = i32::from(self.value?.as_u8() - 1) * 25;
        Some(match self.sign {
            GeoMinusBaroSign::GeometricAboveBarometric => ft,
            GeoMinusBaroSign::GeometricBelowBarometric => -ft,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeoMinusBaroSign {
    GeometricAboveBarometric,
    GeometricBelowBarometric,
}

/// 7-bit geo-minus-baro magnitude; zero on the wire means not available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeoMinusBaroValue(u8);

impl GeoMinusBaroValue {
    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b10000000 == 0 && byte != 0 {
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

/// TFC 28, subtype 1: emergency / priority status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmergencyOrPriorityStatus {
    pub address: Address,
    pub emergency_state: EmergencyState,
    pub mode_a_code: Squawk,
}

impl EmergencyOrPriorityStatus {
    pub fn decode(es: &ExtendedSquitter) -> Result<Self, DecodeError> {
        if es.format_type_code != 28 || es.subtype() != 1 {
            return Err(DecodeError::bad_format(
                "emergency status messages must have type code 28, subtype 1",
            ));
        }

        // byte        1        2
        // bit  01234567 01234567
        //      eeeaaaaa aaaaaaaa   rest is reserved
        let m = &es.message;
        Ok(Self {
            address: es.address,
            emergency_state: EmergencyState::from_u8_unchecked(m[1] >> 5),
            mode_a_code: Squawk::from_u16_unchecked(decode_gillham_id13(
                decode_frame_aligned_altitude_or_identity_code(&m[1..3]),
            )),
        })
    }
}

/// 3-bit emergency / priority state
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmergencyState(u8);

impl EmergencyState {
    pub const NO_EMERGENCY: Self = Self(0);
    pub const GENERAL_EMERGENCY: Self = Self(1);
    pub const LIFEGUARD_MEDICAL_EMERGENCY: Self = Self(2);
    pub const MINIMAL_FUEL: Self = Self(3);
    pub const NO_COMMUNICATIONS: Self = Self(4);
    pub const UNLAWFUL_INTERFERENCE: Self = Self(5);
    pub const DOWNED_AIRCRAFT: Self = Self(6);

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

    pub fn is_emergency(&self) -> bool {
        *self != Self::NO_EMERGENCY
    }
}

impl Debug for EmergencyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::NO_EMERGENCY => write!(f, "EmergencyState::NO_EMERGENCY"),
            Self::GENERAL_EMERGENCY => write!(f, "EmergencyState::GENERAL_EMERGENCY"),
            Self::LIFEGUARD_MEDICAL_EMERGENCY => {
                write!(f, "EmergencyState::LIFEGUARD_MEDICAL_EMERGENCY")
            }
            Self::MINIMAL_FUEL => write!(f, "EmergencyState::MINIMAL_FUEL"),
            Self::NO_COMMUNICATIONS => write!(f, "EmergencyState::NO_COMMUNICATIONS"),
            Self::UNLAWFUL_INTERFERENCE => write!(f, "EmergencyState::UNLAWFUL_INTERFERENCE"),
            Self::DOWNED_AIRCRAFT => write!(f, "EmergencyState::DOWNED_AIRCRAFT"),
            _ => write!(f, "EmergencyState({})", self.0),
        }
    }
}

/// TFC 28, subtype 2: TCAS/ACAS resolution advisory report
///
/// 2.2.3.2.7.8.2
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TcasResolutionAdvisory {
    pub address: Address,
    pub active_resolution_advisories: ActiveResolutionAdvisories,
    pub rac_record: RacRecord,
    pub ra_terminated: bool,
    pub multiple_threat_encounter: bool,
    pub threat_type: ThreatTypeIndicator,
    pub threat_identity: ThreatIdentityData,
}

impl TcasResolutionAdvisory {
    pub fn decode(es: &ExtendedSquitter) -> Result<Self, DecodeError> {
        if es.format_type_code != 28 || es.subtype() != 2 {
            return Err(DecodeError::bad_format(
                "resolution advisory reports must have type code 28, subtype 2",
            ));
        }

        // byte        1        2        3        4        5        6
        // bit  01234567 01234567 01234567 01234567 01234567 01234567
        //      aaaaaaaa aaaaaabb bbcdeeff ffffffff ffffffff ffffffff
        let m = &es.message;
        let ara = (u16::from(m[1]) << 6) | u16::from(m[2] >> 2);
        let rac = ((m[2] & 0b11) << 2) | (m[3] >> 6);
        let tid = (u32::from(m[3] & 0b11) << 24)
            | (u32::from(m[4]) << 16)
            | (u32::from(m[5]) << 8)
            | u32::from(m[6]);

        Ok(Self {
            address: es.address,
            active_resolution_advisories: ActiveResolutionAdvisories::from_u16_unchecked(ara),
            rac_record: RacRecord::from_u8_unchecked(rac),
            ra_terminated: m[3] & 0b0010_0000 != 0,
            multiple_threat_encounter: m[3] & 0b0001_0000 != 0,
            threat_type: ThreatTypeIndicator::from_u8_unchecked((m[3] & 0b1100) >> 2),
            threat_identity: ThreatIdentityData::from_u32_unchecked(tid),
        })
    }

    /// The threat's ICAO24 address, present for threat type 1.
    pub fn threat_icao24(&self) -> Option<Address> {
        (self.threat_type == ThreatTypeIndicator::ICAO24_ADDRESS)
            .then(|| Address::from_u32_unchecked(self.threat_identity.as_u32() >> 2))
    }

    /// The threat's 13-bit altitude code, present for threat type 2.
    pub fn threat_altitude_code(&self) -> Option<AltitudeCode13> {
        (self.threat_type == ThreatTypeIndicator::ALTITUDE_RANGE_BEARING)
            .then(|| AltitudeCode13::from_u16_unchecked((self.threat_identity.as_u32() >> 13) as u16))
    }

    /// The threat's encoded range, present for threat type 2.
    pub fn threat_range(&self) -> Option<u8> {
        (self.threat_type == ThreatTypeIndicator::ALTITUDE_RANGE_BEARING)
            .then(|| ((self.threat_identity.as_u32() >> 6) & 0x7f) as u8)
    }

    /// The threat's encoded bearing, present for threat type 2.
    pub fn threat_bearing(&self) -> Option<u8> {
        (self.threat_type == ThreatTypeIndicator::ALTITUDE_RANGE_BEARING)
            .then(|| (self.threat_identity.as_u32() & 0x3f) as u8)
    }
}

/// 14-bit active resolution advisories record
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActiveResolutionAdvisories(u16);

impl ActiveResolutionAdvisories {
    pub const fn from_u16_unchecked(word: u16) -> Self {
        Self(word)
    }

    pub const fn from_u16(word: u16) -> Option<Self> {
        if word & 0b1100000000000000 == 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Bit in transmission order, 0 to 13.
    pub fn is_set(&self, index: usize) -> bool {
        debug_assert!(index < 14);
        (self.0 >> (13 - index)) & 1 != 0
    }
}

/// 4-bit resolution advisory complements record
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RacRecord(u8);

impl RacRecord {
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

    /// Bit in transmission order, 0 to 3.
    pub fn is_set(&self, index: usize) -> bool {
        debug_assert!(index < 4);
        (self.0 >> (3 - index)) & 1 != 0
    }
}

/// 2-bit threat type indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreatTypeIndicator(u8);

impl ThreatTypeIndicator {
    pub const NO_IDENTITY_DATA: Self = Self(0);
    pub const ICAO24_ADDRESS: Self = Self(1);
    pub const ALTITUDE_RANGE_BEARING: Self = Self(2);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111100 == 0 {
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

/// 26-bit threat identity data
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreatIdentityData(u32);

impl ThreatIdentityData {
    pub const fn from_u32_unchecked(word: u32) -> Self {
        Self(word)
    }

    pub const fn from_u32(word: u32) -> Option<Self> {
        if word & 0b11111100000000000000000000000000 == 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// TFC 29, subtype 1: target state and status (version 1 and later)
///
/// 2.2.3.2.7.1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetStateAndStatus {
    pub address: Address,
    pub sil_supplement: SilSupplement,
    pub selected_altitude_type: SelectedAltitudeType,
    selected_altitude: u16,
    barometric_setting: u16,
    pub selected_heading_status: bool,
    selected_heading: u16,
    pub nac_p: NacP,
    pub nic_baro: bool,
    pub sil: Sil,
    /// Whether the autopilot mode bits below are populated.
    pub mode_bits_valid: bool,
    pub autopilot_engaged: bool,
    pub vnav_engaged: bool,
    pub altitude_hold: bool,
    pub approach_mode: bool,
    pub tcas_operational: bool,
    pub lnav_engaged: bool,
}

impl TargetStateAndStatus {
    pub fn decode(es: &ExtendedSquitter) -> Result<Self, DecodeError> {
        if es.format_type_code != 29 || (es.message[0] >> 1) & 0b11 != 1 {
            return Err(DecodeError::bad_format(
                "target state and status messages must have type code 29, subtype 1",
            ));
        }

        let bits = BitReader::new(&es.message);
        Ok(Self {
            address: es.address,
            sil_supplement: SilSupplement::from_bit(bits.bit(7)?),
            selected_altitude_type: if bits.bit(8)? {
                SelectedAltitudeType::Fms
            }
            else {
                SelectedAltitudeType::McpFcu
            },
            selected_altitude: bits.unsigned(9, 11)? as u16,
            barometric_setting: bits.unsigned(20, 9)? as u16,
            selected_heading_status: bits.bit(29)?,
            selected_heading: bits.unsigned(30, 9)? as u16,
            nac_p: NacP::from_u8_unchecked(bits.unsigned(39, 4)? as u8),
            nic_baro: bits.bit(43)?,
            sil: Sil::from_u8_unchecked(bits.unsigned(44, 2)? as u8),
            mode_bits_valid: bits.bit(46)?,
            autopilot_engaged: bits.bit(47)?,
            vnav_engaged: bits.bit(48)?,
            altitude_hold: bits.bit(49)?,
            approach_mode: bits.bit(51)?,
            tcas_operational: bits.bit(52)?,
            lnav_engaged: bits.bit(53)?,
        })
    }

    pub fn has_selected_altitude(&self) -> bool {
        self.selected_altitude != 0
    }

    /// Selected altitude in feet.
    pub fn selected_altitude(&self) -> Option<i32> {
        (self.selected_altitude != 0).then(|| (i32::from(self.selected_altitude) - 1) * 32)
    }

    pub fn has_barometric_setting(&self) -> bool {
        self.barometric_setting != 0
    }

    /// Barometric pressure setting in hPa.
    pub fn barometric_setting(&self) -> Option<f64> {
        (self.barometric_setting != 0)
            .then(|| f64::from(self.barometric_setting - 1) * 0.8 + 800.0)
    }

    /// Selected heading in degrees, gated on the status bit.
    pub fn selected_heading(&self) -> Option<f64> {
        self.selected_heading_status
            .then(|| f64::from(self.selected_heading) * 180.0 / 256.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectedAltitudeType {
    McpFcu,
    Fms,
}

/// Probability of exceeding the NIC radius of containment, per hour or per
/// sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SilSupplement {
    PerHour,
    PerSample,
}

impl SilSupplement {
    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::PerSample } else { Self::PerHour }
    }
}

/// TFC 31, version 0: aircraft operational status
///
/// DO-260A leaves the capability and operational mode codes mostly
/// unstructured; they are carried raw. One variant covers both the airborne
/// (0) and surface (1) subtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationalStatusV0 {
    pub address: Address,
    /// 0 = airborne, 1 = surface.
    pub subtype: u8,
    pub capability_class_codes: u16,
    pub operational_mode_codes: u16,
    pub version: MopsVersion,
}

impl OperationalStatusV0 {
    pub fn decode(es: &ExtendedSquitter) -> Result<Self, DecodeError> {
        let m = operational_status_message(es)?;

        Ok(Self {
            address: es.address,
            subtype: es.subtype(),
            capability_class_codes: u16::from_be_bytes([m[1], m[2]]),
            operational_mode_codes: u16::from_be_bytes([m[3], m[4]]),
            version: MopsVersion::from_u8_unchecked(m[5] >> 5),
        })
    }
}

/// TFC 31, subtype 0, version 1 and 2: airborne operational status
///
/// 2.2.3.2.7.2
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AirborneOperationalStatus {
    pub address: Address,
    pub capability_class_codes: u16,
    pub operational_mode: OperationalMode,
    pub version: MopsVersion,
    pub nic_supplement_a: bool,
    pub nac_p: NacP,
    /// Version 2 only.
    pub gva: Option<Gva>,
    pub sil: Sil,
    pub nic_baro: bool,
    /// Horizontal reference direction: true north (false) or magnetic north
    /// (true).
    pub hrd: bool,
    /// Version 2 only.
    pub sil_supplement: Option<SilSupplement>,
}

impl AirborneOperationalStatus {
    pub fn decode(es: &ExtendedSquitter) -> Result<Self, DecodeError> {
        let m = operational_status_message(es)?;
        if es.subtype() != 0 {
            return Err(DecodeError::bad_format(
                "airborne operational status messages have subtype 0",
            ));
        }

        let version = MopsVersion::from_u8_unchecked(m[5] >> 5);

        // byte        5        6
        // bit  01234567 01234567
        //      vvvsnnnn ggbbrhpx   (p = SIL supplement)
        Ok(Self {
            address: es.address,
            capability_class_codes: u16::from_be_bytes([m[1], m[2]]),
            operational_mode: OperationalMode::from_u16(u16::from_be_bytes([m[3], m[4]]), false),
            version,
            nic_supplement_a: m[5] & 0b0001_0000 != 0,
            nac_p: NacP::from_u8_unchecked(m[5] & 0b1111),
            gva: (version.as_u8() >= 2).then(|| Gva::from_u8_unchecked(m[6] >> 6)),
            sil: Sil::from_u8_unchecked((m[6] >> 4) & 0b11),
            nic_baro: m[6] & 0b1000 != 0,
            hrd: m[6] & 0b100 != 0,
            sil_supplement: (version.as_u8() >= 2)
                .then(|| SilSupplement::from_bit(m[6] & 0b10 != 0)),
        })
    }

    /// TCAS/ACAS operational bit of the capability class codes.
    pub fn tcas_operational(&self) -> bool {
        self.capability_class_codes & 0x2000 != 0
    }

    /// 1090ES IN bit of the capability class codes.
    pub fn has_1090es_in(&self) -> bool {
        self.capability_class_codes & 0x1000 != 0
    }
}

/// TFC 31, subtype 1, version 1 and 2: surface operational status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceOperationalStatus {
    pub address: Address,
    /// 12-bit capability class code word.
    pub capability_class_codes: u16,
    pub length_width: LengthWidthCode,
    pub operational_mode: OperationalMode,
    pub version: MopsVersion,
    pub nic_supplement_a: bool,
    pub nac_p: NacP,
    pub sil: Sil,
    /// Whether the surface position messages report track angle (false) or
    /// heading (true).
    pub track_heading: bool,
    pub hrd: bool,
    /// Version 2 only.
    pub sil_supplement: Option<SilSupplement>,
}

impl SurfaceOperationalStatus {
    pub fn decode(es: &ExtendedSquitter) -> Result<Self, DecodeError> {
        let m = operational_status_message(es)?;
        if es.subtype() != 1 {
            return Err(DecodeError::bad_format(
                "surface operational status messages have subtype 1",
            ));
        }

        let version = MopsVersion::from_u8_unchecked(m[5] >> 5);
        let cc_and_lw = u16::from_be_bytes([m[1], m[2]]);

        Ok(Self {
            address: es.address,
            capability_class_codes: cc_and_lw >> 4,
            length_width: LengthWidthCode::from_u8_unchecked((cc_and_lw & 0b1111) as u8),
            operational_mode: OperationalMode::from_u16(u16::from_be_bytes([m[3], m[4]]), true),
            version,
            nic_supplement_a: m[5] & 0b0001_0000 != 0,
            nac_p: NacP::from_u8_unchecked(m[5] & 0b1111),
            sil: Sil::from_u8_unchecked((m[6] >> 4) & 0b11),
            track_heading: m[6] & 0b1000 != 0,
            hrd: m[6] & 0b100 != 0,
            sil_supplement: (version.as_u8() >= 2)
                .then(|| SilSupplement::from_bit(m[6] & 0b10 != 0)),
        })
    }

    /// NACv carried in the capability class codes.
    pub fn nac_v(&self) -> NacV {
        NacV::from_u8_unchecked(((self.capability_class_codes >> 1) & 0b111) as u8)
    }

    /// NIC supplement C, the last capability class bit.
    pub fn nic_supplement_c(&self) -> u8 {
        (self.capability_class_codes & 1) as u8
    }
}

fn operational_status_message(es: &ExtendedSquitter) -> Result<&[u8; 7], DecodeError> {
    if es.format_type_code != 31 {
        return Err(DecodeError::bad_format(
            "operational status messages must have type code 31",
        ));
    }
    if es.subtype() > 1 {
        return Err(DecodeError::bad_format(
            "operational status messages have subtype 0 or 1",
        ));
    }
    Ok(&es.message)
}

/// Operational mode codes shared between the airborne and surface variants;
/// the second byte carries the GPS antenna offset on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationalMode {
    pub tcas_ra_active: bool,
    pub ident_switch_active: bool,
    pub single_antenna_flag: bool,
    pub system_design_assurance: SystemDesignAssurance,
    pub gps_antenna_offset: Option<GpsAntennaOffset>,
}

impl OperationalMode {
    pub fn from_u16(word: u16, surface: bool) -> Self {
        let [byte_0, byte_1] = word.to_be_bytes();

        // bit  01234567
        //      00abxcdd
        Self {
            tcas_ra_active: byte_0 & 0b0010_0000 != 0,
            ident_switch_active: byte_0 & 0b0001_0000 != 0,
            single_antenna_flag: byte_0 & 0b0000_0100 != 0,
            system_design_assurance: SystemDesignAssurance::from_u8_unchecked(byte_0 & 0b11),
            gps_antenna_offset: surface.then(|| GpsAntennaOffset(byte_1)),
        }
    }
}

/// Encoded GPS antenna position
///
/// 2.2.3.2.7.2.4.7
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GpsAntennaOffset(pub u8);

impl GpsAntennaOffset {
    /// Lateral distance of the antenna from the roll axis in meters,
    /// positive to the right.
    pub fn lateral_m(&self) -> i8 {
        let magnitude = (((self.0 >> 5) & 0b11) << 1) as i8;
        if self.0 & 0b1000_0000 != 0 {
            magnitude
        }
        else {
            -magnitude
        }
    }

    /// Longitudinal distance of the antenna from the nose in meters.
    pub fn longitudinal_m(&self) -> u8 {
        (self.0 & 0b11111) << 1
    }
}

/// 2-bit system design assurance level
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemDesignAssurance(u8);

impl SystemDesignAssurance {
    pub const NONE: Self = Self(0);
    pub const D: Self = Self(1);
    pub const C: Self = Self(2);
    pub const B: Self = Self(3);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

/// 3 bit ADS-B (MOPS) version
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MopsVersion(u8);

impl MopsVersion {
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

/// Navigation Accuracy Category for position
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NacP(u8);

impl NacP {
    pub const UNKNOWN: Self = Self(0);

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

impl Debug for NacP {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NacP({})", self.0)
    }
}

/// Geometric Vertical Accuracy
///
/// 2.2.3.2.7.2.8
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gva(u8);

impl Gva {
    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111100 == 0 {
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

/// Source Integrity Level
///
/// 2.2.3.2.7.2.9
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sil(u8);

impl Sil {
    pub const UNKNOWN: Self = Self(0);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111100 == 0 {
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

/// Aircraft/vehicle length and width code
///
/// 2.2.3.2.7.2.11
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LengthWidthCode(u8);

impl LengthWidthCode {
    pub const UNKNOWN: Self = Self(0);

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

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use downlink1090_types::Address;

    use crate::{
        adsb::{
            AirborneOperationalStatus,
            AirbornePosition,
            AirspeedHeading,
            EmergencyOrPriorityStatus,
            EmergencyState,
            ExtendedSquitter,
            Identification,
            OperationalStatusV0,
            SelectedAltitudeType,
            SilSupplement,
            SurfaceOperationalStatus,
            SurfacePosition,
            TargetStateAndStatus,
            TcasResolutionAdvisory,
            VelocityOverGround,
            VerticalRateSource,
            WakeVortexCategory,
            cpr::CprFormat,
        },
        frame::Envelope,
    };

    fn extended_squitter(hex: &str) -> ExtendedSquitter {
        let envelope = Envelope::parse_hex(hex, false).unwrap();
        ExtendedSquitter::decode(&envelope).unwrap()
    }

    fn from_me(me: [u8; 7]) -> ExtendedSquitter {
        ExtendedSquitter {
            address: Address::from_u32_unchecked(0x4840d6),
            first_field: 5,
            format_type_code: me[0] >> 3,
            message: me,
        }
    }

    #[test]
    fn it_decodes_an_identification() {
        let es = extended_squitter("8D4840D6202CC371C32CE0576098");
        let identification = Identification::decode(&es).unwrap();

        assert_eq!(identification.callsign.decode().unwrap().as_str(), "KLM1023 ");
        assert_eq!(identification.category_set(), 'A');
        assert_eq!(identification.emitter_category, 0);
        assert_eq!(
            identification.wake_vortex_category(),
            WakeVortexCategory::NoCategoryInformation { type_code: 4 },
        );
    }

    #[test]
    fn it_decodes_another_identification() {
        let es = from_me([0x20, 0x2c, 0xc3, 0x71, 0xc3, 0x1d, 0xe0]);
        let identification = Identification::decode(&es).unwrap();

        assert_eq!(identification.callsign.decode().unwrap().as_str(), "KLM1017 ");
    }

    #[test]
    fn it_decodes_an_airborne_position() {
        let es = extended_squitter("8D40621D58C382D690C8AC2863A7");
        let position = AirbornePosition::decode(&es, 0).unwrap();

        assert_eq!(position.format_type_code, 11);
        assert!(position.is_barometric_altitude());
        assert!(position.has_altitude());
        assert_eq!(position.altitude(), Some(38000));
        assert_eq!(position.cpr.format, CprFormat::Even);
        assert_eq!(position.cpr.latitude.as_u32(), 93000);
        assert_eq!(position.cpr.longitude.as_u32(), 51372);
    }

    #[test]
    fn it_decodes_a_surface_position() {
        let es = extended_squitter("8C4ACA153AED72241216884AA69B");
        let position = SurfacePosition::decode(&es, 0).unwrap();

        assert_eq!(position.movement.as_u8(), 0b0101110);
        assert_abs_diff_eq!(position.movement.decode().unwrap(), 22.0);
        let track = position.ground_track.expect("no ground track");
        assert_abs_diff_eq!(track.as_degrees(), 244.6875);
        assert_eq!(position.cpr.format, CprFormat::Even);
        assert_eq!(position.cpr.latitude.as_u32(), 0b1_0001_0010_0000_1001);
        assert_eq!(position.cpr.longitude.as_u32(), 0b0_0001_0110_1000_1000);
    }

    #[test]
    fn it_decodes_a_velocity_over_ground() {
        let es = extended_squitter("8D485020994409940838175B284F");
        let velocity = VelocityOverGround::decode(&es).unwrap();

        assert!(!velocity.supersonic);
        assert!(!velocity.intent_change);
        assert!(velocity.ifr_capability);

        assert_abs_diff_eq!(velocity.ground_speed().unwrap(), 159.20, epsilon = 0.01);
        assert_abs_diff_eq!(velocity.track().unwrap(), 182.88, epsilon = 0.01);

        assert!(velocity.has_vertical_rate_info());
        assert_eq!(velocity.vertical_rate.source, VerticalRateSource::Geometric);
        assert_eq!(velocity.vertical_rate.as_ft_per_min(), Some(-832));

        assert!(velocity.has_geo_minus_baro_info());
        assert_eq!(velocity.geo_minus_baro.as_ft(), Some(550));
    }

    #[test]
    fn it_decodes_a_supersonic_airspeed() {
        let es = from_me([0x9c, 0x00, 0x04, 0x00, 0x20, 0x02, 0x97]);
        let airspeed = AirspeedHeading::decode(&es).unwrap();

        assert!(airspeed.supersonic);
        assert!(!airspeed.true_airspeed);

        // airspeed raw 1 decodes to 0 kt, but is available
        assert!(airspeed.has_airspeed_info());
        assert_eq!(airspeed.airspeed_knots(), Some(0));

        // heading status cleared gates the heading off
        assert!(!airspeed.has_heading_status());
        assert_eq!(airspeed.heading(), None);

        // vertical rate raw 0 is unavailable
        assert!(!airspeed.has_vertical_rate_info());
        assert_eq!(airspeed.vertical_rate.as_ft_per_min(), None);

        assert!(airspeed.has_geo_minus_baro_info());
        assert_eq!(airspeed.geo_minus_baro.as_ft(), Some(-550));
    }

    #[test]
    fn supersonic_airspeed_scales_by_four() {
        let es = from_me([0x9c, 0x04, 0x04, 0x00, 0x60, 0x00, 0x00]);
        let airspeed = AirspeedHeading::decode(&es).unwrap();

        assert_eq!(airspeed.airspeed_knots(), Some(8));
        assert_abs_diff_eq!(airspeed.heading().unwrap(), 1.40625);
    }

    #[test]
    fn it_rejects_bad_velocity_subtypes() {
        // subtype 5 is reserved
        assert!(AirspeedHeading::decode(&from_me([0x9d, 0, 0, 0, 0, 0, 0])).is_err());
        assert!(VelocityOverGround::decode(&from_me([0x9c, 0, 0, 0, 0, 0, 0])).is_err());
        // wrong type code
        assert!(AirspeedHeading::decode(&from_me([0x20, 0, 0, 0, 0, 0, 0])).is_err());
    }

    #[test]
    fn it_decodes_an_emergency_status() {
        let es = from_me([0xe1, 0x2a, 0xaa, 0x00, 0x00, 0x00, 0x00]);
        let status = EmergencyOrPriorityStatus::decode(&es).unwrap();

        assert_eq!(status.emergency_state, EmergencyState::GENERAL_EMERGENCY);
        assert!(status.emergency_state.is_emergency());
        assert_eq!(status.mode_a_code.to_string(), "7700");
    }

    #[test]
    fn it_decodes_a_resolution_advisory() {
        let es = from_me([0xe2, 0x40, 0x40, 0x76, 0xaf, 0x37, 0xbc]);
        let advisory = TcasResolutionAdvisory::decode(&es).unwrap();

        assert_eq!(
            advisory.active_resolution_advisories.as_u16(),
            0b01000000010000
        );
        assert!(advisory.active_resolution_advisories.is_set(1));
        assert!(advisory.active_resolution_advisories.is_set(9));
        assert_eq!(advisory.rac_record.as_u8(), 1);
        assert!(advisory.ra_terminated);
        assert!(advisory.multiple_threat_encounter);
        assert_eq!(advisory.threat_type.as_u8(), 1);
        assert_eq!(
            advisory.threat_icao24(),
            Some(Address::from_u32_unchecked(0xabcdef))
        );
        assert_eq!(advisory.threat_altitude_code(), None);
    }

    #[test]
    fn it_decodes_a_target_state_and_status() {
        let es = from_me([0xea, 0x3e, 0x80, 0x06, 0x00, 0x00, 0x00]);
        let target = TargetStateAndStatus::decode(&es).unwrap();

        assert_eq!(target.selected_altitude_type, SelectedAltitudeType::McpFcu);
        assert!(target.has_selected_altitude());
        assert_eq!(target.selected_altitude(), Some(31968));
        assert!(!target.has_barometric_setting());
        assert_eq!(target.barometric_setting(), None);
        assert_eq!(target.selected_heading(), Some(180.0));
    }

    #[test]
    fn it_decodes_operational_status_messages() {
        // airborne, version 2
        let es = from_me([0xf8, 0x20, 0x00, 0x00, 0x00, 0x5a, 0xba]);
        let status = AirborneOperationalStatus::decode(&es).unwrap();
        assert_eq!(status.version.as_u8(), 2);
        assert!(status.nic_supplement_a);
        assert_eq!(status.nac_p.as_u8(), 10);
        assert_eq!(status.gva.unwrap().as_u8(), 2);
        assert_eq!(status.sil.as_u8(), 3);
        assert!(status.nic_baro);
        assert!(!status.hrd);
        assert_eq!(status.sil_supplement, Some(SilSupplement::PerSample));
        assert!(status.tcas_operational());
        assert!(!status.has_1090es_in());

        // surface, version 2
        let es = from_me([0xf9, 0x00, 0x39, 0x00, 0x00, 0x48, 0x1c]);
        let status = SurfaceOperationalStatus::decode(&es).unwrap();
        assert_eq!(status.version.as_u8(), 2);
        assert!(!status.nic_supplement_a);
        assert_eq!(status.nac_p.as_u8(), 8);
        assert_eq!(status.nac_v().as_u8(), 1);
        assert_eq!(status.nic_supplement_c(), 1);
        assert_eq!(status.length_width.as_u8(), 9);
        assert!(status.track_heading);
        assert!(status.hrd);
        assert_eq!(status.sil_supplement, Some(SilSupplement::PerHour));

        // version 0 keeps the raw code words
        let es = from_me([0xf8, 0x20, 0x40, 0x00, 0x00, 0x00, 0x00]);
        let status = OperationalStatusV0::decode(&es).unwrap();
        assert_eq!(status.version.as_u8(), 0);
        assert_eq!(status.capability_class_codes, 0x2040);
        assert_eq!(status.subtype, 0);

        // subtype 2 and above is not an operational status
        assert!(OperationalStatusV0::decode(&from_me([0xfa, 0, 0, 0, 0, 0, 0])).is_err());
    }
}
