pub mod bits;
pub mod gillham;

use bytes::Buf;

use crate::{
    adsb::cpr::{
        Cpr,
        CprFormat,
        CprValue,
    },
    frame::{
        AltitudeCode,
        DownlinkRequest,
        FlightStatus,
        ReplyInformation,
        SensitivityLevel,
        UtilityMessage,
        VerticalStatus,
    },
};

pub trait BufReadBytesExt {
    fn get_bytes<const N: usize>(&mut self) -> [u8; N];
}

impl<B: Buf> BufReadBytesExt for B {
    fn get_bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut data: [u8; N] = [0; N];
        self.copy_to_slice(&mut data[..]);
        data
    }
}

/// Decode fields common to the surveillance replies (DF4, DF5, DF20, DF21).
///
/// `bits_6_to_8` are the last 3 bits of the first frame byte, `bytes` the
/// three bytes that follow it.
///
/// ```plain
/// bits_6_to_8  bytes [0]      [1]      [2]
/// .....fff     ddddduuu  uuuaaaaa aaaaaaaa
/// ```
pub fn decode_surveillance_reply_body(
    bits_6_to_8: u8,
    bytes: [u8; 3],
) -> (FlightStatus, DownlinkRequest, UtilityMessage, u16) {
    (
        FlightStatus::from_u8_unchecked(bits_6_to_8),
        DownlinkRequest::from_u8_unchecked(bytes[0] >> 3),
        UtilityMessage::from_u8_unchecked(((bytes[0] & 0b111) << 3) | (bytes[1] >> 5)),
        decode_frame_aligned_altitude_or_identity_code(&bytes[1..=2]),
    )
}

/// Decode fields common to the air-air surveillance replies (DF0, DF16).
///
/// ```plain
/// bits_6_to_8  bytes [0]      [1]      [2]
/// .....vxx     sssxxrrr  rxxaaaaa aaaaaaaa
/// ```
pub fn decode_air_air_surveillance_common_fields(
    bits_6_to_8: u8,
    bytes: [u8; 3],
) -> (
    VerticalStatus,
    SensitivityLevel,
    ReplyInformation,
    AltitudeCode,
) {
    let vertical_status = if bits_6_to_8 & 0b100 == 0 {
        VerticalStatus::Airborne
    }
    else {
        VerticalStatus::Ground
    };

    (
        vertical_status,
        SensitivityLevel::from_u8_unchecked(bytes[0] >> 5),
        ReplyInformation::from_u8_unchecked(((bytes[0] & 0b111) << 1) | (bytes[1] >> 7)),
        AltitudeCode::from_u16_unchecked(decode_frame_aligned_altitude_or_identity_code(
            &bytes[1..=2],
        )),
    )
}

/// Extracts a 13-bit AC or ID code starting at bit 3 of `bytes[0]`:
///
/// ```plain
/// byte         0        1
/// bit   01234567 01234567
/// value ...aaaaa aaaaaaaa
/// ```
pub fn decode_frame_aligned_altitude_or_identity_code(bytes: &[u8]) -> u16 {
    (u16::from(bytes[0] & 0b00011111) << 8) | u16::from(bytes[1])
}

/// Decode a CPR field from a frame. The format bit sits at bit 5 of
/// `bytes[0]`, the 17+17 bit coordinates start at bit 6; 5 bytes total.
///
/// ```plain
/// byte         0        1        2        3        4
/// bit   01234567 01234567 01234567 01234567 01234567
/// value .....faa aaaaaaaa aaaaaaab bbbbbbbb bbbbbbbb
/// ```
pub fn decode_frame_aligned_cpr(bytes: &[u8]) -> Cpr {
    Cpr {
        format: CprFormat::from_bit(bytes[0] & 0b00000100 != 0),
        latitude: CprValue::from_u32_unchecked(
            (u32::from(bytes[0] & 0b11) << 15) | (u32::from(bytes[1]) << 7) | u32::from(bytes[2] >> 1),
        ),
        longitude: CprValue::from_u32_unchecked(
            (u32::from(bytes[2] & 0b1) << 16) | (u32::from(bytes[3]) << 8) | u32::from(bytes[4]),
        ),
    }
}

/// CRC algorithm over the 24-bit Mode S polynomial.
///
/// Only used to undo the XOR overlay of the address onto the parity field;
/// frames are assumed to be CRC-checked upstream.
///
/// <https://www.ll.mit.edu/sites/default/files/publication/doc/2018-12/Gertz_1984_ATC-117_WW-15318.pdf>
pub const CRC_24_MODES: crc::Algorithm<u32> = crc::Algorithm {
    width: 24,
    poly: 0xfff409,
    init: 0,
    refin: false,
    refout: false,
    xorout: 0x000000,
    check: 0x54268,
    residue: 0x000000,
};

/// Checksum over everything up to the parity field.
pub fn mode_s_checksum(data: &[u8]) -> [u8; 3] {
    const CRC: crc::Crc<u32> = crc::Crc::<u32>::new(&CRC_24_MODES);

    let checksum = CRC.checksum(data).to_be_bytes();
    [checksum[1], checksum[2], checksum[3]]
}
