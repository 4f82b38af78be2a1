//! 1090 MHz Mode S / ADS-B downlink decoder
//!
//! Takes raw Mode S replies (short 7-byte or long 14-byte frames, as bytes
//! or hex) and produces fully typed message records: identity, position,
//! velocity, intent, operational status and collision avoidance advisories.
//!
//! Decoding happens in two stages: a stateless pass over the frame envelope
//! and its bitfields ([`frame`], [`adsb`]), and a stateful per-aircraft pass
//! ([`decoder`]) that tracks the advertised ADS-B version, NIC supplements
//! and the even/odd CPR pairing needed to recover positions.
//!
//! Callers are expected to hand in CRC-checked frames; parity is only used
//! to recover XOR-overlaid addresses. See [`StatefulDecoder`] for the entry
//! point.
//!
//! - [DO-260B][1] defines the message formats
//! - [The 1090 Megahertz Riddle][2] is a good overview
//!
//! [1]: http://www.anteni.net/adsb/Doc/1090-WP30-18-DRAFT_DO-260B-V42.pdf
//! [2]: https://mode-s.org/1090mhz/

pub mod adsb;
pub mod decoder;
pub mod frame;
pub mod util;

pub use downlink1090_types as types;

pub use self::{
    decoder::{
        DecoderConfig,
        Message,
        StatefulDecoder,
    },
    frame::{
        DecodeError,
        Envelope,
    },
};
