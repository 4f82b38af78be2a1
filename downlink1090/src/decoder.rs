//! Stateful Mode S decoding
//!
//! [`StatefulDecoder::decode`] turns an [`Envelope`] into the deepest
//! specialized [`Message`] it can. Decoding is stateful because the ADS-B
//! version of a transponder is only known once an operational status message
//! has been seen; position and operational status messages decode
//! differently per version, and CPR position decoding needs the matching
//! even/odd frame remembered per aircraft.
//!
//! A decoder instance is meant for single-threaded use: no operation blocks,
//! and callers that want parallelism shard aircraft across instances.

use std::collections::HashMap;

use downlink1090_types::{
    Address,
    AltitudeType,
    Position,
};

use crate::{
    adsb::{
        AirborneOperationalStatus,
        AirbornePosition,
        AirbornePositionV1,
        AirbornePositionV2,
        AirspeedHeading,
        EmergencyOrPriorityStatus,
        ExtendedSquitter,
        Identification,
        OperationalStatusV0,
        SurfaceOperationalStatus,
        SurfacePosition,
        SurfacePositionV1,
        SurfacePositionV2,
        TargetStateAndStatus,
        TcasResolutionAdvisory,
        VelocityOverGround,
        cpr::{
            DecodedPosition,
            PositionDecoder,
        },
    },
    frame::{
        AllCallReply,
        AltitudeReply,
        CommBAltitudeReply,
        CommBIdentifyReply,
        CommDExtendedLength,
        DecodeError,
        Envelope,
        IdentifyReply,
        LongAcas,
        ShortAcas,
        VerticalStatus,
    },
};

/// The deepest specialization of a decoded Mode S reply.
///
/// Frames the decoder cannot specialize further are handed back as the
/// generic [`ExtendedSquitter`] (recognized ADS-B carrier, unknown payload)
/// or the raw [`Envelope`] (everything else).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    ShortAcas(ShortAcas),
    AltitudeReply(AltitudeReply),
    IdentifyReply(IdentifyReply),
    AllCallReply(AllCallReply),
    LongAcas(LongAcas),
    Identification(Identification),
    SurfacePositionV0(SurfacePosition),
    SurfacePositionV1(SurfacePositionV1),
    SurfacePositionV2(SurfacePositionV2),
    AirbornePositionV0(AirbornePosition),
    AirbornePositionV1(AirbornePositionV1),
    AirbornePositionV2(AirbornePositionV2),
    VelocityOverGround(VelocityOverGround),
    AirspeedHeading(AirspeedHeading),
    EmergencyOrPriorityStatus(EmergencyOrPriorityStatus),
    TcasResolutionAdvisory(TcasResolutionAdvisory),
    TargetStateAndStatus(TargetStateAndStatus),
    OperationalStatusV0(OperationalStatusV0),
    AirborneOperationalStatusV1(AirborneOperationalStatus),
    AirborneOperationalStatusV2(AirborneOperationalStatus),
    SurfaceOperationalStatusV1(SurfaceOperationalStatus),
    SurfaceOperationalStatusV2(SurfaceOperationalStatus),
    CommBAltitudeReply(CommBAltitudeReply),
    CommBIdentifyReply(CommBIdentifyReply),
    CommDExtendedLength(CommDExtendedLength),
    ExtendedSquitter(ExtendedSquitter),
    Unknown(Envelope),
}

impl Message {
    pub fn address(&self) -> Address {
        match self {
            Message::ShortAcas(message) => message.address,
            Message::AltitudeReply(message) => message.address,
            Message::IdentifyReply(message) => message.address,
            Message::AllCallReply(message) => message.address,
            Message::LongAcas(message) => message.address,
            Message::Identification(message) => message.address,
            Message::SurfacePositionV0(message) => message.address,
            Message::SurfacePositionV1(message) => message.position.address,
            Message::SurfacePositionV2(message) => message.position.address,
            Message::AirbornePositionV0(message) => message.address,
            Message::AirbornePositionV1(message) => message.position.address,
            Message::AirbornePositionV2(message) => message.position.address,
            Message::VelocityOverGround(message) => message.address,
            Message::AirspeedHeading(message) => message.address,
            Message::EmergencyOrPriorityStatus(message) => message.address,
            Message::TcasResolutionAdvisory(message) => message.address,
            Message::TargetStateAndStatus(message) => message.address,
            Message::OperationalStatusV0(message) => message.address,
            Message::AirborneOperationalStatusV1(message) => message.address,
            Message::AirborneOperationalStatusV2(message) => message.address,
            Message::SurfaceOperationalStatusV1(message) => message.address,
            Message::SurfaceOperationalStatusV2(message) => message.address,
            Message::CommBAltitudeReply(message) => message.address,
            Message::CommBIdentifyReply(message) => message.address,
            Message::CommDExtendedLength(message) => message.address,
            Message::ExtendedSquitter(message) => message.address,
            Message::Unknown(envelope) => envelope.address(),
        }
    }

    /// Airborne position of any version.
    pub fn is_airborne_position(&self) -> bool {
        matches!(
            self,
            Message::AirbornePositionV0(_)
                | Message::AirbornePositionV1(_)
                | Message::AirbornePositionV2(_)
        )
    }

    /// Surface position of any version.
    pub fn is_surface_position(&self) -> bool {
        matches!(
            self,
            Message::SurfacePositionV0(_)
                | Message::SurfacePositionV1(_)
                | Message::SurfacePositionV2(_)
        )
    }

    pub fn is_position(&self) -> bool {
        self.is_airborne_position() || self.is_surface_position()
    }
}

/// Tuning knobs of the per-aircraft state housekeeping. The defaults match
/// the long-standing production values; tests lower them.
#[derive(Clone, Debug)]
pub struct DecoderConfig {
    /// Messages decoded before an automatic eviction pass is considered.
    pub cleanup_interval: u64,
    /// Eviction only runs while more aircraft than this are tracked.
    pub cleanup_aircraft_threshold: usize,
    /// Aircraft unseen for longer than this many milliseconds are evicted.
    pub stale_after: u64,
    /// Reasonableness bound: globally decoded positions further than this
    /// from the previous fix are dropped.
    pub max_position_jump_nm: f64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: 1_000_000,
            cleanup_aircraft_threshold: 30_000,
            stale_after: 3_600_000,
            max_position_jump_nm: 50.0,
        }
    }
}

/// Per-aircraft decoder state.
///
/// The version starts at 0 and is only ever written by operational status
/// messages; everything else reads it.
#[derive(Debug, Default)]
struct AircraftState {
    adsb_version: u8,
    nic_supplement_a: bool,
    nic_supplement_c: u8,
    geo_minus_baro: Option<i32>,
    last_used: u64,
    position_decoder: PositionDecoder,
}

/// Stateful decoder for Mode S downlink frames.
#[derive(Debug, Default)]
pub struct StatefulDecoder {
    aircraft: HashMap<Address, AircraftState>,
    latest_timestamp: u64,
    messages_since_cleanup: u64,
    config: DecoderConfig,
}

impl StatefulDecoder {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            aircraft: HashMap::new(),
            latest_timestamp: 0,
            messages_since_cleanup: 0,
            config,
        }
    }

    /// Number of aircraft with live decoder state.
    pub fn tracked_aircraft(&self) -> usize {
        self.aircraft.len()
    }

    /// Decode a raw frame of 7 or 14 bytes. See [`Envelope::parse`] for the
    /// meaning of `address_recovered`.
    ///
    /// `timestamp` is the time of applicability (or reception) in
    /// milliseconds. Callers are expected to supply non-decreasing
    /// timestamps; out-of-order input cannot corrupt state but delays
    /// eviction.
    pub fn decode_bytes(
        &mut self,
        frame: &[u8],
        address_recovered: bool,
        timestamp: u64,
    ) -> Result<Message, DecodeError> {
        self.decode(Envelope::parse(frame, address_recovered)?, timestamp)
    }

    /// Decode a frame from its hex representation.
    pub fn decode_hex(
        &mut self,
        frame: &str,
        address_recovered: bool,
        timestamp: u64,
    ) -> Result<Message, DecodeError> {
        self.decode(Envelope::parse_hex(frame, address_recovered)?, timestamp)
    }

    /// Decode a parsed envelope to its deepest possible specialization.
    pub fn decode(&mut self, envelope: Envelope, timestamp: u64) -> Result<Message, DecodeError> {
        // the counter is deliberately never reset: once the burn-in has
        // passed, eviction is gated by the map size alone
        self.messages_since_cleanup += 1;
        if self.messages_since_cleanup > self.config.cleanup_interval
            && self.aircraft.len() > self.config.cleanup_aircraft_threshold
        {
            self.clear_stale();
        }

        self.latest_timestamp = timestamp;

        let message = match envelope.downlink_format() {
            0 => Message::ShortAcas(ShortAcas::decode(&envelope)),
            4 => Message::AltitudeReply(AltitudeReply::decode(&envelope)),
            5 => Message::IdentifyReply(IdentifyReply::decode(&envelope)),
            11 => Message::AllCallReply(AllCallReply::decode(&envelope)),
            16 => Message::LongAcas(LongAcas::decode(&envelope)),
            17..=19 => self.decode_extended_squitter(&envelope)?,
            20 => Message::CommBAltitudeReply(CommBAltitudeReply::decode(&envelope)),
            21 => Message::CommBIdentifyReply(CommBIdentifyReply::decode(&envelope)),
            downlink_format if downlink_format >= 24 => {
                Message::CommDExtendedLength(CommDExtendedLength::decode(&envelope))
            }
            _ => Message::Unknown(envelope),
        };

        Ok(message)
    }

    fn decode_extended_squitter(&mut self, envelope: &Envelope) -> Result<Message, DecodeError> {
        let downlink_format = envelope.downlink_format();
        let first_field = envelope.first_field();

        // standard ADS-B is only carried by these combinations (Figure 2-2,
        // DO-260B); TIS-B and ADS-R rebroadcasts stay untyped for now
        let is_adsb = downlink_format == 17
            || (downlink_format == 18 && first_field < 2)
            || (downlink_format == 19 && first_field == 0);
        if !is_adsb {
            return Ok(Message::Unknown(*envelope));
        }

        let es = ExtendedSquitter::decode(envelope)?;
        let timestamp = self.latest_timestamp;
        let state = self.aircraft.entry(es.address).or_default();
        state.last_used = timestamp;

        let message = match es.format_type_code {
            1..=4 => Message::Identification(Identification::decode(&es)?),

            5..=8 => {
                let position = SurfacePosition::decode(&es, timestamp)?;
                match state.adsb_version {
                    1 => {
                        Message::SurfacePositionV1(SurfacePositionV1 {
                            position,
                            nic_supplement_a: state.nic_supplement_a,
                        })
                    }
                    2 => {
                        Message::SurfacePositionV2(SurfacePositionV2 {
                            position,
                            nic_supplement_a: state.nic_supplement_a,
                            nic_supplement_c: state.nic_supplement_c,
                        })
                    }
                    // version 0, including anything unexpected
                    _ => Message::SurfacePositionV0(position),
                }
            }

            9..=18 | 20..=22 => {
                let position = AirbornePosition::decode(&es, timestamp)?;
                match state.adsb_version {
                    1 => {
                        Message::AirbornePositionV1(AirbornePositionV1 {
                            position,
                            nic_supplement_a: state.nic_supplement_a,
                        })
                    }
                    2 => {
                        Message::AirbornePositionV2(AirbornePositionV2 {
                            position,
                            nic_supplement_a: state.nic_supplement_a,
                        })
                    }
                    _ => Message::AirbornePositionV0(position),
                }
            }

            19 => {
                match es.subtype() {
                    1 | 2 => {
                        let velocity = VelocityOverGround::decode(&es)?;
                        if let Some(geo_minus_baro) = velocity.geo_minus_baro.as_ft() {
                            state.geo_minus_baro = Some(geo_minus_baro);
                        }
                        Message::VelocityOverGround(velocity)
                    }
                    3 | 4 => {
                        let airspeed = AirspeedHeading::decode(&es)?;
                        if let Some(geo_minus_baro) = airspeed.geo_minus_baro.as_ft() {
                            state.geo_minus_baro = Some(geo_minus_baro);
                        }
                        Message::AirspeedHeading(airspeed)
                    }
                    _ => Message::ExtendedSquitter(es),
                }
            }

            28 => {
                match es.subtype() {
                    1 => {
                        Message::EmergencyOrPriorityStatus(EmergencyOrPriorityStatus::decode(&es)?)
                    }
                    2 => Message::TcasResolutionAdvisory(TcasResolutionAdvisory::decode(&es)?),
                    _ => Message::ExtendedSquitter(es),
                }
            }

            29 => {
                let subtype = (es.message[0] >> 1) & 0b11;
                // version 0 transponders with ME bit 11 set do not implement
                // target state reports (DO-260B 2.2.3.2.7.1); the frame goes
                // back untyped
                let me_bit_11 = es.message[1] & 0b0010_0000 != 0;
                if subtype == 1 && (state.adsb_version > 0 || !me_bit_11) {
                    Message::TargetStateAndStatus(TargetStateAndStatus::decode(&es)?)
                }
                else {
                    Message::ExtendedSquitter(es)
                }
            }

            31 => {
                let subtype = es.subtype();
                if subtype > 1 {
                    Message::ExtendedSquitter(es)
                }
                else {
                    let version = es.message[5] >> 5;
                    if version > 2 {
                        return Err(DecodeError::BadFormat {
                            reason: format!("operational status has invalid version: {version}"),
                        });
                    }
                    // the version never goes backwards until eviction
                    if version > state.adsb_version {
                        tracing::trace!(address = %es.address, version, "adsb version updated");
                        state.adsb_version = version;
                    }

                    match state.adsb_version {
                        1 | 2 => {
                            if subtype == 0 {
                                let status = AirborneOperationalStatus::decode(&es)?;
                                state.nic_supplement_a = status.nic_supplement_a;
                                if state.adsb_version == 1 {
                                    Message::AirborneOperationalStatusV1(status)
                                }
                                else {
                                    Message::AirborneOperationalStatusV2(status)
                                }
                            }
                            else {
                                let status = SurfaceOperationalStatus::decode(&es)?;
                                state.nic_supplement_a = status.nic_supplement_a;
                                state.nic_supplement_c = status.nic_supplement_c();
                                if state.adsb_version == 1 {
                                    Message::SurfaceOperationalStatusV1(status)
                                }
                                else {
                                    Message::SurfaceOperationalStatusV2(status)
                                }
                            }
                        }
                        _ => Message::OperationalStatusV0(OperationalStatusV0::decode(&es)?),
                    }
                }
            }

            _ => Message::ExtendedSquitter(es),
        };

        Ok(message)
    }

    /// Decode the CPR-encoded position of an airborne or surface position
    /// message of any version, combining it with the message's altitude.
    ///
    /// `receiver` is used as the reference for local decoding and for
    /// resolving the surface ambiguity.
    pub fn extract_position(
        &mut self,
        message: &Message,
        receiver: Option<&Position>,
    ) -> Option<Position> {
        match message {
            Message::AirbornePositionV0(position) => {
                self.extract_airborne_position(position, receiver)
            }
            Message::AirbornePositionV1(message) => {
                self.extract_airborne_position(&message.position, receiver)
            }
            Message::AirbornePositionV2(message) => {
                self.extract_airborne_position(&message.position, receiver)
            }
            Message::SurfacePositionV0(position) => {
                self.extract_surface_position(position, receiver)
            }
            Message::SurfacePositionV1(message) => {
                self.extract_surface_position(&message.position, receiver)
            }
            Message::SurfacePositionV2(message) => {
                self.extract_surface_position(&message.position, receiver)
            }
            _ => None,
        }
    }

    fn extract_airborne_position(
        &mut self,
        position: &AirbornePosition,
        receiver: Option<&Position>,
    ) -> Option<Position> {
        let latest_timestamp = self.latest_timestamp;
        let max_jump = self.config.max_position_jump_nm;
        let reference = receiver.map(reference_of);

        let state = self.aircraft.entry(position.address).or_default();
        state.last_used = latest_timestamp;

        let decoded = state.position_decoder.decode(
            position.cpr,
            VerticalStatus::Airborne,
            position.timestamp,
            reference.as_ref(),
            max_jump,
        )?;

        Some(Position {
            latitude: decoded.latitude,
            longitude: decoded.longitude,
            altitude: position.altitude().map(f64::from),
            altitude_type: if position.is_barometric_altitude() {
                AltitudeType::BarometricAltitude
            }
            else {
                AltitudeType::AboveWgs84Ellipsoid
            },
        })
    }

    fn extract_surface_position(
        &mut self,
        position: &SurfacePosition,
        receiver: Option<&Position>,
    ) -> Option<Position> {
        let latest_timestamp = self.latest_timestamp;
        let max_jump = self.config.max_position_jump_nm;
        let reference = receiver.map(reference_of);

        let state = self.aircraft.entry(position.address).or_default();
        state.last_used = latest_timestamp;

        let decoded = state.position_decoder.decode(
            position.cpr,
            VerticalStatus::Ground,
            position.timestamp,
            reference.as_ref(),
            max_jump,
        )?;

        Some(Position {
            latitude: decoded.latitude,
            longitude: decoded.longitude,
            altitude: Some(0.0),
            altitude_type: AltitudeType::AboveGroundLevel,
        })
    }

    /// The ADS-B version tracked for the message's aircraft. Version 0 is
    /// assumed until an operational status message says otherwise.
    pub fn adsb_version(&mut self, message: &Message) -> u8 {
        let latest_timestamp = self.latest_timestamp;
        let state = self.aircraft.entry(message.address()).or_default();
        state.last_used = latest_timestamp;
        state.adsb_version
    }

    /// The most recent difference between geometric and barometric altitude
    /// in feet, as reported by velocity messages of the message's aircraft.
    pub fn geo_minus_baro(&mut self, message: &Message) -> Option<i32> {
        let latest_timestamp = self.latest_timestamp;
        let state = self.aircraft.entry(message.address()).or_default();
        state.last_used = latest_timestamp;
        state.geo_minus_baro
    }

    /// Drop state of all aircraft not seen for longer than the configured
    /// staleness bound. Runs automatically under memory pressure.
    pub fn clear_stale(&mut self) {
        let stale_after = self.config.stale_after;
        let latest_timestamp = self.latest_timestamp;
        let before = self.aircraft.len();

        self.aircraft
            .retain(|_, state| latest_timestamp.saturating_sub(state.last_used) <= stale_after);

        tracing::debug!(
            evicted = before - self.aircraft.len(),
            tracked = self.aircraft.len(),
            "cleared stale per-aircraft state"
        );
    }
}

fn reference_of(position: &Position) -> DecodedPosition {
    DecodedPosition {
        latitude: position.latitude,
        longitude: position.longitude,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use downlink1090_types::{
        Address,
        AddressQualifier,
        AltitudeType,
    };

    use crate::decoder::{
        DecoderConfig,
        Message,
        StatefulDecoder,
    };

    const EVEN_POSITION: &str = "8D40621D58C382D690C8AC2863A7";
    const ODD_POSITION: &str = "8D40621D58C386435CC412692AD6";

    /// DF17 frame for an address with an arbitrary ME field; the parity is
    /// left zeroed, so frames are decoded with `address_recovered`.
    fn df17(address: u32, me: [u8; 7]) -> [u8; 14] {
        let mut frame = [0u8; 14];
        frame[0] = 0x8d;
        frame[1..4].copy_from_slice(&Address::from_u32_unchecked(address).as_bytes());
        frame[4..11].copy_from_slice(&me);
        frame
    }

    /// Airborne operational status advertising the given version.
    fn operational_status(version: u8) -> [u8; 7] {
        [0xf8, 0x20, 0x00, 0x00, 0x00, (version << 5) | 0x1a, 0xba]
    }

    #[test]
    fn it_decodes_an_identification_message() {
        let mut decoder = StatefulDecoder::new();
        let message = decoder
            .decode_hex("8D4840D6202CC371C32CE0576098", false, 0)
            .unwrap();

        let Message::Identification(identification) = message else {
            panic!("unexpected message: {message:?}");
        };
        assert_eq!(identification.address, Address::from_u32_unchecked(0x4840d6));
        assert_eq!(
            identification.callsign.decode().unwrap().as_str(),
            "KLM1023 "
        );
    }

    #[test]
    fn position_variants_follow_the_tracked_version() {
        let mut decoder = StatefulDecoder::new();

        // before any operational status, positions decode as version 0
        let message = decoder.decode_hex(EVEN_POSITION, false, 0).unwrap();
        assert!(matches!(message, Message::AirbornePositionV0(_)));
        assert!(message.is_airborne_position());
        assert!(message.is_position());
        assert_eq!(decoder.adsb_version(&message), 0);

        // an operational status with version 2 upgrades the aircraft
        let status = decoder
            .decode_bytes(&df17(0x40621d, operational_status(2)), true, 1000)
            .unwrap();
        assert!(matches!(status, Message::AirborneOperationalStatusV2(_)));

        let message = decoder.decode_hex(EVEN_POSITION, false, 2000).unwrap();
        let Message::AirbornePositionV2(position) = message else {
            panic!("unexpected message: {message:?}");
        };
        assert!(position.nic_supplement_a);
        assert_eq!(decoder.adsb_version(&message), 2);

        // other aircraft are unaffected
        let other = decoder.decode_hex("8D4840D6202CC371C32CE0576098", false, 3000).unwrap();
        assert_eq!(decoder.adsb_version(&other), 0);
    }

    #[test]
    fn the_version_never_decreases() {
        let mut decoder = StatefulDecoder::new();

        decoder
            .decode_bytes(&df17(0x40621d, operational_status(2)), true, 0)
            .unwrap();
        let status = decoder
            .decode_bytes(&df17(0x40621d, operational_status(1)), true, 1000)
            .unwrap();

        // the downgrade is ignored; the message still decodes as version 2
        assert!(matches!(status, Message::AirborneOperationalStatusV2(_)));
        assert_eq!(decoder.adsb_version(&status), 2);
    }

    #[test]
    fn it_rejects_an_invalid_operational_status_version() {
        let mut decoder = StatefulDecoder::new();

        let result = decoder.decode_bytes(&df17(0x40621d, operational_status(3)), true, 0);
        assert!(result.is_err());

        // the invalid version was never stored
        let message = decoder.decode_hex(EVEN_POSITION, false, 1000).unwrap();
        assert!(matches!(message, Message::AirbornePositionV0(_)));
    }

    #[test]
    fn it_stashes_geo_minus_baro_from_velocity_messages() {
        let mut decoder = StatefulDecoder::new();

        let message = decoder
            .decode_hex("8D485020994409940838175B284F", false, 0)
            .unwrap();
        assert!(matches!(message, Message::VelocityOverGround(_)));
        assert_eq!(decoder.geo_minus_baro(&message), Some(550));
    }

    #[test]
    fn target_state_is_suppressed_for_version_0_with_me_bit_11() {
        let mut decoder = StatefulDecoder::new();
        let me = [0xea, 0x1e, 0x80, 0x06, 0x00, 0x00, 0x00];

        // ME bit 11 set (0x20 in byte 1) and version 0: untyped
        let mut suppressed = me;
        suppressed[1] |= 0x20;
        let message = decoder
            .decode_bytes(&df17(0x40621d, suppressed), true, 0)
            .unwrap();
        assert!(matches!(message, Message::ExtendedSquitter(_)));

        // without the bit the message is decoded even for version 0
        let message = decoder.decode_bytes(&df17(0x40621d, me), true, 1000).unwrap();
        assert!(matches!(message, Message::TargetStateAndStatus(_)));

        // with a known version 1+, the bit no longer matters
        decoder
            .decode_bytes(&df17(0x40621d, operational_status(2)), true, 2000)
            .unwrap();
        let message = decoder
            .decode_bytes(&df17(0x40621d, suppressed), true, 3000)
            .unwrap();
        assert!(matches!(message, Message::TargetStateAndStatus(_)));
    }

    #[test]
    fn it_extracts_a_global_position() {
        let mut decoder = StatefulDecoder::new();

        let odd = decoder.decode_hex(ODD_POSITION, false, 0).unwrap();
        assert!(decoder.extract_position(&odd, None).is_none());

        let even = decoder.decode_hex(EVEN_POSITION, false, 1000).unwrap();
        let position = decoder.extract_position(&even, None).unwrap();

        assert_abs_diff_eq!(position.latitude, 52.25720, epsilon = 0.001);
        assert_abs_diff_eq!(position.longitude, 3.91937, epsilon = 0.001);
        assert_eq!(position.altitude, Some(38000.0));
        assert_eq!(position.altitude_type, AltitudeType::BarometricAltitude);
    }

    #[test]
    fn decoding_twice_is_idempotent() {
        let mut decoder = StatefulDecoder::new();

        let first = decoder.decode_hex(EVEN_POSITION, false, 1000).unwrap();
        let tracked = decoder.tracked_aircraft();
        let second = decoder.decode_hex(EVEN_POSITION, false, 1000).unwrap();

        assert_eq!(first, second);
        assert_eq!(decoder.tracked_aircraft(), tracked);
    }

    #[test]
    fn non_adsb_carriers_pass_through_untyped() {
        let mut decoder = StatefulDecoder::new();

        // DF18 with CF=5 is TIS-B with a non-ICAO address
        let mut frame = df17(0x40621d, operational_status(2));
        frame[0] = (18 << 3) | 5;
        let message = decoder.decode_bytes(&frame, true, 0).unwrap();

        let Message::Unknown(envelope) = message else {
            panic!("unexpected message: {message:?}");
        };
        assert_eq!(envelope.address().qualifier(), AddressQualifier::TisbOther);

        // its state is keyed separately from the ICAO24 aircraft
        decoder
            .decode_bytes(&df17(0x40621d, operational_status(2)), true, 1000)
            .unwrap();
        assert_eq!(decoder.adsb_version(&message), 0);

        // DF19 only carries ADS-B with application field 0
        let mut frame = df17(0x40621d, operational_status(2));
        frame[0] = (19 << 3) | 1;
        let message = decoder.decode_bytes(&frame, true, 2000).unwrap();
        assert!(matches!(message, Message::Unknown(_)));

        frame[0] = 19 << 3;
        let message = decoder.decode_bytes(&frame, true, 3000).unwrap();
        assert!(matches!(message, Message::AirborneOperationalStatusV2(_)));
    }

    #[test]
    fn stale_aircraft_are_evicted() {
        let mut decoder = StatefulDecoder::with_config(DecoderConfig {
            cleanup_interval: 10,
            cleanup_aircraft_threshold: 2,
            stale_after: 1000,
            ..DecoderConfig::default()
        });

        for address in [0x100001, 0x100002, 0x100003] {
            decoder
                .decode_bytes(&df17(address, operational_status(2)), true, 0)
                .unwrap();
        }
        assert_eq!(decoder.tracked_aircraft(), 3);

        // a stream of messages for a fourth aircraft trips the automatic
        // cleanup once the counter and map size thresholds are both crossed
        for _ in 0..12 {
            decoder
                .decode_bytes(&df17(0x100004, operational_status(2)), true, 10_000)
                .unwrap();
        }
        assert_eq!(decoder.tracked_aircraft(), 1);

        // evicted aircraft start over at version 0
        let message = decoder
            .decode_bytes(&df17(0x100001, [0x58, 0xc3, 0x82, 0xd6, 0x90, 0xc8, 0xac]), true, 11_000)
            .unwrap();
        assert!(matches!(message, Message::AirbornePositionV0(_)));
        assert_eq!(decoder.adsb_version(&message), 0);
    }

    #[test]
    fn clear_stale_can_be_forced() {
        let mut decoder = StatefulDecoder::with_config(DecoderConfig {
            stale_after: 1000,
            ..DecoderConfig::default()
        });

        decoder
            .decode_bytes(&df17(0x100001, operational_status(2)), true, 0)
            .unwrap();
        decoder
            .decode_bytes(&df17(0x100002, operational_status(2)), true, 5000)
            .unwrap();
        assert_eq!(decoder.tracked_aircraft(), 2);

        decoder.clear_stale();
        assert_eq!(decoder.tracked_aircraft(), 1);
    }
}
